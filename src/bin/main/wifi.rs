use embassy_net::Stack;
use embassy_time::{Duration, Timer, WithTimeout};
use esp_radio::wifi::WifiController;
use glowclock_core::event::Event;
use glowclock_hal_esp32s3::network::LinkBus;
use log::{info, warn};

const NETWORK_POLL_INTERVAL_MS: u64 = 500;
const DHCP_TIMEOUT_SECS: u64 = 15;

/// Connects whenever the supervisor asks, then watches the link until it drops.
///
/// Failures are reported as `NetworkDown`; the retry delay belongs to the
/// supervisor, so this loop never sleeps between attempts on its own.
pub async fn wifi_connection_loop(
    wifi_controller: &mut WifiController<'_>,
    stack: Stack<'_>,
    bus: &'static LinkBus,
) -> ! {
    loop {
        bus.connect_network.wait().await;
        info!("wifi: connect requested");

        if !wifi_controller.is_started().unwrap_or(false)
            && let Err(err) = wifi_controller.start_async().await
        {
            warn!("wifi: start failed: {:?}", err);
            bus.post(Event::NetworkDown).await;
            continue;
        }

        if let Err(err) = wifi_controller.connect_async().await {
            warn!("wifi: connect failed: {:?}", err);
            let _ = wifi_controller.disconnect_async().await;
            bus.post(Event::NetworkDown).await;
            continue;
        }

        if stack
            .wait_config_up()
            .with_timeout(Duration::from_secs(DHCP_TIMEOUT_SECS))
            .await
            .is_err()
        {
            warn!("wifi: dhcp timeout; dropping association");
            let _ = wifi_controller.disconnect_async().await;
            bus.post(Event::NetworkDown).await;
            continue;
        }

        info!("wifi: connected, ipv4={:?}", stack.config_v4().map(|c| c.address));
        bus.post(Event::NetworkUp).await;

        loop {
            let link_up = stack.is_link_up();
            let has_ipv4 = stack.config_v4().is_some();
            let is_connected = matches!(wifi_controller.is_connected(), Ok(true));

            if !(link_up && has_ipv4 && is_connected) {
                warn!(
                    "wifi: state lost (link_up={} has_ipv4={} connected={})",
                    link_up, has_ipv4, is_connected
                );
                break;
            }

            Timer::after_millis(NETWORK_POLL_INTERVAL_MS).await;
        }

        let _ = wifi_controller.disconnect_async().await;
        bus.post(Event::NetworkDown).await;
    }
}
