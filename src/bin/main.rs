#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::net::Ipv4Addr;

use embassy_executor::Spawner;
use embassy_time::{Instant, Timer};
use esp_hal::{
    clock::CpuClock,
    delay::Delay,
    gpio::{Level, Output, OutputConfig},
    rtc_cntl::reset_reason,
    system::Cpu,
    timer::timg::TimerGroup,
};
use esp_radio::wifi::{ClientConfig, ModeConfig};
use glowclock_core::{
    app::{App, TickResult},
    clock::WallClock,
    config::AppConfig,
    connectivity::LinkState,
    error::FatalError,
};
use glowclock_hal_esp32s3::{
    network::{LinkBus, MqttConfig, WifiConfig},
    platform::matrix::{MatrixPanel, PIN_MAP},
    render::{FrameRenderer, MatrixRenderer},
};
use hub75::{FrameBuffer, Pins};
use log::{LevelFilter, error, info, warn};
use static_cell::StaticCell;

use session::session_loop;
use wall_clock::{UptimeWallClock, parse_setting_i64};
use wifi::wifi_connection_loop;

#[path = "main/session.rs"]
mod session;
#[path = "main/wall_clock.rs"]
mod wall_clock;
#[path = "main/wifi.rs"]
mod wifi;

const WIFI_SSID: &str = env!(
    "GLOWCLOCK_WIFI_SSID",
    "Set GLOWCLOCK_WIFI_SSID in your environment before building/flashing."
);
const WIFI_PASSWORD: &str = env!(
    "GLOWCLOCK_WIFI_PASSWORD",
    "Set GLOWCLOCK_WIFI_PASSWORD in your environment before building/flashing."
);
const WIFI_CONFIG: WifiConfig = WifiConfig::new(WIFI_SSID, WIFI_PASSWORD);

const MQTT_HOST: &str = env!(
    "GLOWCLOCK_MQTT_HOST",
    "Set GLOWCLOCK_MQTT_HOST (broker IPv4 address) before building/flashing."
);
const MQTT_PORT: Option<&str> = option_env!("GLOWCLOCK_MQTT_PORT");
const MQTT_KEEP_ALIVE_SECS: Option<&str> = option_env!("GLOWCLOCK_MQTT_KEEP_ALIVE_SECS");
const MQTT_CLIENT_ID: &str = match option_env!("GLOWCLOCK_MQTT_CLIENT_ID") {
    Some(id) => id,
    None => "glowclock",
};
const EPOCH_SECS: Option<&str> = option_env!("GLOWCLOCK_EPOCH_SECS");
const UTC_OFFSET_MINUTES: Option<&str> = option_env!("GLOWCLOCK_UTC_OFFSET_MINUTES");

static BUS: LinkBus = LinkBus::new();
static NET_RESOURCES: StaticCell<embassy_net::StackResources<4>> = StaticCell::new();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Restart is the recovery path for anything the links cannot heal.
fn restart_after(fatal: FatalError) -> ! {
    error!(
        "fatal: {} (restart code {}): {:?}",
        fatal.as_str(),
        fatal.restart_code(),
        fatal
    );
    esp_hal::system::software_reset()
}

async fn halt(reason: &str) -> ! {
    error!("boot: {}; halting", reason);
    loop {
        Timer::after_secs(1).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: glowclock starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    info!("boot reset_reason={:?}", reset_reason(Cpu::ProCpu));

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // HUB75 wiring, see PIN_MAP. OE starts high so the panel stays dark.
    let out = OutputConfig::default();
    let pins = Pins {
        r1: Output::new(peripherals.GPIO4, Level::Low, out),
        g1: Output::new(peripherals.GPIO5, Level::Low, out),
        b1: Output::new(peripherals.GPIO6, Level::Low, out),
        r2: Output::new(peripherals.GPIO7, Level::Low, out),
        g2: Output::new(peripherals.GPIO15, Level::Low, out),
        b2: Output::new(peripherals.GPIO16, Level::Low, out),
        address: [
            Output::new(peripherals.GPIO17, Level::Low, out),
            Output::new(peripherals.GPIO18, Level::Low, out),
            Output::new(peripherals.GPIO8, Level::Low, out),
            Output::new(peripherals.GPIO9, Level::Low, out),
        ],
        clk: Output::new(peripherals.GPIO10, Level::Low, out),
        lat: Output::new(peripherals.GPIO11, Level::Low, out),
        oe: Output::new(peripherals.GPIO12, Level::High, out),
    };

    let mut panel = match MatrixPanel::new(pins, Delay::new()) {
        Ok(panel) => panel,
        Err(err) => halt(err.as_str()).await,
    };
    info!("Matrix pins: {}", PIN_MAP);

    let mqtt_host = match MQTT_HOST.trim().parse::<Ipv4Addr>() {
        Ok(host) => host,
        Err(_) => halt("GLOWCLOCK_MQTT_HOST is not an IPv4 address").await,
    };
    let mqtt_port = parse_setting_i64(MQTT_PORT, i64::from(MqttConfig::DEFAULT_PORT));
    let keep_alive = parse_setting_i64(
        MQTT_KEEP_ALIVE_SECS,
        i64::from(MqttConfig::DEFAULT_KEEP_ALIVE_SECS),
    );
    let mqtt_config = MqttConfig::new(mqtt_host, MQTT_CLIENT_ID)
        .with_port(u16::try_from(mqtt_port).unwrap_or(MqttConfig::DEFAULT_PORT))
        .with_keep_alive_secs(
            u16::try_from(keep_alive).unwrap_or(MqttConfig::DEFAULT_KEEP_ALIVE_SECS),
        );

    let wall_clock = UptimeWallClock::new(
        parse_setting_i64(EPOCH_SECS, 0),
        parse_setting_i64(UTC_OFFSET_MINUTES, 0).clamp(-14 * 60, 14 * 60) as i32,
    );

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            warn!("esp-radio init failed: {:?}", err);
            halt("radio unavailable").await
        }
    };

    let (mut wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                warn!("wifi peripheral init failed: {:?}", err);
                halt("wifi unavailable").await
            }
        };

    let client_config = ClientConfig::default()
        .with_ssid(WIFI_CONFIG.ssid.into())
        .with_password(WIFI_CONFIG.password.into());
    if let Err(err) = wifi_controller.set_config(&ModeConfig::Client(client_config)) {
        warn!("wifi mode config failed: {:?}", err);
        halt("wifi misconfigured").await
    }

    let stack_config = embassy_net::Config::dhcpv4(Default::default());
    let (stack, mut net_runner) = embassy_net::new(
        interfaces.sta,
        stack_config,
        NET_RESOURCES.init(embassy_net::StackResources::<4>::new()),
        0x6C0C_4B1D_2E57_A911,
    );

    let mut app = App::new(AppConfig::default());
    let mut renderer = MatrixRenderer::new();
    let mut frame = FrameBuffer::new();

    info!(
        "glowclock started: ssid={} broker={}:{} client_id={} unix_seed={}",
        WIFI_CONFIG.ssid,
        mqtt_config.host,
        mqtt_config.port,
        mqtt_config.client_id,
        wall_clock.unix_now()
    );

    let net_future = net_runner.run();
    let wifi_future = wifi_connection_loop(&mut wifi_controller, stack, &BUS);
    let session_future = session_loop(stack, mqtt_config, &BUS);
    let ui_future = async {
        let loop_start = Instant::now();
        app.start();

        loop {
            let now_ms = loop_start.elapsed().as_millis();

            while let Ok(event) = BUS.events.try_receive() {
                if let Err(fatal) = app.handle_event(event, now_ms) {
                    let _ = panel.blank();
                    restart_after(fatal);
                }
            }

            let reconnect = app.poll_links(now_ms);
            if reconnect.network {
                BUS.connect_network.signal(());
            }
            if reconnect.session {
                BUS.connect_session.signal(());
            }

            if app.supervisor().session() == LinkState::Up && app.router().is_subscribed() {
                for request in app.drain_publishes() {
                    BUS.offer_publish(request);
                }
            }

            if app.tick(&wall_clock.now()) == TickResult::RenderRequested {
                let rendered = app.rendered();
                renderer.render(rendered, &mut frame);
                panel.set_brightness(rendered.map_or(0, |r| r.appearance.brightness));
            }

            let _ = panel.refresh(&frame);
            Timer::after_millis(1).await;
        }
    };

    let _ = embassy_futures::join::join4(net_future, wifi_future, session_future, ui_future).await;
    unreachable!()
}
