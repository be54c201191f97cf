use super::*;

const DELAY: u64 = 10_000;

fn started() -> Supervisor {
    let mut supervisor = Supervisor::new(DELAY);
    supervisor.start();
    assert_eq!(
        supervisor.poll(0),
        Reconnect {
            network: true,
            session: false,
        }
    );
    supervisor
}

fn online() -> Supervisor {
    let mut supervisor = started();
    supervisor.on_network_up();
    assert_eq!(
        supervisor.poll(100),
        Reconnect {
            network: false,
            session: true,
        }
    );
    supervisor.on_session_up();
    supervisor
}

#[test]
fn start_requests_network_without_arming() {
    let mut supervisor = Supervisor::new(DELAY);
    supervisor.start();

    let snapshot = supervisor.snapshot();
    assert_eq!(snapshot.network, LinkState::Connecting);
    assert_eq!(snapshot.session, LinkState::Down);
    assert!(!snapshot.network_retry_armed);
    assert!(!snapshot.session_retry_armed);
    assert!(supervisor.poll(0).network);
    assert!(supervisor.poll(1).is_empty());
}

#[test]
fn network_up_disarms_retry_and_requests_session() {
    let mut supervisor = started();
    supervisor.on_network_up();

    assert_eq!(supervisor.network(), LinkState::Up);
    assert_eq!(supervisor.session(), LinkState::Connecting);
    assert!(!supervisor.snapshot().network_retry_armed);
}

#[test]
fn network_down_forces_session_down_and_arms_network_retry() {
    let mut supervisor = online();
    supervisor.on_session_down(500);
    assert!(supervisor.snapshot().session_retry_armed);

    supervisor.on_network_down(1_000);

    let snapshot = supervisor.snapshot();
    assert_eq!(snapshot.network, LinkState::Down);
    assert_eq!(snapshot.session, LinkState::Down);
    assert!(snapshot.network_retry_armed);
    assert!(!snapshot.session_retry_armed);
}

#[test]
fn network_retry_fires_once_after_fixed_delay() {
    let mut supervisor = online();
    supervisor.on_network_down(1_000);

    assert!(supervisor.poll(10_999).is_empty());
    assert_eq!(
        supervisor.poll(11_000),
        Reconnect {
            network: true,
            session: false,
        }
    );
    assert_eq!(supervisor.network(), LinkState::Connecting);
    assert!(supervisor.poll(30_000).is_empty());
}

#[test]
fn reconnect_in_same_tick_cancels_pending_retry() {
    let mut supervisor = online();
    supervisor.on_network_down(1_000);
    supervisor.on_network_up();

    assert!(!supervisor.snapshot().network_retry_armed);
    let requested = supervisor.poll(1_000);
    assert!(!requested.network);
    assert!(requested.session);
    assert!(!supervisor.poll(20_000).network);
}

#[test]
fn session_down_while_network_up_arms_session_retry() {
    let mut supervisor = online();
    supervisor.on_session_down(2_000);

    assert_eq!(supervisor.session(), LinkState::Down);
    assert!(supervisor.poll(11_999).is_empty());
    assert_eq!(
        supervisor.poll(12_000),
        Reconnect {
            network: false,
            session: true,
        }
    );
    assert_eq!(supervisor.session(), LinkState::Connecting);
}

#[test]
fn session_down_without_network_is_ignored() {
    let mut supervisor = online();
    supervisor.on_network_down(1_000);
    supervisor.on_session_down(1_500);

    assert!(!supervisor.snapshot().session_retry_armed);
    let requested = supervisor.poll(11_000);
    assert!(requested.network);
    assert!(!requested.session);
}

#[test]
fn session_up_without_network_keeps_session_down() {
    let mut supervisor = started();
    supervisor.on_session_up();

    assert_eq!(supervisor.session(), LinkState::Down);
}

#[test]
fn duplicate_network_up_does_not_request_second_session() {
    let mut supervisor = online();
    supervisor.on_network_up();

    assert!(supervisor.poll(5_000).is_empty());
    assert_eq!(supervisor.session(), LinkState::Up);
}

#[test]
fn repeated_network_failure_rearms_from_latest_report() {
    let mut supervisor = started();
    supervisor.on_network_down(0);
    assert!(supervisor.poll(10_000).network);

    supervisor.on_network_down(12_000);
    assert!(supervisor.poll(21_999).is_empty());
    assert!(supervisor.poll(22_000).network);
}
