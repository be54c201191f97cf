use proptest::prelude::*;

use super::*;

fn dispatch(router: &mut Router, topic: &str, payload: &[u8]) -> Option<Command> {
    router
        .dispatch(&InboundMessage::new(topic, payload))
        .expect("complete messages are never fatal")
}

#[test]
fn mode_values_map_to_display_modes() {
    assert_eq!(
        route("display/mode", b"1"),
        Ok(Command::SetMode(DisplayMode::Pomodoro))
    );
    assert_eq!(
        route("display/mode", b"0"),
        Ok(Command::SetMode(DisplayMode::Clock))
    );
    assert_eq!(
        route("display/mode", b"-1"),
        Ok(Command::SetMode(DisplayMode::None))
    );
    assert_eq!(route("display/mode", b"2"), Err(Rejection::OutOfRange(2)));
    assert_eq!(route("display/mode", b"pomodoro"), Err(Rejection::NotANumber));
}

#[test]
fn color_is_parsed_as_hex() {
    assert_eq!(
        route("display/color", b"ff8000"),
        Ok(Command::SetColor(Rgb::new(0xFF, 0x80, 0x00)))
    );
    assert_eq!(
        route("display/color", b"FFFFFF\n"),
        Ok(Command::SetColor(Rgb::WHITE))
    );
    assert_eq!(
        route("display/color", b"1000000"),
        Err(Rejection::OutOfRange(0x100_0000))
    );
    assert_eq!(route("display/color", b"#ff0000"), Err(Rejection::NotANumber));
    assert_eq!(route("display/color", b""), Err(Rejection::NotANumber));
}

#[test]
fn brightness_and_durations_fit_a_byte() {
    assert_eq!(
        route("display/brightness", b" 255 "),
        Ok(Command::SetBrightness(255))
    );
    assert_eq!(
        route("display/brightness", b"256"),
        Err(Rejection::OutOfRange(256))
    );
    assert_eq!(
        route("display/pomodoro/work", b"50"),
        Ok(Command::SetPomodoroDuration {
            phase: PomodoroPhase::Work,
            minutes: 50,
        })
    );
    assert_eq!(
        route("display/pomodoro/short_break", b"0"),
        Ok(Command::SetPomodoroDuration {
            phase: PomodoroPhase::ShortBreak,
            minutes: 0,
        })
    );
    assert_eq!(
        route("display/pomodoro/long_break", b"-3"),
        Err(Rejection::OutOfRange(-3))
    );
}

#[test]
fn reset_ignores_payload() {
    assert_eq!(route("display/pomodoro/reset", b""), Ok(Command::ResetPomodoro));
    assert_eq!(
        route("display/pomodoro/reset", &[0xFF, 0xFE]),
        Ok(Command::ResetPomodoro)
    );
}

#[test]
fn unknown_and_foreign_topics_are_rejected() {
    assert_eq!(route("lights/mode", b"1"), Err(Rejection::ForeignTopic));
    assert_eq!(route("display/modes", b"1"), Err(Rejection::UnknownSubtopic));
    assert_eq!(
        route("display/pomodoro/workout", b"1"),
        Err(Rejection::UnknownSubtopic)
    );
    assert_eq!(route("display/", b"1"), Err(Rejection::UnknownSubtopic));
    assert_eq!(route("display/brightness", &[0xC3, 0x28]), Err(Rejection::NotUtf8));
}

#[test]
fn own_count_echo_is_dropped_quietly() {
    let mut router = Router::new();

    assert_eq!(dispatch(&mut router, "display/pomodoro/count", b"3"), None);
    assert_eq!(router.rejected(), 0);
}

#[test]
fn rejections_are_counted_not_fatal() {
    let mut router = Router::new();

    assert_eq!(dispatch(&mut router, "display/brightness", b"900"), None);
    assert_eq!(
        dispatch(&mut router, "display/brightness", b"90"),
        Some(Command::SetBrightness(90))
    );
    assert_eq!(router.rejected(), 1);
    assert_eq!(router.accepted(), 1);
}

#[test]
fn fragment_with_offset_is_fatal() {
    let mut router = Router::new();
    let message = InboundMessage::fragment("display/color", b"00ff", 2, 6);

    assert_eq!(
        router.dispatch(&message),
        Err(FatalError::FragmentedMessage {
            offset: 2,
            len: 4,
            total_len: 6,
        })
    );
}

#[test]
fn short_read_is_fatal() {
    let mut router = Router::new();
    let message = InboundMessage::fragment("display/color", b"00", 0, 6);

    assert!(matches!(
        router.dispatch(&message),
        Err(FatalError::FragmentedMessage { .. })
    ));
}

#[test]
fn subscribe_failure_is_fatal() {
    let mut router = Router::new();

    assert_eq!(router.on_subscribed(true), Ok(()));
    assert!(router.is_subscribed());
    router.on_session_down();
    assert!(!router.is_subscribed());
    assert_eq!(router.on_subscribed(false), Err(FatalError::SubscribeFailed));
}

proptest! {
    #[test]
    fn any_mode_value_is_accepted_iff_defined(value in -1_000i64..1_000) {
        let payload = format!("{value}");
        let result = route("display/mode", payload.as_bytes());

        if (-1..=1).contains(&value) {
            prop_assert_eq!(
                result,
                Ok(Command::SetMode(DisplayMode::from_wire(value).unwrap()))
            );
        } else {
            prop_assert_eq!(result, Err(Rejection::OutOfRange(value)));
        }
    }

    #[test]
    fn any_color_is_accepted_iff_24_bit(value in 0u64..0x2_000_000) {
        let payload = format!("{value:x}");
        let result = route("display/color", payload.as_bytes());

        if value <= 0xFF_FFFF {
            prop_assert_eq!(
                result,
                Ok(Command::SetColor(Rgb::from_rgb888(value as u32).unwrap()))
            );
        } else {
            prop_assert_eq!(result, Err(Rejection::OutOfRange(value as i64)));
        }
    }

    #[test]
    fn brightness_accepts_exactly_a_byte(value in -300i64..600) {
        let payload = format!("{value}");
        let result = route("display/brightness", payload.as_bytes());

        match u8::try_from(value) {
            Ok(level) => prop_assert_eq!(result, Ok(Command::SetBrightness(level))),
            Err(_) => prop_assert_eq!(result, Err(Rejection::OutOfRange(value))),
        }
    }

    #[test]
    fn arbitrary_payloads_never_panic(
        suffix in "[a-z_/]{0,24}",
        payload in proptest::collection::vec(any::<u8>(), 0..32),
    ) {
        let topic = format!("display/{suffix}");
        let _ = route(&topic, &payload);
    }
}
