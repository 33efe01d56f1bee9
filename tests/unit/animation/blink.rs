use super::*;

#[test]
fn new_persona_samples_expression_range() {
    let mut b = BlinkSystem::new(1);
    b.update("Echo", Expression::Surprised, 0.0);
    let next = b.next_interval("Echo").unwrap();
    assert!((1.5..=3.0).contains(&next), "{next}");
    assert_eq!(b.eye_state("Echo"), EyeState::Open);
    assert_eq!(b.blink_alpha("Echo"), 1.0);
}

#[test]
fn triggered_blink_walks_through_layers() {
    let mut b = BlinkSystem::new(2);
    b.update("Echo", Expression::Happy, 0.0);
    b.trigger_blink("Echo");

    assert_eq!(b.update("Echo", Expression::Happy, 0.03), EyeState::HalfClosed);
    assert_eq!(b.eye_layer("Echo"), HALF_CLOSED_EYES);
    assert_eq!(b.update("Echo", Expression::Happy, 0.03), EyeState::Closed);
    assert_eq!(b.eye_layer("Echo"), CLOSED_EYES);
    assert_eq!(b.update("Echo", Expression::Happy, 0.03), EyeState::Closed);
    assert_eq!(b.update("Echo", Expression::Happy, 0.03), EyeState::HalfClosed);
    assert_eq!(b.update("Echo", Expression::Happy, 0.1), EyeState::Open);
    assert!(!b.is_blinking("Echo"));
    assert_eq!(b.eye_layer("Echo"), "happy_eyes");
}

#[test]
fn alpha_peaks_mid_blink() {
    let mut b = BlinkSystem::new(3);
    b.trigger_blink("Echo");
    b.update("Echo", Expression::Neutral, BLINK_DURATION / 2.0);
    assert!((b.blink_alpha("Echo") - 1.0).abs() < 1e-9);
    assert!((b.closed_weight("Echo") - 1.0).abs() < 1e-9);
    assert!((b.blink_progress("Echo") - 0.5).abs() < 1e-9);
}

#[test]
fn cycle_respects_bounds() {
    let mut b = BlinkSystem::new(4);
    let mut was_blinking = false;
    let mut cycles = 0;
    for _ in 0..3000 {
        b.update("Echo", Expression::Sad, 1.0 / 60.0);
        if let Some(e) = b.blink_elapsed("Echo") {
            assert!(e <= BLINK_DURATION);
        }
        let blinking = b.is_blinking("Echo");
        if was_blinking && !blinking {
            cycles += 1;
            let next = b.next_interval("Echo").unwrap();
            assert!((4.0..=8.0).contains(&next), "{next}");
        }
        was_blinking = blinking;
    }
    assert!(cycles >= 5, "only {cycles} blinks in 50s");
}

#[test]
fn expression_change_never_interrupts_blink() {
    let mut b = BlinkSystem::new(5);
    b.update("Echo", Expression::Neutral, 0.0);
    b.trigger_blink("Echo");
    b.update("Echo", Expression::Neutral, 0.05);
    b.update("Echo", Expression::Surprised, 0.01);
    assert!(b.is_blinking("Echo"));
    assert_eq!(b.interval_range("Echo"), (1.5, 3.0));
    let next = b.next_interval("Echo").unwrap();
    assert!((1.5..=3.0).contains(&next));
}

#[test]
fn override_lasts_until_expression_change() {
    let mut b = BlinkSystem::new(6);
    b.update("Echo", Expression::Neutral, 0.0);
    b.set_interval_range("Echo", 0.5, 0.6).unwrap();
    assert_eq!(b.interval_range("Echo"), (0.5, 0.6));
    assert!(b.set_interval_range("Echo", 2.0, 1.0).is_err());
    assert!(b.set_interval_range("Echo", 0.0, 1.0).is_err());

    b.update("Echo", Expression::Angry, 0.0);
    assert_eq!(b.interval_range("Echo"), (4.0, 8.0));
}

#[test]
fn drowsy_holds_eyes_closed() {
    let mut b = BlinkSystem::new(7);
    b.set_drowsy("Echo", true);
    for _ in 0..100 {
        assert_eq!(b.update("Echo", Expression::Neutral, 0.1), EyeState::Closed);
    }
    assert_eq!(b.blink_progress("Echo"), 0.5);
    assert_eq!(b.closed_weight("Echo"), 1.0);
    assert_eq!(b.eye_layer("Echo"), CLOSED_EYES);

    b.set_drowsy("Echo", false);
    assert!(!b.is_drowsy("Echo"));
    assert_eq!(b.update("Echo", Expression::Neutral, 0.01), EyeState::Open);
}

#[test]
fn clear_forgets_state() {
    let mut b = BlinkSystem::new(8);
    b.update("Echo", Expression::Neutral, 0.0);
    b.update("Nova", Expression::Neutral, 0.0);
    b.clear("Echo");
    assert!(b.next_interval("Echo").is_none());
    assert!(b.next_interval("Nova").is_some());
    b.clear_all();
    assert!(b.next_interval("Nova").is_none());
}
