use super::*;

#[test]
fn tables_are_complete() {
    validate_expression_tables().unwrap();
}

#[test]
fn layer_names_follow_category() {
    assert_eq!(Expression::Neutral.eye_layer(), "neutral_eyes");
    assert_eq!(Expression::Neutral.mouth_layer(), "neutral_mouth");
    assert_eq!(Expression::Happy.eye_layer(), "happy_eyes");
}

#[test]
fn breathing_mapping_matches_mood() {
    use BreathingMode::*;
    let cases = [
        (Expression::Happy, Excited),
        (Expression::Surprised, Excited),
        (Expression::Playful, Excited),
        (Expression::Sad, Calm),
        (Expression::Disappointed, Calm),
        (Expression::Thoughtful, Calm),
        (Expression::Angry, Intense),
        (Expression::Worried, Nervous),
        (Expression::Annoyed, Nervous),
        (Expression::Shy, Nervous),
        (Expression::Smug, Relaxed),
        (Expression::Neutral, Normal),
        (Expression::Confused, Normal),
    ];
    for (e, m) in cases {
        assert_eq!(e.breathing_mode(), m, "{e:?}");
    }
}

#[test]
fn blink_ranges_by_category() {
    assert_eq!(Expression::Surprised.blink_interval(), (1.5, 3.0));
    assert_eq!(Expression::Sad.blink_interval(), (4.0, 8.0));
    assert_eq!(Expression::Angry.blink_interval(), (4.0, 8.0));
    assert_eq!(Expression::Neutral.blink_interval(), (3.0, 6.0));
}

#[test]
fn parse_is_case_insensitive() {
    assert_eq!("Happy".parse::<Expression>().unwrap(), Expression::Happy);
    assert_eq!(" shy ".parse::<Expression>().unwrap(), Expression::Shy);
    assert!("grumpy".parse::<Expression>().is_err());
}

#[test]
fn serde_uses_lowercase_names() {
    let s = serde_json::to_string(&Expression::Disappointed).unwrap();
    assert_eq!(s, "\"disappointed\"");
    let e: Expression = serde_json::from_str("\"playful\"").unwrap();
    assert_eq!(e, Expression::Playful);
}
