use super::*;

#[test]
fn unknown_persona_is_neutral() {
    let src = StaticExpressionSource::new();
    assert_eq!(src.current_expression("Nova"), Expression::Neutral);
    assert_eq!(src.variant_count("Nova", Expression::Happy), 1);
    assert_eq!(src.expression_suffix("Nova", Expression::Happy), "_happy");
}

#[test]
fn suffix_carries_variant_index() {
    let mut src = StaticExpressionSource::new();
    src.set_expression("Echo", Expression::Sad, 3);
    assert_eq!(src.current_expression("Echo"), Expression::Sad);
    assert_eq!(src.expression_suffix("Echo", Expression::Sad), "_sad3");
    assert_eq!(src.expression_suffix("Echo", Expression::Neutral), "");
}

#[test]
fn variant_counts_are_at_least_one() {
    let mut src = StaticExpressionSource::new();
    src.set_variant_count("Echo", Expression::Happy, 0);
    assert_eq!(src.variant_count("Echo", Expression::Happy), 1);
    src.set_variant_count("Echo", Expression::Happy, 5);
    assert_eq!(src.variant_count("Echo", Expression::Happy), 5);
    src.remove("Echo");
    assert_eq!(src.variant_count("Echo", Expression::Happy), 1);
}
