use std::collections::HashMap;

use crate::expression::category::Expression;

/// Supplies expression state owned by the host.
///
/// Compositing, avatar and animation code treat this as an opaque source of stable values.
pub trait ExpressionSource {
    /// Expression the persona currently displays.
    fn current_expression(&self, persona: &str) -> Expression;

    /// File-name suffix for `expression`, including the persona's cached variant index.
    ///
    /// `Neutral` always maps to the empty suffix.
    fn expression_suffix(&self, persona: &str, expression: Expression) -> String;

    /// Number of authored variants of `expression` for `persona` (at least 1).
    fn variant_count(&self, persona: &str, expression: Expression) -> u32;
}

#[derive(Clone, Debug, Default)]
struct PersonaExpression {
    current: Expression,
    variant: u32,
    variant_counts: HashMap<Expression, u32>,
}

/// Map-backed [`ExpressionSource`] for hosts without their own expression system.
#[derive(Clone, Debug, Default)]
pub struct StaticExpressionSource {
    personas: HashMap<String, PersonaExpression>,
}

impl StaticExpressionSource {
    /// Create an empty source; unknown personas report `Neutral`, variant 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the displayed expression and its cached variant (0 = base art).
    pub fn set_expression(&mut self, persona: &str, expression: Expression, variant: u32) {
        let st = self.personas.entry(persona.to_owned()).or_default();
        st.current = expression;
        st.variant = variant;
    }

    /// Declare how many variants exist for one expression.
    pub fn set_variant_count(&mut self, persona: &str, expression: Expression, count: u32) {
        self.personas
            .entry(persona.to_owned())
            .or_default()
            .variant_counts
            .insert(expression, count.max(1));
    }

    /// Forget a persona.
    pub fn remove(&mut self, persona: &str) {
        self.personas.remove(persona);
    }
}

impl ExpressionSource for StaticExpressionSource {
    fn current_expression(&self, persona: &str) -> Expression {
        self.personas
            .get(persona)
            .map(|p| p.current)
            .unwrap_or_default()
    }

    fn expression_suffix(&self, persona: &str, expression: Expression) -> String {
        if expression == Expression::Neutral {
            return String::new();
        }
        let variant = self.personas.get(persona).map(|p| p.variant).unwrap_or(0);
        if variant == 0 {
            format!("_{}", expression.name())
        } else {
            format!("_{}{variant}", expression.name())
        }
    }

    fn variant_count(&self, persona: &str, expression: Expression) -> u32 {
        self.personas
            .get(persona)
            .and_then(|p| p.variant_counts.get(&expression).copied())
            .unwrap_or(1)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/source.rs"]
mod tests;
