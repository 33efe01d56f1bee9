use crate::animation::breathing::BreathingMode;
use crate::foundation::error::{VisageError, VisageResult};

/// Closed set of expression categories a persona can display.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    /// Resting face.
    #[default]
    Neutral,
    /// Smiling.
    Happy,
    /// Downcast.
    Sad,
    /// Frowning.
    Angry,
    /// Wide-eyed.
    Surprised,
    /// Puzzled.
    Confused,
    /// Self-satisfied.
    Smug,
    /// Bashful.
    Shy,
    /// Anxious.
    Worried,
    /// Let down.
    Disappointed,
    /// Pensive.
    Thoughtful,
    /// Irritated.
    Annoyed,
    /// Teasing.
    Playful,
}

impl Expression {
    /// Every category, in table order.
    pub const ALL: [Expression; 13] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Surprised,
        Expression::Confused,
        Expression::Smug,
        Expression::Shy,
        Expression::Worried,
        Expression::Disappointed,
        Expression::Thoughtful,
        Expression::Annoyed,
        Expression::Playful,
    ];

    /// Position in [`Expression::ALL`] and in the trait table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase category name used in asset file names.
    pub fn name(self) -> &'static str {
        self.traits().name
    }

    /// Static traits of this category.
    pub fn traits(self) -> &'static ExpressionTraits {
        &EXPRESSION_TRAITS[self.index()]
    }

    /// Eye layer name for the open-eyes state.
    pub fn eye_layer(self) -> &'static str {
        self.traits().eyes
    }

    /// Mouth layer name.
    pub fn mouth_layer(self) -> &'static str {
        self.traits().mouth
    }

    /// Breathing preset this category syncs to.
    pub fn breathing_mode(self) -> BreathingMode {
        self.traits().breathing
    }

    /// Blink interval range in seconds, `(min, max)`.
    pub fn blink_interval(self) -> (f64, f64) {
        self.traits().blink_interval
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Expression {
    type Err = VisageError;

    fn from_str(s: &str) -> VisageResult<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Expression::ALL
            .into_iter()
            .find(|e| e.name() == wanted)
            .ok_or_else(|| VisageError::validation(format!("unknown expression '{s}'")))
    }
}

/// Per-category data consumed by compositing and animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpressionTraits {
    /// Category this row describes.
    pub expression: Expression,
    /// Lowercase name.
    pub name: &'static str,
    /// Open-eyes layer name.
    pub eyes: &'static str,
    /// Mouth layer name.
    pub mouth: &'static str,
    /// Breathing preset.
    pub breathing: BreathingMode,
    /// Blink interval range in seconds.
    pub blink_interval: (f64, f64),
}

const DEFAULT_BLINK: (f64, f64) = (3.0, 6.0);
const QUICK_BLINK: (f64, f64) = (1.5, 3.0);
const SLOW_BLINK: (f64, f64) = (4.0, 8.0);

const fn row(
    expression: Expression,
    name: &'static str,
    eyes: &'static str,
    mouth: &'static str,
    breathing: BreathingMode,
    blink_interval: (f64, f64),
) -> ExpressionTraits {
    ExpressionTraits {
        expression,
        name,
        eyes,
        mouth,
        breathing,
        blink_interval,
    }
}

#[rustfmt::skip]
static EXPRESSION_TRAITS: [ExpressionTraits; 13] = [
    row(Expression::Neutral, "neutral", "neutral_eyes", "neutral_mouth", BreathingMode::Normal, DEFAULT_BLINK),
    row(Expression::Happy, "happy", "happy_eyes", "happy_mouth", BreathingMode::Excited, DEFAULT_BLINK),
    row(Expression::Sad, "sad", "sad_eyes", "sad_mouth", BreathingMode::Calm, SLOW_BLINK),
    row(Expression::Angry, "angry", "angry_eyes", "angry_mouth", BreathingMode::Intense, SLOW_BLINK),
    row(Expression::Surprised, "surprised", "surprised_eyes", "surprised_mouth", BreathingMode::Excited, QUICK_BLINK),
    row(Expression::Confused, "confused", "confused_eyes", "confused_mouth", BreathingMode::Normal, DEFAULT_BLINK),
    row(Expression::Smug, "smug", "smug_eyes", "smug_mouth", BreathingMode::Relaxed, DEFAULT_BLINK),
    row(Expression::Shy, "shy", "shy_eyes", "shy_mouth", BreathingMode::Nervous, DEFAULT_BLINK),
    row(Expression::Worried, "worried", "worried_eyes", "worried_mouth", BreathingMode::Nervous, DEFAULT_BLINK),
    row(Expression::Disappointed, "disappointed", "disappointed_eyes", "disappointed_mouth", BreathingMode::Calm, DEFAULT_BLINK),
    row(Expression::Thoughtful, "thoughtful", "thoughtful_eyes", "thoughtful_mouth", BreathingMode::Calm, DEFAULT_BLINK),
    row(Expression::Annoyed, "annoyed", "annoyed_eyes", "annoyed_mouth", BreathingMode::Nervous, DEFAULT_BLINK),
    row(Expression::Playful, "playful", "playful_eyes", "playful_mouth", BreathingMode::Excited, DEFAULT_BLINK),
];

/// Check that every expression has exactly one well-formed table row.
///
/// Run once at engine startup; a failure indicates a programming error in the tables.
pub fn validate_expression_tables() -> VisageResult<()> {
    for (i, expr) in Expression::ALL.into_iter().enumerate() {
        if expr.index() != i {
            return Err(VisageError::validation(format!(
                "expression '{expr:?}' is out of order in ALL"
            )));
        }
        let t = &EXPRESSION_TRAITS[i];
        if t.expression != expr {
            return Err(VisageError::validation(format!(
                "trait row {i} describes {:?}, expected {expr:?}",
                t.expression
            )));
        }
        if t.eyes != format!("{}_eyes", t.name) || t.mouth != format!("{}_mouth", t.name) {
            return Err(VisageError::validation(format!(
                "layer names for '{}' do not follow '<name>_eyes' / '<name>_mouth'",
                t.name
            )));
        }
        let (lo, hi) = t.blink_interval;
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
            return Err(VisageError::validation(format!(
                "blink interval for '{}' must satisfy 0 < min <= max",
                t.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/expression/category.rs"]
mod tests;
