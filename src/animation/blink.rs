use std::collections::HashMap;

use crate::animation::rng::Rng64;
use crate::expression::category::Expression;
use crate::foundation::error::{VisageError, VisageResult};

/// Length of one blink in seconds.
pub const BLINK_DURATION: f64 = 0.15;

/// Layer shown at the start and end of a blink.
pub const HALF_CLOSED_EYES: &str = "half_closed_eyes";

/// Layer shown at the middle of a blink and while drowsy.
pub const CLOSED_EYES: &str = "closed_eyes";

/// Eyelid position selected for the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeState {
    /// Expression's own eye layer.
    Open,
    /// [`HALF_CLOSED_EYES`].
    HalfClosed,
    /// [`CLOSED_EYES`].
    Closed,
}

impl EyeState {
    /// Eye layer name for this state; `Open` uses the expression's eye layer.
    pub fn layer_name(self, expression: Expression) -> &'static str {
        match self {
            EyeState::Open => expression.eye_layer(),
            EyeState::HalfClosed => HALF_CLOSED_EYES,
            EyeState::Closed => CLOSED_EYES,
        }
    }

    fn from_fraction(frac: f64) -> Self {
        if frac < 0.33 {
            EyeState::HalfClosed
        } else if frac < 0.67 {
            EyeState::Closed
        } else {
            EyeState::HalfClosed
        }
    }
}

#[derive(Clone, Debug)]
struct BlinkState {
    clock: f64,
    last_blink: f64,
    next_interval: f64,
    blinking: bool,
    elapsed: f64,
    expression: Expression,
    interval_override: Option<(f64, f64)>,
    drowsy: bool,
}

impl BlinkState {
    fn range(&self) -> (f64, f64) {
        self.interval_override
            .unwrap_or_else(|| self.expression.blink_interval())
    }

    fn fraction(&self) -> f64 {
        (self.elapsed / BLINK_DURATION).clamp(0.0, 1.0)
    }

    fn eye_state(&self) -> EyeState {
        if self.drowsy {
            EyeState::Closed
        } else if self.blinking {
            EyeState::from_fraction(self.fraction())
        } else {
            EyeState::Open
        }
    }
}

/// Per-persona blink timers.
///
/// Each persona has its own clock advanced by [`BlinkSystem::update`]. A blink starts once the
/// time since the previous blink reaches the sampled interval and lasts [`BLINK_DURATION`].
#[derive(Debug)]
pub struct BlinkSystem {
    states: HashMap<String, BlinkState>,
    rng: Rng64,
}

impl BlinkSystem {
    /// Create an empty system with a seeded interval generator.
    pub fn new(seed: u64) -> Self {
        Self {
            states: HashMap::new(),
            rng: Rng64::new(seed),
        }
    }

    /// Advance `persona` by `dt` seconds while it shows `expression`; returns the eye state.
    ///
    /// An expression change resamples the interval from the new range immediately (and drops
    /// any override) but never interrupts a blink in progress.
    pub fn update(&mut self, persona: &str, expression: Expression, dt: f64) -> EyeState {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let rng = &mut self.rng;
        let st = Self::state_entry(&mut self.states, rng, persona, expression);

        if st.expression != expression {
            st.expression = expression;
            st.interval_override = None;
            let (lo, hi) = st.range();
            st.next_interval = rng.range_f64(lo, hi);
            tracing::debug!(persona, ?expression, next = st.next_interval, "blink range reset");
        }

        st.clock += dt;
        if st.drowsy {
            return EyeState::Closed;
        }

        if !st.blinking && st.clock - st.last_blink >= st.next_interval {
            st.blinking = true;
            st.elapsed = 0.0;
            st.last_blink = st.clock;
        }

        if st.blinking {
            st.elapsed += dt;
            if st.elapsed >= BLINK_DURATION {
                st.blinking = false;
                st.elapsed = 0.0;
                let (lo, hi) = st.range();
                st.next_interval = rng.range_f64(lo, hi);
                return EyeState::Open;
            }
        }

        st.eye_state()
    }

    /// Current eye state without advancing time.
    pub fn eye_state(&self, persona: &str) -> EyeState {
        self.states
            .get(persona)
            .map_or(EyeState::Open, BlinkState::eye_state)
    }

    /// Eye layer name for the current state.
    pub fn eye_layer(&self, persona: &str) -> &'static str {
        let expression = self
            .states
            .get(persona)
            .map(|s| s.expression)
            .unwrap_or_default();
        self.eye_state(persona).layer_name(expression)
    }

    /// `sin(fraction * PI)` while blinking, `1.0` otherwise.
    ///
    /// While blinking this is the weight of the closed/half-closed layer over the open eyes;
    /// outside a blink it is the (full) weight of the open-eyes layer.
    pub fn blink_alpha(&self, persona: &str) -> f64 {
        match self.states.get(persona) {
            Some(st) if st.blinking && !st.drowsy => (st.fraction() * std::f64::consts::PI).sin(),
            _ => 1.0,
        }
    }

    /// Weight of the closed/half-closed eye layer over the open eyes for this frame.
    pub fn closed_weight(&self, persona: &str) -> f64 {
        match self.states.get(persona) {
            Some(st) if st.drowsy => 1.0,
            Some(st) if st.blinking => (st.fraction() * std::f64::consts::PI).sin(),
            _ => 0.0,
        }
    }

    /// Blink fraction in `[0, 1)`; `0.5` while drowsy, `0.0` when not blinking.
    pub fn blink_progress(&self, persona: &str) -> f64 {
        match self.states.get(persona) {
            Some(st) if st.drowsy => 0.5,
            Some(st) if st.blinking => st.fraction(),
            _ => 0.0,
        }
    }

    /// Seconds elapsed inside the current blink, if one is running.
    pub fn blink_elapsed(&self, persona: &str) -> Option<f64> {
        self.states
            .get(persona)
            .filter(|s| s.blinking)
            .map(|s| s.elapsed)
    }

    /// Whether a blink is in progress.
    pub fn is_blinking(&self, persona: &str) -> bool {
        self.states.get(persona).is_some_and(|s| s.blinking)
    }

    /// Interval until the next blink, measured from the start of the previous one.
    pub fn next_interval(&self, persona: &str) -> Option<f64> {
        self.states.get(persona).map(|s| s.next_interval)
    }

    /// Range the next interval is drawn from.
    pub fn interval_range(&self, persona: &str) -> (f64, f64) {
        self.states
            .get(persona)
            .map_or(Expression::Neutral.blink_interval(), BlinkState::range)
    }

    /// Start a blink now.
    pub fn trigger_blink(&mut self, persona: &str) {
        let st = Self::state_entry(&mut self.states, &mut self.rng, persona, Expression::Neutral);
        st.blinking = true;
        st.elapsed = 0.0;
        st.last_blink = st.clock;
    }

    /// Override the interval range until the next expression change.
    pub fn set_interval_range(&mut self, persona: &str, min: f64, max: f64) -> VisageResult<()> {
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(VisageError::validation(format!(
                "blink interval range must satisfy 0 < min <= max, got [{min}, {max}]"
            )));
        }
        let rng = &mut self.rng;
        let st = Self::state_entry(&mut self.states, rng, persona, Expression::Neutral);
        st.interval_override = Some((min, max));
        st.next_interval = rng.range_f64(min, max);
        Ok(())
    }

    /// Hold the eyes closed (`true`) or resume normal blinking (`false`).
    pub fn set_drowsy(&mut self, persona: &str, drowsy: bool) {
        let st = Self::state_entry(&mut self.states, &mut self.rng, persona, Expression::Neutral);
        st.drowsy = drowsy;
        if !drowsy {
            st.blinking = false;
            st.elapsed = 0.0;
            st.last_blink = st.clock;
        }
    }

    /// Whether the persona is drowsy.
    pub fn is_drowsy(&self, persona: &str) -> bool {
        self.states.get(persona).is_some_and(|s| s.drowsy)
    }

    /// Forget one persona.
    pub fn clear(&mut self, persona: &str) {
        self.states.remove(persona);
    }

    /// Forget every persona.
    pub fn clear_all(&mut self) {
        self.states.clear();
    }

    fn state_entry<'a>(
        states: &'a mut HashMap<String, BlinkState>,
        rng: &mut Rng64,
        persona: &str,
        expression: Expression,
    ) -> &'a mut BlinkState {
        states.entry(persona.to_owned()).or_insert_with(|| {
            let (lo, hi) = expression.blink_interval();
            BlinkState {
                clock: 0.0,
                last_blink: 0.0,
                next_interval: rng.range_f64(lo, hi),
                blinking: false,
                elapsed: 0.0,
                expression,
                interval_override: None,
                drowsy: false,
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/blink.rs"]
mod tests;
