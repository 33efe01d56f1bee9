use std::collections::HashMap;

use crate::expression::category::Expression;
use crate::foundation::math::{clamp01, lerp};

/// Named breathing style.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BreathingMode {
    /// Slow and shallow.
    Calm,
    /// Resting rhythm.
    #[default]
    Normal,
    /// Quick and deep.
    Excited,
    /// Quick and uneven.
    Nervous,
    /// Slowest, barely visible.
    Relaxed,
    /// Fastest and deepest.
    Intense,
}

/// Parameters of one [`BreathingMode`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreathingPreset {
    /// Cycles per second.
    pub speed: f64,
    /// Peak offset in pixels.
    pub amplitude: f64,
    /// Transition rate weight when entering or leaving this mode.
    pub smoothness: f64,
    /// Human-readable name.
    pub label: &'static str,
}

static PRESETS: [BreathingPreset; 6] = [
    BreathingPreset {
        speed: 0.35,
        amplitude: 1.2,
        smoothness: 0.9,
        label: "Calm breathing",
    },
    BreathingPreset {
        speed: 0.5,
        amplitude: 2.0,
        smoothness: 0.8,
        label: "Normal breathing",
    },
    BreathingPreset {
        speed: 0.9,
        amplitude: 3.2,
        smoothness: 0.6,
        label: "Excited breathing",
    },
    BreathingPreset {
        speed: 1.2,
        amplitude: 2.8,
        smoothness: 0.5,
        label: "Nervous breathing",
    },
    BreathingPreset {
        speed: 0.25,
        amplitude: 0.8,
        smoothness: 0.95,
        label: "Relaxed breathing",
    },
    BreathingPreset {
        speed: 1.5,
        amplitude: 4.0,
        smoothness: 0.4,
        label: "Intense breathing",
    },
];

impl BreathingMode {
    /// Every mode, in preset-table order.
    pub const ALL: [BreathingMode; 6] = [
        BreathingMode::Calm,
        BreathingMode::Normal,
        BreathingMode::Excited,
        BreathingMode::Nervous,
        BreathingMode::Relaxed,
        BreathingMode::Intense,
    ];

    /// Preset parameters.
    pub fn preset(self) -> &'static BreathingPreset {
        &PRESETS[self as usize]
    }
}

/// Every available mode.
pub fn all_modes() -> &'static [BreathingMode] {
    &BreathingMode::ALL
}

/// Vertical offset of a sinusoidal breath at time `t` seconds.
pub fn breathing_offset(speed: f64, amplitude: f64, t: f64) -> f64 {
    amplitude * (std::f64::consts::TAU * speed * t).sin()
}

/// Snapshot of one persona's breathing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreathingSnapshot {
    /// Mode being left (or held, once the transition completes).
    pub current_mode: BreathingMode,
    /// Mode being entered.
    pub target_mode: BreathingMode,
    /// Transition progress in `[0, 1]`.
    pub progress: f64,
    /// Interpolated speed.
    pub speed: f64,
    /// Interpolated amplitude.
    pub amplitude: f64,
}

#[derive(Clone, Debug)]
struct BreathingState {
    current: BreathingMode,
    target: BreathingMode,
    progress: f64,
    speed: f64,
    amplitude: f64,
    target_speed: f64,
    target_amplitude: f64,
    time: f64,
}

impl BreathingState {
    fn settled(mode: BreathingMode) -> Self {
        let p = mode.preset();
        Self {
            current: mode,
            target: mode,
            progress: 1.0,
            speed: p.speed,
            amplitude: p.amplitude,
            target_speed: p.speed,
            target_amplitude: p.amplitude,
            time: 0.0,
        }
    }

    fn snapshot(&self) -> BreathingSnapshot {
        BreathingSnapshot {
            current_mode: self.current,
            target_mode: self.target,
            progress: self.progress,
            speed: self.speed,
            amplitude: self.amplitude,
        }
    }

    fn status(&self) -> String {
        let from = self.current.preset().label;
        if self.progress < 1.0 {
            let to = self.target.preset().label;
            format!("{from} -> {to} ({:.0}%)", self.progress * 100.0)
        } else {
            from.to_owned()
        }
    }
}

/// Per-persona breathing mode transitions.
#[derive(Debug, Default)]
pub struct BreathingSystem {
    states: HashMap<String, BreathingState>,
}

impl BreathingSystem {
    /// Create an empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `mode` for `persona`.
    ///
    /// A persona without state starts settled in `mode`. Requesting the mode already fully
    /// reached is a no-op. Otherwise a transition toward `mode` starts from zero; the mode being
    /// left only advances to the previous target if that earlier transition had completed.
    pub fn set_mode(&mut self, persona: &str, mode: BreathingMode) {
        let Some(st) = self.states.get_mut(persona) else {
            self.states
                .insert(persona.to_owned(), BreathingState::settled(mode));
            return;
        };

        if st.target == mode && st.progress >= 1.0 {
            return;
        }

        if st.progress >= 1.0 {
            st.current = st.target;
        }
        st.target = mode;
        st.progress = 0.0;
        let p = mode.preset();
        st.target_speed = p.speed;
        st.target_amplitude = p.amplitude;
        tracing::debug!(persona, from = ?st.current, to = ?mode, "breathing transition");
    }

    /// Map `expression` to its breathing mode and request it.
    pub fn sync_with_expression(&mut self, persona: &str, expression: Expression) {
        self.set_mode(persona, expression.breathing_mode());
    }

    /// Advance the transition and breathing clock by `dt` seconds.
    pub fn update(&mut self, persona: &str, dt: f64) {
        let Some(st) = self.states.get_mut(persona) else {
            return;
        };
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        st.time += dt;

        if st.progress >= 1.0 {
            return;
        }

        let from = st.current.preset();
        let to = st.target.preset();
        let rate = lerp(from.smoothness, to.smoothness, st.progress);
        st.progress = clamp01(st.progress + dt * rate);

        if st.progress >= 1.0 {
            st.current = st.target;
            st.speed = to.speed;
            st.amplitude = to.amplitude;
        } else {
            st.speed = lerp(from.speed, st.target_speed, st.progress);
            st.amplitude = lerp(from.amplitude, st.target_amplitude, st.progress);
        }
    }

    /// Current interpolated parameters.
    pub fn snapshot(&self, persona: &str) -> Option<BreathingSnapshot> {
        self.states.get(persona).map(BreathingState::snapshot)
    }

    /// Breathing offset at the persona's own clock.
    pub fn offset(&self, persona: &str) -> f64 {
        self.states
            .get(persona)
            .map_or(0.0, |s| breathing_offset(s.speed, s.amplitude, s.time))
    }

    /// Status such as `"Calm breathing -> Normal breathing (45%)"`.
    pub fn status(&self, persona: &str) -> String {
        self.states
            .get(persona)
            .map_or_else(|| "uninitialized".to_owned(), BreathingState::status)
    }

    /// Multi-line summary of every tracked persona.
    pub fn debug_info(&self) -> String {
        let mut names: Vec<&String> = self.states.keys().collect();
        names.sort();
        let mut out = format!("breathing states: {}\n", names.len());
        for name in names {
            let st = &self.states[name];
            out.push_str(&format!(
                "  {name}: {} speed={:.2} amplitude={:.2}\n",
                st.status(),
                st.speed,
                st.amplitude
            ));
        }
        out
    }

    /// Forget one persona.
    pub fn clear(&mut self, persona: &str) {
        self.states.remove(persona);
    }

    /// Forget every persona.
    pub fn clear_all(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/breathing.rs"]
mod tests;
