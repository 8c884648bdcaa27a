//! Timing profiles for the decoy animation and hurricane phase delays

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::symbols::{MAX_CATEGORY, MIN_CATEGORY};

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Studio mode (near-instant, for soak runs and tests)
    Studio,
    /// Custom timing multiplier
    Custom,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::Normal
    }
}

/// Detailed timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Frames in the category decoy cycle (last frame shows the outcome)
    pub decoy_cycles: u32,

    /// Base interval between decoy frames (ms)
    pub decoy_interval_ms: f64,

    /// Extra delay added per frame during the slowdown window (ms)
    pub decoy_slowdown_ms: f64,

    /// Number of trailing frames that slow down
    pub decoy_slowdown_cycles: u32,

    /// How long the decided category stays on screen (ms)
    pub decoy_hold_ms: f64,

    /// Delay from column expansion to the other columns spinning (ms)
    pub expand_delay_ms: f64,

    /// Delay from evaluation to the hurricane moving on (ms)
    pub propagate_delay_ms: f64,
}

impl TimingConfig {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            decoy_cycles: 20,
            decoy_interval_ms: 100.0,
            decoy_slowdown_ms: 20.0,
            decoy_slowdown_cycles: 10,
            decoy_hold_ms: 1000.0,
            expand_delay_ms: 1000.0,
            propagate_delay_ms: 1500.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            decoy_cycles: 10,
            decoy_interval_ms: 50.0,
            decoy_slowdown_ms: 10.0,
            decoy_slowdown_cycles: 5,
            decoy_hold_ms: 400.0,
            expand_delay_ms: 400.0,
            propagate_delay_ms: 600.0,
        }
    }

    /// Studio mode (one decoy frame, minimal holds)
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            decoy_cycles: 1,
            decoy_interval_ms: 1.0,
            decoy_slowdown_ms: 0.0,
            decoy_slowdown_cycles: 0,
            decoy_hold_ms: 1.0,
            expand_delay_ms: 1.0,
            propagate_delay_ms: 1.0,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster). Frame counts are unchanged.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            decoy_interval_ms: self.decoy_interval_ms * factor,
            decoy_slowdown_ms: self.decoy_slowdown_ms * factor,
            decoy_hold_ms: self.decoy_hold_ms * factor,
            expand_delay_ms: self.expand_delay_ms * factor,
            propagate_delay_ms: self.propagate_delay_ms * factor,
            ..self.clone()
        }
    }

    /// Delay before decoy frame `frame` (0-based) is shown
    pub fn decoy_delay(&self, frame: u32) -> f64 {
        let slow_from = self.decoy_cycles.saturating_sub(self.decoy_slowdown_cycles);
        let slow_frames = (frame + 1).saturating_sub(slow_from);
        self.decoy_interval_ms + self.decoy_slowdown_ms * slow_frames as f64
    }

    /// Whole decoy duration including the final hold
    pub fn decoy_duration(&self) -> f64 {
        (0..self.decoy_cycles).map(|f| self.decoy_delay(f)).sum::<f64>() + self.decoy_hold_ms
    }

    /// Category shown on a decoy frame.
    ///
    /// Intermediate frames cycle through the categories; the last frame always
    /// shows `final_category`.
    pub fn decoy_frame_category(&self, frame: u32, final_category: u8) -> u8 {
        if frame + 1 >= self.decoy_cycles {
            return final_category;
        }
        let span = (MAX_CATEGORY - MIN_CATEGORY + 1) as u32;
        MIN_CATEGORY + (frame % span) as u8
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.decoy_cycles == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timing.decoy_cycles",
                value: "0".into(),
            });
        }
        if self.decoy_slowdown_cycles > self.decoy_cycles {
            return Err(ConfigError::Validation(
                "decoy_slowdown_cycles exceeds decoy_cycles".into(),
            ));
        }
        for (field, value) in [
            ("timing.decoy_interval_ms", self.decoy_interval_ms),
            ("timing.decoy_slowdown_ms", self.decoy_slowdown_ms),
            ("timing.decoy_hold_ms", self.decoy_hold_ms),
            ("timing.expand_delay_ms", self.expand_delay_ms),
            ("timing.propagate_delay_ms", self.propagate_delay_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}
