//! Run settings and preferences
//!
//! Separate from balance: these never change simulated combat outcomes
//! except for the debug god mode.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle pool capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 64,
            QualityPreset::Medium => 256,
            QualityPreset::High => 1024,
        }
    }
}

/// Run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cosmetic quality preset
    pub quality: QualityPreset,
    /// Cosmetic particles on/off
    pub particles: bool,
    /// Debug: the player ignores all damage
    pub god_mode: bool,
    /// Start the next wave by itself after this intermission; `None` waits
    /// for the host (shop/skill screens)
    pub auto_advance_ms: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            god_mode: false,
            auto_advance_ms: Some(3000.0),
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle pool capacity
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }
}
