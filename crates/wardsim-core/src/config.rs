//! Simulation configuration - floor layout, timing thresholds, prediction tunables.
//!
//! `SimConfig::default()` reproduces the standard six-room floor in a 900x400
//! unit space. Configurations loaded from JSON are validated before an engine
//! will accept them; missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::components::{Rect, RoomType, DEFAULT_SHUTDOWN_IDLE_SECS, DEFAULT_SLEEP_THRESHOLD};

/// Where one room sits on the floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomPlacement {
    pub room_type: RoomType,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub layout: Vec<RoomPlacement>,
    /// Idle seconds before `Ready` equipment sleeps
    pub sleep_threshold: f64,
    /// Empty-room seconds before equipment is shut down (predictive mode)
    pub shutdown_idle_secs: f64,
    /// Confidence attached to every pattern-based prediction
    pub prediction_confidence: f32,
    /// Minimum confidence for a staff prediction to trigger a preload
    pub preload_confidence_threshold: f32,
    /// Preload the predicted room whenever staff moves in predictive mode
    pub preload_on_prediction: bool,
    /// Per-staff movement observations kept by the prediction engine
    pub staff_history_len: usize,
    /// Prediction records kept for analysis
    pub recent_predictions_len: usize,
    /// Seconds a driver should wait before restarting a finished tour
    pub tour_cooldown_secs: f64,
    /// Seed for the off-pattern fallback
    pub seed: u64,
    pub predictive_mode: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            sleep_threshold: DEFAULT_SLEEP_THRESHOLD,
            shutdown_idle_secs: DEFAULT_SHUTDOWN_IDLE_SECS,
            prediction_confidence: 0.7,
            preload_confidence_threshold: 0.5,
            preload_on_prediction: true,
            staff_history_len: 20,
            recent_predictions_len: 50,
            tour_cooldown_secs: 5.0,
            seed: 42,
            predictive_mode: true,
        }
    }
}

fn default_layout() -> Vec<RoomPlacement> {
    let place = |room_type, x, y| RoomPlacement {
        room_type,
        bounds: Rect::new(x, y, 300.0, 200.0),
    };
    vec![
        place(RoomType::Radiology, 0.0, 0.0),
        place(RoomType::Icu, 0.0, 200.0),
        place(RoomType::Lobby, 300.0, 0.0),
        place(RoomType::Lab, 300.0, 200.0),
        place(RoomType::PatientRoom, 600.0, 0.0),
        place(RoomType::EmergencyRoom, 600.0, 200.0),
    ]
}

impl SimConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn placement(&self, room_type: RoomType) -> Option<&RoomPlacement> {
        self.layout.iter().find(|p| p.room_type == room_type)
    }

    /// Check structural preconditions: every room placed exactly once,
    /// no overlapping rectangles, sane thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for room_type in RoomType::ALL {
            match self.layout.iter().filter(|p| p.room_type == room_type).count() {
                0 => return Err(ConfigError::MissingRoom(room_type)),
                1 => {}
                _ => return Err(ConfigError::DuplicateRoom(room_type)),
            }
        }

        for placement in &self.layout {
            if !positive_finite(f64::from(placement.bounds.width))
                || !positive_finite(f64::from(placement.bounds.height))
            {
                return Err(ConfigError::EmptyRoom(placement.room_type));
            }
        }

        for (i, a) in self.layout.iter().enumerate() {
            for b in &self.layout[i + 1..] {
                if a.bounds.overlaps(&b.bounds) {
                    return Err(ConfigError::OverlappingRooms(a.room_type, b.room_type));
                }
            }
        }

        if !positive_finite(self.sleep_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "sleep_threshold",
                reason: "must be positive",
            });
        }
        if !positive_finite(self.shutdown_idle_secs) {
            return Err(ConfigError::InvalidValue {
                field: "shutdown_idle_secs",
                reason: "must be positive",
            });
        }
        if !(self.tour_cooldown_secs >= 0.0 && self.tour_cooldown_secs.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "tour_cooldown_secs",
                reason: "must not be negative",
            });
        }
        if !(0.0..=1.0).contains(&self.prediction_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "prediction_confidence",
                reason: "must be within 0..=1",
            });
        }
        if !(0.0..=1.0).contains(&self.preload_confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "preload_confidence_threshold",
                reason: "must be within 0..=1",
            });
        }
        if self.staff_history_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "staff_history_len",
                reason: "must be at least 1",
            });
        }
        if self.recent_predictions_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recent_predictions_len",
                reason: "must be at least 1",
            });
        }

        Ok(())
    }
}

fn positive_finite(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

/// Errors that can occur while loading or validating a configuration
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    MissingRoom(RoomType),
    DuplicateRoom(RoomType),
    EmptyRoom(RoomType),
    OverlappingRooms(RoomType, RoomType),
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "Config parse error: {}", e),
            ConfigError::MissingRoom(room) => write!(f, "Layout has no placement for {}", room),
            ConfigError::DuplicateRoom(room) => write!(f, "Layout places {} more than once", room),
            ConfigError::EmptyRoom(room) => write!(f, "{} has a non-positive size", room),
            ConfigError::OverlappingRooms(a, b) => write!(f, "{} overlaps {}", a, b),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}
