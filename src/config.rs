//! Build-time compensation configuration
//!
//! Channel table layouts and the extrapolation policy are fixed once a
//! [`CompensationContext`](crate::compensation::CompensationContext) is
//! built. They can be supplied as a JSON file so a machine profile can be
//! swapped without recompiling.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::channel::{ChannelCalibration, SensorChannel};
use crate::error::CompensationError;

/// Complete compensation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationConfig {
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub extrapolation: ExtrapolationConfig,
}

/// Table layout for every channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    pub probe: ChannelCalibration,
    pub bed: ChannelCalibration,
    pub probe_winter: ChannelCalibration,
    /// Hotend compensation is only compiled into some machine profiles
    #[serde(default)]
    pub extruder: Option<ChannelCalibration>,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            probe: ChannelCalibration::PROBE_DEFAULT,
            bed: ChannelCalibration::BED_DEFAULT,
            probe_winter: ChannelCalibration::PROBE_WINTER_DEFAULT,
            extruder: None,
        }
    }
}

impl ChannelsConfig {
    /// Layout for `channel`, `None` if the channel is not configured
    pub fn get(&self, channel: SensorChannel) -> Option<ChannelCalibration> {
        match channel {
            SensorChannel::Probe => Some(self.probe),
            SensorChannel::Bed => Some(self.bed),
            SensorChannel::ProbeWinter => Some(self.probe_winter),
            SensorChannel::Extruder => self.extruder,
        }
    }
}

/// Behaviour of offset lookups outside the calibrated slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrapolationConfig {
    /// Extend the end segments linearly instead of clamping
    pub enabled: bool,
    /// Slot distance of the second point used for the extension line
    pub span: usize,
}

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            span: 2,
        }
    }
}

impl Default for CompensationConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            channels: ChannelsConfig::default(),
            extrapolation: ExtrapolationConfig::default(),
        }
    }
}

impl CompensationConfig {
    /// Default layout with the hotend channel enabled
    pub fn with_extruder() -> Self {
        let mut config = Self::default();
        config.channels.extruder = Some(ChannelCalibration::EXTRUDER_DEFAULT);
        config
    }

    /// Extrapolation span in effect, `None` when lookups clamp
    pub fn extrapolation_span(&self) -> Option<usize> {
        self.extrapolation
            .enabled
            .then_some(self.extrapolation.span)
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// the JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Check that every configured table is usable
    ///
    /// # Validation Rules
    /// * `temp_res` must be finite and positive
    /// * every table needs at least 2 slots
    /// * an enabled extrapolation span must lie in `1..measurements`
    pub fn validate(&self) -> Result<(), CompensationError> {
        for channel in SensorChannel::ALL {
            let Some(cal) = self.channels.get(channel) else {
                continue;
            };

            if !cal.start_temp.is_finite() {
                return Err(CompensationError::InvalidConfig {
                    reason: format!(
                        "{}: start temperature {} is not a number",
                        channel.display_name(),
                        cal.start_temp
                    ),
                });
            }

            if !cal.temp_res.is_finite() || cal.temp_res <= 0.0 {
                return Err(CompensationError::InvalidConfig {
                    reason: format!(
                        "{}: temperature resolution {} must be positive",
                        channel.display_name(),
                        cal.temp_res
                    ),
                });
            }

            if cal.measurements < 2 {
                return Err(CompensationError::InvalidConfig {
                    reason: format!(
                        "{}: {} slots, need at least 2",
                        channel.display_name(),
                        cal.measurements
                    ),
                });
            }

            if let Some(span) = self.extrapolation_span() {
                if span == 0 || span >= cal.measurements {
                    return Err(CompensationError::InvalidConfig {
                        reason: format!(
                            "{}: extrapolation span {} out of range [1, {}]",
                            channel.display_name(),
                            span,
                            cal.measurements - 1
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
