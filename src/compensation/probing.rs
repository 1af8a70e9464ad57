// Full thermal correction of a single probing result
//
// A probing routine reads every relevant sensor and removes the bed drift,
// then the probe drift for the active probe profile, then (when configured)
// the hotend drift.

use serde::{Deserialize, Serialize};

use crate::channel::SensorChannel;
use crate::compensation::context::CompensationContext;

/// Sensor temperatures sampled at the moment of probing (°C)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalReadings {
    pub bed: f32,
    pub probe: f32,
    /// Only used when the hotend channel is configured
    #[serde(default)]
    pub hotend: Option<f32>,
}

impl ThermalReadings {
    pub fn new(bed: f32, probe: f32) -> Self {
        Self {
            bed,
            probe,
            hotend: None,
        }
    }

    pub fn with_hotend(mut self, hotend: f32) -> Self {
        self.hotend = Some(hotend);
        self
    }
}

impl CompensationContext {
    /// Apply every channel's correction to a raw probed height (mm)
    ///
    /// Bed first, then Probe or Probe Winter depending on the winter mode
    /// flag, then Extruder if both the channel and a hotend reading exist.
    pub fn compensate_probing(&self, readings: &ThermalReadings, measured_height: f32) -> f32 {
        let mut z = measured_height;

        self.compensate_measurement(SensorChannel::Bed, readings.bed, &mut z);
        self.compensate_measurement(self.active_probe_channel(), readings.probe, &mut z);
        if let Some(hotend) = readings.hotend {
            self.compensate_measurement(SensorChannel::Extruder, hotend, &mut z);
        }

        z
    }
}
