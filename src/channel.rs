// Sensor channels and their immutable calibration metadata
//
// Each channel is a temperature sensor whose thermal drift is compensated
// independently. A channel's table covers `measurements` slots spaced
// `temp_res` degrees apart, starting at `start_temp`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Temperature sensor whose drift is compensated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannel {
    /// Probe body temperature, normal ambient profile
    Probe,
    /// Heated bed temperature
    Bed,
    /// Hotend temperature (only present when configured)
    Extruder,
    /// Probe body temperature, cold ambient profile
    ProbeWinter,
}

impl SensorChannel {
    /// Every channel, in diagnostic dump order
    pub const ALL: [SensorChannel; 4] = [
        SensorChannel::Probe,
        SensorChannel::Bed,
        SensorChannel::Extruder,
        SensorChannel::ProbeWinter,
    ];

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            SensorChannel::Probe => "Probe",
            SensorChannel::Bed => "Bed",
            SensorChannel::Extruder => "Extruder",
            SensorChannel::ProbeWinter => "Probe Winter",
        }
    }

    /// Whether tables for this channel can be built by live capture
    ///
    /// The hotend channel is excluded from capture, regression and
    /// finishing; its table can only be written slot by slot.
    pub fn supports_capture(&self) -> bool {
        !matches!(self, SensorChannel::Extruder)
    }

    fn as_key(&self) -> &'static str {
        match self {
            SensorChannel::Probe => "probe",
            SensorChannel::Bed => "bed",
            SensorChannel::Extruder => "extruder",
            SensorChannel::ProbeWinter => "probe_winter",
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for SensorChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorChannel::ALL
            .into_iter()
            .find(|channel| channel.as_key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown channel '{}', expected one of probe, bed, extruder, probe_winter",
                    s
                )
            })
    }
}

/// Immutable table layout for one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelCalibration {
    /// Temperature of slot 0 (°C)
    pub start_temp: f32,
    /// Temperature step between slots (°C)
    pub temp_res: f32,
    /// Number of slots in the table
    pub measurements: usize,
}

impl ChannelCalibration {
    pub const fn new(start_temp: f32, temp_res: f32, measurements: usize) -> Self {
        Self {
            start_temp,
            temp_res,
            measurements,
        }
    }

    /// Probe profile: 30..80 °C in 5 °C steps
    pub const PROBE_DEFAULT: Self = Self::new(30.0, 5.0, 10);

    /// Bed profile: 60..110 °C in 5 °C steps
    pub const BED_DEFAULT: Self = Self::new(60.0, 5.0, 10);

    /// Hotend profile: 180..280 °C in 5 °C steps
    pub const EXTRUDER_DEFAULT: Self = Self::new(180.0, 5.0, 20);

    /// Winter probe profile: 10..60 °C in 5 °C steps
    pub const PROBE_WINTER_DEFAULT: Self = Self::new(10.0, 5.0, 10);

    /// Upper bound of the compensated range (°C)
    pub fn end_temp(&self) -> f32 {
        self.start_temp + self.measurements as f32 * self.temp_res
    }

    /// Temperature represented by slot `index` (°C)
    #[inline]
    pub fn slot_temperature(&self, index: usize) -> f32 {
        self.start_temp + index as f32 * self.temp_res
    }

    /// Whether `temperature` lies inside `[start_temp, end_temp]`
    pub fn contains(&self, temperature: f32) -> bool {
        temperature >= self.start_temp && temperature <= self.end_temp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_support() {
        assert!(SensorChannel::Probe.supports_capture());
        assert!(SensorChannel::Bed.supports_capture());
        assert!(SensorChannel::ProbeWinter.supports_capture());
        assert!(!SensorChannel::Extruder.supports_capture());
    }

    #[test]
    fn test_parse_channel_names() {
        assert_eq!("probe".parse::<SensorChannel>(), Ok(SensorChannel::Probe));
        assert_eq!("BED".parse::<SensorChannel>(), Ok(SensorChannel::Bed));
        assert_eq!("probe_winter".parse::<SensorChannel>(), Ok(SensorChannel::ProbeWinter));
        assert!("nozzle".parse::<SensorChannel>().is_err());
    }

    #[test]
    fn test_display_matches_serde_name() {
        for channel in SensorChannel::ALL {
            let json = serde_json::to_string(&channel).unwrap();
            assert_eq!(json, format!("\"{}\"", channel));
        }
    }

    #[test]
    fn test_default_ranges() {
        assert_eq!(ChannelCalibration::PROBE_DEFAULT.end_temp(), 80.0);
        assert_eq!(ChannelCalibration::BED_DEFAULT.end_temp(), 110.0);
        assert_eq!(ChannelCalibration::EXTRUDER_DEFAULT.end_temp(), 280.0);
        assert_eq!(ChannelCalibration::PROBE_WINTER_DEFAULT.end_temp(), 60.0);
    }

    #[test]
    fn test_slot_temperature_and_range() {
        let cal = ChannelCalibration::new(20.0, 5.0, 4);
        assert_eq!(cal.slot_temperature(0), 20.0);
        assert_eq!(cal.slot_temperature(3), 35.0);
        assert!(cal.contains(20.0));
        assert!(cal.contains(40.0));
        assert!(!cal.contains(19.9));
        assert!(!cal.contains(40.1));
    }
}
