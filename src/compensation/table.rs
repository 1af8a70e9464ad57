// OffsetTable - per-channel Z-offset storage and lookup
//
// A table holds one signed offset (µm) per temperature slot. Lookups
// interpolate linearly between the two slots bracketing a temperature and
// either clamp or extend the end segments outside the slot range.

use crate::channel::ChannelCalibration;
use crate::error::CompensationError;

/// Z-offset table for a single channel
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetTable {
    calibration: ChannelCalibration,
    /// Offsets in micrometers, one per slot
    offsets: Vec<i16>,
}

impl OffsetTable {
    /// Create an all-zero table for the given layout
    pub fn new(calibration: ChannelCalibration) -> Self {
        Self {
            calibration,
            offsets: vec![0; calibration.measurements],
        }
    }

    pub fn calibration(&self) -> &ChannelCalibration {
        &self.calibration
    }

    pub fn offsets(&self) -> &[i16] {
        &self.offsets
    }

    pub(crate) fn offsets_mut(&mut self) -> &mut [i16] {
        &mut self.offsets
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.offsets.len()
    }

    /// Reset every slot to zero
    pub fn clear(&mut self) {
        self.offsets.fill(0);
    }

    /// Overwrite a single slot
    ///
    /// # Returns
    /// * `Ok(())` - Slot written
    /// * `Err(CompensationError::IndexOutOfRange)` - `index` beyond capacity, table unchanged
    pub fn set(&mut self, index: usize, offset_um: i16) -> Result<(), CompensationError> {
        let capacity = self.capacity();
        let slot = self
            .offsets
            .get_mut(index)
            .ok_or(CompensationError::IndexOutOfRange { index, capacity })?;
        *slot = offset_um;
        Ok(())
    }

    /// (temperature, offset) coordinates of slot `index`
    fn point(&self, index: usize) -> (f32, f32) {
        (
            self.calibration.slot_temperature(index),
            f32::from(self.offsets[index]),
        )
    }

    /// Offset in micrometers for an arbitrary temperature
    ///
    /// # Arguments
    /// * `temperature` - Sensor temperature in °C
    /// * `extrapolation_span` - `None` clamps outside the slot range
    ///   (0 below, last slot above); `Some(span)` extends the line through
    ///   the first/last slot and the slot `span` positions inward
    pub fn offset_at(&self, temperature: f32, extrapolation_span: Option<usize>) -> f32 {
        let count = self.capacity();
        if count == 0 || !temperature.is_finite() {
            return 0.0;
        }
        let last = count - 1;

        if temperature < self.calibration.start_temp {
            return match extrapolation_span.filter(|&span| span <= last && span > 0) {
                Some(span) => linear_interp(temperature, self.point(0), self.point(span)),
                None => 0.0,
            };
        }

        // Compared as float first; the cast saturates for huge temperatures
        let pos = (temperature - self.calibration.start_temp) / self.calibration.temp_res;

        if pos >= last as f32 {
            return match extrapolation_span.and_then(|span| last.checked_sub(span)) {
                Some(first) if first < last => {
                    linear_interp(temperature, self.point(first), self.point(last))
                }
                _ => f32::from(self.offsets[last]),
            };
        }

        // Non-negative and below `last` here, so truncation is a floor
        let idx = pos as usize;
        linear_interp(temperature, self.point(idx), self.point(idx + 1))
    }
}

/// Value at `x` on the line through `p1` and `p2`
fn linear_interp(x: f32, p1: (f32, f32), p2: (f32, f32)) -> f32 {
    (p2.1 - p1.1) / (p2.0 - p1.0) * (x - p1.0) + p1.1
}
