// CalibrationSession - capture cursor and reference height
//
// The session tracks how many measurements have been captured since the
// last `prepare_new_calibration` and the height every capture is measured
// against. There is one session per compensation context, so calibration
// passes for different channels have to run one after another.

/// Capture state for the calibration pass in progress
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalibrationSession {
    /// Next slot to fill
    cursor: usize,
    /// Height (mm) measured before any heating, the zero point of the pass
    reference_height: f32,
}

impl CalibrationSession {
    /// Start a pass measured against `reference_height` (mm)
    pub fn new(reference_height: f32) -> Self {
        Self {
            cursor: 0,
            reference_height,
        }
    }

    /// Number of measurements captured so far
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reference_height(&self) -> f32 {
        self.reference_height
    }

    /// Offset (µm) of `measured_height` relative to the reference
    ///
    /// Saturates at the `i16` limits; such values are rejected later by
    /// table validation.
    pub fn relative_offset_um(&self, measured_height: f32) -> i16 {
        ((measured_height - self.reference_height) * 1000.0).round() as i16
    }

    pub(crate) fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    pub(crate) fn advance(&mut self) {
        self.cursor += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = CalibrationSession::new(1.25);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.reference_height(), 1.25);
    }

    #[test]
    fn test_relative_offset_um() {
        let session = CalibrationSession::new(2.0);
        assert_eq!(session.relative_offset_um(2.5), 500);
        assert_eq!(session.relative_offset_um(1.9), -100);
        assert_eq!(session.relative_offset_um(2.0004), 0);
    }

    #[test]
    fn test_relative_offset_saturates() {
        let session = CalibrationSession::new(0.0);
        assert_eq!(session.relative_offset_um(100.0), i16::MAX);
        assert_eq!(session.relative_offset_um(-100.0), i16::MIN);
    }

    #[test]
    fn test_cursor_moves() {
        let mut session = CalibrationSession::new(0.0);
        session.advance();
        session.advance();
        assert_eq!(session.cursor(), 2);
        session.reset_cursor();
        assert_eq!(session.cursor(), 0);
    }
}
