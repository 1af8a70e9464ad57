// Sanity checks applied to a finished calibration table
//
// A table is rejected if any slot holds a physically implausible offset or
// if two neighbouring slots jump further than a probe can drift in one
// temperature step.

use crate::error::CompensationError;

/// Largest accepted absolute offset (µm)
pub const MAX_OFFSET_UM: i32 = 2000;

/// Largest accepted difference between adjacent slots (µm)
pub const MAX_ADJACENT_DELTA_UM: i32 = 800;

/// Validator for completed offset tables
pub struct TableValidator;

impl TableValidator {
    /// Validate every slot of a table, front to back
    ///
    /// Each slot is checked for magnitude first, then against its
    /// predecessor, so the first offending slot decides the error.
    ///
    /// # Returns
    /// * `Ok(())` - Table accepted
    /// * `Err(CompensationError::OffsetOutOfRange)` - `|offset| > 2000`
    /// * `Err(CompensationError::ExcessiveOffsetDelta)` - adjacent delta `> 800`
    pub fn validate(offsets: &[i16]) -> Result<(), CompensationError> {
        for (index, &offset) in offsets.iter().enumerate() {
            if i32::from(offset).abs() > MAX_OFFSET_UM {
                return Err(CompensationError::OffsetOutOfRange {
                    index,
                    offset_um: offset,
                });
            }

            if index > 0 {
                let delta_um = (i32::from(offsets[index - 1]) - i32::from(offset)).abs();
                if delta_um > MAX_ADJACENT_DELTA_UM {
                    return Err(CompensationError::ExcessiveOffsetDelta { index, delta_um });
                }
            }
        }
        Ok(())
    }
}
