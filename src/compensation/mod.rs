// Compensation module - thermal offset calibration and lookup
//
// This module provides:
// 1. OffsetTable: per-channel Z offsets (µm) with interpolating lookup
// 2. CalibrationSession: capture cursor and reference height
// 3. CompensationContext: lifecycle (prepare, capture, finish) and queries
//
// The calibration workflow:
// 1. Record the reference height with the system cold
// 2. Push one measured height per temperature step
// 3. Finish to extrapolate, validate and commit the table

pub mod context;
pub mod probing;
pub mod regression;
pub mod session;
pub mod snapshot;
pub mod table;
pub mod validation;

pub use context::{CompensationContext, MIN_CALIBRATION_MEASUREMENTS};
pub use probing::ThermalReadings;
pub use regression::LinearFit;
pub use session::CalibrationSession;
pub use snapshot::OffsetSnapshot;
pub use table::OffsetTable;
pub use validation::{TableValidator, MAX_ADJACENT_DELTA_UM, MAX_OFFSET_UM};
