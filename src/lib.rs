// Probe Temperature Compensation Core
// Thermal drift correction for Z-probe measurements on a 3D printer

// Module declarations
pub mod channel;
pub mod compensation;
pub mod config;
pub mod error;
pub mod managers;

// Re-exports for convenience
pub use channel::{ChannelCalibration, SensorChannel};
pub use compensation::{
    CalibrationSession, CompensationContext, LinearFit, OffsetSnapshot, OffsetTable,
    ThermalReadings,
};
pub use config::CompensationConfig;
pub use error::{CompensationError, ErrorCode};
pub use managers::CompensationManager;
