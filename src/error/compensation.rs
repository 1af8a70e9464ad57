// Compensation error types and constants

use crate::channel::SensorChannel;
use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Compensation error code constants
///
/// Single source of truth for the numeric codes reported to operator
/// tooling alongside the diagnostic text.
///
/// Error code range: 3001-3009
pub struct CompensationErrorCodes {}

impl CompensationErrorCodes {
    /// Channel does not support the requested operation or is not configured
    pub const UNSUPPORTED_CHANNEL: i32 = 3001;

    /// Table slot index beyond the channel capacity
    pub const INDEX_OUT_OF_RANGE: i32 = 3002;

    /// Fewer than three measurements captured before finishing
    pub const INSUFFICIENT_MEASUREMENTS: i32 = 3003;

    /// Least-squares fit was singular
    pub const SINGULAR_FIT: i32 = 3004;

    /// A slot exceeded the absolute offset limit
    pub const OFFSET_OUT_OF_RANGE: i32 = 3005;

    /// Two adjacent slots differed by more than the delta limit
    pub const EXCESSIVE_OFFSET_DELTA: i32 = 3006;

    /// Snapshot does not match the configured table layout
    pub const SNAPSHOT_MISMATCH: i32 = 3007;

    /// Compensation state lock was poisoned
    pub const STATE_POISONED: i32 = 3008;

    /// Channel configuration is unusable
    pub const INVALID_CONFIG: i32 = 3009;
}

/// Log a compensation error with structured context
///
/// Logs the error code, the component and the diagnostic message together
/// with the operation in which the error was detected.
pub fn log_compensation_error(err: &CompensationError, context: &str) {
    error!(
        "Compensation error in {}: code={}, component=ThermalOffsetCalibrator, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by the calibration lifecycle and table access
///
/// Every variant is recovered locally: the offending table has already been
/// reset to a safe state (or left untouched) when the error is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum CompensationError {
    /// Channel is not configured or cannot be used for this operation
    UnsupportedChannel { channel: SensorChannel },

    /// Slot index beyond table capacity
    IndexOutOfRange { index: usize, capacity: usize },

    /// Calibration finished with too few measurements
    InsufficientMeasurements { required: usize, collected: usize },

    /// Regression denominator collapsed to zero
    SingularFit,

    /// A slot holds an implausible absolute offset (µm)
    OffsetOutOfRange { index: usize, offset_um: i16 },

    /// Adjacent slots differ by more than the allowed delta (µm)
    ExcessiveOffsetDelta { index: usize, delta_um: i32 },

    /// Persisted table length differs from the configured capacity
    SnapshotMismatch {
        channel: SensorChannel,
        expected: usize,
        found: usize,
    },

    /// Compensation state lock was poisoned
    StatePoisoned,

    /// Configuration rejected at construction
    InvalidConfig { reason: String },
}

impl ErrorCode for CompensationError {
    fn code(&self) -> i32 {
        match self {
            CompensationError::UnsupportedChannel { .. } => {
                CompensationErrorCodes::UNSUPPORTED_CHANNEL
            }
            CompensationError::IndexOutOfRange { .. } => CompensationErrorCodes::INDEX_OUT_OF_RANGE,
            CompensationError::InsufficientMeasurements { .. } => {
                CompensationErrorCodes::INSUFFICIENT_MEASUREMENTS
            }
            CompensationError::SingularFit => CompensationErrorCodes::SINGULAR_FIT,
            CompensationError::OffsetOutOfRange { .. } => {
                CompensationErrorCodes::OFFSET_OUT_OF_RANGE
            }
            CompensationError::ExcessiveOffsetDelta { .. } => {
                CompensationErrorCodes::EXCESSIVE_OFFSET_DELTA
            }
            CompensationError::SnapshotMismatch { .. } => CompensationErrorCodes::SNAPSHOT_MISMATCH,
            CompensationError::StatePoisoned => CompensationErrorCodes::STATE_POISONED,
            CompensationError::InvalidConfig { .. } => CompensationErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        match self {
            CompensationError::UnsupportedChannel { channel } => {
                format!("Channel {} not supported here", channel.display_name())
            }
            CompensationError::IndexOutOfRange { index, capacity } => {
                format!("Offset index {} out of range (capacity {})", index, capacity)
            }
            CompensationError::InsufficientMeasurements { required, collected } => format!(
                "Insufficient measurements (min. {}), got {}",
                required, collected
            ),
            CompensationError::SingularFit => {
                "Singularity - unable to solve linear regression".to_string()
            }
            CompensationError::OffsetOutOfRange { index, offset_um } => format!(
                "Invalid Z-offset detected (0-2): slot {} holds {} um",
                index, offset_um
            ),
            CompensationError::ExcessiveOffsetDelta { index, delta_um } => format!(
                "Invalid Z-offset between two probings detected (0-0.8): slot {} differs by {} um",
                index, delta_um
            ),
            CompensationError::SnapshotMismatch {
                channel,
                expected,
                found,
            } => format!(
                "Snapshot for {} has {} offsets, expected {}",
                channel.display_name(),
                found,
                expected
            ),
            CompensationError::StatePoisoned => "Compensation state lock poisoned".to_string(),
            CompensationError::InvalidConfig { reason } => {
                format!("Invalid compensation config: {}", reason)
            }
        }
    }
}

impl fmt::Display for CompensationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompensationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CompensationError {}
