// Error types for probe temperature compensation
//
// This module defines the error type for calibration lifecycle and table
// operations, with numeric error codes suitable for operator tooling.

mod compensation;

pub use compensation::{log_compensation_error, CompensationError, CompensationErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so front ends can report failures consistently.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
