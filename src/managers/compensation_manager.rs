// CompensationManager: thread-safe owner of the compensation context
//
// The context itself is single-threaded; its capture cursor is shared by
// every channel. The manager holds the context behind one mutex and runs a
// whole capture sequence under a single lock acquisition so concurrent
// callers cannot interleave two calibration passes.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::channel::SensorChannel;
use crate::compensation::{CompensationContext, OffsetSnapshot, ThermalReadings};
use crate::config::CompensationConfig;
use crate::error::{log_compensation_error, CompensationError};

/// Shares one `CompensationContext` between threads
///
/// # Example
/// ```
/// use probe_temp_comp::{CompensationManager, SensorChannel, ThermalReadings};
///
/// let manager = CompensationManager::default();
/// manager
///     .run_calibration(SensorChannel::Bed, 0.0, &[0.01, 0.02, 0.03])
///     .unwrap();
/// let z = manager
///     .compensate_probing(&ThermalReadings::new(65.0, 25.0), 0.2)
///     .unwrap();
/// assert!(z < 0.2);
/// ```
#[derive(Clone)]
pub struct CompensationManager {
    context: Arc<Mutex<CompensationContext>>,
}

impl CompensationManager {
    /// Create a manager around a freshly built context
    ///
    /// # Errors
    /// * `CompensationError::InvalidConfig` - configuration rejected
    pub fn new(config: &CompensationConfig) -> Result<Self, CompensationError> {
        Ok(Self::from_context(CompensationContext::new(config)?))
    }

    pub fn from_context(context: CompensationContext) -> Self {
        Self {
            context: Arc::new(Mutex::new(context)),
        }
    }

    /// Run prepare → capture × n → finish for one channel under one lock
    ///
    /// # Arguments
    /// * `channel` - Channel being calibrated
    /// * `reference_height` - Height (mm) measured before heating
    /// * `measurements` - Heights (mm), one per temperature step
    ///
    /// # Errors
    /// Any error `finish_calibration` reports, or `StatePoisoned`.
    pub fn run_calibration(
        &self,
        channel: SensorChannel,
        reference_height: f32,
        measurements: &[f32],
    ) -> Result<(), CompensationError> {
        let mut ctx = self.lock_context()?;
        tracing::debug!(
            "[CompensationManager] Calibrating {} with {} measurements",
            channel.display_name(),
            measurements.len()
        );

        ctx.prepare_new_calibration(reference_height);
        for &z in measurements {
            ctx.push_back_new_measurement(channel, z);
        }
        ctx.finish_calibration(channel)
    }

    /// Corrected height (mm) for one probing result
    pub fn compensate_probing(
        &self,
        readings: &ThermalReadings,
        measured_height: f32,
    ) -> Result<f32, CompensationError> {
        let ctx = self.lock_context()?;
        Ok(ctx.compensate_probing(readings, measured_height))
    }

    pub fn set_winter_mode(&self, enabled: bool) -> Result<(), CompensationError> {
        self.lock_context()?.set_winter_mode(enabled);
        Ok(())
    }

    /// Copy of every table for the settings store
    pub fn snapshot(&self) -> Result<OffsetSnapshot, CompensationError> {
        Ok(self.lock_context()?.snapshot())
    }

    /// Replace tables with previously persisted ones
    pub fn restore(&self, snapshot: &OffsetSnapshot) -> Result<(), CompensationError> {
        self.lock_context()?.restore(snapshot)
    }

    /// Run `f` with exclusive access to the context
    ///
    /// For caller-driven capture sequences that interleave probing moves
    /// with measurements; the lock is held for the whole closure.
    pub fn with_context<R>(
        &self,
        f: impl FnOnce(&mut CompensationContext) -> R,
    ) -> Result<R, CompensationError> {
        let mut ctx = self.lock_context()?;
        Ok(f(&mut ctx))
    }

    /// Safely acquire lock on the compensation context
    fn lock_context(&self) -> Result<MutexGuard<'_, CompensationContext>, CompensationError> {
        self.context.lock().map_err(|_| {
            let err = CompensationError::StatePoisoned;
            log_compensation_error(&err, "lock_context");
            err
        })
    }
}

impl Default for CompensationManager {
    fn default() -> Self {
        Self::from_context(CompensationContext::default())
    }
}
