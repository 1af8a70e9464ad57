// CompensationContext - owner of every channel table and the capture session
//
// Calibration lifecycle:
// 1. prepare_new_calibration(reference height)
// 2. push_back_new_measurement() once per temperature step
// 3. finish_calibration() extrapolates a partial table, validates it and
//    either keeps it or resets it to zero
//
// Queries (compensate_measurement / get_offset_for_temperature) never fail;
// a temperature outside a channel's range simply skips correction.

use std::collections::HashMap;
use std::io;

use log::{debug, info, warn};

use crate::channel::{ChannelCalibration, SensorChannel};
use crate::compensation::regression::LinearFit;
use crate::compensation::session::CalibrationSession;
use crate::compensation::table::OffsetTable;
use crate::compensation::validation::TableValidator;
use crate::config::CompensationConfig;
use crate::error::{log_compensation_error, CompensationError};

/// Fewest captured measurements `finish_calibration` accepts
pub const MIN_CALIBRATION_MEASUREMENTS: usize = 3;

/// Fewest captured measurements a regression can be run on
pub const MIN_REGRESSION_MEASUREMENTS: usize = 2;

/// Per-channel offset tables plus the shared calibration session
///
/// # Example
/// ```
/// use probe_temp_comp::{CompensationConfig, CompensationContext, SensorChannel};
///
/// let mut ctx = CompensationContext::new(&CompensationConfig::default()).unwrap();
/// ctx.prepare_new_calibration(0.0);
/// for z in [0.010, 0.020, 0.030, 0.040] {
///     ctx.push_back_new_measurement(SensorChannel::Bed, z);
/// }
/// ctx.finish_calibration(SensorChannel::Bed).unwrap();
///
/// let mut z = 0.5;
/// ctx.compensate_measurement(SensorChannel::Bed, 70.0, &mut z);
/// assert!(z < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct CompensationContext {
    pub(crate) tables: HashMap<SensorChannel, OffsetTable>,
    pub(crate) session: CalibrationSession,
    pub(crate) is_winter: bool,
    extrapolation_span: Option<usize>,
}

impl CompensationContext {
    /// Build all channel tables from a validated configuration
    ///
    /// # Errors
    /// * `CompensationError::InvalidConfig` - unusable resolution, slot count
    ///   or extrapolation span
    pub fn new(config: &CompensationConfig) -> Result<Self, CompensationError> {
        config.validate().inspect_err(|err| {
            log_compensation_error(err, "build_context");
        })?;
        Ok(Self::from_config_unchecked(config))
    }

    pub(crate) fn from_config_unchecked(config: &CompensationConfig) -> Self {
        let tables = SensorChannel::ALL
            .into_iter()
            .filter_map(|channel| {
                config
                    .channels
                    .get(channel)
                    .map(|cal| (channel, OffsetTable::new(cal)))
            })
            .collect();

        Self {
            tables,
            session: CalibrationSession::default(),
            is_winter: false,
            extrapolation_span: config.extrapolation_span(),
        }
    }

    /// Configured channels, in diagnostic dump order
    pub fn channels(&self) -> impl Iterator<Item = SensorChannel> + '_ {
        SensorChannel::ALL
            .into_iter()
            .filter(|channel| self.tables.contains_key(channel))
    }

    /// Table layout of `channel`, `None` if not configured
    pub fn calibration(&self, channel: SensorChannel) -> Option<&ChannelCalibration> {
        self.tables.get(&channel).map(OffsetTable::calibration)
    }

    /// Raw offsets (µm) of `channel`, `None` if not configured
    pub fn offsets(&self, channel: SensorChannel) -> Option<&[i16]> {
        self.tables.get(&channel).map(OffsetTable::offsets)
    }

    pub fn session(&self) -> &CalibrationSession {
        &self.session
    }

    pub fn extrapolation_span(&self) -> Option<usize> {
        self.extrapolation_span
    }

    pub fn is_winter(&self) -> bool {
        self.is_winter
    }

    pub fn set_winter_mode(&mut self, enabled: bool) {
        if self.is_winter != enabled {
            info!(
                "[Compensation] Winter mode {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        self.is_winter = enabled;
    }

    /// Probe profile selected by the winter mode flag
    pub fn active_probe_channel(&self) -> SensorChannel {
        if self.is_winter {
            SensorChannel::ProbeWinter
        } else {
            SensorChannel::Probe
        }
    }

    fn table(&self, channel: SensorChannel) -> Result<&OffsetTable, CompensationError> {
        self.tables
            .get(&channel)
            .ok_or(CompensationError::UnsupportedChannel { channel })
    }

    fn capture_table(&self, channel: SensorChannel) -> Result<&OffsetTable, CompensationError> {
        if !channel.supports_capture() {
            return Err(CompensationError::UnsupportedChannel { channel });
        }
        self.table(channel)
    }

    /// Zero every slot of `channel` and rewind the capture cursor
    pub fn clear_offsets(&mut self, channel: SensorChannel) {
        if let Some(table) = self.tables.get_mut(&channel) {
            table.clear();
        }
        self.session.reset_cursor();
    }

    /// Overwrite slot `index` of `channel` directly
    ///
    /// # Errors
    /// * `CompensationError::IndexOutOfRange` - `index` beyond capacity
    /// * `CompensationError::UnsupportedChannel` - channel not configured
    pub fn set_offset(
        &mut self,
        channel: SensorChannel,
        index: usize,
        offset_um: i16,
    ) -> Result<(), CompensationError> {
        self.tables
            .get_mut(&channel)
            .ok_or(CompensationError::UnsupportedChannel { channel })?
            .set(index, offset_um)
    }

    /// Begin a capture pass measured against `reference_height` (mm)
    pub fn prepare_new_calibration(&mut self, reference_height: f32) {
        debug!(
            "[Compensation] New calibration pass, reference height {:.3} mm",
            reference_height
        );
        self.session = CalibrationSession::new(reference_height);
    }

    /// Store `measured_height` (mm) in the next slot of `channel`
    ///
    /// Silently ignored for channels without capture support and once the
    /// table is full.
    pub fn push_back_new_measurement(&mut self, channel: SensorChannel, measured_height: f32) {
        if !channel.supports_capture() {
            return;
        }
        let cursor = self.session.cursor();
        let offset = self.session.relative_offset_um(measured_height);
        let Some(table) = self.tables.get_mut(&channel) else {
            return;
        };
        if cursor >= table.capacity() {
            debug!(
                "[Compensation] {} table full, dropping measurement {:.3} mm",
                channel.display_name(),
                measured_height
            );
            return;
        }
        table.offsets_mut()[cursor] = offset;
        self.session.advance();
    }

    /// Close the capture pass for `channel`
    ///
    /// A partial table is completed by linear extrapolation (or by repeating
    /// the last measurement if the fit is singular), then validated. On a
    /// validation failure a table is reset to zero before returning.
    ///
    /// # Errors
    /// * `UnsupportedChannel` - no capture support, nothing changed
    /// * `InsufficientMeasurements` - fewer than 3 captures, table cleared
    /// * `OffsetOutOfRange` - a slot above 2 mm, table cleared
    /// * `ExcessiveOffsetDelta` - adjacent slots more than 0.8 mm apart; the
    ///   probe table chosen by the winter flag is cleared, whichever channel
    ///   was being finished
    pub fn finish_calibration(&mut self, channel: SensorChannel) -> Result<(), CompensationError> {
        let measurements = self
            .capture_table(channel)
            .inspect_err(|err| log_compensation_error(err, "finish_calibration"))?
            .capacity();

        let collected = self.session.cursor();
        if collected < MIN_CALIBRATION_MEASUREMENTS {
            self.clear_offsets(channel);
            let err = CompensationError::InsufficientMeasurements {
                required: MIN_CALIBRATION_MEASUREMENTS,
                collected,
            };
            log_compensation_error(&err, "finish_calibration");
            return Err(err);
        }

        if collected < measurements {
            info!("[Compensation] Got {} measurements.", collected);
            self.extrapolate(channel, collected)?;
        }

        let verdict = TableValidator::validate(self.table(channel)?.offsets());
        match verdict {
            Ok(()) => {
                self.session.set_cursor(measurements);
                info!(
                    "[Compensation] {} calibration accepted ({} slots)",
                    channel.display_name(),
                    measurements
                );
                Ok(())
            }
            Err(err @ CompensationError::ExcessiveOffsetDelta { .. }) => {
                let probe_channel = self.active_probe_channel();
                self.clear_offsets(probe_channel);
                log_compensation_error(&err, "finish_calibration");
                Err(err)
            }
            Err(err) => {
                self.clear_offsets(channel);
                log_compensation_error(&err, "finish_calibration");
                Err(err)
            }
        }
    }

    /// Fill slots from `collected - 1` upwards from the regression line, or
    /// repeat the last capture when no line can be fitted
    fn extrapolate(
        &mut self,
        channel: SensorChannel,
        collected: usize,
    ) -> Result<(), CompensationError> {
        let fit = self.linear_regression(channel);
        let table = self
            .tables
            .get_mut(&channel)
            .ok_or(CompensationError::UnsupportedChannel { channel })?;
        let calibration = *table.calibration();
        let offsets = table.offsets_mut();

        match fit {
            Ok(fit) => {
                info!(
                    "[Compensation] Applying linear extrapolation for higher temperatures (k={:.3}, d={:.3})",
                    fit.k, fit.d
                );
                for (index, slot) in offsets.iter_mut().enumerate().skip(collected - 1) {
                    *slot = fit.evaluate(calibration.slot_temperature(index)) as i16;
                }
            }
            Err(_) => {
                warn!("[Compensation] Failed to extrapolate for higher temperatures, repeating last measurement");
                let last = offsets[collected - 1];
                offsets[collected..].fill(last);
            }
        }
        Ok(())
    }

    /// Fit `offset = k * temperature + d` over the captured slots
    ///
    /// The fit includes an implicit `(start_temp, 0)` origin and places
    /// captured slot `i` at `start_temp + (i + 1) * temp_res`.
    ///
    /// # Errors
    /// * `UnsupportedChannel` - no capture support
    /// * `InsufficientMeasurements` - fewer than 2 captures
    /// * `IndexOutOfRange` - cursor past this channel's capacity
    /// * `SingularFit` - degenerate fit, equivalent to `k = d = 0`
    pub fn linear_regression(&self, channel: SensorChannel) -> Result<LinearFit, CompensationError> {
        let table = self.capture_table(channel)?;
        let collected = self.session.cursor();

        if collected < MIN_REGRESSION_MEASUREMENTS {
            return Err(CompensationError::InsufficientMeasurements {
                required: MIN_REGRESSION_MEASUREMENTS,
                collected,
            });
        }
        // Cursor advanced on a larger table
        if collected > table.capacity() {
            return Err(CompensationError::IndexOutOfRange {
                index: collected - 1,
                capacity: table.capacity(),
            });
        }

        let calibration = table.calibration();
        let origin = (calibration.start_temp, 0.0);
        let captured = table.offsets()[..collected]
            .iter()
            .enumerate()
            .map(|(i, &offset)| (calibration.slot_temperature(i + 1), f32::from(offset)));

        LinearFit::least_squares(std::iter::once(origin).chain(captured))
    }

    /// Subtract the thermal offset for `temperature` from `measured_height`
    ///
    /// Leaves the height untouched when `temperature` lies outside the
    /// channel's `[start_temp, end_temp]` range or the channel is not
    /// configured.
    pub fn compensate_measurement(
        &self,
        channel: SensorChannel,
        temperature: f32,
        measured_height: &mut f32,
    ) {
        let Some(table) = self.tables.get(&channel) else {
            return;
        };
        if table.calibration().contains(temperature) {
            *measured_height -= self.get_offset_for_temperature(channel, temperature);
        }
    }

    /// Thermal offset (mm) of `channel` at `temperature`
    ///
    /// Returns 0 for channels that are not configured.
    pub fn get_offset_for_temperature(&self, channel: SensorChannel, temperature: f32) -> f32 {
        self.tables
            .get(&channel)
            .map(|table| table.offset_at(temperature, self.extrapolation_span) / 1000.0)
            .unwrap_or(0.0)
    }

    /// Write every configured table as `<label> temp: <t>C; Offset: <v> um`
    ///
    /// Each channel starts with a zero row at `start_temp`, followed by one
    /// row per slot, one resolution step apart.
    pub fn print_offsets<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for channel in self.channels() {
            let table = &self.tables[&channel];
            let calibration = table.calibration();
            let label = channel.display_name();

            writeln!(
                out,
                "{} temp: {}C; Offset: 0 um",
                label, calibration.start_temp
            )?;
            for (i, offset) in table.offsets().iter().enumerate() {
                writeln!(
                    out,
                    "{} temp: {}C; Offset: {} um",
                    label,
                    calibration.slot_temperature(i + 1),
                    offset
                )?;
            }
        }
        Ok(())
    }
}

impl Default for CompensationContext {
    fn default() -> Self {
        Self::from_config_unchecked(&CompensationConfig::default())
    }
}
