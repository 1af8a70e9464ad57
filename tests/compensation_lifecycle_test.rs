//! Integration tests for the thermal offset calibration lifecycle
//!
//! These tests drive the public API the way a probing routine does:
//! - prepare a pass, push measured heights, finish
//! - query and apply offsets during normal probing
//! - rejection paths that reset tables to a safe state

use probe_temp_comp::{
    ChannelCalibration, CompensationConfig, CompensationContext, CompensationError, LinearFit,
    SensorChannel,
};

fn context() -> CompensationContext {
    CompensationContext::new(&CompensationConfig::with_extruder()).expect("valid default config")
}

fn capture(ctx: &mut CompensationContext, channel: SensorChannel, reference: f32, heights: &[f32]) {
    ctx.prepare_new_calibration(reference);
    for &z in heights {
        ctx.push_back_new_measurement(channel, z);
    }
}

fn all_zero(ctx: &CompensationContext, channel: SensorChannel) -> bool {
    ctx.offsets(channel).unwrap().iter().all(|&v| v == 0)
}

#[test]
fn test_cleared_table_has_zero_offset_at_start() {
    let mut ctx = context();
    for channel in SensorChannel::ALL {
        ctx.set_offset(channel, 0, 123).unwrap();
        ctx.clear_offsets(channel);

        let start = ctx.calibration(channel).unwrap().start_temp;
        assert_eq!(
            ctx.get_offset_for_temperature(channel, start),
            0.0,
            "{} should read zero after clearing",
            channel.display_name()
        );
    }
}

#[test]
fn test_clear_offsets_rewinds_cursor() {
    let mut ctx = context();
    capture(&mut ctx, SensorChannel::Bed, 0.0, &[0.01, 0.02]);
    assert_eq!(ctx.session().cursor(), 2);

    ctx.clear_offsets(SensorChannel::Probe);
    assert_eq!(ctx.session().cursor(), 0);
}

#[test]
fn test_cursor_fills_in_order_and_stops_at_capacity() {
    let mut ctx = context();
    ctx.prepare_new_calibration(0.0);

    for k in 1..=10 {
        ctx.push_back_new_measurement(SensorChannel::Probe, k as f32 * 0.01);
        assert_eq!(ctx.session().cursor(), k);
    }
    let full: Vec<i16> = ctx.offsets(SensorChannel::Probe).unwrap().to_vec();
    assert_eq!(full, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);

    // Eleventh measurement is dropped
    ctx.push_back_new_measurement(SensorChannel::Probe, 1.5);
    assert_eq!(ctx.session().cursor(), 10);
    assert_eq!(ctx.offsets(SensorChannel::Probe).unwrap(), full.as_slice());
}

#[test]
fn test_measurement_converted_to_micrometers() {
    let mut ctx = context();
    let h0 = 2.0;
    ctx.prepare_new_calibration(h0);
    ctx.push_back_new_measurement(SensorChannel::Bed, h0 + 0.5);

    assert_eq!(ctx.offsets(SensorChannel::Bed).unwrap()[0], 500);
}

#[test]
fn test_two_measurements_are_insufficient() {
    let mut ctx = context();
    capture(&mut ctx, SensorChannel::Probe, 0.0, &[0.02, 0.04]);

    let result = ctx.finish_calibration(SensorChannel::Probe);
    assert_eq!(
        result,
        Err(CompensationError::InsufficientMeasurements {
            required: 3,
            collected: 2
        })
    );
    assert!(all_zero(&ctx, SensorChannel::Probe));
}

#[test]
fn test_magnitude_violation_clears_table() {
    let mut ctx = context();
    let heights: Vec<f32> = (0..10).map(|i| i as f32 * 0.01).collect();
    capture(&mut ctx, SensorChannel::Bed, 0.0, &heights);
    ctx.set_offset(SensorChannel::Bed, 4, 2500).unwrap();

    let result = ctx.finish_calibration(SensorChannel::Bed);
    assert_eq!(
        result,
        Err(CompensationError::OffsetOutOfRange {
            index: 4,
            offset_um: 2500
        })
    );
    assert!(all_zero(&ctx, SensorChannel::Bed));
}

#[test]
fn test_extrapolated_values_are_validated() {
    let mut ctx = context();
    // Steep drift: 60 um/°C reaches 2 mm before the end of the table
    capture(&mut ctx, SensorChannel::Probe, 0.0, &[0.3, 0.6, 0.9]);

    let result = ctx.finish_calibration(SensorChannel::Probe);
    assert!(matches!(
        result,
        Err(CompensationError::OffsetOutOfRange { index: 7, .. })
    ));
    assert!(all_zero(&ctx, SensorChannel::Probe));
}

#[test]
fn test_delta_violation_clears_active_probe_table() {
    let mut ctx = context();
    ctx.set_offset(SensorChannel::Probe, 3, 77).unwrap();
    ctx.set_offset(SensorChannel::ProbeWinter, 3, 88).unwrap();

    capture(&mut ctx, SensorChannel::Bed, 0.0, &[0.0; 10]);
    ctx.set_offset(SensorChannel::Bed, 1, 900).unwrap();

    let result = ctx.finish_calibration(SensorChannel::Bed);
    assert_eq!(
        result,
        Err(CompensationError::ExcessiveOffsetDelta {
            index: 1,
            delta_um: 900
        })
    );

    // The probe table is reset, the bed table under validation is not
    assert!(all_zero(&ctx, SensorChannel::Probe));
    assert_eq!(ctx.offsets(SensorChannel::Bed).unwrap()[1], 900);
    assert_eq!(ctx.offsets(SensorChannel::ProbeWinter).unwrap()[3], 88);
    assert_eq!(ctx.session().cursor(), 0);
}

#[test]
fn test_delta_violation_in_winter_mode_clears_winter_table() {
    let mut ctx = context();
    ctx.set_winter_mode(true);
    ctx.set_offset(SensorChannel::Probe, 3, 77).unwrap();
    ctx.set_offset(SensorChannel::ProbeWinter, 3, 88).unwrap();

    capture(&mut ctx, SensorChannel::Bed, 0.0, &[0.0; 10]);
    ctx.set_offset(SensorChannel::Bed, 1, 900).unwrap();

    assert!(ctx.finish_calibration(SensorChannel::Bed).is_err());
    assert!(all_zero(&ctx, SensorChannel::ProbeWinter));
    assert_eq!(ctx.offsets(SensorChannel::Probe).unwrap()[3], 77);
}

#[test]
fn test_interpolation_halfway_between_slots() {
    let mut config = CompensationConfig::default();
    config.channels.probe = ChannelCalibration::new(20.0, 5.0, 10);
    let mut ctx = CompensationContext::new(&config).unwrap();
    ctx.set_offset(SensorChannel::Probe, 0, 0).unwrap();
    ctx.set_offset(SensorChannel::Probe, 1, 100).unwrap();

    let offset = ctx.get_offset_for_temperature(SensorChannel::Probe, 22.5);
    assert!((offset - 0.05).abs() < 1e-6, "got {}", offset);
}

#[test]
fn test_compensation_only_inside_channel_range() {
    let mut ctx = context();
    for i in 0..10 {
        ctx.set_offset(SensorChannel::Bed, i, 250).unwrap();
    }

    for temp in [59.9, 110.1, -40.0] {
        let mut z = 0.8;
        ctx.compensate_measurement(SensorChannel::Bed, temp, &mut z);
        assert_eq!(z, 0.8, "temperature {} must not be compensated", temp);
    }

    let mut z = 0.8;
    ctx.compensate_measurement(SensorChannel::Bed, 110.0, &mut z);
    assert!((z - 0.55).abs() < 1e-6);
}

#[test]
fn test_regression_with_identical_temperatures_is_singular() {
    let result = LinearFit::least_squares([(40.0, 120.0), (40.0, 180.0)]);
    assert_eq!(result, Err(CompensationError::SingularFit));
    assert_eq!(LinearFit::default(), LinearFit { k: 0.0, d: 0.0 });
}

#[test]
fn test_set_offset_out_of_range_changes_nothing() {
    let mut ctx = context();
    let before = ctx.snapshot();

    let result = ctx.set_offset(SensorChannel::Extruder, 20, 5);
    assert_eq!(
        result,
        Err(CompensationError::IndexOutOfRange {
            index: 20,
            capacity: 20
        })
    );
    assert_eq!(ctx.snapshot(), before);
}

#[test]
fn test_partial_calibration_then_probing() {
    let mut ctx = context();
    // Probe drifts 4 um per °C above its 30 °C start
    capture(&mut ctx, SensorChannel::Probe, 1.0, &[1.02, 1.04, 1.06, 1.08, 1.10]);
    ctx.finish_calibration(SensorChannel::Probe).unwrap();

    let offsets = ctx.offsets(SensorChannel::Probe).unwrap();
    assert_eq!(&offsets[..4], &[20, 40, 60, 80]);
    assert!((i32::from(offsets[9]) - 180).abs() <= 1);

    let mut z = 1.0;
    ctx.compensate_measurement(SensorChannel::Probe, 72.5, &mut z);
    assert!((z - (1.0 - 0.170)).abs() < 2e-3, "got {}", z);
}

#[test]
fn test_query_far_above_range_returns_last_slot() {
    let mut ctx = context();
    ctx.set_offset(SensorChannel::Probe, 9, 180).unwrap();

    for temp in [1.0e20, f32::MAX] {
        let offset = ctx.get_offset_for_temperature(SensorChannel::Probe, temp);
        assert!((offset - 0.180).abs() < 1e-6, "got {} at {}", offset, temp);
    }
}
