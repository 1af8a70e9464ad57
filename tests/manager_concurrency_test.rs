//! Integration tests for the thread-safe compensation manager
//!
//! Calibration passes share one capture cursor. These tests verify that
//! passes started from different threads never interleave when driven
//! through `CompensationManager`.

use std::thread;

use probe_temp_comp::{CompensationManager, SensorChannel, ThermalReadings};

#[test]
fn test_parallel_calibrations_do_not_collide() {
    let manager = CompensationManager::default();

    let jobs = [
        (SensorChannel::Probe, 0.010_f32),
        (SensorChannel::Bed, 0.020_f32),
        (SensorChannel::ProbeWinter, 0.030_f32),
    ];

    let handles: Vec<_> = jobs
        .into_iter()
        .map(|(channel, step)| {
            let manager = manager.clone();
            thread::spawn(move || {
                let heights: Vec<f32> = (1..=10).map(|i| i as f32 * step).collect();
                for _ in 0..25 {
                    manager
                        .run_calibration(channel, 0.0, &heights)
                        .expect("calibration accepted");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("calibration thread panicked");
    }

    let snapshot = manager.snapshot().unwrap();
    for (channel, step) in jobs {
        let expected: Vec<i16> = (1..=10)
            .map(|i| (i as f32 * step * 1000.0).round() as i16)
            .collect();
        assert_eq!(
            snapshot.tables[&channel],
            expected,
            "{} table corrupted",
            channel.display_name()
        );
    }
}

#[test]
fn test_winter_toggle_from_another_thread() {
    let manager = CompensationManager::default();
    manager
        .with_context(|ctx| {
            for i in 0..10 {
                ctx.set_offset(SensorChannel::Probe, i, 50).unwrap();
                ctx.set_offset(SensorChannel::ProbeWinter, i, 200).unwrap();
            }
        })
        .unwrap();

    let readings = ThermalReadings::new(20.0, 40.0);
    let summer = manager.compensate_probing(&readings, 1.0).unwrap();
    assert!((summer - 0.95).abs() < 1e-5);

    let toggler = manager.clone();
    thread::spawn(move || toggler.set_winter_mode(true).unwrap())
        .join()
        .unwrap();

    let winter = manager.compensate_probing(&readings, 1.0).unwrap();
    assert!((winter - 0.8).abs() < 1e-5);
}

#[test]
fn test_snapshot_restore_between_managers() {
    let source = CompensationManager::default();
    source
        .run_calibration(SensorChannel::Bed, 0.5, &[0.52, 0.54, 0.56, 0.58])
        .unwrap();

    let target = CompensationManager::default();
    target.restore(&source.snapshot().unwrap()).unwrap();

    assert_eq!(source.snapshot().unwrap(), target.snapshot().unwrap());
}
