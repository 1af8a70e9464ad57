use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use probe_temp_comp::{
    CompensationConfig, CompensationContext, ErrorCode, OffsetSnapshot, SensorChannel,
    ThermalReadings,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "ptc_cli",
    about = "Inspect and build probe temperature compensation tables"
)]
struct Cli {
    /// JSON compensation config (defaults to the built-in machine profile)
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON offset snapshot to load before running the command
    #[arg(long)]
    tables: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dump every table as temperature/offset rows
    Print,
    /// Look up the offset (mm) of one channel at a temperature
    Query {
        #[arg(long)]
        channel: SensorChannel,
        #[arg(long)]
        temp: f32,
    },
    /// Correct a probed height using sensor temperatures
    Compensate {
        #[arg(long)]
        bed_temp: f32,
        #[arg(long)]
        probe_temp: f32,
        #[arg(long)]
        hotend_temp: Option<f32>,
        /// Raw probed height (mm)
        #[arg(long, allow_hyphen_values = true)]
        z: f32,
        /// Use the winter probe profile
        #[arg(long)]
        winter: bool,
    },
    /// Build a table from captured heights and emit the resulting snapshot
    Calibrate {
        #[arg(long)]
        channel: SensorChannel,
        /// Height (mm) measured before heating
        #[arg(long, allow_hyphen_values = true)]
        reference: f32,
        /// Heights (mm), one per temperature step, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        measurements: Vec<f32>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_deref()
        .map(CompensationConfig::load_from_file)
        .unwrap_or_default();
    let mut context = CompensationContext::new(&config)?;

    if let Some(path) = cli.tables.as_deref() {
        let snapshot = load_snapshot(path)?;
        context
            .restore(&snapshot)
            .with_context(|| format!("restoring tables from {}", path.display()))?;
        tracing::info!("[ptc_cli] Restored tables from {}", path.display());
    }

    match cli.command {
        Commands::Print => run_print(&context),
        Commands::Query { channel, temp } => run_query(&context, channel, temp),
        Commands::Compensate {
            bed_temp,
            probe_temp,
            hotend_temp,
            z,
            winter,
        } => {
            if winter {
                context.set_winter_mode(true);
            }
            let mut readings = ThermalReadings::new(bed_temp, probe_temp);
            if let Some(hotend) = hotend_temp {
                readings = readings.with_hotend(hotend);
            }
            run_compensate(&context, &readings, z)
        }
        Commands::Calibrate {
            channel,
            reference,
            measurements,
            output,
        } => run_calibrate(&mut context, channel, reference, &measurements, output),
    }
}

fn load_snapshot(path: &Path) -> Result<OffsetSnapshot> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

fn run_print(context: &CompensationContext) -> Result<ExitCode> {
    context.print_offsets(&mut io::stdout().lock())?;
    Ok(ExitCode::from(0))
}

fn run_query(context: &CompensationContext, channel: SensorChannel, temp: f32) -> Result<ExitCode> {
    if context.calibration(channel).is_none() {
        eprintln!("{} is not configured", channel.display_name());
        return Ok(ExitCode::from(2));
    }
    let payload = QueryPayload {
        channel,
        temperature: temp,
        offset_mm: context.get_offset_for_temperature(channel, temp),
    };
    println!("{}", serde_json::to_string(&payload)?);
    Ok(ExitCode::from(0))
}

fn run_compensate(
    context: &CompensationContext,
    readings: &ThermalReadings,
    z: f32,
) -> Result<ExitCode> {
    let payload = CompensatePayload {
        winter: context.is_winter(),
        readings,
        measured_z: z,
        corrected_z: context.compensate_probing(readings, z),
    };
    println!("{}", serde_json::to_string(&payload)?);
    Ok(ExitCode::from(0))
}

fn run_calibrate(
    context: &mut CompensationContext,
    channel: SensorChannel,
    reference: f32,
    measurements: &[f32],
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    context.prepare_new_calibration(reference);
    for &z in measurements {
        context.push_back_new_measurement(channel, z);
    }

    if let Err(err) = context.finish_calibration(channel) {
        eprintln!("!{} (code {})", err.message(), err.code());
        return Ok(ExitCode::from(2));
    }

    let json = serde_json::to_string_pretty(&context.snapshot())?;
    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct QueryPayload {
    channel: SensorChannel,
    temperature: f32,
    offset_mm: f32,
}

#[derive(Serialize)]
struct CompensatePayload<'a> {
    winter: bool,
    readings: &'a ThermalReadings,
    measured_z: f32,
    corrected_z: f32,
}
