//! Command-line driver for the cam motion-law engine.
//!
//! Usage: `camlaw-app [params.json] [output.json]`
//!
//! Without arguments the default parameter set is synthesized. The preflight
//! report is logged item by item; failures are warnings, not fatal — the
//! caller of the engine decides what to do with a degraded table.

use std::env;
use std::error::Error;
use std::fs;

use camcore::{CamParams, MotionTable, TransmissionTables};
use log::{info, warn};
use motion::{preflight, synthesize};
use serde::Serialize;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use transmission::{JsonFileProvider, build_transmission};

#[derive(Serialize)]
struct RunOutput<'a> {
    params: &'a CamParams,
    motion: &'a MotionTable,
    transmission: &'a TransmissionTables,
}

fn main() -> Result<(), Box<dyn Error>> {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let mut args = env::args().skip(1);
    let params = match args.next() {
        Some(path) => {
            info!("loading parameters from {path}");
            serde_json::from_str(&fs::read_to_string(&path)?)?
        }
        None => CamParams::default(),
    };
    params.validate()?;

    let table = synthesize(&params)?;
    info!(
        "synthesized {} samples at {}° step",
        table.len(),
        table.step_deg
    );

    let report = preflight(&table);
    for item in &report.checks {
        if item.passed {
            info!("preflight {}: ok ({})", item.name, item.detail);
        } else {
            warn!("preflight {}: FAILED ({})", item.name, item.detail);
        }
    }
    if !report.passed {
        warn!("table failed preflight; downstream consumers may reject it");
    }

    // Reference curves, when published, live next to the binary under
    // reference/ keyed by the parameter set; absence just skips calibration.
    let provider = JsonFileProvider::new("reference");
    let tables = build_transmission(&table, &params, &provider);
    info!(
        "transmission: {} ratio samples, arc-length residual rms {:.3e}",
        tables.ratio.len(),
        tables.arc_length_residual_rms
    );

    let out_path = args.next().unwrap_or_else(|| "cam_tables.json".into());
    let output = RunOutput {
        params: &params,
        motion: &table,
        transmission: &tables,
    };
    fs::write(&out_path, serde_json::to_string_pretty(&output)?)?;
    info!("wrote {out_path}");
    Ok(())
}
