use std::fs::canonicalize;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;

use crate::blocks::dff::{Dff, DffReport};
use crate::cell::CellTechnology;
use crate::cli::args::Args;
use crate::cli::progress::{StepContext, TaskKey};
use crate::config::{parse_run_config, RunConfig};

pub mod args;
pub mod progress;

pub const BANNER: &str = r"
 __  __ ___ __  __  ___ ___  ___ _____
|  \/  | __|  \/  |/ __/ _ \/ __|_   _|
| |\/| | _|| |\/| | (_| (_) \__ \ | |
|_|  |_|___|_|  |_|\___\___/|___/ |_|

MEMCOST v0.1
";

pub fn run() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = canonicalize(&args.config)
        .with_context(|| format!("configuration file {:?} not found", &args.config))?;
    let quiet = args.json;

    if !quiet {
        println!("{BANNER}");
        println!("Reading configuration file...\n");
    }
    let config = parse_run_config(&config_path)?;
    info!("loaded configuration from {:?}", &config_path);

    if !quiet {
        println!("Configuration file: {:?}", &config_path);
        print_parameters(&config);
    }

    let mut ctx = StepContext::new(args.output.is_some(), quiet);
    let res = estimate(&config, &mut ctx);
    let report = ctx.check(res)?;

    if let Some(output) = &args.output {
        ctx.check(write_report(output, &report))?;
        ctx.finish(TaskKey::WriteReport);
    }

    if quiet {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        if let Some(output) = &args.output {
            println!("Report saved to: {:?}\n", output);
        }
    }

    Ok(())
}

/// Runs the flip-flop estimation stages described by `config`.
pub fn estimate(config: &RunConfig, ctx: &mut StepContext) -> Result<DffReport> {
    let (tech, cell) = config.build()?;
    let input = config.input();
    let mut dff = Dff::new(&input, &tech, &cell)?;
    ctx.finish(TaskKey::CharacterizeCell);

    let params = &config.dff;
    dff.initialize(params.num_bits, params.clock_frequency)?;
    ctx.finish(TaskKey::Initialize);

    dff.calculate_area(params.height, params.width, params.layout)?;
    ctx.finish(TaskKey::CalculateArea);

    dff.calculate_latency(params.ramp_input, params.load_factor)?;
    ctx.finish(TaskKey::CalculateLatency);

    dff.calculate_power(params.activity, params.toggle_count, params.include_leakage)?;
    ctx.finish(TaskKey::CalculatePower);

    dff.report()
        .ok_or_else(|| anyhow!("flip-flop estimation did not complete"))
}

fn write_report(path: &Path, report: &DffReport) -> Result<()> {
    let contents = serde_json::to_string_pretty(report)?;
    std::fs::write(path, contents).with_context(|| format!("failed to write {path:?}"))
}

fn print_parameters(config: &RunConfig) {
    let input = config.input();
    println!("Technology parameters:");
    println!("\tProcess node: {} nm", input.process_node);
    println!("\tDevice roadmap: {}", input.roadmap);
    println!("\tTransistor type: {}", input.transistor_type);
    println!("\tTemperature: {} K", input.temperature);
    let cell = match config.cell.params().technology {
        CellTechnology::Sram(_) => "SRAM".to_string(),
        CellTechnology::Nvm { family, access, .. } => format!("{family:?} ({access:?} access)"),
    };
    println!("Memory cell: {cell}");
    println!("Flip-flop parameters:");
    println!("\tNumber of bits: {}", config.dff.num_bits);
    println!("\tClock frequency: {:e} Hz", config.dff.clock_frequency);
    println!("\tLayout mode: {:?}\n", config.dff.layout);
}

fn print_report(report: &DffReport) {
    println!("Results:");
    println!(
        "\tArea: {:.6e} um^2 ({:.4} um x {:.4} um)",
        report.area_um2, report.height_um, report.width_um
    );
    println!("\tRead latency: {:.6e} ns", report.read_latency_ns);
    println!("\tRead dynamic energy: {:.6e} nJ", report.read_dynamic_energy_nj);
    println!(
        "\tLeakage: {:.6e} nA ({:.6e} uW)",
        report.leakage_na, report.leakage_power_uw
    );
    if !report.meets_timing {
        println!("\tWarning: latency exceeds the clock period");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DffConfig;

    #[test]
    fn test_estimate_reference_config() {
        let config = RunConfig::default();
        let mut ctx = StepContext::new(false, true);
        let report = estimate(&config, &mut ctx).unwrap();
        assert!(report.area_um2 > 0.0);
        assert!(report.read_latency_ns > 0.0);
        assert!(report.read_dynamic_energy_nj > 0.0);
        assert!(report.leakage_na > 0.0);
        assert!(ctx.current_step().is_none());
    }

    #[test]
    fn test_estimate_reports_stage_errors() {
        let config = RunConfig {
            dff: DffConfig {
                num_bits: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut ctx = StepContext::new(false, true);
        let res = estimate(&config, &mut ctx);
        let err = ctx.check(res).unwrap_err();
        let err = err.downcast_ref::<crate::Error>().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_write_report() {
        let config = RunConfig::default();
        let mut ctx = StepContext::new(true, true);
        let report = estimate(&config, &mut ctx).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&path, &report).unwrap();
        ctx.finish(TaskKey::WriteReport);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["meets_timing"], serde_json::Value::Bool(true));
        assert!(json["area_um2"].as_f64().unwrap() > 0.0);
    }
}
