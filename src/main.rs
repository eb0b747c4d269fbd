use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use traffic_observer::{
    write_json, write_report, Observer, Result, Session, SimulatorConfig, TraciClient,
};

/// Runs a SUMO scenario to completion and reports vehicle travel times.
#[derive(Parser, Debug)]
#[command(name = "traffic-observer", version, about, long_about = None)]
struct Args {
    /// TOML file with simulator settings. Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Override the simulator executable, e.g. `sumo` for a headless run.
    #[arg(long)]
    binary: Option<String>,

    /// Override the scenario configuration passed to the simulator.
    #[arg(long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Serve TraCI on this port instead of a free one.
    #[arg(long)]
    port: Option<u16>,

    /// Also write every completed record to this file as JSON.
    #[arg(long, value_name = "FILE")]
    records: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level.as_str()),
    )
    .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config_file {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SimulatorConfig::load(path)?
        }
        None => SimulatorConfig::default(),
    };
    if let Some(binary) = &args.binary {
        config.binary = binary.clone();
    }
    if let Some(scenario) = &args.scenario {
        config.config_path = scenario.clone();
    }
    if args.port.is_some() {
        config.port = args.port;
    }

    println!("Running SUMO simulation...");
    let home = config.check_environment()?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Could not install the Ctrl-C handler: {}", err);
    }

    let mut session = Session::new(TraciClient::launch(&config, &home)?);
    let outcome = Observer::with_interrupt(interrupt).run(&mut *session)?;
    session.close()?;

    write_report(&outcome.records, &mut std::io::stdout().lock())?;

    if let Some(path) = &args.records {
        write_json(&outcome, BufWriter::new(File::create(path)?))?;
        info!("Wrote {} records to {}", outcome.records.len(), path.display());
    }
    Ok(())
}
