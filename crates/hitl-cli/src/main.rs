use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use hitl_bridge::{doctor as bridge_doctor, launch as bridge_launch, Bridge, UnixHttp};
use hitl_jsbsim::{launch as jsbsim_launch, scenario, Attribute, Jsbsim, Session, TcpChannel};

mod clock;
mod config;
mod convert;
mod driver;
mod harness;

use config::{load_config, Config};
use driver::{Driver, DriverConfig, LoopState};
use harness::Harness;

#[derive(Debug, Parser)]
#[command(name = "hitl", version, about = "Closed-loop JSBSim / flight firmware test bench")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Launch both engines and fly until crash, time-out or Ctrl-C.
    Run {
        /// JSBSim executable (overrides jsbsim.executable)
        #[arg(long)]
        jsbsim: Option<PathBuf>,
        /// firmware simulator executable (overrides bridge.executable)
        #[arg(long)]
        simulator: Option<PathBuf>,
        /// firmware simulator config file (overrides bridge.config)
        #[arg(long)]
        simulator_config: Option<PathBuf>,
    },
    Doctor,
    /// Print attributes of an already running JSBSim.
    Probe {
        #[arg(long)]
        port: u16,
        #[arg(required = true)]
        attributes: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run { jsbsim, simulator, simulator_config } => {
            if let Some(exe) = jsbsim {
                cfg.jsbsim.executable = exe;
            }
            if let Some(exe) = simulator {
                cfg.bridge.executable = exe;
            }
            if let Some(file) = simulator_config {
                cfg.bridge.config = file;
            }
            run(&cfg).await?
        }
        Command::Probe { port, attributes } => probe(&cfg, port, &attributes).await?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    cfg.run.check()?;
    cfg.pilot.validate().context("pilot")?;
    bridge_doctor::check_rates(&cfg.bridge, Duration::from_micros(cfg.run.step_us()))?;
    bridge_doctor::check_timeouts(&cfg.bridge)?;
    anyhow::ensure!(cfg.jsbsim.command_timeout_ms > 0, "jsbsim.command_timeout_ms must be > 0");
    info!("doctor: OK");
    Ok(())
}

async fn run(cfg: &Config) -> Result<()> {
    doctor(cfg)?;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let mut harness = Harness::default();
    let started = tokio::select! {
        biased;
        _ = &mut interrupt => None,
        started = start(cfg, &mut harness) => Some(started),
    };

    if started.is_none() {
        warn!("run: interrupted during startup");
    }
    let outcome = driver::run_and_teardown(&mut harness, started, &mut interrupt).await;

    match outcome? {
        Some(summary) => {
            info!(
                "run: {:?}, {} iterations, {:.3}s simulated",
                summary.state,
                summary.iterations,
                summary.elapsed.as_secs_f64()
            );
            if summary.state == LoopState::Interrupted {
                warn!("run: interrupted by user");
            }
        }
        None => info!("run: {:?} before the first iteration", LoopState::Interrupted),
    }
    Ok(())
}

/// Writes the scenario and brings up JSBSim, then the firmware. Everything
/// started is registered with `harness` as soon as it exists.
async fn start(cfg: &Config, harness: &mut Harness) -> Result<Driver<TcpChannel, UnixHttp>> {
    let port = jsbsim_launch::pick_port(&cfg.jsbsim);
    let mut written = Vec::new();
    let script = scenario::write_scenario(&cfg.jsbsim, port, cfg.run.total_ticks(), cfg.run.step_s, &mut written);
    for path in written {
        harness.track(path);
    }
    let script = script.context("write JSBSim scenario")?;

    let child = jsbsim_launch::spawn(&cfg.jsbsim, &script, port).await.context("start JSBSim")?;
    harness.set_jsbsim(child);
    let channel = TcpChannel::connect(port, cfg.jsbsim.command_timeout())
        .await
        .with_context(|| format!("connect to JSBSim on port {}", port))?;

    harness.track(&cfg.bridge.socket);
    let child = bridge_launch::spawn(&cfg.bridge).await.context("start firmware simulator")?;
    harness.set_firmware(child);

    Ok(Driver::new(Jsbsim::new(channel), Bridge::connect(&cfg.bridge), DriverConfig::from_config(cfg)))
}

async fn probe(cfg: &Config, port: u16, names: &[String]) -> Result<()> {
    let attributes = names
        .iter()
        .map(|name| name.parse::<Attribute>())
        .collect::<Result<Vec<_>, _>>()?;

    let channel = TcpChannel::connect(port, cfg.jsbsim.command_timeout())
        .await
        .with_context(|| format!("connect to JSBSim on port {}", port))?;
    let mut session = Session::new(channel);
    for attribute in attributes {
        let value = session.read(attribute).await.with_context(|| format!("get {}", attribute))?;
        println!("{} = {}", attribute, value);
    }
    Ok(())
}
