use anyhow::{Context, Result};
use serde::Deserialize;

use hitl_bridge::BridgeConfig;
use hitl_jsbsim::JsbsimConfig;
use hitl_proto::control::PilotInput;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunCfg,
    /// constant pilot input pushed to the firmware every iteration
    #[serde(default)]
    pub pilot: PilotInput,
    #[serde(default)]
    pub jsbsim: JsbsimConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunCfg {
    /// simulated seconds before the run ends
    pub duration_s: f64,
    /// seconds per dynamics step / firmware tick
    pub step_s: f64,
    /// height above ground (ft) at or below which the aircraft counts as crashed
    pub min_height_ft: f64,
    /// print a status line per iteration
    pub status_line: bool,
}

impl Default for RunCfg {
    fn default() -> Self {
        Self { duration_s: 0.2, step_s: 0.001, min_height_ft: 1.0, status_line: true }
    }
}

impl RunCfg {
    pub fn step_us(&self) -> u64 {
        (self.step_s * 1e6).round() as u64
    }

    pub fn total_ticks(&self) -> u64 {
        (self.duration_s / self.step_s).round() as u64
    }

    pub fn check(&self) -> Result<()> {
        anyhow::ensure!(self.step_s > 0.0 && self.step_us() > 0, "run.step_s must be at least 1us");
        anyhow::ensure!(self.duration_s >= 0.0, "run.duration_s must not be negative");
        anyhow::ensure!(self.min_height_ft.is_finite(), "run.min_height_ft must be finite");
        Ok(())
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    toml::from_str(&s).context("parse config toml")
}
