use anyhow::Result;
use std::time::Duration;

use crate::BridgeConfig;

/// Every enabled channel must fire on a whole number of steps, or the
/// modulus gate in the driver would skip it.
pub fn check_rates(cfg: &BridgeConfig, step: Duration) -> Result<()> {
    let step_us = step.as_micros() as u64;
    anyhow::ensure!(step_us > 0, "step must be at least 1us");
    anyhow::ensure!(cfg.rate > 0, "bridge.rate must be > 0");

    for (name, rate) in [("bridge.altimeter_rate", cfg.altimeter_rate), ("bridge.gnss_rate", cfg.gnss_rate)] {
        if rate == 0 {
            continue;
        }
        anyhow::ensure!(rate <= cfg.rate, "{} ({}Hz) exceeds bridge.rate ({}Hz)", name, rate, cfg.rate);
        anyhow::ensure!(1_000_000 % rate as u64 == 0, "{} ({}Hz) has no whole-microsecond period", name, rate);
        let period_us = 1_000_000 / rate as u64;
        anyhow::ensure!(
            period_us % step_us == 0,
            "{} period {}us is not a multiple of the {}us step",
            name,
            period_us,
            step_us
        );
    }
    Ok(())
}

pub fn check_timeouts(cfg: &BridgeConfig) -> Result<()> {
    anyhow::ensure!(cfg.timeout_ms > 0, "bridge.timeout_ms must be > 0");
    anyhow::ensure!(cfg.ready_timeout_ms >= 100, "bridge.ready_timeout_ms should be >= 100");
    Ok(())
}
