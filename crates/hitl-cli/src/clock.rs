use std::time::Duration;

/// Simulated time since the loop started, advanced in whole steps.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    step_us: u64,
    ticks: u64,
}

impl SimulationClock {
    pub fn new(step_us: u64) -> Self {
        Self { step_us, ticks: 0 }
    }

    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn elapsed_us(&self) -> u64 {
        self.ticks * self.step_us
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_us() / 1000
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_us())
    }
}

/// Decides whether a rate-limited channel is due at the current tick:
/// a channel at R Hz fires whenever elapsed time is a multiple of 1/R.
#[derive(Debug, Clone, Copy)]
pub struct RateGate {
    period_us: Option<u64>,
}

impl RateGate {
    /// A rate of 0 disables the channel.
    pub fn new(rate_hz: u32) -> Self {
        Self { period_us: (rate_hz > 0).then(|| 1_000_000 / rate_hz as u64) }
    }

    pub fn due(&self, clock: &SimulationClock) -> bool {
        match self.period_us {
            Some(period) if period > 0 => clock.elapsed_us() % period == 0,
            _ => false,
        }
    }
}
