//! The closed loop: JSBSim state in, firmware actuator output back.
//!
//! Every iteration is a strict sequence of blocking requests; pacing comes
//! from their round trips, not from sleeping.

use anyhow::{Context, Result};
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use hitl_bridge::{Bridge, Transport};
use hitl_jsbsim::{CommandChannel, Jsbsim};
use hitl_proto::control::PilotInput;

use crate::clock::{RateGate, SimulationClock};
use crate::config::Config;
use crate::convert;
use crate::harness::Harness;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Running,
    Crashed,
    TimeExpired,
    Interrupted,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Crashed | LoopState::TimeExpired | LoopState::Interrupted)
    }
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub step_us: u64,
    pub total_ticks: u64,
    pub min_height_ft: f64,
    pub altimeter_rate: u32,
    pub gnss_rate: u32,
    pub pilot: PilotInput,
    pub status_line: bool,
}

impl DriverConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            step_us: cfg.run.step_us(),
            total_ticks: cfg.run.total_ticks(),
            min_height_ft: cfg.run.min_height_ft,
            altimeter_rate: cfg.bridge.altimeter_rate,
            gnss_rate: cfg.bridge.gnss_rate,
            pilot: cfg.pilot,
            status_line: cfg.run.status_line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub state: LoopState,
    pub iterations: u64,
    pub elapsed: Duration,
}

pub struct Driver<C, T> {
    model: Jsbsim<C>,
    bridge: Bridge<T>,
    clock: SimulationClock,
    altimeter: RateGate,
    gnss: RateGate,
    cfg: DriverConfig,
    state: LoopState,
}

impl<C: CommandChannel, T: Transport> Driver<C, T> {
    pub fn new(model: Jsbsim<C>, bridge: Bridge<T>, cfg: DriverConfig) -> Self {
        Self {
            model,
            bridge,
            clock: SimulationClock::new(cfg.step_us),
            altimeter: RateGate::new(cfg.altimeter_rate),
            gnss: RateGate::new(cfg.gnss_rate),
            cfg,
            state: LoopState::Starting,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn model(&self) -> &Jsbsim<C> {
        &self.model
    }

    pub fn bridge(&self) -> &Bridge<T> {
        &self.bridge
    }

    pub fn summary(&self) -> Summary {
        Summary { state: self.state, iterations: self.clock.ticks(), elapsed: self.clock.elapsed() }
    }

    /// Iterates until a terminal state. `shutdown` completing moves the loop
    /// to `Interrupted`; an error from either engine aborts the run.
    pub async fn run<F: Future>(&mut self, shutdown: F) -> Result<Summary> {
        tokio::pin!(shutdown);
        self.state = LoopState::Running;
        info!("driver: running {} iterations of {}us", self.cfg.total_ticks, self.cfg.step_us);

        if self.clock.ticks() >= self.cfg.total_ticks {
            self.state = LoopState::TimeExpired;
        }
        while !self.state.is_terminal() {
            let step = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                next = self.iterate() => Some(next),
            };
            self.state = match step {
                Some(next) => next?,
                None => LoopState::Interrupted,
            };
        }

        if self.cfg.status_line {
            println!();
        }
        info!(
            "driver: {:?} after {} iterations ({:?} simulated)",
            self.state,
            self.clock.ticks(),
            self.clock.elapsed()
        );
        Ok(self.summary())
    }

    async fn iterate(&mut self) -> Result<LoopState> {
        self.bridge.push_input(&self.cfg.pilot).await.context("push pilot input")?;

        let acceleration = self.model.acceleration().await.context("read acceleration")?;
        self.bridge.push_sensor(&convert::accelerometer(&acceleration)).await.context("push acceleration")?;
        let gyro = self.model.gyro().await.context("read gyro")?;
        self.bridge.push_sensor(&convert::gyroscope(&gyro)).await.context("push gyro")?;

        if self.altimeter.due(&self.clock) {
            let altitude = self.model.altitude_ft().await.context("read altitude")?;
            self.bridge.push_sensor(&convert::altimeter(altitude)).await.context("push altitude")?;
        }
        if self.gnss.due(&self.clock) {
            let position = self.model.position().await.context("read position")?;
            let altitude = self.model.altitude_ft().await.context("read altitude")?;
            let velocity = self.model.velocity().await.context("read velocity")?;
            let attitude = self.model.attitude().await.context("read attitude")?;
            let record = convert::gnss(&position, altitude, &velocity, &attitude);
            self.bridge
                .push_sensor(&hitl_bridge::SensorReading::Gnss(record))
                .await
                .context("push gnss")?;
        }

        let output = self.bridge.pull_output().await.context("pull firmware output")?;
        let command = convert::fcs_command(&output);
        debug!("driver: output {:?} -> {:?}", output, command);
        self.model.step(&command).await.context("step JSBSim")?;
        self.bridge.tick().await.context("tick firmware")?;
        self.clock.advance();

        let height = self.model.height_agl_ft().await.context("read height")?;
        let speed = self.model.speed().await.context("read speed")?;
        if self.cfg.status_line {
            print!(
                "\rIteration {}/{}, speed: {:.0}, height: {:.0}",
                self.clock.ticks(),
                self.cfg.total_ticks,
                speed.calibrated,
                height
            );
            let _ = std::io::stdout().flush();
        }

        if height <= self.cfg.min_height_ft {
            info!("driver: crashed at {:.1}ft after {:?}", height, self.clock.elapsed());
            return Ok(LoopState::Crashed);
        }
        if self.clock.ticks() >= self.cfg.total_ticks {
            return Ok(LoopState::TimeExpired);
        }
        Ok(LoopState::Running)
    }
}

/// Drives a started loop to its terminal state, then tears `harness` down.
/// A startup that failed, or was interrupted (`None`), ends in the same
/// teardown.
pub async fn run_and_teardown<C, T, F>(
    harness: &mut Harness,
    started: Option<Result<Driver<C, T>>>,
    shutdown: F,
) -> Result<Option<Summary>>
where
    C: CommandChannel,
    T: Transport,
    F: Future,
{
    let outcome = match started {
        None => Ok(None),
        Some(Err(e)) => Err(e),
        Some(Ok(mut driver)) => driver.run(shutdown).await.map(Some),
    };
    harness.teardown().await;
    outcome
}
