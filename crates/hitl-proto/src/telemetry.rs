//! Telemetry records read back from `/telemetry`.
//!
//! The response shape depends on the firmware build, so the caller picks a
//! [`TelemetryFormat`] up front instead of probing fields.

use serde::{Deserialize, Serialize};

use crate::control::ControlSurfaceCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryFormat {
    /// flat actuator output: `{engine, aileron, elevator, rudder}`
    Output,
    /// nested IMU + FCS record
    #[default]
    Full,
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("malformed telemetry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("telemetry reports no engine output")]
    MissingEngine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub engine: i32,
    pub aileron: i32,
    pub elevator: i32,
    pub rudder: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imu {
    pub acceleration: [f64; 3],
    pub attitude: Attitude,
    pub gyro: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FixedWing {
    pub engines: Vec<f64>,
    pub aileron_left: f64,
    pub aileron_right: f64,
    pub elevator: f64,
    pub rudder: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fcs {
    pub output: Vec<f64>,
    pub control: FixedWing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightTelemetry {
    pub imu: Imu,
    pub fcs: Fcs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    Output(Output),
    Full(FlightTelemetry),
}

impl Telemetry {
    pub fn parse(format: TelemetryFormat, body: &[u8]) -> Result<Self, TelemetryError> {
        let telemetry = match format {
            TelemetryFormat::Output => Telemetry::Output(serde_json::from_slice(body)?),
            TelemetryFormat::Full => Telemetry::Full(serde_json::from_slice(body)?),
        };
        // reject a record we cannot turn into actuator output
        telemetry.control()?;
        Ok(telemetry)
    }

    pub fn control(&self) -> Result<ControlSurfaceCommand, TelemetryError> {
        match self {
            Telemetry::Output(o) => Ok(ControlSurfaceCommand {
                throttle: o.engine,
                aileron: o.aileron,
                elevator: o.elevator,
                rudder: o.rudder,
            }),
            Telemetry::Full(t) => {
                let c = &t.fcs.control;
                let engine = c.engines.first().ok_or(TelemetryError::MissingEngine)?;
                Ok(ControlSurfaceCommand {
                    throttle: engine.round() as i32,
                    aileron: c.aileron_left.round() as i32,
                    elevator: c.elevator.round() as i32,
                    rudder: c.rudder.round() as i32,
                })
            }
        }
    }

    /// Attitude as estimated by the firmware, when the record carries one.
    pub fn attitude(&self) -> Option<Attitude> {
        match self {
            Telemetry::Output(_) => None,
            Telemetry::Full(t) => Some(t.imu.attitude),
        }
    }
}
