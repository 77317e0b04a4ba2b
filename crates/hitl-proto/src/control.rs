use serde::{Deserialize, Serialize};

use crate::units;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputError {
    #[error("pilot input {field}={value} outside {min}..={max}")]
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },
}

/// Pilot stick/throttle input in normalized units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotInput {
    pub throttle: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl PilotInput {
    pub fn validate(&self) -> Result<(), InputError> {
        check("throttle", self.throttle, 0.0, 1.0)?;
        check("roll", self.roll, -1.0, 1.0)?;
        check("pitch", self.pitch, -1.0, 1.0)?;
        check("yaw", self.yaw, -1.0, 1.0)
    }

    /// Validates and scales to the firmware's integer ranges.
    pub fn to_command(&self) -> Result<InputCommand, InputError> {
        self.validate()?;
        Ok(InputCommand {
            throttle: units::throttle_to_firmware(self.throttle),
            roll: units::axis_to_firmware(self.roll),
            pitch: units::axis_to_firmware(self.pitch),
            yaw: units::axis_to_firmware(self.yaw),
        })
    }
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), InputError> {
    // NaN fails the range test too
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InputError::OutOfRange { field, value, min, max })
    }
}

/// Body of `/input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCommand {
    pub throttle: u16,
    pub roll: i16,
    pub pitch: i16,
    pub yaw: i16,
}

/// Actuator output as reported by the firmware, in its fixed-point ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlSurfaceCommand {
    pub throttle: i32,
    pub aileron: i32,
    pub elevator: i32,
    pub rudder: i32,
}

/// Control surface positions in the dynamics model's ranges:
/// throttle [0, 1], surfaces [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedControl {
    pub throttle: f64,
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
}

impl ControlSurfaceCommand {
    pub fn normalize(&self) -> NormalizedControl {
        NormalizedControl {
            throttle: units::throttle_from_firmware(self.throttle),
            aileron: units::axis_from_firmware(self.aileron),
            elevator: units::axis_from_firmware(self.elevator),
            rudder: units::axis_from_firmware(self.rudder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_throttle_command() {
        let cmd = PilotInput { throttle: 1.0, ..Default::default() }.to_command().unwrap();
        assert_eq!(cmd, InputCommand { throttle: 65535, roll: 0, pitch: 0, yaw: 0 });
    }

    #[test]
    fn nose_down_command() {
        let cmd = PilotInput { pitch: -1.0, ..Default::default() }.to_command().unwrap();
        assert_eq!(cmd.pitch, -32767);
        assert_eq!(cmd.throttle, 0);
    }

    #[test]
    fn rejects_out_of_domain() {
        let err = PilotInput { throttle: -0.1, ..Default::default() }.validate().unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { field: "throttle", .. }));

        let err = PilotInput { yaw: 1.5, ..Default::default() }.to_command().unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { field: "yaw", .. }));

        assert!(PilotInput { roll: f64::NAN, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn input_body_shape() {
        let body = serde_json::to_value(InputCommand { throttle: 1, roll: -2, pitch: 3, yaw: 0 }).unwrap();
        assert_eq!(body, serde_json::json!({"throttle": 1, "roll": -2, "pitch": 3, "yaw": 0}));
    }

    #[test]
    fn normalize_output() {
        let n = ControlSurfaceCommand { throttle: 32768, aileron: -16384, elevator: -32768, rudder: 0 }
            .normalize();
        assert_eq!(n, NormalizedControl { throttle: 0.5, aileron: -0.5, elevator: -1.0, rudder: 0.0 });
    }
}
