//! Typed accessors over a [`Session`].
//!
//! Each accessor reads a fixed set of properties and assembles one sample.
//! Axis order and sign flips towards the firmware's body frame happen here,
//! so callers never touch raw property paths.

use crate::session::{CommandChannel, Session};
use crate::{Attribute, Result};

/// Degrees, aircraft convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub true_heading: f64,
}

/// Body angular rates in radians per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gyro {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Specific force at the pilot station in g, already in the firmware's axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Feet per second; `x` right, `y` forward, `z` down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Knots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed {
    pub calibrated: f64,
    pub true_airspeed: f64,
}

/// Flight control inputs in JSBSim's normalized ranges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FcsCommand {
    pub throttle: f64,
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
}

pub struct Jsbsim<C> {
    session: Session<C>,
}

impl<C: CommandChannel> Jsbsim<C> {
    pub fn new(channel: C) -> Self {
        Self { session: Session::new(channel) }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<C> {
        &mut self.session
    }

    pub async fn attitude(&mut self) -> Result<Attitude> {
        Ok(Attitude {
            roll: self.session.read(Attribute::PhiDeg).await?,
            pitch: self.session.read(Attribute::ThetaDeg).await?,
            true_heading: self.session.read(Attribute::PsiDeg).await?,
        })
    }

    pub async fn gyro(&mut self) -> Result<Gyro> {
        Ok(Gyro {
            roll: self.session.read(Attribute::PhiDotRadSec).await?,
            pitch: self.session.read(Attribute::ThetaDotRadSec).await?,
            yaw: self.session.read(Attribute::PsiDotRadSec).await?,
        })
    }

    pub async fn acceleration(&mut self) -> Result<Acceleration> {
        // JSBSim's pilot x/y are swapped and negated relative to the IMU frame
        Ok(Acceleration {
            x: -self.session.read(Attribute::PilotAccelY).await?,
            y: -self.session.read(Attribute::PilotAccelX).await?,
            z: self.session.read(Attribute::PilotAccelZ).await?,
        })
    }

    pub async fn velocity(&mut self) -> Result<Velocity> {
        Ok(Velocity {
            x: self.session.read(Attribute::VelocityVFps).await?,
            y: self.session.read(Attribute::VelocityUFps).await?,
            z: self.session.read(Attribute::VelocityWFps).await?,
        })
    }

    pub async fn position(&mut self) -> Result<Position> {
        Ok(Position {
            latitude: self.session.read(Attribute::LatitudeDeg).await?,
            longitude: self.session.read(Attribute::LongitudeDeg).await?,
        })
    }

    pub async fn speed(&mut self) -> Result<Speed> {
        Ok(Speed {
            calibrated: self.session.read(Attribute::CalibratedAirspeedKts).await?,
            true_airspeed: self.session.read(Attribute::TrueAirspeedKts).await?,
        })
    }

    /// Feet above mean sea level.
    pub async fn altitude_ft(&mut self) -> Result<f64> {
        self.session.read(Attribute::AltitudeSeaLevelFt).await
    }

    /// Feet above ground level.
    pub async fn height_agl_ft(&mut self) -> Result<f64> {
        self.session.read(Attribute::HeightAglFt).await
    }

    pub async fn aoa_deg(&mut self) -> Result<f64> {
        self.session.read(Attribute::AlphaDeg).await
    }

    /// Climb rate in feet per second, positive up.
    pub async fn vario_fps(&mut self) -> Result<f64> {
        Ok(-self.session.read(Attribute::VelocityDownFps).await?)
    }

    pub async fn set_controls(&mut self, control: &FcsCommand) -> Result<()> {
        self.session.write(Attribute::AileronCmd, control.aileron).await?;
        self.session.write(Attribute::ElevatorCmd, control.elevator).await?;
        self.session.write(Attribute::RudderCmd, control.rudder).await?;
        self.session.write(Attribute::ThrottleCmd, control.throttle).await
    }

    pub async fn step(&mut self, control: &FcsCommand) -> Result<()> {
        self.set_controls(control).await?;
        self.session.advance_step().await
    }
}
