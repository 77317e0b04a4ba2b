use std::str::FromStr;

use crate::Error;

/// JSBSim property paths the harness knows how to read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    PhiDeg,
    ThetaDeg,
    PsiDeg,
    PhiDotRadSec,
    ThetaDotRadSec,
    PsiDotRadSec,
    PilotAccelX,
    PilotAccelY,
    PilotAccelZ,
    LatitudeDeg,
    LongitudeDeg,
    AltitudeSeaLevelFt,
    HeightAglFt,
    VelocityUFps,
    VelocityVFps,
    VelocityWFps,
    VelocityDownFps,
    CalibratedAirspeedKts,
    TrueAirspeedKts,
    AlphaDeg,
    SimTimeSec,
    AileronCmd,
    ElevatorCmd,
    RudderCmd,
    ThrottleCmd,
    EngineRunning,
}

impl Attribute {
    pub const ALL: [Attribute; 26] = [
        Attribute::PhiDeg,
        Attribute::ThetaDeg,
        Attribute::PsiDeg,
        Attribute::PhiDotRadSec,
        Attribute::ThetaDotRadSec,
        Attribute::PsiDotRadSec,
        Attribute::PilotAccelX,
        Attribute::PilotAccelY,
        Attribute::PilotAccelZ,
        Attribute::LatitudeDeg,
        Attribute::LongitudeDeg,
        Attribute::AltitudeSeaLevelFt,
        Attribute::HeightAglFt,
        Attribute::VelocityUFps,
        Attribute::VelocityVFps,
        Attribute::VelocityWFps,
        Attribute::VelocityDownFps,
        Attribute::CalibratedAirspeedKts,
        Attribute::TrueAirspeedKts,
        Attribute::AlphaDeg,
        Attribute::SimTimeSec,
        Attribute::AileronCmd,
        Attribute::ElevatorCmd,
        Attribute::RudderCmd,
        Attribute::ThrottleCmd,
        Attribute::EngineRunning,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Attribute::PhiDeg => "attitude/phi-deg",
            Attribute::ThetaDeg => "attitude/theta-deg",
            Attribute::PsiDeg => "attitude/psi-deg",
            Attribute::PhiDotRadSec => "velocities/phidot-rad_sec",
            Attribute::ThetaDotRadSec => "velocities/thetadot-rad_sec",
            Attribute::PsiDotRadSec => "velocities/psidot-rad_sec",
            Attribute::PilotAccelX => "accelerations/n-pilot-x-norm",
            Attribute::PilotAccelY => "accelerations/n-pilot-y-norm",
            Attribute::PilotAccelZ => "accelerations/n-pilot-z-norm",
            Attribute::LatitudeDeg => "position/lat-gc-deg",
            Attribute::LongitudeDeg => "position/long-gc-deg",
            Attribute::AltitudeSeaLevelFt => "position/h-sl-ft",
            Attribute::HeightAglFt => "position/h-agl-ft",
            Attribute::VelocityUFps => "velocities/u-fps",
            Attribute::VelocityVFps => "velocities/v-fps",
            Attribute::VelocityWFps => "velocities/w-fps",
            Attribute::VelocityDownFps => "velocities/v-down-fps",
            Attribute::CalibratedAirspeedKts => "velocities/vc-kts",
            Attribute::TrueAirspeedKts => "velocities/vtrue-kts",
            Attribute::AlphaDeg => "aero/alpha-deg",
            Attribute::SimTimeSec => "simulation/sim-time-sec",
            Attribute::AileronCmd => "fcs/aileron-cmd-norm",
            Attribute::ElevatorCmd => "fcs/elevator-cmd-norm",
            Attribute::RudderCmd => "fcs/rudder-cmd-norm",
            Attribute::ThrottleCmd => "fcs/throttle-cmd-norm",
            Attribute::EngineRunning => "propulsion/engine[0]/set-running",
        }
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Attribute::ALL
            .iter()
            .copied()
            .find(|a| a.path() == s)
            .ok_or_else(|| Error::UnknownAttribute(s.to_string()))
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_path_parses_back() {
        for a in Attribute::ALL {
            assert_eq!(a.path().parse::<Attribute>().unwrap(), a);
        }
    }

    #[test]
    fn unknown_path_is_rejected() {
        let err = "position/h-agl-m".parse::<Attribute>().unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute(ref s) if s == "position/h-agl-m"));
    }
}
