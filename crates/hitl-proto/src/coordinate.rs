use serde::{Serialize, Serializer};
use std::fmt;

/// Geodetic latitude in decimal degrees, positive north.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Latitude(pub f64);

/// Geodetic longitude in decimal degrees, positive east.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Longitude(pub f64);

// hemisphere, degrees, minutes, seconds with three decimals
fn write_dms(f: &mut fmt::Formatter<'_>, deg: f64, hemi: (char, char), width: usize) -> fmt::Result {
    let direction = if deg >= 0.0 { hemi.0 } else { hemi.1 };
    let millis = (deg.abs() * 3_600_000.0).round() as u64;
    let degrees = millis / 3_600_000;
    let minutes = (millis / 60_000) % 60;
    let seconds = millis % 60_000;
    write!(
        f,
        "{}{:0width$}°{:02}'{:02}.{:03}",
        direction,
        degrees,
        minutes,
        seconds / 1000,
        seconds % 1000,
        width = width
    )
}

impl fmt::Display for Latitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dms(f, self.0, ('N', 'S'), 2)
    }
}

impl fmt::Display for Longitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dms(f, self.0, ('E', 'W'), 3)
    }
}

impl Serialize for Latitude {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl Serialize for Longitude {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}
