//! Sensor payloads pushed to the firmware bridge.

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::coordinate::{Latitude, Longitude};

/// A body-frame three-vector, serialized as `[x, y, z]` with five decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

fn five_decimals(v: f64) -> f64 {
    (v * 1e5).round() / 1e5
}

impl Serialize for Axes {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut t = s.serialize_tuple(3)?;
        t.serialize_element(&five_decimals(self.x))?;
        t.serialize_element(&five_decimals(self.y))?;
        t.serialize_element(&five_decimals(self.z))?;
        t.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: Latitude,
    pub longitude: Longitude,
    /// centimeters above mean sea level
    pub altitude: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Fix {
    pub position: Position,
    /// compass bearing of travel, degrees
    pub course: f64,
    /// mm/s
    pub ground_speed: i32,
    /// mm/s, model x/y/z axes
    pub velocity_vector: [i32; 3],
    /// true heading, degrees
    pub heading: f64,
}

/// One GNSS fix; built once per GNSS period and sent as a single write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GnssRecord {
    pub fixed: Fix,
}
