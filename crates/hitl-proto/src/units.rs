//! Conversions between the dynamics model's native units (feet, knots,
//! radians) and the firmware's (centimeters, millimeters per second,
//! fixed-point actuator ranges).
//!
//! Every function here is total over finite inputs.

pub const DEGREES_PER_RADIAN: f64 = 180.0 / std::f64::consts::PI;

pub const CENTIMETERS_PER_FOOT: f64 = 30.48;

/// Feet per second to millimeters per second. Not the exact 304.8; the
/// firmware's velocity scale was calibrated against this value.
pub const MMPS_PER_FPS: f64 = 303.0;

/// Largest value sent for a unipolar channel (throttle).
pub const THROTTLE_MAX: f64 = 65535.0;
/// Largest magnitude sent for a bipolar channel (roll/pitch/yaw).
pub const AXIS_MAX: f64 = 32767.0;

/// Full-scale of the firmware's unipolar actuator output.
pub const THROTTLE_FULL_SCALE: f64 = 65536.0;
/// Full-scale of the firmware's bipolar actuator output.
pub const AXIS_FULL_SCALE: f64 = 32768.0;

pub fn deg_per_sec(rad_per_sec: f64) -> f64 {
    rad_per_sec * DEGREES_PER_RADIAN
}

pub fn feet_to_cm(feet: f64) -> f64 {
    feet * CENTIMETERS_PER_FOOT
}

/// Altitude as the firmware's integer centimeters.
pub fn altitude_cm(feet: f64) -> i32 {
    feet_to_cm(feet).round() as i32
}

pub fn fps_to_mmps(fps: f64) -> f64 {
    fps * MMPS_PER_FPS
}

pub fn mmps_to_fps(mmps: f64) -> f64 {
    mmps / MMPS_PER_FPS
}

/// Direction of travel in degrees, (-180, 180], for a vector given in the
/// model's right (`x`) / forward (`y`) axes.
pub fn course_deg(x: f64, y: f64) -> f64 {
    x.atan2(y) * DEGREES_PER_RADIAN
}

/// Folds an angle into a compass bearing in [0, 360).
pub fn compass_bearing(deg: f64) -> f64 {
    let bearing = deg.rem_euclid(360.0);
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if bearing >= 360.0 { 0.0 } else { bearing }
}

pub fn throttle_to_firmware(value: f64) -> u16 {
    (value * THROTTLE_MAX).round().clamp(0.0, THROTTLE_MAX) as u16
}

pub fn axis_to_firmware(value: f64) -> i16 {
    (value * AXIS_MAX).round().clamp(-AXIS_MAX, AXIS_MAX) as i16
}

pub fn throttle_from_firmware(raw: i32) -> f64 {
    raw as f64 / THROTTLE_FULL_SCALE
}

pub fn axis_from_firmware(raw: i32) -> f64 {
    raw as f64 / AXIS_FULL_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rad_to_deg() {
        assert!((deg_per_sec(std::f64::consts::PI) - 180.0).abs() < 1e-9);
        assert!((deg_per_sec(-1.0) + 57.29577951308232).abs() < 1e-9);
    }

    #[test]
    fn altitude_is_rounded_centimeters() {
        assert_eq!(altitude_cm(100.0), 3048);
        assert_eq!(altitude_cm(6.6), 201);
        assert_eq!(altitude_cm(-1.0), -30);
    }

    #[test]
    fn velocity_uses_303_factor() {
        assert_eq!(fps_to_mmps(1.0), 303.0);
        for fps in [-250.0, -3.3, 0.0, 0.001, 17.25, 180.0] {
            let back = mmps_to_fps(fps_to_mmps(fps));
            assert!((back - fps).abs() < 1e-9, "{} -> {}", fps, back);
        }
    }

    #[test]
    fn course_quadrants() {
        assert_eq!(course_deg(0.0, 1.0), 0.0);
        assert!((course_deg(1.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((course_deg(0.0, -1.0) - 180.0).abs() < 1e-9);
        assert!((course_deg(-1.0, 0.0) + 90.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_wraps_into_compass_range() {
        assert_eq!(compass_bearing(-90.0), 270.0);
        assert_eq!(compass_bearing(180.0), 180.0);
        assert_eq!(compass_bearing(360.0), 0.0);
        assert_eq!(compass_bearing(0.0), 0.0);
        let tiny = compass_bearing(-1e-15);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn input_scaling_rounds_to_nearest() {
        assert_eq!(throttle_to_firmware(1.0), 65535);
        assert_eq!(throttle_to_firmware(0.5), 32768);
        assert_eq!(throttle_to_firmware(0.0), 0);
        assert_eq!(axis_to_firmware(-1.0), -32767);
        assert_eq!(axis_to_firmware(0.25), 8192);
    }

    #[test]
    fn axis_scaling_recovers_every_raw_value() {
        for raw in i16::MIN as i32..=i16::MAX as i32 {
            let back = axis_to_firmware(axis_from_firmware(raw)) as i32;
            assert!((back - raw).abs() <= 1, "{} -> {}", raw, back);
        }
    }

    #[test]
    fn throttle_scaling_recovers_every_raw_value() {
        for raw in 0..=u16::MAX as i32 {
            let back = throttle_to_firmware(throttle_from_firmware(raw)) as i32;
            assert!((back - raw).abs() <= 1, "{} -> {}", raw, back);
        }
    }
}
