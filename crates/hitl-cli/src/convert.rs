//! Maps dynamics-model samples onto firmware sensor payloads and firmware
//! actuator output back onto model control inputs.

use hitl_bridge::SensorReading;
use hitl_jsbsim::model::{Acceleration, Attitude, Gyro, Position, Velocity};
use hitl_jsbsim::FcsCommand;
use hitl_proto::control::ControlSurfaceCommand;
use hitl_proto::coordinate::{Latitude, Longitude};
use hitl_proto::sensors::{self, Axes, Fix, GnssRecord};
use hitl_proto::units;

pub fn accelerometer(a: &Acceleration) -> SensorReading {
    SensorReading::Accelerometer(Axes::new(a.x, a.y, a.z))
}

/// Roll/pitch/yaw rates become the firmware's x/y/z in degrees per second.
pub fn gyroscope(g: &Gyro) -> SensorReading {
    SensorReading::Gyroscope(Axes::new(
        units::deg_per_sec(g.roll),
        units::deg_per_sec(g.pitch),
        units::deg_per_sec(g.yaw),
    ))
}

pub fn altimeter(altitude_ft: f64) -> SensorReading {
    SensorReading::Altimeter(units::altitude_cm(altitude_ft))
}

pub fn gnss(position: &Position, altitude_ft: f64, velocity: &Velocity, attitude: &Attitude) -> GnssRecord {
    let vx = units::fps_to_mmps(velocity.x);
    let vy = units::fps_to_mmps(velocity.y);
    let vz = units::fps_to_mmps(velocity.z);
    GnssRecord {
        fixed: Fix {
            position: sensors::Position {
                latitude: Latitude(position.latitude),
                longitude: Longitude(position.longitude),
                altitude: units::altitude_cm(altitude_ft),
            },
            course: units::compass_bearing(units::course_deg(velocity.x, velocity.y)),
            ground_speed: vx.hypot(vy).round() as i32,
            velocity_vector: [vx.round() as i32, vy.round() as i32, vz.round() as i32],
            heading: units::compass_bearing(attitude.true_heading),
        },
    }
}

pub fn fcs_command(output: &ControlSurfaceCommand) -> FcsCommand {
    let n = output.normalize();
    FcsCommand { throttle: n.throttle, aileron: n.aileron, elevator: n.elevator, rudder: n.rudder }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gyro_in_degrees() {
        let reading = gyroscope(&Gyro { roll: std::f64::consts::FRAC_PI_2, pitch: 0.0, yaw: -std::f64::consts::PI });
        let SensorReading::Gyroscope(axes) = reading else { panic!("wrong channel") };
        assert!((axes.x - 90.0).abs() < 1e-9);
        assert!((axes.z + 180.0).abs() < 1e-9);
    }

    #[test]
    fn gnss_fix_from_model_state() {
        let record = gnss(
            &Position { latitude: 29.593978, longitude: -95.163839 },
            2006.6,
            &Velocity { x: -10.0, y: 0.0, z: 1.0 },
            &Attitude { roll: 0.0, pitch: 0.0, true_heading: -90.0 },
        );
        let fix = record.fixed;
        assert_eq!(fix.position.altitude, 61161);
        assert_eq!(fix.velocity_vector, [-3030, 0, 303]);
        assert_eq!(fix.ground_speed, 3030);
        assert!((fix.course - 270.0).abs() < 1e-9);
        assert_eq!(fix.heading, 270.0);
        assert_eq!(fix.position.latitude.to_string(), "N29°35'38.321");
    }

    #[test]
    fn firmware_output_to_model_ranges() {
        let cmd = fcs_command(&ControlSurfaceCommand { throttle: 0, aileron: 0, elevator: -32767, rudder: 32767 });
        assert_eq!(cmd.throttle, 0.0);
        assert!((cmd.elevator + 1.0).abs() < 1e-4);
        assert!((cmd.rudder - 1.0).abs() < 1e-4);
    }
}
