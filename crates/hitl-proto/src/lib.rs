pub mod control;
pub mod coordinate;
pub mod sensors;
pub mod telemetry;
pub mod units;
