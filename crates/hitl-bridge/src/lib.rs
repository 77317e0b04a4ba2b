pub mod doctor;
pub mod http;
pub mod launch;

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use hitl_proto::control::{ControlSurfaceCommand, InputError, PilotInput};
use hitl_proto::sensors::{Axes, GnssRecord};
use hitl_proto::telemetry::{Telemetry, TelemetryError, TelemetryFormat};

pub use http::{Method, Response, Transport, UnixHttp};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bridge i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("bridge did not answer within {0:?}")]
    Timeout(Duration),
    #[error("{method} {path} answered {status}")]
    Status { method: Method, path: &'static str, status: u16 },
    #[error("http: {0}")]
    Http(#[from] hyper::Error),
    #[error("build request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("encode request body: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("socket {} not ready after {waited:?}", .path.display())]
    NotReady { path: PathBuf, waited: Duration },
    #[error("firmware simulator exited early: {0}")]
    Exited(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// firmware simulator executable
    pub executable: PathBuf,
    /// Unix socket the simulator listens on; removed on teardown
    pub socket: PathBuf,
    /// firmware configuration file handed to the simulator
    pub config: PathBuf,

    /// IMU sample rate, Hz
    pub rate: u32,
    /// Hz; 0 disables the channel
    pub altimeter_rate: u32,
    /// Hz; 0 disables the channel
    pub gnss_rate: u32,

    /// Method for `/input` and `/sensors/*`. The simulator that serves `/tick`
    /// routes every write as PUT; the older POST-only build has no `/tick`.
    pub write_method: Method,
    pub telemetry: TelemetryFormat,

    pub timeout_ms: u64,
    pub ready_timeout_ms: u64,

    /// RUST_LOG handed to the simulator process
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("simulator"),
            socket: PathBuf::from("/tmp/simulator.sock"),
            config: PathBuf::from("simulator.yaml"),
            rate: 1000,
            altimeter_rate: 10,
            gnss_rate: 1,
            write_method: Method::Put,
            telemetry: TelemetryFormat::Full,
            timeout_ms: 1000,
            ready_timeout_ms: 10_000,
            log_level: "debug".into(),
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Accelerometer,
    Gyroscope,
    Altimeter,
    Gnss,
}

impl Channel {
    pub fn path(self) -> &'static str {
        match self {
            Channel::Accelerometer => "/sensors/accelerometer",
            Channel::Gyroscope => "/sensors/gyroscope",
            Channel::Altimeter => "/sensors/altimeter",
            Channel::Gnss => "/sensors/gnss",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SensorReading {
    /// g, firmware body axes
    Accelerometer(Axes),
    /// degrees per second, firmware body axes
    Gyroscope(Axes),
    /// centimeters above mean sea level
    Altimeter(i32),
    Gnss(GnssRecord),
}

impl SensorReading {
    pub fn channel(&self) -> Channel {
        match self {
            SensorReading::Accelerometer(_) => Channel::Accelerometer,
            SensorReading::Gyroscope(_) => Channel::Gyroscope,
            SensorReading::Altimeter(_) => Channel::Altimeter,
            SensorReading::Gnss(_) => Channel::Gnss,
        }
    }

    pub fn body(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            SensorReading::Accelerometer(a) | SensorReading::Gyroscope(a) => serde_json::to_vec(a),
            SensorReading::Altimeter(cm) => serde_json::to_vec(cm),
            SensorReading::Gnss(g) => serde_json::to_vec(g),
        }
    }
}

/// Client for the firmware-under-test's telemetry/actuation endpoint.
pub struct Bridge<T> {
    transport: T,
    write_method: Method,
    format: TelemetryFormat,
}

impl Bridge<UnixHttp> {
    pub fn connect(cfg: &BridgeConfig) -> Self {
        Bridge::new(UnixHttp::new(&cfg.socket, cfg.timeout()), cfg.write_method, cfg.telemetry)
    }
}

impl<T: Transport> Bridge<T> {
    pub fn new(transport: T, write_method: Method, format: TelemetryFormat) -> Self {
        Self { transport, write_method, format }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Out-of-domain input is rejected before anything is sent.
    pub async fn push_input(&mut self, input: &PilotInput) -> Result<()> {
        let body = serde_json::to_vec(&input.to_command()?)?;
        self.call(self.write_method, "/input", Some(&body)).await?;
        Ok(())
    }

    pub async fn push_sensor(&mut self, reading: &SensorReading) -> Result<()> {
        let channel = reading.channel();
        let body = reading.body()?;
        debug!("bridge: {} {}", channel.path(), String::from_utf8_lossy(&body));
        self.call(self.write_method, channel.path(), Some(&body)).await?;
        Ok(())
    }

    pub async fn pull_telemetry(&mut self) -> Result<Telemetry> {
        let response = self.call(Method::Get, "/telemetry", None).await?;
        Ok(Telemetry::parse(self.format, &response.body)?)
    }

    pub async fn pull_output(&mut self) -> Result<ControlSurfaceCommand> {
        Ok(self.pull_telemetry().await?.control()?)
    }

    /// Advances the firmware's simulated clock by one tick.
    pub async fn tick(&mut self) -> Result<()> {
        self.call(Method::Post, "/tick", None).await?;
        Ok(())
    }

    async fn call(&mut self, method: Method, path: &'static str, body: Option<&[u8]>) -> Result<Response> {
        let response = self.transport.request(method, path, body).await?;
        if !(200..300).contains(&response.status) {
            return Err(Error::Status { method, path, status: response.status });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitl_proto::coordinate::{Latitude, Longitude};
    use hitl_proto::sensors::{Fix, Position};

    #[derive(Default)]
    struct Recorder {
        requests: Vec<(Method, String, Option<String>)>,
        status: u16,
        telemetry: &'static str,
    }

    impl Transport for Recorder {
        async fn request(&mut self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Response> {
            let body_text = body.map(|b| String::from_utf8_lossy(b).into_owned());
            self.requests.push((method, path.to_string(), body_text));
            let body = if path == "/telemetry" { self.telemetry.as_bytes().to_vec() } else { Vec::new() };
            Ok(Response { status: self.status, body })
        }
    }

    fn bridge(status: u16) -> Bridge<Recorder> {
        let recorder = Recorder {
            status,
            telemetry: r#"{"engine": 65535, "aileron": 0, "elevator": -32768, "rudder": 16384}"#,
            ..Default::default()
        };
        Bridge::new(recorder, Method::Put, TelemetryFormat::Output)
    }

    #[tokio::test]
    async fn sensors_go_to_their_paths() {
        let mut b = bridge(200);
        b.push_sensor(&SensorReading::Accelerometer(Axes::new(0.0, 0.0, -1.0))).await.unwrap();
        b.push_sensor(&SensorReading::Gyroscope(Axes::new(1.5, 0.0, 0.0))).await.unwrap();
        b.push_sensor(&SensorReading::Altimeter(60960)).await.unwrap();

        let reqs = &b.transport().requests;
        assert_eq!(reqs[0], (Method::Put, "/sensors/accelerometer".into(), Some("[0.0,0.0,-1.0]".into())));
        assert_eq!(reqs[1].1, "/sensors/gyroscope");
        assert_eq!(reqs[2], (Method::Put, "/sensors/altimeter".into(), Some("60960".into())));
    }

    #[tokio::test]
    async fn gnss_is_one_write() {
        let mut b = bridge(200);
        let record = GnssRecord {
            fixed: Fix {
                position: Position { latitude: Latitude(1.0), longitude: Longitude(-1.0), altitude: 0 },
                course: 0.0,
                ground_speed: 0,
                velocity_vector: [0, 0, 0],
                heading: 0.0,
            },
        };
        b.push_sensor(&SensorReading::Gnss(record)).await.unwrap();
        let reqs = &b.transport().requests;
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].1, "/sensors/gnss");
        assert!(reqs[0].2.as_ref().unwrap().contains("\"ground-speed\":0"));
    }

    #[tokio::test]
    async fn input_is_validated_before_sending() {
        let mut b = bridge(200);
        let err = b.push_input(&PilotInput { throttle: 2.0, ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert!(b.transport().requests.is_empty());

        b.push_input(&PilotInput { throttle: 1.0, ..Default::default() }).await.unwrap();
        let (method, path, body) = &b.transport().requests[0];
        assert_eq!((*method, path.as_str()), (Method::Put, "/input"));
        assert_eq!(body.as_deref(), Some(r#"{"throttle":65535,"roll":0,"pitch":0,"yaw":0}"#));
    }

    #[tokio::test]
    async fn non_2xx_is_fatal() {
        let mut b = bridge(500);
        let err = b.tick().await.unwrap_err();
        assert!(matches!(err, Error::Status { path: "/tick", status: 500, .. }));
    }

    #[tokio::test]
    async fn tick_and_output() {
        let mut b = bridge(200);
        b.tick().await.unwrap();
        let out = b.pull_output().await.unwrap();
        assert_eq!(out, ControlSurfaceCommand { throttle: 65535, aileron: 0, elevator: -32768, rudder: 16384 });
        let reqs = &b.transport().requests;
        assert_eq!((reqs[0].0, reqs[0].1.as_str()), (Method::Post, "/tick"));
        assert_eq!((reqs[1].0, reqs[1].1.as_str()), (Method::Get, "/telemetry"));
    }

    /// Route table of the simulator build that serves `/tick`.
    #[derive(Default)]
    struct SimulatorRoutes {
        served: Vec<String>,
    }

    impl Transport for SimulatorRoutes {
        async fn request(&mut self, method: Method, path: &str, _body: Option<&[u8]>) -> Result<Response> {
            let allowed = match path {
                "/telemetry" => Method::Get,
                "/tick" => Method::Post,
                _ => Method::Put,
            };
            if method != allowed {
                return Ok(Response { status: 405, body: Vec::new() });
            }
            self.served.push(format!("{} {}", method, path));
            let body = if path == "/telemetry" {
                br#"{"engine": 0, "aileron": 0, "elevator": 0, "rudder": 0}"#.to_vec()
            } else {
                Vec::new()
            };
            Ok(Response { status: 200, body })
        }
    }

    #[tokio::test]
    async fn default_config_matches_simulator_routes() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.write_method, Method::Put);

        let mut b = Bridge::new(SimulatorRoutes::default(), cfg.write_method, TelemetryFormat::Output);
        b.push_input(&PilotInput::default()).await.unwrap();
        b.push_sensor(&SensorReading::Altimeter(0)).await.unwrap();
        b.pull_output().await.unwrap();
        b.tick().await.unwrap();
        assert_eq!(
            b.transport().served,
            ["PUT /input", "PUT /sensors/altimeter", "GET /telemetry", "POST /tick"]
        );
    }
}
