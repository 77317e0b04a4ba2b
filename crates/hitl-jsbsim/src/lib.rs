pub mod attribute;
pub mod launch;
pub mod model;
pub mod scenario;
pub mod session;

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub use attribute::Attribute;
pub use model::{FcsCommand, Jsbsim};
pub use session::{CommandChannel, Session, TcpChannel};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("jsbsim i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("jsbsim did not answer within {0:?}")]
    Timeout(Duration),
    #[error("jsbsim closed the connection")]
    Closed,
    #[error("No such attribute {0}")]
    NoSuchAttribute(&'static str),
    #[error("malformed value for {attribute}: {response:?}")]
    Malformed { attribute: &'static str, response: String },
    #[error("unknown attribute {0}")]
    UnknownAttribute(String),
    #[error("Could not bind to TCP input socket on port {0}")]
    BindFailed(u16),
    #[error("jsbsim exited before it was ready")]
    Exited,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JsbsimConfig {
    /// JSBSim executable, resolved through PATH when not absolute
    pub executable: PathBuf,

    /// Directory passed as `--root`; scenario files are written below it.
    pub root: PathBuf,

    /// Aircraft directory name under `<root>/aircraft/`
    pub aircraft: String,

    /// Optional aircraft definition to link as `<aircraft>.xml` for the run.
    /// Example: "Rascal110-JSBSim.xml"
    pub aircraft_definition: Option<String>,

    pub realtime: bool,

    /// TCP input port; random in 1000..10000 when unset
    pub port: Option<u16>,

    pub ready_timeout_ms: u64,
    pub command_timeout_ms: u64,

    pub initial: scenario::InitialConditions,
}

impl Default for JsbsimConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("JSBSim"),
            root: PathBuf::from("."),
            aircraft: "rascal".into(),
            aircraft_definition: None,
            realtime: true,
            port: None,
            ready_timeout_ms: 10_000,
            command_timeout_ms: 5_000,
            initial: scenario::InitialConditions::default(),
        }
    }
}

impl JsbsimConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}
