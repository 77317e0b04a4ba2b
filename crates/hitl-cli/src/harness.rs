//! Owns the two engine processes and the transient files of one run, and
//! tears them down exactly once regardless of how the run ended.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Child;
use tracing::{debug, info, warn};

const REAP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Default)]
pub struct Harness {
    jsbsim: Option<Child>,
    firmware: Option<Child>,
    artifacts: Vec<PathBuf>,
    torn_down: bool,
}

impl Harness {
    pub fn set_jsbsim(&mut self, child: Child) {
        self.jsbsim = Some(child);
    }

    pub fn set_firmware(&mut self, child: Child) {
        self.firmware = Some(child);
    }

    /// Registers a file to remove on teardown.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.artifacts.push(path.into());
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Kills both engines and removes every tracked file. Files that are
    /// already gone are fine; later calls do nothing.
    pub async fn teardown(&mut self) {
        if self.torn_down {
            debug!("harness: already torn down");
            return;
        }
        self.torn_down = true;

        for (name, child) in [("jsbsim", self.jsbsim.take()), ("firmware", self.firmware.take())] {
            if let Some(child) = child {
                kill(name, child).await;
            }
        }

        for path in self.artifacts.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("harness: removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => debug!("harness: {} already gone", path.display()),
                Err(e) => warn!("harness: remove {} failed: {}", path.display(), e),
            }
        }
        info!("harness: torn down");
    }
}

async fn kill(name: &str, mut child: Child) {
    if let Err(e) = child.start_kill() {
        debug!("harness: kill {}: {}", name, e);
    }
    match tokio::time::timeout(REAP_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) => debug!("harness: {} exited with {}", name, status),
        Ok(Err(e)) => warn!("harness: wait {}: {}", name, e),
        Err(_) => warn!("harness: {} did not exit within {:?}", name, REAP_TIMEOUT),
    }
}
