use rand::Rng;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time;
use tracing::{info, trace, warn};

use crate::{Error, JsbsimConfig, Result};

const BOUND: &str = "Successfully bound to TCP input socket on port";
const BIND_FAILED: &str = "Could not bind to TCP input socket";
// macOS builds print this instead of the bind messages
const EXECUTION_BEGINNING: &str = "JSBSim Execution beginning";

pub fn pick_port(cfg: &JsbsimConfig) -> u16 {
    cfg.port.unwrap_or_else(|| rand::thread_rng().gen_range(1000..10000))
}

/// Starts JSBSim on `script` and waits until its input socket is bound.
pub async fn spawn(cfg: &JsbsimConfig, script: &Path, port: u16) -> Result<Child> {
    let script = script.strip_prefix(&cfg.root).unwrap_or(script);
    let mut cmd = Command::new(&cfg.executable);
    if cfg.realtime {
        cmd.arg("--realtime");
    }
    cmd.arg("--root=.")
        .arg(script)
        .current_dir(&cfg.root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .kill_on_drop(true);

    info!("jsbsim: spawning {} {}", cfg.executable.display(), script.display());
    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take().ok_or(Error::Exited)?;
    let mut reader = BufReader::new(stdout);

    wait_ready(&mut reader, port, cfg.ready_timeout()).await?;
    info!(port, "jsbsim: input socket ready");

    // keep draining so the engine never blocks on a full pipe
    tokio::spawn(async move {
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            trace!("jsbsim: {}", line);
        }
    });
    Ok(child)
}

/// Scans engine output until the input socket is reported bound.
pub async fn wait_ready<R: AsyncBufRead + Unpin>(reader: &mut R, port: u16, timeout: Duration) -> Result<()> {
    time::timeout(timeout, scan_ready(reader, port))
        .await
        .map_err(|_| Error::Timeout(timeout))?
}

async fn scan_ready<R: AsyncBufRead + Unpin>(reader: &mut R, port: u16) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(Error::Exited);
        }
        trace!("jsbsim: {}", line.trim_end());
        if line.contains(BIND_FAILED) {
            warn!(port, "jsbsim: bind failed");
            return Err(Error::BindFailed(port));
        }
        if line.contains(BOUND) || (cfg!(target_os = "macos") && line.contains(EXECUTION_BEGINNING)) {
            return Ok(());
        }
    }
}
