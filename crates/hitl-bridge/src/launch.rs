use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::{BridgeConfig, Error, Result};

const POLL: Duration = Duration::from_millis(100);

/// Starts the firmware simulator and waits for its socket to appear.
pub async fn spawn(cfg: &BridgeConfig) -> Result<Child> {
    // a stale socket from an earlier run would pass the readiness check
    match tokio::fs::remove_file(&cfg.socket).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let mut cmd = Command::new(&cfg.executable);
    cmd.arg("-l")
        .arg(&cfg.socket)
        .arg("--config")
        .arg(&cfg.config)
        .arg("--rate")
        .arg(cfg.rate.to_string())
        .arg("--altimeter-rate")
        .arg(cfg.altimeter_rate.to_string())
        .env("RUST_LOG", &cfg.log_level)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    info!("bridge: spawning {} -l {}", cfg.executable.display(), cfg.socket.display());
    let mut child = cmd.spawn()?;
    wait_for_socket(&cfg.socket, cfg.ready_timeout(), Some(&mut child)).await?;
    info!("bridge: socket {} ready", cfg.socket.display());
    Ok(child)
}

/// Polls for `path` every 100ms. Fails early if `child` exits first.
pub async fn wait_for_socket(path: &Path, timeout: Duration, mut child: Option<&mut Child>) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(());
        }
        if let Some(child) = child.as_deref_mut() {
            if let Some(status) = child.try_wait()? {
                return Err(Error::Exited(status.to_string()));
            }
        }
        if Instant::now() >= deadline {
            return Err(Error::NotReady { path: path.to_path_buf(), waited: timeout });
        }
        debug!("bridge: waiting for {}", path.display());
        time::sleep(POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn socket_appears() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("simulator.sock");
        let creator = {
            let sock = sock.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(150)).await;
                std::fs::write(sock, b"").unwrap();
            })
        };
        wait_for_socket(&sock, Duration::from_secs(2), None).await.unwrap();
        creator.await.unwrap();
    }

    #[tokio::test]
    async fn socket_never_appears() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("simulator.sock");
        let err = wait_for_socket(&sock, Duration::from_millis(150), None).await.unwrap_err();
        assert!(matches!(err, Error::NotReady { .. }));
    }

    #[tokio::test]
    async fn child_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut child = Command::new("sh").arg("-c").arg("exit 3").spawn().unwrap();
        let err = wait_for_socket(&dir.path().join("never.sock"), Duration::from_secs(5), Some(&mut child))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Exited(_)));
    }
}
