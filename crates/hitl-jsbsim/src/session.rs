//! Request/response session over JSBSim's text command socket.
//!
//! A [`Session`] owns two caches: attribute reads are remembered until the
//! next [`Session::advance_step`], and `set` commands are skipped when the
//! value equals the last one sent.

use std::collections::HashMap;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;
use tracing::{info, trace};

use crate::{Attribute, Error, Result};

/// Marker JSBSim prints after every response.
pub const PROMPT: &str = "JSBSim>";

#[allow(async_fn_in_trait)]
pub trait CommandChannel {
    /// Sends one command line and returns the text printed before the next prompt.
    async fn exec(&mut self, command: &str) -> Result<String>;
}

/// Line-oriented command channel delimited by [`PROMPT`].
pub struct PromptChannel<S> {
    stream: S,
    pending: Vec<u8>,
    timeout: Duration,
}

pub type TcpChannel = PromptChannel<TcpStream>;

impl TcpChannel {
    pub async fn connect(port: u16, timeout: Duration) -> Result<Self> {
        let stream = time::timeout(timeout, TcpStream::connect(("127.0.0.1", port)))
            .await
            .map_err(|_| Error::Timeout(timeout))??;
        stream.set_nodelay(true)?;
        let channel = PromptChannel::open(stream, timeout).await?;
        info!(port, "jsbsim: connected");
        Ok(channel)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> PromptChannel<S> {
    /// Wraps an established stream and consumes the greeting up to the first prompt.
    pub async fn open(stream: S, timeout: Duration) -> Result<Self> {
        let mut channel = Self { stream, pending: Vec::new(), timeout };
        time::timeout(timeout, channel.read_prompt())
            .await
            .map_err(|_| Error::Timeout(timeout))??;
        Ok(channel)
    }

    async fn read_prompt(&mut self) -> Result<String> {
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(pos) = find(&self.pending, PROMPT.as_bytes()) {
                let text = String::from_utf8_lossy(&self.pending[..pos]).into_owned();
                self.pending.drain(..pos + PROMPT.len());
                return Ok(text);
            }
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::Closed);
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }

    async fn roundtrip(&mut self, command: &str) -> Result<String> {
        self.stream.write_all(command.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        self.read_prompt().await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> CommandChannel for PromptChannel<S> {
    async fn exec(&mut self, command: &str) -> Result<String> {
        trace!("jsbsim > {}", command);
        let limit = self.timeout;
        let reply = time::timeout(limit, self.roundtrip(command))
            .await
            .map_err(|_| Error::Timeout(limit))??;
        trace!("jsbsim < {}", reply.trim());
        Ok(reply)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub struct Session<C> {
    channel: C,
    reads: HashMap<Attribute, f64>,
    writes: HashMap<Attribute, f64>,
}

impl<C: CommandChannel> Session<C> {
    pub fn new(channel: C) -> Self {
        Self { channel, reads: HashMap::new(), writes: HashMap::new() }
    }

    pub async fn read(&mut self, attribute: Attribute) -> Result<f64> {
        if let Some(value) = self.reads.get(&attribute) {
            return Ok(*value);
        }
        let reply = self.channel.exec(&format!("get {}", attribute.path())).await?;
        let value = parse_value(attribute, &reply)?;
        self.reads.insert(attribute, value);
        Ok(value)
    }

    pub async fn write(&mut self, attribute: Attribute, value: f64) -> Result<()> {
        if self.writes.get(&attribute) == Some(&value) {
            return Ok(());
        }
        self.channel.exec(&format!("set {} = {}", attribute.path(), value)).await?;
        self.writes.insert(attribute, value);
        Ok(())
    }

    /// Advances the model by one step. Drops the read cache, keeps the write cache.
    pub async fn advance_step(&mut self) -> Result<()> {
        self.reads.clear();
        self.channel.exec("iterate 1").await?;
        Ok(())
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

fn parse_value(attribute: Attribute, reply: &str) -> Result<f64> {
    let (_, rhs) = reply.split_once('=').ok_or(Error::NoSuchAttribute(attribute.path()))?;
    rhs.split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::Malformed { attribute: attribute.path(), response: reply.trim().to_string() })
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use super::CommandChannel;
    use crate::Result;

    /// Answers `get` from a fixed table and records every command.
    #[derive(Default)]
    pub struct TableChannel {
        pub values: HashMap<&'static str, f64>,
        pub log: Vec<String>,
    }

    impl TableChannel {
        pub fn with(values: &[(&'static str, f64)]) -> Self {
            Self { values: values.iter().copied().collect(), log: Vec::new() }
        }

        pub fn count(&self, prefix: &str) -> usize {
            self.log.iter().filter(|c| c.starts_with(prefix)).count()
        }
    }

    impl CommandChannel for TableChannel {
        async fn exec(&mut self, command: &str) -> Result<String> {
            self.log.push(command.to_string());
            if let Some(path) = command.strip_prefix("get ") {
                return Ok(match self.values.get(path) {
                    Some(v) => format!("{} = {}\n", path, v),
                    None => format!("Unknown property {}\n", path),
                });
            }
            Ok(String::new())
        }
    }
}
