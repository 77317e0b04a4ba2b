//! HTTP/1.1 to the firmware simulator's Unix socket, one connection per request.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::{self, SendRequest};
use hyper::header::{CONNECTION, CONTENT_TYPE, HOST};
use hyper::Request;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::time;
use tracing::trace;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    #[default]
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    fn to_http(self) -> hyper::Method {
        match self {
            Method::Get => hyper::Method::GET,
            Method::Post => hyper::Method::POST,
            Method::Put => hyper::Method::PUT,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn request(&mut self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Response>;
}

pub struct UnixHttp {
    socket: PathBuf,
    timeout: Duration,
}

impl UnixHttp {
    pub fn new(socket: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { socket: socket.into(), timeout }
    }

    async fn roundtrip(&self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Response> {
        let stream = UnixStream::connect(&self.socket).await?;
        let (sender, conn) = http1::handshake(TokioIo::new(stream)).await?;
        tokio::pin!(conn);

        let mut request = Request::builder()
            .method(method.to_http())
            .uri(path)
            .header(HOST, "localhost")
            .header(CONNECTION, "close");
        if body.is_some() {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        let request = request.body(Full::new(body.map(Bytes::copy_from_slice).unwrap_or_default()))?;

        // the connection future performs the socket i/o for the exchange
        let exchange = exchange(sender, request);
        tokio::pin!(exchange);
        let response = tokio::select! {
            response = &mut exchange => response?,
            closed = &mut conn => {
                closed?;
                exchange.await?
            }
        };
        trace!("bridge: {} {} -> {}", method, path, response.status);
        Ok(response)
    }
}

async fn exchange(mut sender: SendRequest<Full<Bytes>>, request: Request<Full<Bytes>>) -> Result<Response> {
    let response = sender.send_request(request).await?;
    let status = response.status().as_u16();
    let body = response.into_body().collect().await?.to_bytes().to_vec();
    Ok(Response { status, body })
}

impl Transport for UnixHttp {
    async fn request(&mut self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Response> {
        let limit = self.timeout;
        time::timeout(limit, self.roundtrip(method, path, body))
            .await
            .map_err(|_| Error::Timeout(limit))?
    }
}
