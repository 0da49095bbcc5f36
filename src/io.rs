//! Connections: one request/response cycle at a time over a persistent link

use crate::error::{DvidError, Result};
use crate::utils::body_text;
use bytes::Bytes;
use std::fmt;
use std::io::Read;

/// HTTP methods used by the DVID API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// One outgoing request; `path` includes the API root
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub content_type: Option<&'static str>,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            content_type: None,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, content_type: &'static str, body: Bytes) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            content_type: Some(content_type),
            body: Some(body),
        }
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

/// Status line plus a body stream that is read on demand.
///
/// The connection stays busy until the body has been read to the end and the
/// response dropped.
pub struct Response {
    pub status: u16,
    pub reason: String,
    body: Box<dyn Read + Send>,
}

impl Response {
    pub fn new(status: u16, reason: impl Into<String>, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: Box::new(body),
        }
    }

    /// Read whatever is left of the body
    pub fn read_body(&mut self) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        self.body.read_to_end(&mut body)?;
        Ok(body)
    }

    /// Consume the response into an [`DvidError::ErrorResponse`] for `action`
    pub fn into_error(mut self, action: &str) -> DvidError {
        let body = match self.read_body() {
            Ok(body) => body_text(&body),
            Err(e) => format!("<unreadable response body: {}>", e),
        };
        log::warn!(
            "{} failed with status {} {}",
            action,
            self.status,
            self.reason
        );
        DvidError::ErrorResponse {
            action: action.to_string(),
            status: self.status,
            reason: self.reason,
            body,
        }
    }
}

impl Read for Response {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.body.read(buf)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// A link to one server that carries one request/response cycle at a time.
///
/// Callers must finish with (read and drop) a [`Response`] before sending the
/// next request.
pub trait Connection: Send {
    fn send(&mut self, request: Request) -> Result<Response>;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn send(&mut self, request: Request) -> Result<Response> {
        (**self).send(request)
    }
}

#[cfg(feature = "http-client")]
pub use http::HttpConnection;

#[cfg(feature = "http-client")]
mod http {
    use super::{Connection, Method, Request, Response};
    use crate::config::ClientConfig;
    use crate::error::Result;
    use reqwest::blocking::Client;
    use reqwest::header::CONTENT_TYPE;

    /// HTTP/1.1 connection to one DVID server.
    ///
    /// Backed by a reqwest client whose pool keeps at most one idle socket, so
    /// sequential requests reuse the same keep-alive connection.
    #[derive(Debug, Clone)]
    pub struct HttpConnection {
        client: Client,
        base_url: String,
    }

    impl HttpConnection {
        pub fn connect(hostname: &str, config: &ClientConfig) -> Result<Self> {
            config.validate()?;
            let client = Client::builder()
                .user_agent(config.user_agent.clone())
                .pool_max_idle_per_host(1)
                .http1_only()
                .connect_timeout(config.connect_timeout)
                .timeout(config.request_timeout)
                .build()?;
            let base_url = config.base_url(hostname);
            log::debug!("prepared connection to {}", base_url);
            Ok(Self { client, base_url })
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }
    }

    impl Connection for HttpConnection {
        fn send(&mut self, request: Request) -> Result<Response> {
            let url = format!("{}{}", self.base_url, request.path);
            log::debug!("{} {} ({} bytes)", request.method, url, request.body_len());

            let mut builder = match request.method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
            };
            if let Some(content_type) = request.content_type {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            if let Some(body) = request.body {
                builder = builder.body(body.to_vec());
            }

            let response = builder.send()?;
            let status = response.status();
            Ok(Response::new(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                response,
            ))
        }
    }
}
