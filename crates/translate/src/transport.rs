//! HTTP transport abstraction.
//!
//! Providers only build [`Request`]s and parse response bodies; sending them
//! is left to an [`HttpTransport`] so tests can script provider responses.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Parameters are sent in the query string.
    Get,
    /// Parameters are sent as an `application/x-www-form-urlencoded` body.
    Post,
}

/// An outgoing provider request. Parameters may repeat (e.g. one `text` per
/// input text).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    /// All values of a parameter, in order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.params.iter().filter(|(n, _)| n == name).map(|(_, v)| v.as_str()).collect()
    }
}

/// Sends provider requests and returns the raw response body.
///
/// Error statuses are *not* a transport failure: providers report them in
/// the body, which is returned as-is for the provider to interpret.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: Request) -> Result<String>;
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build().or_raise(|| ErrorKind::Request)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<String> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.params),
            Method::Post => self.client.post(&request.url).form(&request.params),
        };
        let response = builder.send().await.or_raise(|| ErrorKind::Request)?;
        tracing::debug!(url = %request.url, status = %response.status(), "Provider responded");
        response.text().await.or_raise(|| ErrorKind::Request)
    }
}
