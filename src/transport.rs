//! Raw HTTP transport seam.
//!
//! The core never embeds retry or timeout policy beyond what the client is
//! built with; anything smarter (retries, backoff) belongs to the caller that
//! owns the transport. Tests substitute a canned implementation.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config;
use crate::error::{ArchiveError, Result};

/// A fetched payload: HTTP status plus raw body bytes.
#[derive(Debug, Clone)]
pub struct Payload {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Payload {
    /// Body decoded as UTF-8, lossily. The brand sites occasionally mix
    /// encodings and a replacement character beats losing the whole page.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Blocking GET-only transport the catalog and adapters fetch through.
///
/// Implementations own connection concerns (timeout, redirects, TLS).
/// Must be `Sync`: the orchestrator shares one transport across its workers.
pub trait Transport: Sync {
    /// Fetch `url`. A non-success HTTP status is an `Err`, not a payload.
    fn get(&self, url: &str) -> Result<Payload>;
}

/// Real transport over a `reqwest` blocking client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config::USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Payload> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ArchiveError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        let body = resp.bytes()?.to_vec();
        Ok(Payload {
            status: status.as_u16(),
            body,
        })
    }
}
