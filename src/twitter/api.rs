//! HTTP transport used by the search session.
//!
//! The session only needs an authenticated GET. [`HttpTransport`] is that capability;
//! [`ReqwestTransport`] provides it with a blocking `reqwest` client that signs every
//! request with the configured credentials.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;

use crate::config::TwitterConfig;
use crate::error::Result;
use crate::oauth::Credentials;

/// Response headers, keyed by lower-case header name.
pub type Metadata = BTreeMap<String, String>;

/// A completed HTTP round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Metadata,
    pub body: Vec<u8>,
}

/// Authenticated HTTP GET.
///
/// Credentials and proxy settings belong to the implementation. Any completed round-trip
/// is `Ok`, whatever its status; `Err` means no response was received.
pub trait HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for Box<T> {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url)
    }
}

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// Newlines and tabs become spaces, other control characters become `?`, and text longer
/// than `max_len` bytes is cut at the nearest character boundary.
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.len() > max_len {
        let mut end = max_len;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, {} total bytes]",
            &sanitized[..end],
            text.len()
        )
    } else {
        sanitized
    }
}

/// URL without its query string, for info-level logs.
fn loggable_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Blocking `reqwest` client signing each request with the configured credentials.
pub struct ReqwestTransport {
    client: Client,
    credentials: Credentials,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Builds the client with the configured timeout and, if set, the HTTPS proxy.
    pub fn new(config: &TwitterConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tweetsearch/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = &config.proxy {
            info!("Routing HTTPS requests through proxy {}", proxy);
            builder = builder.proxy(reqwest::Proxy::https(proxy.as_str())?);
        }

        Ok(Self {
            client: builder.build()?,
            credentials: config.credentials.clone(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        info!("Sending GET request to {}", loggable_url(url));
        debug!("Full request URL: {}", url);

        let auth_header = self.credentials.authorization_header("GET", url)?;
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, auth_header)
            .send()?;

        let status = response.status();
        info!("Received response with status: {}", status);

        let headers: Metadata = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes()?.to_vec();
        debug!("Response summary: {} bytes received", body.len());

        if !status.is_success() {
            warn!("Request to {} failed - Status: {}", loggable_url(url), status);
            debug!(
                "Error response: {}",
                sanitize_for_logging(&String::from_utf8_lossy(&body), 200)
            );
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
