//! Configuration module for the tweetsearch client.
//!
//! This module contains the configuration structures and environment variable handling
//! for the Twitter API v1.1 search and timeline endpoints.

use std::env;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::error::{ErrorKind, Result, TwitterSearchError};
use crate::oauth::Credentials;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Paths of the API endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub search: String,
    pub user_timeline: String,
    pub languages: String,
    pub verify_credentials: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search: "search/tweets.json".to_string(),
            user_timeline: "statuses/user_timeline.json".to_string(),
            languages: "help/languages.json".to_string(),
            verify_credentials: "account/verify_credentials.json".to_string(),
        }
    }
}

/// Configuration for a search session.
///
/// Holds the credentials every request is signed with, where the API lives, and how the
/// HTTP client is set up. The credentials are never printed in full: `Debug` masks them.
#[derive(Debug, Clone)]
pub struct TwitterConfig {
    pub credentials: Credentials,
    /// Base URL of the API, always ending in `/`.
    pub base_url: String,
    pub endpoints: Endpoints,
    /// HTTPS proxy, e.g. `my.proxy.com:8080`.
    pub proxy: Option<String>,
    /// When true, sessions check the credentials once when they are created.
    pub verify_credentials: bool,
    pub timeout: Duration,
}

/// Masks a secret for logging, keeping at most the first and last eight characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let length = chars.len();

    let prefix: String = chars.iter().take(8).collect();
    if length > 16 {
        let suffix: String = chars[length - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        format!("{}...", prefix)
    }
}

/// Reads a required variable, logging its length and masked value.
fn load_secret(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) => {
            info!(
                "Found {} environment variable with length: {}",
                name,
                value.len()
            );
            debug!("{} (masked): {}", name, mask_secret(&value));

            if value.is_empty() {
                error!("{} is empty", name);
                return Err(TwitterSearchError::Config(format!("{} cannot be empty", name)));
            }
            if value.len() < 10 {
                warn!(
                    "{} seems unusually short ({} characters)",
                    name,
                    value.len()
                );
            }
            Ok(value)
        }
        Err(e) => {
            error!("Failed to load {} from environment: {}", name, e);
            Err(TwitterSearchError::Config(format!(
                "Missing {} environment variable: {}",
                name, e
            )))
        }
    }
}

fn load_optional(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            info!("Found {} environment variable", name);
            Some(value)
        }
        _ => {
            debug!("No {} found in environment variables", name);
            None
        }
    }
}

const OAUTH1_VARIABLES: [&str; 4] = [
    "xapi_consumer_key",
    "xapi_consumer_secret",
    "xapi_access_token",
    "xapi_access_token_secret",
];

impl TwitterConfig {
    /// Creates a configuration with the default base URL, endpoints and timeout.
    ///
    /// Credential verification is enabled and no proxy is used.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: Endpoints::default(),
            proxy: None,
            verify_credentials: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Loads the configuration from environment variables.
    ///
    /// # Credentials
    ///
    /// Either all four OAuth 1.0a user context variables
    ///
    /// - `xapi_consumer_key`, `xapi_consumer_secret`
    /// - `xapi_access_token`, `xapi_access_token_secret`
    ///
    /// or the app-only `xapi_bearer_token`. A partial OAuth 1.0a set is an error.
    ///
    /// # Optional Environment Variables
    ///
    /// - `xapi_base_url`: API base URL (defaults to `https://api.twitter.com/1.1/`)
    /// - `xapi_proxy`: HTTPS proxy, e.g. `my.proxy.com:8080`
    /// - `xapi_verify_credentials`: `true`/`false`, defaults to `true`
    /// - `xapi_timeout_secs`: request timeout in seconds, defaults to 30
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use tweetsearch::TwitterConfig;
    ///
    /// std::env::set_var("xapi_bearer_token", "your_bearer_token");
    /// let config = TwitterConfig::from_env().unwrap();
    /// ```
    pub fn from_env() -> Result<Self> {
        info!("Loading Twitter configuration from environment variables");

        let present: Vec<&str> = OAUTH1_VARIABLES
            .iter()
            .copied()
            .filter(|name| env::var(name).is_ok())
            .collect();

        let credentials = if !present.is_empty() {
            if present.len() < OAUTH1_VARIABLES.len() {
                let missing: Vec<&str> = OAUTH1_VARIABLES
                    .iter()
                    .copied()
                    .filter(|name| !present.contains(name))
                    .collect();
                error!("Incomplete OAuth 1.0a credentials, missing: {:?}", missing);
                return Err(TwitterSearchError::Config(format!(
                    "Incomplete OAuth 1.0a credentials, missing: {}",
                    missing.join(", ")
                )));
            }
            info!("Using OAuth 1.0a user context authentication");
            Credentials::OAuth1 {
                consumer_key: load_secret("xapi_consumer_key")?,
                consumer_secret: load_secret("xapi_consumer_secret")?,
                access_token: load_secret("xapi_access_token")?,
                access_token_secret: load_secret("xapi_access_token_secret")?,
            }
        } else if env::var("xapi_bearer_token").is_ok() {
            info!("Using app-only bearer token authentication");
            Credentials::Bearer(load_secret("xapi_bearer_token")?)
        } else {
            error!("No Twitter credentials found in environment variables");
            error!("Set the xapi_consumer_* and xapi_access_token* variables, or xapi_bearer_token");
            return Err(TwitterSearchError::Config(
                "Missing Twitter credentials in environment".to_string(),
            ));
        };

        let mut config = Self::new(credentials);

        if let Some(base_url) = load_optional("xapi_base_url") {
            config = config.with_base_url(&base_url)?;
        }
        if let Some(proxy) = load_optional("xapi_proxy") {
            config = config.with_proxy(&proxy)?;
        }
        if let Some(verify) = load_optional("xapi_verify_credentials") {
            config.verify_credentials = crate::order::parse_bool(verify.trim()).map_err(|_| {
                TwitterSearchError::Config(format!(
                    "xapi_verify_credentials must be true or false, got '{}'",
                    verify
                ))
            })?;
        }
        if let Some(timeout) = load_optional("xapi_timeout_secs") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                TwitterSearchError::Config(format!(
                    "xapi_timeout_secs must be a number of seconds, got '{}'",
                    timeout
                ))
            })?;
            config.timeout = Duration::from_secs(seconds);
        }

        info!(
            "Twitter configuration loaded successfully (base URL: {}, proxy: {}, verify: {})",
            config.base_url,
            config.proxy.as_deref().unwrap_or("none"),
            config.verify_credentials
        );
        Ok(config)
    }

    /// Routes all requests through an HTTPS proxy such as `my.proxy.com:8080`.
    ///
    /// Fails with `InvalidString` if the address is not a host with an optional port.
    pub fn with_proxy(mut self, proxy: &str) -> Result<Self> {
        let proxy = proxy.trim();
        let candidate = if proxy.contains("://") {
            proxy.to_string()
        } else {
            format!("http://{}", proxy)
        };

        match url::Url::parse(&candidate) {
            Ok(parsed) if parsed.host_str().is_some() => {
                debug!("Using proxy {}", proxy);
                self.proxy = Some(proxy.to_string());
                Ok(self)
            }
            _ => Err(TwitterSearchError::with_message(
                ErrorKind::InvalidString,
                format!("Invalid proxy address: '{}'", proxy),
            )),
        }
    }

    /// Points the client at another API root, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        url::Url::parse(&base_url).map_err(|e| {
            TwitterSearchError::with_message(
                ErrorKind::InvalidString,
                format!("Invalid base URL '{}': {}", base_url, e),
            )
        })?;
        self.base_url = base_url;
        Ok(self)
    }

    pub fn with_verify_credentials(mut self, verify: bool) -> Self {
        self.verify_credentials = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL of an endpoint path.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}
