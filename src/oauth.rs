//! OAuth authentication module for the Twitter API.
//!
//! This module builds the `Authorization` header for both supported schemes: OAuth 1.0a
//! user context (HMAC-SHA1 signed requests) and OAuth 2.0 app-only Bearer Tokens.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use log::debug;
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;
use url::Url;

use crate::config::mask_secret;
use crate::error::{ErrorKind, Result, TwitterSearchError};

type HmacSha1 = Hmac<Sha1>;

/// Credentials used to authenticate requests.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth 1.0a user context: the app's consumer key pair and the user's access token pair.
    OAuth1 {
        consumer_key: String,
        consumer_secret: String,
        access_token: String,
        access_token_secret: String,
    },
    /// OAuth 2.0 app-only Bearer Token.
    Bearer(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::OAuth1 {
                consumer_key,
                access_token,
                ..
            } => f
                .debug_struct("OAuth1")
                .field("consumer_key", &mask_secret(consumer_key))
                .field("access_token", &mask_secret(access_token))
                .finish_non_exhaustive(),
            Credentials::Bearer(token) => f.debug_tuple("Bearer").field(&mask_secret(token)).finish(),
        }
    }
}

impl Credentials {
    pub fn oauth1(
        consumer_key: &str,
        consumer_secret: &str,
        access_token: &str,
        access_token_secret: &str,
    ) -> Self {
        Credentials::OAuth1 {
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            access_token: access_token.to_string(),
            access_token_secret: access_token_secret.to_string(),
        }
    }

    pub fn bearer(token: &str) -> Self {
        Credentials::Bearer(token.to_string())
    }

    /// Builds the `Authorization` header value for a request.
    ///
    /// For OAuth 1.0a the query parameters of `url` are part of the signature, so the
    /// header is only valid for exactly this URL.
    pub fn authorization_header(&self, method: &str, url: &str) -> Result<String> {
        match self {
            Credentials::Bearer(token) => Ok(build_bearer_auth_header(token)),
            Credentials::OAuth1 {
                consumer_key,
                consumer_secret,
                access_token,
                access_token_secret,
            } => {
                let parsed = Url::parse(url).map_err(|e| {
                    TwitterSearchError::with_message(
                        ErrorKind::InvalidString,
                        format!("Cannot sign invalid URL '{}': {}", url, e),
                    )
                })?;
                let params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
                let mut base_url = parsed;
                base_url.set_query(None);
                base_url.set_fragment(None);

                let signer = OAuth1Signer {
                    consumer_key,
                    consumer_secret,
                    token: access_token,
                    token_secret: access_token_secret,
                };
                signer.header(
                    method,
                    base_url.as_str(),
                    &params,
                    &generate_nonce(),
                    chrono::Utc::now().timestamp(),
                )
            }
        }
    }
}

/// Builds the Authorization header for OAuth 2.0 Bearer Token authentication.
///
/// # Example
///
/// ```rust
/// use tweetsearch::oauth::build_bearer_auth_header;
///
/// let header = build_bearer_auth_header("your_bearer_token");
/// assert_eq!(header, "Bearer your_bearer_token");
/// ```
pub fn build_bearer_auth_header(bearer_token: &str) -> String {
    format!("Bearer {}", bearer_token)
}

/// Percent-encodes per RFC 3986: everything but `A-Z a-z 0-9 - . _ ~`.
fn percent_encode(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

struct OAuth1Signer<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    token: &'a str,
    token_secret: &'a str,
}

impl OAuth1Signer<'_> {
    fn oauth_params(&self, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.to_string()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.token.to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ]
    }

    /// Computes the base64 HMAC-SHA1 signature over the signature base string.
    fn signature(
        &self,
        method: &str,
        base_url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String> {
        let mut encoded: Vec<(String, String)> = params
            .iter()
            .chain(self.oauth_params(nonce, timestamp).iter())
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect();
        encoded.sort();

        let parameter_string = encoded
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            percent_encode(base_url),
            percent_encode(&parameter_string)
        );
        let signing_key = format!(
            "{}&{}",
            percent_encode(self.consumer_secret),
            percent_encode(self.token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
            .map_err(|e| TwitterSearchError::Config(format!("Invalid signing key: {}", e)))?;
        mac.update(base_string.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn header(
        &self,
        method: &str,
        base_url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String> {
        let signature = self.signature(method, base_url, params, nonce, timestamp)?;
        debug!("Signed {} request to {}", method, base_url);

        let mut fields = self.oauth_params(nonce, timestamp);
        fields.push(("oauth_signature".to_string(), signature));
        fields.sort();

        let fields = fields
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {}", fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documented_signer() -> OAuth1Signer<'static> {
        OAuth1Signer {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog",
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        }
    }

    fn documented_params() -> Vec<(String, String)> {
        vec![
            (
                "status".to_string(),
                "Hello Ladies + Gentlemen, a signed OAuth request!".to_string(),
            ),
            ("include_entities".to_string(), "true".to_string()),
        ]
    }

    #[test]
    fn test_signature_matches_documented_example() {
        let signature = documented_signer()
            .signature(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json",
                &documented_params(),
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                1318622958,
            )
            .unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_header_layout() {
        let header = documented_signer()
            .header(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json",
                &documented_params(),
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                1318622958,
            )
            .unwrap();
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", "));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.ends_with("oauth_version=\"1.0\""));
        assert!(!header.contains("status"));
    }

    #[test]
    fn test_authorization_header_signs_query_parameters() {
        let credentials = Credentials::oauth1("key", "secret", "token", "token_secret");
        let header = credentials
            .authorization_header("GET", "https://api.twitter.com/1.1/search/tweets.json?q=foo&count=4")
            .unwrap();
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_token=\"token\""));

        let err = credentials.authorization_header("GET", "not a url").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidString));
    }

    #[test]
    fn test_nonces_differ() {
        let first = generate_nonce();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, generate_nonce());
    }

    #[test]
    fn test_build_bearer_auth_header() {
        assert_eq!(build_bearer_auth_header("abc"), "Bearer abc");
        let credentials = Credentials::bearer("abc");
        assert_eq!(
            credentials.authorization_header("GET", "ignored").unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn test_debug_masks_secrets() {
        let credentials = Credentials::oauth1(
            "consumer_key_0123456789",
            "very_secret_consumer_secret",
            "access_token_0123456789",
            "very_secret_token_secret",
        );
        let printed = format!("{:?}", credentials);
        assert!(!printed.contains("very_secret"));
        assert!(!printed.contains("consumer_key_0123456789"));
    }
}
