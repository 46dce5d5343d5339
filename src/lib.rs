//! # Tweetsearch Library
//!
//! A client library for the Twitter API v1.1 search and user timeline endpoints. Queries are
//! described by typed orders, sent through an authenticated HTTP transport and paged through
//! with an id-based cursor, so all results of a query can be read as one lazy sequence.
//!
//! ## Features
//!
//! - Query builders for the search endpoint ([`SearchOrder`]) and user timelines ([`UserOrder`])
//!   that validate every parameter and round-trip through their query strings
//! - Transparent pagination using `max_id` boundaries, without duplicates or gaps
//! - OAuth 1.0a user context and OAuth 2.0 Bearer Token authentication
//! - One error type carrying library codes (1000 and up) and HTTP status codes
//! - Structured logging through the `log` facade
//!
//! ## Configuration
//!
//! [`TwitterConfig::from_env`] reads the credentials from `xapi_consumer_key`,
//! `xapi_consumer_secret`, `xapi_access_token` and `xapi_access_token_secret`, or from
//! `xapi_bearer_token` for app-only access.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tweetsearch::{QueryOrder, SearchOrder, SearchSession, TwitterConfig};
//!
//! fn main() -> tweetsearch::Result<()> {
//!     let mut order = SearchOrder::new();
//!     order.set_keywords(["Guttenberg", "Doktorarbeit"], false)?;
//!     order.set_language("de")?;
//!     order.set_include_entities(false);
//!
//!     let mut session = SearchSession::new(TwitterConfig::from_env()?)?;
//!     for tweet in session.iterate(&order, None)? {
//!         let tweet = tweet?;
//!         println!("@{} tweeted: {}", tweet["user"]["screen_name"], tweet["text"]);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod oauth;
pub mod order;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{Endpoints, TwitterConfig};
pub use error::{ErrorKind, Result, TwitterSearchError};
pub use oauth::Credentials;
pub use order::{
    Attitude, DistanceUnit, Geocode, OrderKind, QueryOrder, ResultType, SearchOrder,
    TimelineUser, TwitterOrder, UserOrder,
};
pub use twitter::{
    HttpResponse, HttpTransport, Language, PaginationCursor, ReqwestTransport,
    ResponseEnvelope, SearchSession, Statistics,
};
