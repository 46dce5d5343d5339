//! Query builders for the search and user timeline endpoints.
//!
//! An order is a typed description of one query. [`SearchOrder`] targets the search
//! endpoint, [`UserOrder`] a user timeline. Both keep their parameters in an [`Arguments`]
//! map of wire-format strings and expose the shared setters through [`QueryOrder`].
//! [`TwitterOrder`] is the closed union of both, used where either kind is accepted.

mod languages;
mod search;
mod user;

use std::collections::BTreeMap;

use log::debug;

use crate::error::{ErrorKind, Result, TwitterSearchError};

pub use languages::ISO_639_1;
pub use search::{Attitude, DistanceUnit, Geocode, ResultType, SearchOrder};
pub use user::{TimelineUser, UserOrder};

/// The two kinds of orders and what each implies for requests and pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Search,
    UserTimeline,
}

impl OrderKind {
    /// Largest page size the endpoint accepts. Orders default to it to minimize round-trips.
    pub const fn max_count(self) -> u32 {
        match self {
            OrderKind::Search => 100,
            OrderKind::UserTimeline => 200,
        }
    }

    /// Decides whether a page with `seen` items out of `requested` implies another page.
    ///
    /// The search endpoint fills every page but the last, so a short page ends the result
    /// set. Timelines may return short pages at any point; only an empty page ends them.
    pub const fn continues_after(self, seen: usize, requested: u32) -> bool {
        match self {
            OrderKind::Search => seen > 0 && seen == requested as usize,
            OrderKind::UserTimeline => seen > 0,
        }
    }

    /// Extracts the tweets from a decoded response body.
    ///
    /// Search responses wrap them in a `statuses` array, timelines are a bare array.
    pub fn items(self, content: &serde_json::Value) -> Option<&Vec<serde_json::Value>> {
        match self {
            OrderKind::Search => content.get("statuses").and_then(|v| v.as_array()),
            OrderKind::UserTimeline => content.as_array(),
        }
    }
}

/// Wire-format parameters of an order, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments(BTreeMap<String, String>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire value of a parameter, exactly as it will be sent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub(crate) fn parse_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub(crate) fn parse_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| parse_bool(v).ok())
    }

    /// Serializes the pairs as `key=value` joined by `&`.
    ///
    /// Values are percent-encoded except `geocode`, which the API expects verbatim.
    pub fn encode(&self) -> String {
        self.iter()
            .map(|(key, value)| {
                if key == "geocode" {
                    format!("{}={}", quote_plus(key), value)
                } else {
                    format!("{}={}", quote_plus(key), quote_plus(value))
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Percent-encodes `text` for a query string, spaces become `+`.
pub(crate) fn quote_plus(text: &str) -> String {
    urlencoding::encode(text).replace("%20", "+")
}

/// Splits a query string into decoded pairs. A leading `?` is ignored.
pub(crate) fn parse_query(url: &str) -> Result<Vec<(String, String)>> {
    let query = url.strip_prefix('?').unwrap_or(url);
    serde_urlencoded::from_str::<Vec<(String, String)>>(query).map_err(|e| {
        TwitterSearchError::with_message(
            ErrorKind::InvalidString,
            format!("Invalid query string: {}", e),
        )
    })
}

pub(crate) fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "True" | "1" => Ok(true),
        "false" | "False" | "0" => Ok(false),
        _ => Err(TwitterSearchError::with_message(
            ErrorKind::InvalidBoolean,
            format!("Invalid boolean: {}", value),
        )),
    }
}

pub(crate) fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value.parse().map_err(|_| {
        TwitterSearchError::with_message(
            ErrorKind::InvalidNumber,
            format!("Invalid number for '{}': {}", key, value),
        )
    })
}

pub(crate) fn bool_literal(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Behaviour shared by all orders.
///
/// Implementors provide access to their [`Arguments`] and the two URL conversions; the
/// parameters common to both endpoints come with default implementations.
pub trait QueryOrder {
    /// Which endpoint and pagination rule this order uses.
    fn kind(&self) -> OrderKind;

    fn arguments(&self) -> &Arguments;

    fn arguments_mut(&mut self) -> &mut Arguments;

    /// Builds the query string sent to the endpoint, starting with `?`.
    fn build_url(&self) -> Result<String>;

    /// Replaces the state of this order with the one described by a query string.
    fn parse_url(&mut self, url: &str) -> Result<()>;

    /// Sets the number of tweets per page, between 1 and the endpoint maximum.
    fn set_count(&mut self, count: u32) -> Result<()> {
        let max = self.kind().max_count();
        if count == 0 || count > max {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidNumber,
                format!("count must be between 1 and {}, got {}", max, count),
            ));
        }
        self.arguments_mut().insert("count", count.to_string());
        Ok(())
    }

    /// Requested page size.
    fn count(&self) -> u32 {
        self.arguments()
            .parse_u64("count")
            .map(|c| c as u32)
            .unwrap_or_else(|| self.kind().max_count())
    }

    /// Only return tweets more recent than the given id.
    fn set_since_id(&mut self, id: u64) -> Result<()> {
        if id == 0 {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidNumber,
                "since_id must be a positive integer",
            ));
        }
        self.arguments_mut().insert("since_id", id.to_string());
        Ok(())
    }

    fn since_id(&self) -> Option<u64> {
        self.arguments().parse_u64("since_id")
    }

    /// Only return tweets older than or equal to the given id.
    ///
    /// This bounds the first request only; later pages are bounded by the session cursor.
    fn set_max_id(&mut self, id: u64) -> Result<()> {
        if id == 0 {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidNumber,
                "max_id must be a positive integer",
            ));
        }
        self.arguments_mut().insert("max_id", id.to_string());
        Ok(())
    }

    fn max_id(&self) -> Option<u64> {
        self.arguments().parse_u64("max_id")
    }

    /// Includes or excludes the `entities` node of each tweet.
    fn set_include_entities(&mut self, include: bool) {
        self.arguments_mut()
            .insert("include_entities", bool_literal(include));
    }

    fn include_entities(&self) -> Option<bool> {
        self.arguments().parse_bool("include_entities")
    }
}

/// Applies a parsed pair shared by both order kinds through the typed setters.
///
/// Returns `Ok(false)` when the key is not a shared parameter.
pub(crate) fn apply_common<O: QueryOrder + ?Sized>(
    order: &mut O,
    key: &str,
    value: &str,
) -> Result<bool> {
    match key {
        "count" => order.set_count(parse_number(key, value)?)?,
        "since_id" => order.set_since_id(parse_number(key, value)?)?,
        "max_id" => order.set_max_id(parse_number(key, value)?)?,
        "include_entities" => order.set_include_entities(parse_bool(value)?),
        _ => return Ok(false),
    }
    debug!("Parsed parameter {}={}", key, value);
    Ok(true)
}

/// Either kind of order.
#[derive(Debug, Clone, PartialEq)]
pub enum TwitterOrder {
    Search(SearchOrder),
    User(UserOrder),
}

impl QueryOrder for TwitterOrder {
    fn kind(&self) -> OrderKind {
        match self {
            TwitterOrder::Search(order) => order.kind(),
            TwitterOrder::User(order) => order.kind(),
        }
    }

    fn arguments(&self) -> &Arguments {
        match self {
            TwitterOrder::Search(order) => order.arguments(),
            TwitterOrder::User(order) => order.arguments(),
        }
    }

    fn arguments_mut(&mut self) -> &mut Arguments {
        match self {
            TwitterOrder::Search(order) => order.arguments_mut(),
            TwitterOrder::User(order) => order.arguments_mut(),
        }
    }

    fn build_url(&self) -> Result<String> {
        match self {
            TwitterOrder::Search(order) => order.build_url(),
            TwitterOrder::User(order) => order.build_url(),
        }
    }

    fn parse_url(&mut self, url: &str) -> Result<()> {
        match self {
            TwitterOrder::Search(order) => order.parse_url(url),
            TwitterOrder::User(order) => order.parse_url(url),
        }
    }
}

impl From<SearchOrder> for TwitterOrder {
    fn from(order: SearchOrder) -> Self {
        TwitterOrder::Search(order)
    }
}

impl From<UserOrder> for TwitterOrder {
    fn from(order: UserOrder) -> Self {
        TwitterOrder::User(order)
    }
}
