//! Query builder for the user timeline endpoint.

use log::debug;

use super::{
    apply_common, bool_literal, parse_bool, parse_number, parse_query, Arguments, OrderKind,
    QueryOrder,
};
use crate::error::{ErrorKind, Result, TwitterSearchError};

/// The account whose timeline is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimelineUser {
    Id(u64),
    ScreenName(String),
}

impl TimelineUser {
    fn key(&self) -> &'static str {
        match self {
            TimelineUser::Id(_) => "user_id",
            TimelineUser::ScreenName(_) => "screen_name",
        }
    }

    fn value(&self) -> String {
        match self {
            TimelineUser::Id(id) => id.to_string(),
            TimelineUser::ScreenName(name) => name.clone(),
        }
    }

    fn validated(self) -> Result<Self> {
        match &self {
            TimelineUser::Id(0) => Err(TwitterSearchError::with_message(
                ErrorKind::InvalidUser,
                "User ID must be a positive integer",
            )),
            TimelineUser::ScreenName(name) if name.trim().is_empty() => Err(
                TwitterSearchError::with_message(ErrorKind::InvalidUser, "Screen name is empty"),
            ),
            _ => Ok(self),
        }
    }
}

/// Configuration of one query against the user timeline endpoint.
///
/// A new order requests the maximum page size of 200, includes retweets and keeps replies.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOrder {
    user: TimelineUser,
    arguments: Arguments,
}

impl UserOrder {
    /// Creates an order for the given account.
    pub fn new(user: TimelineUser) -> Result<Self> {
        let user = user.validated()?;
        let mut arguments = Arguments::new();
        arguments.insert("count", OrderKind::UserTimeline.max_count().to_string());
        arguments.insert("include_rts", bool_literal(true));
        arguments.insert("exclude_replies", bool_literal(false));
        Ok(Self { user, arguments })
    }

    pub fn with_user_id(user_id: u64) -> Result<Self> {
        Self::new(TimelineUser::Id(user_id))
    }

    pub fn with_screen_name(screen_name: &str) -> Result<Self> {
        Self::new(TimelineUser::ScreenName(screen_name.to_string()))
    }

    pub fn user(&self) -> &TimelineUser {
        &self.user
    }

    /// When true, each tweet only carries the numerical ID of its author.
    pub fn set_trim_user(&mut self, trim: bool) {
        self.arguments.insert("trim_user", bool_literal(trim));
    }

    pub fn trim_user(&self) -> Option<bool> {
        self.arguments.parse_bool("trim_user")
    }

    /// When false, native retweets are stripped from the timeline.
    pub fn set_include_rts(&mut self, include: bool) {
        self.arguments.insert("include_rts", bool_literal(include));
    }

    pub fn include_rts(&self) -> Option<bool> {
        self.arguments.parse_bool("include_rts")
    }

    /// When true, replies do not appear in the timeline.
    pub fn set_exclude_replies(&mut self, exclude: bool) {
        self.arguments.insert("exclude_replies", bool_literal(exclude));
    }

    pub fn exclude_replies(&self) -> Option<bool> {
        self.arguments.parse_bool("exclude_replies")
    }

    /// When true, contributors are reported with their screen name, not only their ID.
    pub fn set_contributor_details(&mut self, details: bool) {
        self.arguments
            .insert("contributor_details", bool_literal(details));
    }

    pub fn contributor_details(&self) -> Option<bool> {
        self.arguments.parse_bool("contributor_details")
    }
}

impl QueryOrder for UserOrder {
    fn kind(&self) -> OrderKind {
        OrderKind::UserTimeline
    }

    fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    fn arguments_mut(&mut self) -> &mut Arguments {
        &mut self.arguments
    }

    fn build_url(&self) -> Result<String> {
        let mut arguments = self.arguments.clone();
        arguments.insert(self.user.key(), self.user.value());

        let url = format!("?{}", arguments.encode());
        debug!("Built user timeline query string: {}", url);
        Ok(url)
    }

    /// Parameters missing from `url` fall back to their defaults. The user is replaced only
    /// when the query string names one, and naming both an ID and a screen name fails.
    fn parse_url(&mut self, url: &str) -> Result<()> {
        let mut user_id = None;
        let mut screen_name = None;
        let mut parsed = UserOrder::new(self.user.clone())?;

        for (key, value) in parse_query(url)? {
            if apply_common(&mut parsed, &key, &value)? {
                continue;
            }
            match key.as_str() {
                "user_id" => user_id = Some(parse_number::<u64>(&key, &value)?),
                "screen_name" => screen_name = Some(value),
                "trim_user" => parsed.set_trim_user(parse_bool(&value)?),
                "include_rts" => parsed.set_include_rts(parse_bool(&value)?),
                "exclude_replies" => parsed.set_exclude_replies(parse_bool(&value)?),
                "contributor_details" => parsed.set_contributor_details(parse_bool(&value)?),
                _ => parsed.arguments.insert(&key, value),
            }
        }

        parsed.user = match (user_id, screen_name) {
            (Some(_), Some(_)) => {
                return Err(TwitterSearchError::with_message(
                    ErrorKind::InvalidUser,
                    "Query string names both a user ID and a screen name",
                ))
            }
            (Some(id), None) => TimelineUser::Id(id).validated()?,
            (None, Some(name)) => TimelineUser::ScreenName(name).validated()?,
            (None, None) => parsed.user.clone(),
        };

        *self = parsed;
        Ok(())
    }
}
