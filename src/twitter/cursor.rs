//! Id-based pagination state.
//!
//! Tweets come back newest first. The next page is requested with `max_id` set to one less
//! than the smallest id seen so far, which makes page boundaries exclusive and keeps tweets
//! from appearing twice.

use log::debug;
use serde_json::Value;

use crate::error::{ErrorKind, Result, TwitterSearchError};
use crate::order::OrderKind;

/// Reads the id of a tweet, falling back to `id_str` when `id` is missing or not an integer.
pub(crate) fn tweet_id(tweet: &Value) -> Option<u64> {
    tweet.get("id").and_then(Value::as_u64).or_else(|| {
        tweet
            .get("id_str")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    })
}

/// Smallest tweet id on a page, if any tweet carries one.
pub fn minimal_id(tweets: &[Value]) -> Option<u64> {
    tweets.iter().filter_map(tweet_id).min()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    next_max_id: Option<u64>,
    minimal_id: Option<u64>,
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the cursor from a completed page and returns the new boundary.
    ///
    /// `requested` is the page size the order asked for. Whether a further page exists is
    /// decided by [`OrderKind::continues_after`]. A page without usable ids is terminal, and
    /// so is a boundary of 0 since no tweet can be older.
    pub fn advance(&mut self, kind: OrderKind, requested: u32, tweets: &[Value]) -> Option<u64> {
        self.minimal_id = minimal_id(tweets);

        self.next_max_id = if kind.continues_after(tweets.len(), requested) {
            self.minimal_id
                .and_then(|id| id.checked_sub(1))
                .filter(|&boundary| boundary > 0)
        } else {
            None
        };

        debug!(
            "Cursor advanced after {} of {} tweets: minimal id {:?}, next max_id {:?}",
            tweets.len(),
            requested,
            self.minimal_id,
            self.next_max_id
        );
        self.next_max_id
    }

    pub fn has_more(&self) -> bool {
        self.next_max_id.is_some()
    }

    /// Exclusive upper bound for the next page.
    pub fn next_max_id(&self) -> Option<u64> {
        self.next_max_id
    }

    /// Smallest id of the last page.
    pub fn minimal_id(&self) -> Option<u64> {
        self.minimal_id
    }

    /// Query string fragment that requests the next page.
    pub fn next_request_suffix(&self) -> Result<String> {
        self.next_max_id
            .map(|id| format!("&max_id={}", id))
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoMoreResults))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(ids: &[u64]) -> Vec<Value> {
        ids.iter().map(|id| json!({ "id": id, "text": "t" })).collect()
    }

    #[test]
    fn test_full_search_page_continues() {
        let mut cursor = PaginationCursor::new();
        let next = cursor.advance(OrderKind::Search, 4, &page(&[50, 42, 47, 45]));
        assert_eq!(next, Some(41));
        assert!(cursor.has_more());
        assert_eq!(cursor.minimal_id(), Some(42));
        assert_eq!(cursor.next_request_suffix().unwrap(), "&max_id=41");
    }

    #[test]
    fn test_short_search_page_is_terminal() {
        let mut cursor = PaginationCursor::new();
        cursor.advance(OrderKind::Search, 4, &page(&[50, 42, 47, 45]));
        assert_eq!(cursor.advance(OrderKind::Search, 4, &page(&[30, 20, 10])), None);
        assert!(!cursor.has_more());
        assert_eq!(cursor.minimal_id(), Some(10));

        let err = cursor.next_request_suffix().unwrap_err();
        assert!(err.is_no_more_results());
        assert_eq!(err.code(), Some(1011));

        assert_eq!(cursor.advance(OrderKind::Search, 4, &[]), None);
    }

    #[test]
    fn test_timeline_continues_on_short_pages() {
        let mut cursor = PaginationCursor::new();
        assert_eq!(cursor.advance(OrderKind::UserTimeline, 200, &page(&[9, 7])), Some(6));
        assert!(cursor.has_more());
        assert_eq!(cursor.advance(OrderKind::UserTimeline, 200, &[]), None);
        assert!(!cursor.has_more());
    }

    #[test]
    fn test_pages_without_usable_ids_are_terminal() {
        let mut cursor = PaginationCursor::new();
        let no_ids = vec![json!({ "text": "a" }), json!({ "text": "b" })];
        assert_eq!(cursor.advance(OrderKind::Search, 2, &no_ids), None);

        assert_eq!(cursor.advance(OrderKind::UserTimeline, 200, &page(&[0, 3])), None);
        assert_eq!(cursor.minimal_id(), Some(0));
        assert_eq!(cursor.advance(OrderKind::UserTimeline, 200, &page(&[1, 3])), None);
    }

    #[test]
    fn test_id_str_fallback() {
        let tweets = vec![json!({ "id_str": "1234567890123" }), json!({ "id": 99 })];
        assert_eq!(minimal_id(&tweets), Some(99));
        assert_eq!(tweet_id(&tweets[0]), Some(1234567890123));
    }

    #[test]
    fn test_reset() {
        let mut cursor = PaginationCursor::new();
        cursor.advance(OrderKind::UserTimeline, 200, &page(&[5]));
        cursor.reset();
        assert_eq!(cursor, PaginationCursor::default());
    }
}
