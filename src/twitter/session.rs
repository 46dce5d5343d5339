//! Search session: sends orders, walks the result pages and exposes the tweets.

use std::fmt;

use log::{debug, error, info};
use serde::Deserialize;
use serde_json::Value;

use super::api::{HttpTransport, Metadata, ReqwestTransport};
use super::cursor::PaginationCursor;
use crate::config::TwitterConfig;
use crate::error::{ErrorKind, Result, TwitterSearchError};
use crate::order::{parse_query, OrderKind, QueryOrder, TwitterOrder};

/// Number of requests sent and tweets received by a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub queries: u64,
    pub tweets: u64,
}

/// Headers and decoded body of the most recent page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub metadata: Metadata,
    pub content: Value,
}

/// One entry of the language catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Called once per received page, after the cursor has moved and before the page's
/// tweets are handed out.
pub type PageCallback<T> = Box<dyn FnMut(&SearchSession<T>)>;

/// Drives queries against the API and pages through their results.
///
/// A session owns its transport. After [`search`](Self::search) it remembers the query as
/// restart point; every further page is requested with that query bounded by the cursor.
/// [`results`](Self::results) turns the pages into one lazy sequence of tweets.
pub struct SearchSession<T: HttpTransport = ReqwestTransport> {
    transport: T,
    config: TwitterConfig,
    kind: Option<OrderKind>,
    start_url: Option<String>,
    metadata: Option<Metadata>,
    envelope: Option<ResponseEnvelope>,
    cursor: PaginationCursor,
    statistics: Statistics,
    next_tweet: usize,
    callback: Option<PageCallback<T>>,
}

impl<T: HttpTransport> fmt::Debug for SearchSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSession")
            .field("base_url", &self.config.base_url)
            .field("proxy", &self.config.proxy)
            .field("kind", &self.kind)
            .field("start_url", &self.start_url)
            .field("cursor", &self.cursor)
            .field("statistics", &self.statistics)
            .field("next_tweet", &self.next_tweet)
            .field("callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

impl SearchSession<ReqwestTransport> {
    /// Creates a session talking to the API over HTTPS.
    ///
    /// When `config.verify_credentials` is set the credentials are checked right away and
    /// a rejection surfaces here as a `Remote` error.
    pub fn new(config: TwitterConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(transport, &config)
    }
}

/// Removes every `max_id` pair from a query string.
fn without_max_id(query: &str) -> String {
    let pairs: Vec<&str> = query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("max_id="))
        .collect();
    format!("?{}", pairs.join("&"))
}

/// Page size a query string asks for, defaulting to the endpoint maximum.
fn requested_count(kind: OrderKind, query: &str) -> u32 {
    parse_query(query)
        .ok()
        .and_then(|pairs| {
            pairs
                .into_iter()
                .find(|(key, _)| key == "count")
                .and_then(|(_, value)| value.parse().ok())
        })
        .unwrap_or_else(|| kind.max_count())
}

impl<T: HttpTransport> SearchSession<T> {
    /// Creates a session on top of an existing transport.
    ///
    /// The transport is expected to carry the credentials and proxy of `config`; only the
    /// base URL, endpoints and verification flag are read here.
    pub fn with_transport(transport: T, config: &TwitterConfig) -> Result<Self> {
        let mut session = Self {
            transport,
            config: config.clone(),
            kind: None,
            start_url: None,
            metadata: None,
            envelope: None,
            cursor: PaginationCursor::new(),
            statistics: Statistics::default(),
            next_tweet: 0,
            callback: None,
        };

        if config.verify_credentials {
            session.verify_credentials()?;
        }
        Ok(session)
    }

    /// GET outside the pagination flow: checks the status and decodes the body.
    ///
    /// With `record_metadata` the response headers become the session metadata.
    fn fetch_json(&mut self, path: &str, record_metadata: bool) -> Result<Value> {
        let url = self.config.endpoint_url(path);
        let response = self.transport.get(&url)?;
        if record_metadata {
            self.metadata = Some(response.headers);
        }

        if let Some(err) = TwitterSearchError::from_status(response.status) {
            error!("Request to {} failed: {}", path, err);
            return Err(err);
        }
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Checks the credentials against the API and returns the authenticated account.
    ///
    /// The session metadata is not touched; it only ever describes page and catalog requests.
    pub fn verify_credentials(&mut self) -> Result<Value> {
        info!("Verifying credentials");
        let path = self.config.endpoints.verify_credentials.clone();
        let account = self.fetch_json(&path, false)?;
        info!(
            "Credentials verified for @{}",
            account
                .get("screen_name")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
        );
        Ok(account)
    }

    /// HTTPS proxy the session was configured with.
    pub fn proxy(&self) -> Option<&str> {
        self.config.proxy.as_deref()
    }

    /// Sends the first page of an order and makes it the restart point for pagination.
    ///
    /// A `max_id` set on the order bounds this request only; continuation requests are
    /// bounded by the cursor. The session switches to the new order only once its first page
    /// has arrived, so a failed search leaves the previous page and pagination in place.
    ///
    /// # Parameters
    ///
    /// * `order` - A search or user timeline order with everything it needs to build a URL
    ///
    /// # Returns
    ///
    /// * `Ok(&ResponseEnvelope)` - Headers and decoded body of the first page
    /// * `Err(TwitterSearchError)` - The order could not be built, or the request failed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tweetsearch::{QueryOrder, SearchOrder, SearchSession, TwitterConfig};
    ///
    /// let mut session = SearchSession::new(TwitterConfig::from_env()?)?;
    /// let mut order = SearchOrder::new();
    /// order.add_keyword("rustlang")?;
    /// let page = session.search(&order)?;
    /// println!("{}", page.content["search_metadata"]);
    /// # Ok::<(), tweetsearch::TwitterSearchError>(())
    /// ```
    pub fn search<O: QueryOrder + ?Sized>(&mut self, order: &O) -> Result<&ResponseEnvelope> {
        let query = order.build_url()?;
        let kind = order.kind();
        info!("Starting {:?} query", kind);

        let restart = without_max_id(&query);
        self.send_query(kind, &query, Some(restart))
    }

    /// Sends one query string to the endpoint of the current order.
    ///
    /// On success the envelope is replaced, statistics and cursor are updated and the
    /// callback runs. A listed error status fails with `Remote`; the metadata then
    /// describes the failed attempt while envelope, cursor and statistics stay as they were.
    ///
    /// # Parameters
    ///
    /// * `query` - Query string starting with `?`, as produced by `build_url`
    ///
    /// # Returns
    ///
    /// * `Ok(&ResponseEnvelope)` - Headers and decoded body of the received page
    /// * `Err(TwitterSearchError)` - `InvalidOrder` before any [`search`](Self::search),
    ///   otherwise the transport, status or decoding failure
    pub fn send_page(&mut self, query: &str) -> Result<&ResponseEnvelope> {
        let kind = self.kind.ok_or_else(|| {
            TwitterSearchError::with_message(
                ErrorKind::InvalidOrder,
                "No order has been searched yet",
            )
        })?;
        self.send_query(kind, query, None)
    }

    /// Requests one page for `kind` and commits it to the session once it has decoded.
    ///
    /// `restart` replaces the restart point of pagination together with the page.
    fn send_query(
        &mut self,
        kind: OrderKind,
        query: &str,
        restart: Option<String>,
    ) -> Result<&ResponseEnvelope> {
        let path = match kind {
            OrderKind::Search => &self.config.endpoints.search,
            OrderKind::UserTimeline => &self.config.endpoints.user_timeline,
        };
        let url = format!("{}{}", self.config.endpoint_url(path), query);

        info!("Requesting page {}", self.statistics.queries + 1);
        let response = self.transport.get(&url)?;
        self.metadata = Some(response.headers.clone());

        if let Some(err) = TwitterSearchError::from_status(response.status) {
            error!("Page request failed: {}", err);
            return Err(err);
        }

        let content: Value = serde_json::from_slice(&response.body)?;
        if restart.is_some() {
            self.start_url = restart;
        }
        self.kind = Some(kind);

        let tweets = kind.items(&content).map(Vec::as_slice).unwrap_or(&[]);
        let seen = tweets.len();
        self.cursor
            .advance(kind, requested_count(kind, query), tweets);

        self.statistics.queries += 1;
        self.statistics.tweets += seen as u64;
        info!(
            "Received {} tweets ({} queries, {} tweets in total)",
            seen, self.statistics.queries, self.statistics.tweets
        );

        self.envelope = Some(ResponseEnvelope {
            metadata: response.headers,
            content,
        });
        self.next_tweet = 0;

        if let Some(mut callback) = self.callback.take() {
            callback(self);
            self.callback = Some(callback);
        }

        self.envelope
            .as_ref()
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoResults))
    }

    /// Fetches the page after the current one. Fails with `NoMoreResults` at the end.
    pub fn fetch_next_page(&mut self) -> Result<&ResponseEnvelope> {
        let suffix = self.cursor.next_request_suffix()?;
        let start_url = self
            .start_url
            .clone()
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoMoreResults))?;
        debug!("Continuing with {}{}", start_url, suffix);
        self.send_page(&format!("{}{}", start_url, suffix))
    }

    /// Searches `order` and returns the lazy sequence of all its tweets.
    ///
    /// A given `callback` replaces the registered one; `None` keeps it.
    ///
    /// # Parameters
    ///
    /// * `order` - The order to search
    /// * `callback` - Optional page callback, called once per received page
    ///
    /// # Returns
    ///
    /// * `Ok(Tweets)` - Iterator over all tweets, fetching further pages on demand
    /// * `Err(TwitterSearchError)` - The first page could not be fetched
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tweetsearch::{QueryOrder, SearchOrder, SearchSession, TwitterConfig};
    ///
    /// let mut session = SearchSession::new(TwitterConfig::from_env()?)?;
    /// let mut order = SearchOrder::new();
    /// order.add_keywords(["rust", "cargo"], true)?;
    /// for tweet in session.iterate(&order, None)?.take(50) {
    ///     println!("{}", tweet?["text"]);
    /// }
    /// # Ok::<(), tweetsearch::TwitterSearchError>(())
    /// ```
    pub fn iterate<O: QueryOrder + ?Sized>(
        &mut self,
        order: &O,
        callback: Option<PageCallback<T>>,
    ) -> Result<Tweets<'_, T>> {
        if callback.is_some() {
            self.callback = callback;
        }
        self.search(order)?;
        Ok(self.results())
    }

    /// Registers the page callback.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&SearchSession<T>) + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Restarts the tweet sequence at the beginning of the current page.
    ///
    /// Pages already left behind are not fetched again.
    pub fn results(&mut self) -> Tweets<'_, T> {
        self.next_tweet = 0;
        Tweets {
            session: self,
            done: false,
        }
    }

    /// Returns the next tweet, fetching the next page when the current one is used up.
    ///
    /// `Ok(None)` marks the end: the cursor is exhausted or a page came back empty.
    pub fn next_tweet(&mut self) -> Result<Option<Value>> {
        loop {
            let envelope = self
                .envelope
                .as_ref()
                .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoResults))?;
            let kind = self
                .kind
                .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoResults))?;
            let tweets = kind
                .items(&envelope.content)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            if let Some(tweet) = tweets.get(self.next_tweet) {
                self.next_tweet += 1;
                return Ok(Some(tweet.clone()));
            }
            if tweets.is_empty() {
                return Ok(None);
            }

            match self.fetch_next_page().map(|_| ()) {
                Ok(()) => continue,
                Err(e) if e.is_no_more_results() => {
                    debug!("No more results after {} queries", self.statistics.queries);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Headers of the latest request, including a failed one.
    pub fn metadata(&self) -> Result<&Metadata> {
        self.metadata
            .as_ref()
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoMetadata))
    }

    /// Tweets of the current page.
    pub fn tweets(&self) -> Result<&[Value]> {
        let envelope = self
            .envelope
            .as_ref()
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoTweets))?;
        let kind = self
            .kind
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoTweets))?;
        Ok(kind
            .items(&envelope.content)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Decoded body of the current page, e.g. with the `search_metadata` of a search.
    pub fn content(&self) -> Result<&Value> {
        self.envelope
            .as_ref()
            .map(|envelope| &envelope.content)
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoResults))
    }

    /// Headers and body of the current page together.
    pub fn envelope(&self) -> Result<&ResponseEnvelope> {
        self.envelope
            .as_ref()
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoResults))
    }

    /// Queries sent and tweets received so far.
    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn amount_of_tweets(&self) -> Result<usize> {
        self.tweets().map(<[Value]>::len)
    }

    /// Smallest tweet id of the current page.
    pub fn minimal_id(&self) -> Result<u64> {
        self.tweets()?;
        self.cursor
            .minimal_id()
            .ok_or_else(|| TwitterSearchError::new(ErrorKind::NoTweets))
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    pub fn next_max_id(&self) -> Option<u64> {
        self.cursor.next_max_id()
    }

    /// Loads the language catalog and makes it the accepted language set of `order`.
    ///
    /// Only search orders have a language set; a timeline order fails with `InvalidOrder`.
    /// The current page is left untouched.
    pub fn set_supported_languages(&mut self, order: &mut TwitterOrder) -> Result<Vec<Language>> {
        let order = match order {
            TwitterOrder::Search(order) => order,
            TwitterOrder::User(_) => {
                return Err(TwitterSearchError::with_message(
                    ErrorKind::InvalidOrder,
                    "Only search orders accept a language set",
                ))
            }
        };

        info!("Loading supported languages");
        let path = self.config.endpoints.languages.clone();
        let languages: Vec<Language> = serde_json::from_value(self.fetch_json(&path, true)?)?;
        order.set_supported_languages(languages.iter().map(|language| language.code.clone()));
        info!("Loaded {} supported languages", languages.len());
        Ok(languages)
    }
}

/// Lazy sequence of tweets across pages, created by [`SearchSession::results`].
///
/// Yields tweets in server order and fetches pages on demand. The sequence ends when the
/// results are exhausted. An error is yielded once and ends the sequence too; calling
/// [`SearchSession::results`] afterwards resumes at the start of the current page.
pub struct Tweets<'a, T: HttpTransport> {
    session: &'a mut SearchSession<T>,
    done: bool,
}

impl<T: HttpTransport> Iterator for Tweets<'_, T> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.session.next_tweet() {
            Ok(Some(tweet)) => Some(Ok(tweet)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<T: HttpTransport> std::iter::FusedIterator for Tweets<'_, T> {}
