//! Query builder for the search endpoint.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use log::debug;

use super::languages::ISO_639_1;
use super::{
    apply_common, parse_number, parse_query, quote_plus, Arguments, OrderKind, QueryOrder,
};
use crate::error::{ErrorKind, Result, TwitterSearchError};

const LINK_TOKEN: &str = "filter:links";
const QUESTION_TOKEN: &str = "?";
const SOURCE_PREFIX: &str = "source:";
const MIN_TERM_LENGTH: usize = 2;

/// Attitude filter: only tweets with a positive or a negative tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attitude {
    Positive,
    Negative,
}

impl Attitude {
    /// The search operator the API understands for this attitude.
    pub const fn token(self) -> &'static str {
        match self {
            Attitude::Positive => ":)",
            Attitude::Negative => ":(",
        }
    }
}

/// Preferred kind of search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    /// Both popular and real time results.
    Mixed,
    /// Only the most recent results.
    Recent,
    /// Only the most popular results.
    Popular,
}

impl ResultType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResultType::Mixed => "mixed",
            ResultType::Recent => "recent",
            ResultType::Popular => "popular",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultType {
    type Err = TwitterSearchError;

    /// Parses a result type case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mixed" => Ok(ResultType::Mixed),
            "recent" => Ok(ResultType::Recent),
            "popular" => Ok(ResultType::Popular),
            _ => Err(TwitterSearchError::with_message(
                ErrorKind::InvalidResultType,
                format!("No valid result type: {}", s),
            )),
        }
    }
}

/// Unit of a geocode radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

impl DistanceUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = TwitterSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "km" => Ok(DistanceUnit::Kilometers),
            "mi" => Ok(DistanceUnit::Miles),
            _ => Err(TwitterSearchError::with_message(
                ErrorKind::InvalidUnit,
                format!("Invalid unit: '{}'", s),
            )),
        }
    }
}

/// A circular area given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geocode {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u32,
    pub unit: DistanceUnit,
}

impl Geocode {
    /// Wire format `lat,lon,radius{km|mi}`. Whole coordinates keep a trailing `.0`.
    fn to_wire(self) -> String {
        format!(
            "{:?},{:?},{}{}",
            self.latitude,
            self.longitude,
            self.radius,
            self.unit.as_str()
        )
    }
}

impl FromStr for Geocode {
    type Err = TwitterSearchError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        let [latitude, longitude, area] = parts.as_slice() else {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidNumber,
                format!("Invalid geocode: '{}'", s),
            ));
        };

        let digits = area
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(area.len());
        let (radius, unit) = area.split_at(digits);

        Ok(Geocode {
            latitude: parse_number("geocode", latitude.trim())?,
            longitude: parse_number("geocode", longitude.trim())?,
            radius: parse_number("geocode", radius)?,
            unit: unit.parse()?,
        })
    }
}

/// Configuration of one query against the search endpoint.
///
/// Keywords and the advanced filters make up the `q` parameter, everything else is kept
/// as key-value pairs. A new order requests the maximum page size of 100.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOrder {
    arguments: Arguments,
    keywords: Vec<String>,
    attitude: Option<Attitude>,
    question: bool,
    link: bool,
    source: Option<String>,
    languages: Vec<String>,
}

impl Default for SearchOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchOrder {
    /// An order without keywords, asking for the largest page the endpoint serves.
    pub fn new() -> Self {
        let mut arguments = Arguments::new();
        arguments.insert("count", OrderKind::Search.max_count().to_string());
        Self {
            arguments,
            keywords: Vec::new(),
            attitude: None,
            question: false,
            link: false,
            source: None,
            languages: ISO_639_1.iter().map(|code| code.to_string()).collect(),
        }
    }

    /// Current keyword terms, phrases already wrapped in quotes.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Appends a single keyword of at least two characters.
    ///
    /// Keywords containing whitespace are searched as a phrase.
    pub fn add_keyword(&mut self, word: &str) -> Result<()> {
        let term = prepare_term(word)?;
        self.keywords.push(term);
        Ok(())
    }

    /// Appends a non-empty list of keywords.
    ///
    /// With `or_operator` the list becomes one term `a OR b OR c`, otherwise every
    /// element is appended on its own and all of them must match.
    pub fn add_keywords<I, S>(&mut self, words: I, or_operator: bool) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = prepare_terms(words, or_operator)?;
        if terms.is_empty() {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidArgument,
                "Keyword list is empty",
            ));
        }
        self.keywords.extend(terms);
        Ok(())
    }

    /// Replaces the keyword list. An empty list clears it.
    pub fn set_keywords<I, S>(&mut self, words: I, or_operator: bool) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = prepare_terms(words, or_operator)?;
        Ok(())
    }

    /// Codes accepted by [`set_language`](Self::set_language) and [`set_locale`](Self::set_locale).
    pub fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    /// Replaces the accepted language codes, e.g. with the catalog served by the API.
    pub fn set_supported_languages<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = codes.into_iter().map(Into::into).collect();
        debug!("Accepting {} language codes", self.languages.len());
    }

    fn check_language(&self, code: &str) -> Result<()> {
        if self.languages.iter().any(|known| known == code) {
            Ok(())
        } else {
            Err(TwitterSearchError::with_message(
                ErrorKind::InvalidLanguage,
                format!("No ISO 639-1 language code: '{}'", code),
            ))
        }
    }

    /// Only return tweets in the given language.
    pub fn set_language(&mut self, code: &str) -> Result<()> {
        self.check_language(code)?;
        self.arguments.insert("lang", code);
        Ok(())
    }

    /// Language code the results are restricted to.
    pub fn language(&self) -> Option<&str> {
        self.arguments.get("lang")
    }

    /// Declares the language of the query itself.
    pub fn set_locale(&mut self, code: &str) -> Result<()> {
        self.check_language(code)?;
        self.arguments.insert("locale", code);
        Ok(())
    }

    pub fn locale(&self) -> Option<&str> {
        self.arguments.get("locale")
    }

    /// Chooses between recent, popular or mixed results.
    pub fn set_result_type(&mut self, result_type: ResultType) {
        self.arguments.insert("result_type", result_type.as_str());
    }

    pub fn result_type(&self) -> Option<ResultType> {
        self.arguments.get("result_type").and_then(|v| v.parse().ok())
    }

    /// Only return tweets located within `radius` of the given point.
    ///
    /// # Parameters
    ///
    /// * `latitude` - Latitude of the center in degrees
    /// * `longitude` - Longitude of the center in degrees
    /// * `radius` - Positive radius around the center
    /// * `metric` - Kilometers when true, miles otherwise
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The area was stored as `lat,long,radius<unit>`
    /// * `Err(TwitterSearchError)` - `InvalidNumber` for a non-finite coordinate or a zero radius
    ///
    /// # Example
    ///
    /// ```
    /// use tweetsearch::SearchOrder;
    ///
    /// let mut order = SearchOrder::new();
    /// order.set_geocode(40.0, -73.0, 10, true)?;
    /// assert_eq!(order.geocode()?.map(|g| g.radius), Some(10));
    /// # Ok::<(), tweetsearch::TwitterSearchError>(())
    /// ```
    pub fn set_geocode(
        &mut self,
        latitude: f64,
        longitude: f64,
        radius: u32,
        metric: bool,
    ) -> Result<()> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidNumber,
                "Latitude and longitude must be finite numbers",
            ));
        }
        if radius == 0 {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidNumber,
                "Radius must be a positive integer",
            ));
        }

        let unit = if metric {
            DistanceUnit::Kilometers
        } else {
            DistanceUnit::Miles
        };
        let geocode = Geocode {
            latitude,
            longitude,
            radius,
            unit,
        };
        self.arguments.insert("geocode", geocode.to_wire());
        Ok(())
    }

    /// The configured area, failing if a parsed value is malformed.
    pub fn geocode(&self) -> Result<Option<Geocode>> {
        self.arguments
            .get("geocode")
            .map(str::parse)
            .transpose()
    }

    /// Wraps the response in a JSONP callback of the given name.
    pub fn set_callback(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(TwitterSearchError::new(ErrorKind::InvalidCallback));
        }
        self.arguments.insert("callback", name);
        Ok(())
    }

    pub fn callback(&self) -> Option<&str> {
        self.arguments.get("callback")
    }

    /// Only return tweets created before the given date, which must not lie in the future.
    pub fn set_until(&mut self, date: NaiveDate) -> Result<()> {
        let today = chrono::Local::now().date_naive();
        if date > today {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidDate,
                format!("Date {} lies after today ({})", date, today),
            ));
        }
        self.arguments
            .insert("until", date.format("%Y-%m-%d").to_string());
        Ok(())
    }

    pub fn until(&self) -> Option<NaiveDate> {
        self.arguments
            .get("until")
            .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
    }

    /// Only tweets sent through the given client, e.g. `twitterfeed`.
    pub fn set_source_filter(&mut self, source: &str) -> Result<()> {
        if source.chars().count() < MIN_TERM_LENGTH || source.contains(char::is_whitespace) {
            return Err(TwitterSearchError::with_message(
                ErrorKind::InvalidArgument,
                format!("Invalid source filter: '{}'", source),
            ));
        }
        self.source = Some(source.to_string());
        Ok(())
    }

    pub fn remove_source_filter(&mut self) {
        self.source = None;
    }

    pub fn source_filter(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Only tweets containing links.
    pub fn set_link_filter(&mut self) {
        self.link = true;
    }

    pub fn remove_link_filter(&mut self) {
        self.link = false;
    }

    pub fn link_filter(&self) -> bool {
        self.link
    }

    /// Only tweets asking a question.
    pub fn set_question_filter(&mut self) {
        self.question = true;
    }

    pub fn remove_question_filter(&mut self) {
        self.question = false;
    }

    pub fn question_filter(&self) -> bool {
        self.question
    }

    pub fn set_positive_attitude_filter(&mut self) {
        self.attitude = Some(Attitude::Positive);
    }

    pub fn set_negative_attitude_filter(&mut self) {
        self.attitude = Some(Attitude::Negative);
    }

    pub fn remove_attitude_filter(&mut self) {
        self.attitude = None;
    }

    pub fn attitude_filter(&self) -> Option<Attitude> {
        self.attitude
    }

    pub fn remove_all_filters(&mut self) {
        self.attitude = None;
        self.question = false;
        self.link = false;
        self.source = None;
    }

    /// Tokens of the `q` parameter: keywords first, then one per active filter.
    fn query_terms(&self) -> Vec<String> {
        let mut terms = self.keywords.clone();
        if let Some(attitude) = self.attitude {
            terms.push(attitude.token().to_string());
        }
        if let Some(source) = &self.source {
            terms.push(format!("{}{}", SOURCE_PREFIX, source));
        }
        if self.link {
            terms.push(LINK_TOKEN.to_string());
        }
        if self.question {
            terms.push(QUESTION_TOKEN.to_string());
        }
        terms
    }

    /// Sorts decoded `q` terms into keywords and filters.
    fn apply_query_terms(&mut self, query: &str) {
        for term in split_query_terms(query) {
            match term.as_str() {
                ":)" => self.attitude = Some(Attitude::Positive),
                ":(" => self.attitude = Some(Attitude::Negative),
                QUESTION_TOKEN => self.question = true,
                LINK_TOKEN => self.link = true,
                t if self.source.is_none()
                    && t.len() > SOURCE_PREFIX.len()
                    && t.starts_with(SOURCE_PREFIX) =>
                {
                    self.source = Some(t[SOURCE_PREFIX.len()..].to_string());
                }
                _ => self.keywords.push(term),
            }
        }
    }
}

impl QueryOrder for SearchOrder {
    fn kind(&self) -> OrderKind {
        OrderKind::Search
    }

    fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    fn arguments_mut(&mut self) -> &mut Arguments {
        &mut self.arguments
    }

    /// Fails with `NoKeywords` while the keyword list is empty.
    fn build_url(&self) -> Result<String> {
        if self.keywords.is_empty() {
            return Err(TwitterSearchError::new(ErrorKind::NoKeywords));
        }

        let query = self
            .query_terms()
            .iter()
            .map(|term| quote_plus(term))
            .collect::<Vec<_>>()
            .join("+");

        let mut url = format!("?q={}", query);
        if !self.arguments.is_empty() {
            url.push('&');
            url.push_str(&self.arguments.encode());
        }

        debug!("Built search query string: {}", url);
        Ok(url)
    }

    /// Replaces this order with the one described by a search query string.
    ///
    /// Every parameter goes through its typed setter, so a malformed value fails with the
    /// setter's error and leaves this order unchanged. The accepted language set is kept.
    ///
    /// # Parameters
    ///
    /// * `url` - Query string as produced by `build_url`, with or without the leading `?`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Keywords, filters and parameters were taken over
    /// * `Err(TwitterSearchError)` - The query string or one of its values is malformed
    ///
    /// # Example
    ///
    /// ```
    /// use tweetsearch::{QueryOrder, SearchOrder};
    ///
    /// let mut order = SearchOrder::new();
    /// order.parse_url("?q=rust+%22James+Bond%22&count=20")?;
    /// assert_eq!(order.keywords(), ["rust", "\"James Bond\""]);
    /// assert_eq!(order.count(), 20);
    /// # Ok::<(), tweetsearch::TwitterSearchError>(())
    /// ```
    fn parse_url(&mut self, url: &str) -> Result<()> {
        let mut parsed = SearchOrder {
            languages: self.languages.clone(),
            ..SearchOrder::new()
        };
        let mut query = None;

        for (key, value) in parse_query(url)? {
            if key == "q" {
                query = Some(value);
                continue;
            }
            if apply_common(&mut parsed, &key, &value)? {
                continue;
            }
            match key.as_str() {
                "lang" => parsed.set_language(&value)?,
                "locale" => parsed.set_locale(&value)?,
                "result_type" => parsed.set_result_type(value.parse()?),
                "geocode" => {
                    let geocode: Geocode = value.parse()?;
                    parsed.set_geocode(
                        geocode.latitude,
                        geocode.longitude,
                        geocode.radius,
                        geocode.unit == DistanceUnit::Kilometers,
                    )?;
                }
                "callback" => parsed.set_callback(&value)?,
                "until" => {
                    let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| {
                        TwitterSearchError::with_message(
                            ErrorKind::InvalidDate,
                            format!("Invalid date '{}': {}", value, e),
                        )
                    })?;
                    parsed.set_until(date)?;
                }
                _ => parsed.arguments.insert(&key, value),
            }
        }

        let query = query.ok_or_else(|| {
            TwitterSearchError::with_message(
                ErrorKind::NoKeywords,
                "Query string has no 'q' parameter",
            )
        })?;
        parsed.apply_query_terms(&query);

        *self = parsed;
        Ok(())
    }
}

fn prepare_term(word: &str) -> Result<String> {
    if word.chars().count() < MIN_TERM_LENGTH {
        return Err(TwitterSearchError::with_message(
            ErrorKind::InvalidArgument,
            format!(
                "Keyword '{}' is shorter than {} characters",
                word, MIN_TERM_LENGTH
            ),
        ));
    }

    let already_quoted = word.len() > 1 && word.starts_with('"') && word.ends_with('"');
    let term = if word.contains(char::is_whitespace) && !already_quoted {
        format!("\"{}\"", word)
    } else {
        word.to_string()
    };

    if is_filter_token(&term) {
        return Err(TwitterSearchError::with_message(
            ErrorKind::InvalidArgument,
            format!(
                "Keyword '{}' is a search filter, use the filter setters instead",
                word
            ),
        ));
    }
    Ok(term)
}

/// Whether a `q` term would be read back as a filter instead of a keyword.
fn is_filter_token(term: &str) -> bool {
    term == Attitude::Positive.token()
        || term == Attitude::Negative.token()
        || term == LINK_TOKEN
        || term == QUESTION_TOKEN
        || term.starts_with(SOURCE_PREFIX)
}

fn prepare_terms<I, S>(words: I, or_operator: bool) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let terms = words
        .into_iter()
        .map(|word| prepare_term(word.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    if or_operator && !terms.is_empty() {
        Ok(vec![terms.join(" OR ")])
    } else {
        Ok(terms)
    }
}

/// Splits a decoded `q` value on whitespace outside quotes and rejoins `OR` groups.
fn split_query_terms(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in query.chars() {
        if c == '"' {
            quoted = !quoted;
            current.push(c);
        } else if c.is_whitespace() && !quoted {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    let mut terms: Vec<String> = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        if token == "OR" && !terms.is_empty() {
            if let Some(next) = tokens.next() {
                if let Some(last) = terms.last_mut() {
                    last.push_str(" OR ");
                    last.push_str(&next);
                }
                continue;
            }
        }
        terms.push(token);
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn order_with_keyword() -> SearchOrder {
        let mut order = SearchOrder::new();
        order.set_keywords(["foo"], false).unwrap();
        order
    }

    fn pairs(url: &str) -> Vec<(String, String)> {
        let mut pairs = parse_query(url).unwrap();
        pairs.sort();
        pairs
    }

    #[test]
    fn test_new_order_requests_maximum_count() {
        let order = order_with_keyword();
        assert_eq!(order.count(), 100);
        assert_eq!(order.build_url().unwrap(), "?q=foo&count=100");
    }

    #[test]
    fn test_build_url_without_keywords_fails() {
        let err = SearchOrder::new().build_url().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NoKeywords));
        assert_eq!(err.code(), Some(1015));
    }

    #[test]
    fn test_keywords() {
        let mut order = order_with_keyword();
        order.set_keywords(["foo", "bar"], false).unwrap();
        assert!(order.build_url().unwrap().starts_with("?q=foo+bar&"));

        order.add_keywords(["one", "two"], false).unwrap();
        assert!(order.build_url().unwrap().starts_with("?q=foo+bar+one+two&"));

        order.add_keyword("test").unwrap();
        assert!(order
            .build_url()
            .unwrap()
            .starts_with("?q=foo+bar+one+two+test&"));

        order.set_keywords(["test"], false).unwrap();
        assert!(order.build_url().unwrap().starts_with("?q=test&"));
    }

    #[test]
    fn test_filter_tokens_are_not_keywords() {
        let mut order = order_with_keyword();
        for token in [":)", ":(", "filter:links", "source:nyancat", "source:"] {
            let err = order.add_keyword(token).unwrap_err();
            assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument), "{}", token);
            assert!(order.set_keywords([token], false).is_err());
            assert!(order.add_keywords(["bar", token], true).is_err());
        }
        assert_eq!(order.keywords(), ["foo"]);

        // as part of a phrase they stay plain text
        order.add_keyword("source: nyancat").unwrap();
        let url = order.build_url().unwrap();
        let mut parsed = SearchOrder::new();
        parsed.parse_url(&url).unwrap();
        assert_eq!(parsed.keywords(), ["foo", "\"source: nyancat\""]);
        assert_eq!(parsed.source_filter(), None);
    }

    #[test]
    fn test_phrase_keywords_are_quoted() {
        let mut order = order_with_keyword();
        order.add_keyword("James Bond").unwrap();
        assert!(order.build_url().unwrap().contains("%22James+Bond%22"));

        order.set_keywords(["James Bond"], false).unwrap();
        assert_eq!(order.keywords(), ["\"James Bond\""]);
        assert!(order.build_url().unwrap().contains("%22James+Bond%22"));
    }

    #[test]
    fn test_or_operator() {
        let mut order = order_with_keyword();
        order.add_keywords(["bob", "alice"], true).unwrap();
        assert!(order.build_url().unwrap().to_lowercase().contains("bob+or+alice"));
        assert_eq!(order.keywords().len(), 2);

        order.set_keywords(["bob", "alice"], true).unwrap();
        assert_eq!(order.keywords(), ["bob OR alice"]);
    }

    #[test]
    fn test_invalid_keywords() {
        let mut order = SearchOrder::new();
        for word in ["", "x"] {
            let err = order.add_keyword(word).unwrap_err();
            assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));
        }
        let empty: [&str; 0] = [];
        let err = order.add_keywords(empty, false).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));

        let err = order.set_keywords(["ok", "x"], false).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));
        assert!(order.keywords().is_empty());
    }

    #[test]
    fn test_search_encoding() {
        for value in ["test(", "[test", "foo$bar", "plain", "==", "=%!"] {
            let mut order = SearchOrder::new();
            order.add_keyword(value).unwrap();
            let url = order.build_url().unwrap();
            assert_eq!(url, format!("?q={}&count=100", urlencoding::encode(value)));
            assert_eq!(
                pairs(&url),
                vec![
                    ("count".to_string(), "100".to_string()),
                    ("q".to_string(), value.to_string()),
                ]
            );
        }
    }

    #[test]
    fn test_count() {
        let mut order = order_with_keyword();
        for value in [1, 17, 99, 100] {
            order.set_count(value).unwrap();
            let url = order.build_url().unwrap();
            assert_eq!(url.matches("count=").count(), 1);
            assert!(url.ends_with(&format!("count={}", value)));
            assert_eq!(order.count(), value);
        }
        for value in [0, 101, 200] {
            let err = order.set_count(value).unwrap_err();
            assert_eq!(err.kind(), Some(ErrorKind::InvalidNumber));
        }
    }

    #[test]
    fn test_since_and_max_id() {
        let mut order = order_with_keyword();
        order.set_since_id(123).unwrap();
        order.set_max_id(999_999_999).unwrap();
        let url = order.build_url().unwrap();
        assert!(url.contains("&since_id=123"));
        assert!(url.contains("&max_id=999999999"));
        assert_eq!(order.since_id(), Some(123));
        assert_eq!(order.max_id(), Some(999_999_999));

        assert_eq!(
            order.set_since_id(0).unwrap_err().kind(),
            Some(ErrorKind::InvalidNumber)
        );
        assert_eq!(
            order.set_max_id(0).unwrap_err().kind(),
            Some(ErrorKind::InvalidNumber)
        );
    }

    #[test]
    fn test_geocode() {
        let mut order = order_with_keyword();
        order.set_geocode(40.0, -73.0, 10, true).unwrap();
        assert!(order.build_url().unwrap().contains("geocode=40.0,-73.0,10km"));

        order.set_geocode(-12.331, 99.019, 5, false).unwrap();
        assert!(order.build_url().unwrap().contains("geocode=-12.331,99.019,5mi"));
        assert_eq!(
            order.geocode().unwrap(),
            Some(Geocode {
                latitude: -12.331,
                longitude: 99.019,
                radius: 5,
                unit: DistanceUnit::Miles,
            })
        );

        let err = order.set_geocode(1.0, 2.0, 0, true).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidNumber));
        let err = order.set_geocode(f64::NAN, 2.0, 3, true).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidNumber));
    }

    #[test]
    fn test_geocode_parsing_errors() {
        let err = "1.0,2.0,10ft".parse::<Geocode>().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidUnit));
        let err = "north,2.0,10km".parse::<Geocode>().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidNumber));
        let err = "1.0,2.0".parse::<Geocode>().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidNumber));
    }

    #[test]
    fn test_result_type() {
        let mut order = order_with_keyword();
        for value in ["recent", "mixed", "popular", "POPULAR", "Recent"] {
            let result_type: ResultType = value.parse().unwrap();
            order.set_result_type(result_type);
            assert!(order
                .build_url()
                .unwrap()
                .contains(&format!("result_type={}", value.to_lowercase())));
            assert_eq!(order.result_type(), Some(result_type));
        }
        let err = "ABC123".parse::<ResultType>().unwrap_err();
        assert_eq!(err.code(), Some(1003));
    }

    #[test]
    fn test_until() {
        let mut order = order_with_keyword();
        let today = chrono::Local::now().date_naive();
        for date in [
            today,
            today - Duration::days(1),
            today - Duration::days(10),
            today - Duration::days(371),
        ] {
            order.set_until(date).unwrap();
            assert!(order
                .build_url()
                .unwrap()
                .contains(&format!("until={}", date.format("%Y-%m-%d"))));
            assert_eq!(order.until(), Some(date));
        }
        let err = order.set_until(today + Duration::days(1)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidDate));
    }

    #[test]
    fn test_callback() {
        let mut order = order_with_keyword();
        order.set_callback("ABC123").unwrap();
        assert!(order.build_url().unwrap().contains("&callback=ABC123"));
        assert_eq!(order.callback(), Some("ABC123"));
        assert_eq!(
            order.set_callback("").unwrap_err().kind(),
            Some(ErrorKind::InvalidCallback)
        );
    }

    #[test]
    fn test_language_and_locale() {
        let mut order = order_with_keyword();
        for code in ISO_639_1 {
            order.set_language(code).unwrap();
            order.set_locale(code).unwrap();
            let url = order.build_url().unwrap();
            assert!(url.contains(&format!("&lang={}", code)));
            assert!(url.contains(&format!("&locale={}", code)));
        }
        for code in ["", "dee", "q", "xz", "EN"] {
            assert_eq!(
                order.set_language(code).unwrap_err().kind(),
                Some(ErrorKind::InvalidLanguage)
            );
            assert_eq!(
                order.set_locale(code).unwrap_err().kind(),
                Some(ErrorKind::InvalidLanguage)
            );
        }
    }

    #[test]
    fn test_supported_languages_are_replaceable() {
        let mut order = order_with_keyword();
        order.set_supported_languages(["en", "xz"]);
        order.set_language("xz").unwrap();
        assert_eq!(order.language(), Some("xz"));
        assert_eq!(
            order.set_language("de").unwrap_err().kind(),
            Some(ErrorKind::InvalidLanguage)
        );
    }

    #[test]
    fn test_include_entities() {
        let mut order = order_with_keyword();
        order.set_include_entities(true);
        assert!(order.build_url().unwrap().contains("include_entities=true"));
        order.set_include_entities(false);
        assert!(order.build_url().unwrap().contains("include_entities=false"));
        assert_eq!(order.include_entities(), Some(false));
    }

    #[test]
    fn test_filters() {
        let mut order = order_with_keyword();

        assert_eq!(order.source_filter(), None);
        order.set_source_filter("nyancat").unwrap();
        assert_eq!(order.source_filter(), Some("nyancat"));
        assert!(order
            .build_url()
            .unwrap()
            .to_lowercase()
            .contains("source%3anyancat"));
        order.remove_source_filter();
        assert_eq!(order.source_filter(), None);
        for invalid in ["", "x", "two words"] {
            assert_eq!(
                order.set_source_filter(invalid).unwrap_err().kind(),
                Some(ErrorKind::InvalidArgument)
            );
        }

        assert!(!order.link_filter());
        order.set_link_filter();
        assert!(order.build_url().unwrap().to_lowercase().contains("filter%3alinks"));
        order.remove_link_filter();
        assert!(!order.link_filter());

        assert!(!order.question_filter());
        order.set_question_filter();
        assert!(order.build_url().unwrap().to_lowercase().contains("%3f"));
        order.remove_question_filter();
        assert!(!order.question_filter());

        assert_eq!(order.attitude_filter(), None);
        order.set_negative_attitude_filter();
        assert_eq!(order.attitude_filter(), Some(Attitude::Negative));
        assert!(order.build_url().unwrap().to_lowercase().contains("%3a%28"));
        order.set_positive_attitude_filter();
        assert!(order.build_url().unwrap().to_lowercase().contains("%3a%29"));
        order.remove_attitude_filter();
        assert_eq!(order.attitude_filter(), None);
    }

    #[test]
    fn test_filter_tokens_precede_parameters_in_fixed_order() {
        let mut order = order_with_keyword();
        order.set_question_filter();
        order.set_link_filter();
        order.set_source_filter("nyancat").unwrap();
        order.set_positive_attitude_filter();
        order.set_since_id(5).unwrap();

        assert_eq!(
            order.build_url().unwrap(),
            "?q=foo+%3A%29+source%3Anyancat+filter%3Alinks+%3F&count=100&since_id=5"
        );

        order.remove_all_filters();
        assert_eq!(order.build_url().unwrap(), "?q=foo&count=100&since_id=5");
    }

    #[test]
    fn test_parse_url() {
        let mut parsed = order_with_keyword();
        parsed
            .parse_url("?q=test1+test2&count=77&until=2013-07-10&locale=en")
            .unwrap();

        assert!(!parsed.question_filter());
        assert!(!parsed.link_filter());
        assert_eq!(parsed.source_filter(), None);
        assert_eq!(parsed.attitude_filter(), None);

        let mut built = SearchOrder::new();
        built.set_keywords(["test1", "test2"], false).unwrap();
        built.set_count(77).unwrap();
        built
            .set_until(NaiveDate::from_ymd_opt(2013, 7, 10).unwrap())
            .unwrap();
        built.set_locale("en").unwrap();

        assert_eq!(parsed, built);
        assert_eq!(parsed.build_url().unwrap(), built.build_url().unwrap());
    }

    #[test]
    fn test_parse_url_with_filters() {
        let mut parsed = SearchOrder::new();
        parsed
            .parse_url("?q=foobar+%3A%29+%3F+filter%3Alinks+source%3Aalice")
            .unwrap();

        assert_eq!(parsed.attitude_filter(), Some(Attitude::Positive));
        assert!(parsed.question_filter());
        assert!(parsed.link_filter());
        assert_eq!(parsed.source_filter(), Some("alice"));
        assert_eq!(parsed.keywords(), ["foobar"]);

        let mut built = SearchOrder::new();
        built.set_question_filter();
        built.set_positive_attitude_filter();
        built.set_link_filter();
        built.set_source_filter("alice").unwrap();
        built.add_keyword("foobar").unwrap();
        assert_eq!(parsed, built);
    }

    #[test]
    fn test_round_trip() {
        let mut order = SearchOrder::new();
        order.add_keyword("James Bond").unwrap();
        order.add_keywords(["bob", "alice"], true).unwrap();
        order.add_keyword("c++").unwrap();
        order.set_negative_attitude_filter();
        order.set_source_filter("twitterfeed").unwrap();
        order.set_link_filter();
        order.set_count(42).unwrap();
        order.set_geocode(52.5, 13.4, 25, true).unwrap();
        order.set_language("de").unwrap();
        order.set_result_type(ResultType::Recent);
        order.set_callback("cb").unwrap();
        order.set_include_entities(true);
        order.set_since_id(10).unwrap();
        order.set_max_id(20).unwrap();

        let url = order.build_url().unwrap();
        let mut parsed = SearchOrder::new();
        parsed.parse_url(&url).unwrap();

        assert_eq!(parsed, order);
        assert_eq!(parsed.build_url().unwrap(), url);
        assert_eq!(parsed.keywords(), ["\"James Bond\"", "bob OR alice", "c++"]);
    }

    #[test]
    fn test_parse_url_rejects_invalid_values() {
        let mut order = order_with_keyword();
        let before = order.clone();

        let cases = [
            ("?q=foo&count=500", ErrorKind::InvalidNumber),
            ("?q=foo&count=many", ErrorKind::InvalidNumber),
            ("?q=foo&lang=xx", ErrorKind::InvalidLanguage),
            ("?q=foo&result_type=newest", ErrorKind::InvalidResultType),
            ("?q=foo&geocode=1.0,2.0,3ly", ErrorKind::InvalidUnit),
            ("?q=foo&include_entities=maybe", ErrorKind::InvalidBoolean),
            ("?q=foo&until=yesterday", ErrorKind::InvalidDate),
            ("?count=10", ErrorKind::NoKeywords),
        ];
        for (url, kind) in cases {
            assert_eq!(order.parse_url(url).unwrap_err().kind(), Some(kind), "{}", url);
            assert_eq!(order, before);
        }
    }

    #[test]
    fn test_unknown_parameters_are_kept() {
        let mut order = SearchOrder::new();
        order.parse_url("q=foo&tweet_mode=extended").unwrap();
        assert_eq!(order.arguments().get("tweet_mode"), Some("extended"));
        assert!(order.build_url().unwrap().contains("&tweet_mode=extended"));
    }

    #[test]
    fn test_orders_do_not_share_parameters() {
        let mut first = order_with_keyword();
        first.set_count(5).unwrap();
        let second = order_with_keyword();
        assert_eq!(second.count(), 100);
    }
}
