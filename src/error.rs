//! Error types for the Twitter search client.
//!
//! Every failure surfaces as a [`TwitterSearchError`]. Library-internal failures carry a
//! numeric code from the [`ErrorKind`] table (1000 and up), remote failures carry the raw
//! HTTP status code of the response that triggered them.

use thiserror::Error;

/// Library-internal error codes and their default messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A keyword or filter argument was not a string of at least two characters
    /// or a non-empty list of such strings.
    InvalidArgument,
    /// The language code is not part of the accepted ISO 639-1 set.
    InvalidLanguage,
    /// The result type is not one of `mixed`, `recent` or `popular`.
    InvalidResultType,
    /// A numeric argument was out of range or not a number.
    InvalidNumber,
    /// The distance unit of a geocode is neither `km` nor `mi`.
    InvalidUnit,
    InvalidCallback,
    /// The date lies in the future or could not be parsed.
    InvalidDate,
    InvalidBoolean,
    /// A string argument (query string, proxy address, base URL) was malformed.
    InvalidString,
    /// The order cannot be used for the requested operation.
    InvalidOrder,
    NoMoreResults,
    NoMetadata,
    NoTweets,
    NoResults,
    NoKeywords,
    /// A user timeline order needs either a user ID or a screen name.
    InvalidUser,
}

impl ErrorKind {
    /// All kinds, in code order.
    pub const ALL: [ErrorKind; 16] = [
        ErrorKind::InvalidArgument,
        ErrorKind::InvalidLanguage,
        ErrorKind::InvalidResultType,
        ErrorKind::InvalidNumber,
        ErrorKind::InvalidUnit,
        ErrorKind::InvalidCallback,
        ErrorKind::InvalidDate,
        ErrorKind::InvalidBoolean,
        ErrorKind::InvalidString,
        ErrorKind::InvalidOrder,
        ErrorKind::NoMoreResults,
        ErrorKind::NoMetadata,
        ErrorKind::NoTweets,
        ErrorKind::NoResults,
        ErrorKind::NoKeywords,
        ErrorKind::InvalidUser,
    ];

    /// Returns the numeric code of this kind.
    pub const fn code(self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 1000,
            ErrorKind::InvalidLanguage => 1002,
            ErrorKind::InvalidResultType => 1003,
            ErrorKind::InvalidNumber => 1004,
            ErrorKind::InvalidUnit => 1005,
            ErrorKind::InvalidCallback => 1006,
            ErrorKind::InvalidDate => 1007,
            ErrorKind::InvalidBoolean => 1008,
            ErrorKind::InvalidString => 1009,
            ErrorKind::InvalidOrder => 1010,
            ErrorKind::NoMoreResults => 1011,
            ErrorKind::NoMetadata => 1012,
            ErrorKind::NoTweets => 1013,
            ErrorKind::NoResults => 1014,
            ErrorKind::NoKeywords => 1015,
            ErrorKind::InvalidUser => 1017,
        }
    }

    /// Returns the default message used when no explicit message is given.
    pub const fn description(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => {
                "Neither a list nor a string of at least two characters"
            }
            ErrorKind::InvalidLanguage => "No ISO 639-1 language code",
            ErrorKind::InvalidResultType => "No valid result type",
            ErrorKind::InvalidNumber => "Invalid number",
            ErrorKind::InvalidUnit => "Invalid unit",
            ErrorKind::InvalidCallback => "Invalid callback string",
            ErrorKind::InvalidDate => "Not a valid date",
            ErrorKind::InvalidBoolean => "Invalid boolean",
            ErrorKind::InvalidString => "Invalid string",
            ErrorKind::InvalidOrder => "Not a valid order for this operation",
            ErrorKind::NoMoreResults => "No more results available",
            ErrorKind::NoMetadata => "No meta data available",
            ErrorKind::NoTweets => "No tweets available",
            ErrorKind::NoResults => "No results available",
            ErrorKind::NoKeywords => "No keywords given",
            ErrorKind::InvalidUser => "Invalid argument: need either a user ID or a screen-name",
        }
    }

    /// Looks up the kind belonging to a numeric code.
    pub fn from_code(code: u16) -> Option<ErrorKind> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    /// State kinds signal that there is nothing (more) to read, not that input was wrong.
    pub const fn is_state(self) -> bool {
        matches!(
            self,
            ErrorKind::NoMoreResults
                | ErrorKind::NoMetadata
                | ErrorKind::NoTweets
                | ErrorKind::NoResults
        )
    }
}

/// Returns the fixed description of an HTTP status the API reports as an error.
///
/// Statuses outside this table are not treated as errors.
pub fn http_status_description(status: u16) -> Option<&'static str> {
    let description = match status {
        400 => "Bad Request: The request was invalid",
        401 => "Unauthorized: Authentication credentials were missing or incorrect",
        403 => "Forbidden: The request is understood, but it has been refused or access is not allowed",
        404 => "Not Found: The URI requested is invalid or the resource requested does not exist",
        406 => "Not Acceptable: Invalid format is specified in the request",
        410 => "Gone: This resource is gone",
        420 => "Enhance Your Calm: You are being rate limited",
        422 => "Unprocessable Entity: Image unable to be processed",
        429 => "Too Many Requests: Request cannot be served due to the application's rate limit having been exhausted for the resource",
        500 => "Internal Server Error: Something is broken",
        502 => "Bad Gateway: Twitter is down or being upgraded",
        503 => "Service Unavailable: The Twitter servers are up, but overloaded with requests",
        504 => "Gateway timeout: The request couldn't be serviced due to some failure within our stack",
        _ => return None,
    };
    Some(description)
}

/// Errors raised by the query builders, the session and the transport.
#[derive(Error, Debug)]
pub enum TwitterSearchError {
    /// Input rejected before any request was made.
    #[error("Error {}: {message}", .kind.code())]
    Validation { kind: ErrorKind, message: String },

    /// Nothing has been fetched yet, or the result set is exhausted.
    #[error("Error {}: {message}", .kind.code())]
    State { kind: ErrorKind, message: String },

    /// The API answered with one of the error statuses of [`http_status_description`].
    #[error("Error {status}: {message}")]
    Remote { status: u16, message: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TwitterSearchError {
    /// Creates an error of the given kind with its default message.
    pub fn new(kind: ErrorKind) -> Self {
        Self::with_message(kind, kind.description())
    }

    /// Creates an error of the given kind with an explicit message.
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        if kind.is_state() {
            Self::State { kind, message }
        } else {
            Self::Validation { kind, message }
        }
    }

    /// Returns a remote error for `status` if the status is one the API uses for errors.
    pub fn from_status(status: u16) -> Option<Self> {
        http_status_description(status).map(|message| Self::Remote {
            status,
            message: message.to_string(),
        })
    }

    /// Numeric code: the library code for local errors, the HTTP status for remote ones.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Validation { kind, .. } | Self::State { kind, .. } => Some(kind.code()),
            Self::Remote { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Json(_) | Self::Config(_) => None,
        }
    }

    /// Returns the library error kind, if this is a local error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Validation { kind, .. } | Self::State { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True for the cursor-exhaustion signal that ends iteration.
    pub fn is_no_more_results(&self) -> bool {
        self.kind() == Some(ErrorKind::NoMoreResults)
    }

    /// Check if repeating the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Remote { status, .. } => *status >= 500 || *status == 420 || *status == 429,
            _ => false,
        }
    }
}

impl From<ErrorKind> for TwitterSearchError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result type for Twitter search operations.
pub type Result<T> = std::result::Result<T, TwitterSearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_resolvable() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code(1001), None);
        assert_eq!(ErrorKind::from_code(401), None);
    }

    #[test]
    fn test_default_message_comes_from_table() {
        let err = TwitterSearchError::new(ErrorKind::NoKeywords);
        assert_eq!(err.code(), Some(1015));
        assert_eq!(err.to_string(), "Error 1015: No keywords given");
        assert!(matches!(err, TwitterSearchError::Validation { .. }));
    }

    #[test]
    fn test_explicit_message_overrides_table() {
        let err = TwitterSearchError::with_message(ErrorKind::InvalidNumber, "count out of range");
        assert_eq!(err.to_string(), "Error 1004: count out of range");
    }

    #[test]
    fn test_state_kinds() {
        let err = TwitterSearchError::from(ErrorKind::NoMoreResults);
        assert!(matches!(err, TwitterSearchError::State { .. }));
        assert!(err.is_no_more_results());
        assert!(!TwitterSearchError::from(ErrorKind::NoTweets).is_no_more_results());
    }

    #[test]
    fn test_remote_statuses() {
        let err = TwitterSearchError::from_status(401).unwrap();
        assert_eq!(err.code(), Some(401));
        assert!(err.to_string().starts_with("Error 401: Unauthorized"));
        assert!(!err.is_retryable());

        assert!(TwitterSearchError::from_status(429).unwrap().is_retryable());
        assert!(TwitterSearchError::from_status(503).unwrap().is_retryable());

        for status in [200, 201, 204, 301, 304, 418] {
            assert!(TwitterSearchError::from_status(status).is_none());
        }
    }
}
