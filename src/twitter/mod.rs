//! Twitter API v1.1 integration module.
//!
//! This module contains the HTTP transport, the id-based pagination cursor and the
//! search session that ties them together.

mod api;
mod cursor;
mod session;

pub use api::{HttpResponse, HttpTransport, Metadata, ReqwestTransport};
pub use cursor::{minimal_id, PaginationCursor};
pub use session::{
    Language, PageCallback, ResponseEnvelope, SearchSession, Statistics, Tweets,
};
