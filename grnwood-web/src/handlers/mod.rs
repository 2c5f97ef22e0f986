//! HTTP handlers for the grnwood web server

pub mod business;
pub mod health;

pub use business::*;
pub use health::*;

use axum::http::{HeaderMap, HeaderValue};
use grnwood_graph::Bookmark;

use crate::context::BOOKMARK_HEADER;

/// Headers announcing the bookmark of a committed write, if there was one
pub(crate) fn bookmark_headers(bookmark: Option<&Bookmark>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = bookmark.and_then(|b| HeaderValue::from_str(&b.to_string()).ok()) {
        headers.insert(BOOKMARK_HEADER, value);
    }
    headers
}
