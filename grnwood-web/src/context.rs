//! Request context taken from graph routing headers

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use grnwood_graph::RequestContext;

/// Logical database to run the request against
pub const DATABASE_HEADER: &str = "x-graph-database";
/// Comma separated bookmarks the request must observe
pub const BOOKMARKS_HEADER: &str = "x-graph-bookmarks";
/// Bookmark of the write a response committed
pub const BOOKMARK_HEADER: &str = "x-graph-bookmark";

/// Extractor wrapping the [`RequestContext`] of one inbound request
#[derive(Debug, Clone, Default)]
pub struct GraphContext(pub RequestContext);

impl<S> FromRequestParts<S> for GraphContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let database = header_value(parts, DATABASE_HEADER).map(str::to_string);
        let bookmarks: Vec<String> = header_value(parts, BOOKMARKS_HEADER)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(GraphContext(RequestContext {
            database,
            bookmarks,
        }))
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
