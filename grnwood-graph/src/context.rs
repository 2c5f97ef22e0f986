//! Explicit per-request context for graph sessions

/// What a request asks of its graph session.
///
/// Built once per inbound request and passed by reference down the call
/// chain. Both fields are optional in effect:
///
/// * `database`: `None` opens the driver's default logical database. A name
///   the driver does not know falls back to the default, unless bookmarks
///   are also requested.
/// * `bookmarks`: empty means no causal requirement. Non-empty means every
///   bookmark must already be visible to the session, otherwise acquisition
///   fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub database: Option<String>,
    pub bookmarks: Vec<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_bookmark(mut self, bookmark: impl Into<String>) -> Self {
        self.bookmarks.push(bookmark.into());
        self
    }

    pub fn has_bookmarks(&self) -> bool {
        !self.bookmarks.is_empty()
    }
}
