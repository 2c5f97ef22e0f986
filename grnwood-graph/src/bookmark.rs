//! Consistency bookmarks
//!
//! A bookmark names a committed write: `<database>:<commit sequence>`. A
//! session honours a bookmark when its database has committed at least that
//! sequence.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bookmark {
    database: String,
    sequence: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookmarkError {
    #[error("malformed bookmark '{0}'")]
    Malformed(String),
    #[error("bookmark '{bookmark}' belongs to database '{expected}'")]
    WrongDatabase { bookmark: String, expected: String },
    #[error("bookmark '{bookmark}' is ahead of committed sequence {committed}")]
    NotYetVisible { bookmark: String, committed: i64 },
}

impl Bookmark {
    pub fn new(database: impl Into<String>, sequence: i64) -> Self {
        Self {
            database: database.into(),
            sequence,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Check that a session on `database` at `committed` observes this bookmark
    pub fn check_visible(&self, database: &str, committed: i64) -> Result<(), BookmarkError> {
        if self.database != database {
            return Err(BookmarkError::WrongDatabase {
                bookmark: self.to_string(),
                expected: database.to_string(),
            });
        }
        if self.sequence > committed {
            return Err(BookmarkError::NotYetVisible {
                bookmark: self.to_string(),
                committed,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.database, self.sequence)
    }
}

impl FromStr for Bookmark {
    type Err = BookmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (database, sequence) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| BookmarkError::Malformed(s.to_string()))?;
        let sequence: i64 = sequence
            .parse()
            .map_err(|_| BookmarkError::Malformed(s.to_string()))?;
        if database.is_empty() || sequence < 0 {
            return Err(BookmarkError::Malformed(s.to_string()));
        }
        Ok(Self::new(database, sequence))
    }
}
