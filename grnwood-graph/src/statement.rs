//! Parameterized statements and query descriptions
//!
//! Statement text is a `&'static str`: it is written in source, never
//! assembled at runtime. Caller values reach the datastore only as bound
//! parameters, so a hostile string is stored verbatim rather than executed.

use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;

/// A value bound to a positional `?NNN` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Integer(i64),
    Null,
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Text(value.clone())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Integer(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Param::Null)
    }
}

/// One statement with its bound parameters
#[derive(Debug, Clone)]
pub struct Statement {
    text: &'static str,
    params: Vec<Param>,
}

impl Statement {
    pub fn new(text: &'static str) -> Self {
        Self {
            text,
            params: Vec::new(),
        }
    }

    /// Bind the next positional parameter
    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn text(&self) -> &'static str {
        self.text
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn to_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        self.params
            .iter()
            .fold(sqlx::query(self.text), |query, param| match param {
                Param::Text(value) => query.bind(value.as_str()),
                Param::Integer(value) => query.bind(*value),
                Param::Null => query.bind(None::<String>),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// How the first row of the last statement is turned into a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// First column as a scalar
    FirstField,
    /// First column holds a JSON object document
    Entity,
}

/// An ordered chain of statements executed as one unit
#[derive(Debug, Clone)]
pub struct GraphQuery {
    steps: Vec<Statement>,
    mode: AccessMode,
    projection: Projection,
}

impl GraphQuery {
    pub fn read(statement: Statement) -> Self {
        Self {
            steps: vec![statement],
            mode: AccessMode::Read,
            projection: Projection::FirstField,
        }
    }

    pub fn write(statement: Statement) -> Self {
        Self {
            steps: vec![statement],
            mode: AccessMode::Write,
            projection: Projection::FirstField,
        }
    }

    /// Append a statement; the last one in the chain produces the result
    pub fn then(mut self, statement: Statement) -> Self {
        self.steps.push(statement);
        self
    }

    /// Project the result as an entity document
    pub fn entity(mut self) -> Self {
        self.projection = Projection::Entity;
        self
    }

    pub fn steps(&self) -> &[Statement] {
        &self.steps
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }
}
