//! Grnwood Graph - access layer over the property graph datastore
//!
//! Every query goes through the same lifecycle: a [`SessionManager`] opens a
//! session for the request's [`RequestContext`], the [`QueryExecutor`] runs a
//! parameterized [`GraphQuery`] on it, and the session is released before the
//! result is handed back.

pub mod bookmark;
pub mod businesses;
pub mod context;
pub mod driver;
pub mod error;
pub mod executor;
pub mod schema;
pub mod session;
pub mod statement;
pub mod users;

pub use bookmark::Bookmark;
pub use businesses::{BusinessDraft, BusinessRepository};
pub use context::RequestContext;
pub use driver::GraphDriver;
pub use error::OptionalExt;
pub use executor::{Committed, QueryExecutor, QueryResult, Record};
pub use session::{GraphSession, SessionManager};
pub use statement::{AccessMode, GraphQuery, Param, Projection, Statement};
pub use users::{NewUser, UserRepository};
