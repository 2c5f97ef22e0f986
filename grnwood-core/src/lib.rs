//! Grnwood Core - shared domain types, errors, configuration and logging
//!
//! Every other crate in the workspace builds on the types defined here.

pub mod config;
pub mod error;
pub mod logging;
pub mod slug;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use slug::slugify;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
