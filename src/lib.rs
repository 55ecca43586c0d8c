//! Slurp Server - A caching file server
//!
//! Serves files from a directory over a minimal TCP protocol and keeps
//! recently served files in a byte-bounded in-memory LRU cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod server;
pub mod tasks;

pub use api::AppState;
pub use config::{Config, ServeArgs};
pub use error::{Result, ServeError};
pub use fetch::{FetchPipeline, ServeRoot};
pub use tasks::{spawn_coordinator, CoordinatorHandle};
