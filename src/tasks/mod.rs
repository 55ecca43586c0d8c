//! Background Tasks Module
//!
//! Contains the long-running tasks started alongside the server.
//!
//! # Tasks
//! - Cache coordinator: sole owner of the eviction cache, reached through
//!   its lookup and insertion queues

mod coordinator;
pub mod messages;

pub use coordinator::{spawn_coordinator, CacheCoordinator, CoordinatorHandle};
pub use messages::{CaptureBuffer, InsertionRequest, LookupOutcome, LookupRequest, StreamOutcome};
