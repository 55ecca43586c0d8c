//! Admin API Module
//!
//! Optional HTTP endpoint for watching the cache while the file server runs.
//!
//! # Endpoints
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, start_admin_server};
