//! File Server Module
//!
//! TCP side of the server: wire protocol, per-connection handling and the
//! accept loop.
//!
//! # Protocol
//! 1. Client sends a 255-byte NUL-padded file name
//! 2. Server replies with an 8-byte big-endian length
//! 3. Server sends the file body and closes

mod connection;
mod listener;
pub mod protocol;

pub use connection::handle_connection;
pub use listener::serve;
pub use protocol::{encode_name_frame, NAME_FRAME_LEN};
