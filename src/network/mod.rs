//! Message Boundary
//!
//! Transport-agnostic request/response messages. Whatever carries bytes to
//! and from clients (WebSocket, HTTP, a test harness) hands decoded
//! [`ClientMessage`]s to [`dispatch`] and sends back the [`ServerMessage`].
//! No sockets are opened here.

pub mod protocol;

pub use protocol::{dispatch, handle_json, ClientMessage, ErrorCode, ServerError, ServerMessage};
