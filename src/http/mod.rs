//! HTTP host layer.
//!
//! A small HTTP/1.1 server with keep-alive support, carrying requests to the
//! gateway and responses back:
//!
//! - **`connection`**: per-client loop; read a request, dispatch, repeat
//! - **`parser`**: parses incoming HTTP requests from byte buffers
//! - **`request`**: request representation and helpers
//! - **`response`**: response representation with builder pattern
//! - **`writer`**: serializes responses and streamed-response heads
//!
//! Error responses are written whole. View output never materializes here:
//! the gateway streams serialized chunks directly onto the socket, and such
//! connections close when the stream ends.

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
