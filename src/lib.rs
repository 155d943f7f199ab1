//! viewgate - a declarative HTTP-to-SQL gateway.
//!
//! Operators configure "views": an HTTP method and path matcher bound to a
//! parameterized SQL statement and an output format. The server resolves each
//! request to a view, gathers its arguments from cookies, query string, body,
//! and path captures, executes the statement through a connection pool, and
//! streams the result back as CSV or JSON.

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod http;
pub mod serialize;
pub mod server;
