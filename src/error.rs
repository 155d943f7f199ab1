//! Request-level error taxonomy.
//!
//! Every subsystem reports failures as `Result`; the gateway's dispatch layer
//! is the only place an error becomes an HTTP response.

use thiserror::Error;

use crate::db::pool::PoolError;
use crate::db::SqlError;
use crate::http::response::StatusCode;

/// A failure while handling one request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed cookie, query string, or body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body carried a content type other than
    /// `application/x-www-form-urlencoded`.
    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    /// No view matched the request, or a modifying statement affected zero
    /// rows.
    #[error("not found")]
    NotFound,

    /// The database could not be reached or rejected the statement.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// A bound parameter declared by the view was absent from the aggregated
    /// arguments. This is a configuration/request mismatch, not a transient
    /// fault.
    #[error("missing bound parameter '{0}'")]
    MissingParameter(String),

    /// Pool locking failure or another fault the server cannot blame on the
    /// request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BadRequest,
            GatewayError::UnsupportedMediaType(_) => StatusCode::UnsupportedMediaType,
            GatewayError::NotFound => StatusCode::NotFound,
            GatewayError::BadGateway(_) => StatusCode::BadGateway,
            GatewayError::MissingParameter(_) | GatewayError::Internal(_) => {
                StatusCode::InternalServerError
            }
        }
    }
}

impl From<SqlError> for GatewayError {
    fn from(err: SqlError) -> Self {
        GatewayError::BadGateway(err.to_string())
    }
}

impl From<PoolError> for GatewayError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Lock => GatewayError::Internal(err.to_string()),
            PoolError::Connect(_) => GatewayError::BadGateway(err.to_string()),
        }
    }
}
