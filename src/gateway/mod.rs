//! The gateway core: view resolution, argument aggregation, query
//! execution, and streamed serialization.
//!
//! `dispatch` is the single place an error becomes an HTTP response. It
//! never retries; the pool's silent replacement of unhealthy connections is
//! the only self-healing behavior in the system.

pub mod args;
pub mod executor;
pub mod router;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::db::pool::ConnectionPool;
use crate::db::ResultSet;
use crate::error::GatewayError;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer;
use crate::serialize::Serializer;

use router::{View, ViewRegistry};

/// One registry, one pool: everything needed to answer requests.
pub struct Gateway {
    registry: ViewRegistry,
    pool: ConnectionPool,
}

impl Gateway {
    pub fn new(registry: ViewRegistry, pool: ConnectionPool) -> Self {
        Gateway { registry, pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Handle one request, writing the complete HTTP response to `out`.
    ///
    /// Returns whether the connection may be kept alive afterwards. Streamed
    /// view output always closes the connection (its length is not known up
    /// front); error responses carry a Content-Length and keep the
    /// connection usable.
    ///
    /// A failure after row streaming has begun cannot be converted into an
    /// error response anymore; it propagates as an error and the caller
    /// drops the connection mid-stream.
    pub async fn dispatch<W: AsyncWrite + Unpin>(
        &self,
        request: &Request,
        out: &mut W,
    ) -> anyhow::Result<bool> {
        // Everything up to serialization is synchronous, and the database
        // call may block for a while; step out of the async scheduler for
        // the duration. Requires the multi-thread runtime.
        let outcome = tokio::task::block_in_place(|| self.run_view(request));

        let (view, rows) = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                let response = error_response(&err);
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status.as_u16(),
                    error = %err,
                    "request failed"
                );
                writer::write_response(&response, out).await?;
                return Ok(request.keep_alive());
            }
        };

        let serializer = Serializer::for_format(&view.format);
        out.write_all(&writer::response_head(
            StatusCode::Ok,
            serializer.content_type(),
        ))
        .await?;

        if let Err(err) = serializer.serialize(&rows, out).await {
            tracing::error!(
                method = %request.method,
                path = %request.path,
                error = %err,
                "serialization aborted mid-stream"
            );
            return Err(err.into());
        }

        tracing::info!(
            method = %request.method,
            path = %request.path,
            rows = rows.num_rows(),
            "request served"
        );
        Ok(false)
    }

    /// Resolve, aggregate, execute. The pure request-to-rows pipeline, with
    /// no response shaping.
    fn run_view(&self, request: &Request) -> Result<(&View, ResultSet), GatewayError> {
        let resolved = self
            .registry
            .resolve(request.method, request.route_path())?;

        let mut arguments = args::aggregate(request)?;
        // Path captures land last: they are part of the route identity and
        // override any cookie, query, or body value with the same name.
        for (name, value) in resolved.captures {
            arguments.insert(name, value);
        }

        let rows = executor::execute(resolved.view, &arguments, &self.pool)?;
        Ok((resolved.view, rows))
    }
}

fn error_response(err: &GatewayError) -> Response {
    Response::plain_text(err.status(), format!("{err}\n").into_bytes())
}
