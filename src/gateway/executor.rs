//! Query execution.
//!
//! Binds a view's declared parameter names, in order, to values from the
//! argument map and runs the statement through a pooled connection. Exactly
//! one statement execution per call; retries are the caller's decision.

use crate::db::pool::ConnectionPool;
use crate::db::ResultSet;
use crate::error::GatewayError;
use crate::gateway::args::ArgumentMap;
use crate::gateway::router::View;

/// Execute a view's statement with the given arguments.
///
/// GET and POST views run data-returning statements and materialize the
/// result set. PUT and DELETE views run row-modifying statements; zero
/// affected rows is a not-found outcome, a positive count succeeds with an
/// empty result set.
pub fn execute(
    view: &View,
    args: &ArgumentMap,
    pool: &ConnectionPool,
) -> Result<ResultSet, GatewayError> {
    let mut bound: Vec<&str> = Vec::with_capacity(view.bind.len());
    for name in &view.bind {
        let value = args
            .get(name)
            .ok_or_else(|| GatewayError::MissingParameter(name.clone()))?;
        bound.push(value);
    }

    let mut conn = pool.acquire()?;

    let result = if view.method.returns_rows() {
        conn.query(&view.sql, &bound).map(Some)
    } else {
        conn.execute(&view.sql, &bound)
            .map(|n| if n == 0 { None } else { Some(ResultSet::empty()) })
    };

    match result {
        Ok(Some(rows)) => {
            pool.release(conn, false);
            Ok(rows)
        }
        Ok(None) => {
            pool.release(conn, false);
            Err(GatewayError::NotFound)
        }
        Err(err) => {
            // The driver reported a failure; the connection can no longer be
            // trusted and must not be pooled again.
            tracing::warn!(sql = %view.sql, error = %err, "statement failed, closing connection");
            pool.release(conn, true);
            Err(err.into())
        }
    }
}
