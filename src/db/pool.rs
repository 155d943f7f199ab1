//! Database connection pool.
//!
//! A LIFO stack of idle connections behind a mutex, plus an atomic counter
//! of live connections for observability. Connections are created lazily on
//! pool miss and revalidated with a liveness probe before reuse. The mutex
//! covers only the stack push/pop itself, never connection creation,
//! destruction, or query execution; those are unbounded-latency operations
//! and must not block other acquirers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use crate::db::{ConnectError, ConnectionFactory, SqlConnection};

/// Failure to hand out a connection.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Creating a fresh connection failed. Carries the factory's distinction
    /// between misconfiguration and transient unavailability.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The stack mutex was poisoned. Fatal for this operation.
    #[error("connection pool lock poisoned")]
    Lock,
}

/// An owned pool of reusable database connections.
///
/// Pools are plain values: construct one per gateway, or one per test. There
/// is no process-wide singleton.
pub struct ConnectionPool {
    factory: Box<dyn ConnectionFactory>,
    idle: Mutex<Vec<Box<dyn SqlConnection>>>,
    live: AtomicUsize,
}

impl ConnectionPool {
    pub fn new(factory: Box<dyn ConnectionFactory>) -> Self {
        ConnectionPool {
            factory,
            idle: Mutex::new(Vec::new()),
            live: AtomicUsize::new(0),
        }
    }

    /// Number of connections currently alive, idle or checked out.
    pub fn live_connections(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Check out a connection, reusing an idle one when possible.
    ///
    /// An idle connection that fails its liveness probe is destroyed and a
    /// fresh connection is created in its place.
    pub fn acquire(&self) -> Result<Box<dyn SqlConnection>, PoolError> {
        let reused = self.idle.lock().map_err(|_| PoolError::Lock)?.pop();

        if let Some(mut conn) = reused {
            if conn.ping() {
                return Ok(conn);
            }
            tracing::debug!("idle connection failed liveness probe, replacing");
            self.destroy(conn);
        }

        let conn = self.factory.connect()?;
        self.live.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(live = self.live_connections(), "opened database connection");
        Ok(conn)
    }

    /// Return a connection to the pool.
    ///
    /// With `force_close`, or when the connection is not in an idle/ready
    /// state, it is destroyed instead of being pooled.
    pub fn release(&self, conn: Box<dyn SqlConnection>, force_close: bool) {
        if force_close || !conn.is_idle() {
            self.destroy(conn);
            return;
        }

        match self.idle.lock() {
            Ok(mut idle) => idle.push(conn),
            Err(_) => {
                // A poisoned stack cannot take the connection back.
                tracing::error!("connection pool lock poisoned, closing connection");
                self.destroy(conn);
            }
        }
    }

    fn destroy(&self, conn: Box<dyn SqlConnection>) {
        drop(conn);
        self.live.fetch_sub(1, Ordering::Relaxed);
        tracing::debug!(live = self.live_connections(), "closed database connection");
    }
}
