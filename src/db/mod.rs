//! Database collaborator seam.
//!
//! The gateway never talks to a database driver directly. It works against
//! the [`SqlConnection`] and [`ConnectionFactory`] traits, which expose the
//! prepare/execute/fetch primitives the executor and pool need. The
//! production binding lives in [`postgres`]; tests substitute an in-memory
//! fake.

pub mod pool;
pub mod postgres;

use thiserror::Error;

/// Error reported by the database while executing a statement.
///
/// The message is driver-opaque; the executor only needs to know the
/// statement failed and the connection can no longer be trusted.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SqlError(pub String);

/// Failure to establish a new database connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The configured connection parameters are unusable. Retrying cannot
    /// help until the configuration changes.
    #[error("database misconfigured: {0}")]
    Configuration(String),

    /// The database was unreachable. A later attempt may succeed.
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

/// One live database connection.
///
/// A connection executes exactly one statement at a time and is owned either
/// by the pool (idle) or by one in-flight request (checked out).
pub trait SqlConnection: Send {
    /// Liveness probe. The pool calls this before handing out an idle
    /// connection; a `false` answer destroys the connection.
    fn ping(&mut self) -> bool;

    /// True when the connection is ready for a new statement, i.e. not left
    /// inside an open transaction. Connections that are not idle are
    /// destroyed on release instead of being pooled.
    fn is_idle(&self) -> bool;

    /// Execute a data-returning statement with positional text parameters
    /// and materialize the full result set.
    fn query(&mut self, sql: &str, params: &[&str]) -> Result<ResultSet, SqlError>;

    /// Execute a row-modifying statement; returns the number of affected
    /// rows.
    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, SqlError>;
}

/// Creates connections for the pool from configured parameters.
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self) -> Result<Box<dyn SqlConnection>, ConnectError>;
}

/// A fully materialized query result.
///
/// Rows and columns are addressable by index, and columns also by name; the
/// serializers need column metadata before the first row is emitted. A value
/// of `None` is database NULL, distinct from an empty string.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        ResultSet {
            columns,
            rows: Vec::new(),
        }
    }

    /// The result of a row-modifying statement: no columns, no rows.
    pub fn empty() -> Self {
        ResultSet::default()
    }

    /// Append a row; its values must align with the column header.
    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_name(&self, col: usize) -> &str {
        &self.columns[col]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at (row, col); `None` is database NULL.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows[row][col].as_deref()
    }

    /// Value by column name; the outer `None` means the column does not
    /// exist in this result set.
    pub fn value_by_name(&self, row: usize, name: &str) -> Option<Option<&str>> {
        self.column_index(name).map(|col| self.value(row, col))
    }
}
