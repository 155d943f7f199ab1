//! PostgreSQL binding for the database seam.
//!
//! Adapts the blocking `postgres` client to [`SqlConnection`] and
//! [`ConnectionFactory`]. Parameters are bound as text; views whose columns
//! need another type cast in SQL (`$1::int`). Result values are rendered
//! back to text so the serializers can treat them uniformly.

use std::time::Duration;

use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls, Row};

use crate::db::{ConnectError, ConnectionFactory, ResultSet, SqlConnection, SqlError};

/// Probe timeout for [`SqlConnection::ping`].
const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Creates connections from a `postgres://` URL.
pub struct PgConnectionFactory {
    url: String,
}

impl PgConnectionFactory {
    pub fn new(url: impl Into<String>) -> Self {
        PgConnectionFactory { url: url.into() }
    }
}

impl ConnectionFactory for PgConnectionFactory {
    fn connect(&self) -> Result<Box<dyn SqlConnection>, ConnectError> {
        let client = Client::connect(&self.url, NoTls).map_err(classify_connect)?;
        Ok(Box::new(PgConnection { client }))
    }
}

/// A server that answered but refused our parameters is a configuration
/// problem; anything else (refused socket, timeout) may clear up on its own.
fn classify_connect(err: postgres::Error) -> ConnectError {
    if err.as_db_error().is_some() {
        ConnectError::Configuration(err.to_string())
    } else {
        ConnectError::Unavailable(err.to_string())
    }
}

struct PgConnection {
    client: Client,
}

impl SqlConnection for PgConnection {
    fn ping(&mut self) -> bool {
        self.client.is_valid(PING_TIMEOUT).is_ok()
    }

    fn is_idle(&self) -> bool {
        // Statements run through `query`/`execute` auto-commit; this adapter
        // cannot leave the session inside a transaction. Views that issue a
        // bare BEGIN are a misconfiguration and end up closed here.
        !self.client.is_closed()
    }

    fn query(&mut self, sql: &str, params: &[&str]) -> Result<ResultSet, SqlError> {
        let bound = bind(params);
        let rows = self.client.query(sql, &bound).map_err(sql_error)?;

        let columns = match rows.first() {
            Some(row) => row
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            None => Vec::new(),
        };

        let mut result = ResultSet::new(columns);
        for row in &rows {
            let mut values = Vec::with_capacity(row.len());
            for idx in 0..row.len() {
                values.push(value_as_text(row, idx)?);
            }
            result.push_row(values);
        }
        Ok(result)
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, SqlError> {
        let bound = bind(params);
        self.client.execute(sql, &bound).map_err(sql_error)
    }
}

fn bind<'a>(params: &'a [&'a str]) -> Vec<&'a (dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

fn sql_error(err: postgres::Error) -> SqlError {
    SqlError(err.to_string())
}

/// Render one column of a row as text, `None` for NULL.
///
/// Booleans use the `t`/`f` letters the wire text format uses, which is what
/// the JSON sniffer expects.
fn value_as_text(row: &Row, idx: usize) -> Result<Option<String>, SqlError> {
    let ty = row.columns()[idx].type_();
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)
            .map_err(sql_error)?
            .map(|v| if v { "t" } else { "f" }.to_string())
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)
            .map_err(sql_error)?
            .map(|v| v.to_string())
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)
            .map_err(sql_error)?
            .map(|v| v.to_string())
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)
            .map_err(sql_error)?
            .map(|v| v.to_string())
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .map_err(sql_error)?
            .map(|v| v.to_string())
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)
            .map_err(sql_error)?
            .map(|v| v.to_string())
    } else {
        row.try_get::<_, Option<String>>(idx).map_err(sql_error)?
    };
    Ok(value)
}
