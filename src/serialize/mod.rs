//! Result serialization.
//!
//! One serializer value with a CSV and a JSON variant; both run a header
//! phase then a row phase and stage output in a bounded chunk buffer that is
//! flushed to the sink whenever it fills. A large result set never lives in
//! memory all at once.

pub mod csv;
pub mod json;

use std::collections::HashSet;
use std::io;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::db::ResultSet;
use crate::gateway::router::OutputFormat;

/// Flush threshold for the staging buffer.
const CHUNK_SIZE: usize = 8192;

/// Failure while rendering a result set.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// A projected column was absent from a result row. Fatal: CSV cannot
    /// express a hole in a row.
    #[error("column '{0}' missing from result set")]
    MissingColumn(String),

    /// The sink stopped accepting output.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Renders a result set in a view's configured format.
pub enum Serializer<'a> {
    Csv(&'a [String]),
    Json(&'a HashSet<String>),
}

impl<'a> Serializer<'a> {
    pub fn for_format(format: &'a OutputFormat) -> Self {
        match format {
            OutputFormat::Csv { columns } => Serializer::Csv(columns),
            OutputFormat::Json { strings } => Serializer::Json(strings),
        }
    }

    /// The response content type for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Serializer::Csv(_) => "text/csv",
            Serializer::Json(_) => "application/json",
        }
    }

    /// Stream the result set into `out`.
    ///
    /// Once the row phase has started, a failure here cannot be converted
    /// into an error response; the caller must terminate the stream.
    pub async fn serialize<W: AsyncWrite + Unpin>(
        &self,
        rows: &ResultSet,
        out: &mut W,
    ) -> Result<(), SerializeError> {
        match self {
            Serializer::Csv(columns) => csv::serialize(columns, rows, out).await,
            Serializer::Json(strings) => json::serialize(strings, rows, out).await,
        }
    }
}

/// Hand the buffer to the sink when it has grown past the chunk size.
async fn flush_if_full<W: AsyncWrite + Unpin>(
    buf: &mut BytesMut,
    out: &mut W,
) -> io::Result<()> {
    if buf.len() >= CHUNK_SIZE {
        out.write_all(buf).await?;
        buf.clear();
    }
    Ok(())
}

/// Drain the buffer and flush the sink; ends every serialization.
async fn flush_all<W: AsyncWrite + Unpin>(buf: &mut BytesMut, out: &mut W) -> io::Result<()> {
    if !buf.is_empty() {
        out.write_all(buf).await?;
        buf.clear();
    }
    out.flush().await
}
