//! CSV rendering.
//!
//! Header line of the view's declared columns, then one CRLF-terminated line
//! per row projecting exactly those columns, in that order, regardless of
//! the database's column order.

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncWrite;

use crate::db::ResultSet;

use super::{flush_all, flush_if_full, SerializeError, CHUNK_SIZE};

pub(super) async fn serialize<W: AsyncWrite + Unpin>(
    columns: &[String],
    rows: &ResultSet,
    out: &mut W,
) -> Result<(), SerializeError> {
    let mut buf = BytesMut::with_capacity(CHUNK_SIZE);

    // Header phase: the configured projection.
    for (i, name) in columns.iter().enumerate() {
        if i != 0 {
            buf.put_u8(b',');
        }
        push_field(&mut buf, name);
    }
    buf.put_slice(b"\r\n");

    // Row phase.
    for row in 0..rows.num_rows() {
        for (i, name) in columns.iter().enumerate() {
            if i != 0 {
                buf.put_u8(b',');
            }
            let value = rows
                .value_by_name(row, name)
                .ok_or_else(|| SerializeError::MissingColumn(name.clone()))?;
            // NULL becomes an empty field.
            push_field(&mut buf, value.unwrap_or(""));
        }
        buf.put_slice(b"\r\n");
        flush_if_full(&mut buf, out).await?;
    }

    flush_all(&mut buf, out).await?;
    Ok(())
}

/// Append one field.
///
/// A value containing a quote, comma, CR, or LF is wrapped in quotes with
/// every embedded quote doubled; anything else is copied verbatim. The value
/// is scanned once; quote doubling works by emitting the quote-delimited
/// segments with an extra quote between them.
fn push_field(buf: &mut BytesMut, value: &str) {
    let start = buf.len();
    let bytes = value.as_bytes();
    let mut needs_quote = false;
    let mut run = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => {
                // Emit up to and including this quote, then double it.
                buf.put_slice(&bytes[run..=i]);
                buf.put_u8(b'"');
                run = i + 1;
                needs_quote = true;
            }
            b',' | b'\r' | b'\n' => needs_quote = true,
            _ => {}
        }
    }
    buf.put_slice(&bytes[run..]);

    if needs_quote {
        let field = buf.split_off(start);
        buf.put_u8(b'"');
        buf.extend_from_slice(&field);
        buf.put_u8(b'"');
    }
}
