//! JSON rendering.
//!
//! A single row is emitted as a bare object; two or more rows are wrapped in
//! an array. Keys use the database's column order. Values are type-sniffed
//! from their text unless their column is in the string-hint set; every
//! value is classified into exactly one of null, true, false, number, or
//! string.

use std::collections::HashSet;

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncWrite;

use crate::db::ResultSet;

use super::{flush_all, flush_if_full, SerializeError, CHUNK_SIZE};

pub(super) async fn serialize<W: AsyncWrite + Unpin>(
    strings: &HashSet<String>,
    rows: &ResultSet,
    out: &mut W,
) -> Result<(), SerializeError> {
    let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
    let nr_rows = rows.num_rows();

    // An empty result is an empty array, never a bare object.
    if nr_rows == 0 {
        buf.put_slice(b"[]\n");
        flush_all(&mut buf, out).await?;
        return Ok(());
    }

    if nr_rows > 1 {
        buf.put_slice(b"[\n");
    }

    for row in 0..nr_rows {
        let open: &[u8] = if row == 0 { b"{" } else { b", {" };
        buf.put_slice(open);
        for col in 0..rows.num_cols() {
            let sep: &[u8] = if col == 0 { b"\n\t" } else { b",\n\t" };
            buf.put_slice(sep);
            push_string(&mut buf, rows.column_name(col));
            buf.put_slice(b": ");
            push_value(&mut buf, strings, rows.column_name(col), rows.value(row, col));
        }
        buf.put_slice(b"\n}");
        flush_if_full(&mut buf, out).await?;
    }

    if nr_rows > 1 {
        buf.put_slice(b"\n]");
    }
    buf.put_slice(b"\n");

    flush_all(&mut buf, out).await?;
    Ok(())
}

/// Append one column value.
///
/// A column in the string-hint set is always a JSON string. Everything else
/// sniffs: NULL or empty is null, a leading t/y is true, a leading f/n is
/// false, a fully numeric text is emitted unquoted as-is, and the rest are
/// escaped strings.
fn push_value(buf: &mut BytesMut, strings: &HashSet<String>, name: &str, value: Option<&str>) {
    if strings.contains(name) {
        push_string(buf, value.unwrap_or(""));
        return;
    }

    let value = match value {
        None | Some("") => {
            buf.put_slice(b"null");
            return;
        }
        Some(v) => v,
    };

    match value.as_bytes()[0] {
        b't' | b'T' | b'y' | b'Y' => buf.put_slice(b"true"),
        b'f' | b'F' | b'n' | b'N' => buf.put_slice(b"false"),
        _ if is_number(value) => buf.put_slice(value.as_bytes()),
        _ => push_string(buf, value),
    }
}

/// True when the whole value parses as an integer or a float with no
/// trailing characters. Alphabetic bytes other than an exponent marker
/// disqualify the value: `inf` and `NaN` parse as f64 but are not JSON
/// numbers.
fn is_number(value: &str) -> bool {
    if value
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E')
    {
        return false;
    }
    value.parse::<i64>().is_ok() || value.parse::<f64>().is_ok()
}

/// Append a JSON string with standard escaping.
///
/// One pass over the value: verbatim runs are flushed between special
/// characters and the escape substituted in place. Quote and backslash are
/// backslash-escaped, the short escapes cover \b \f \n \r \t, and all other
/// control characters below 0x20 plus DEL use \u00xx.
fn push_string(buf: &mut BytesMut, value: &str) {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    buf.put_u8(b'"');
    let bytes = value.as_bytes();
    let mut run = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if b >= 0x20 && b != b'"' && b != b'\\' && b != 0x7f {
            continue;
        }
        buf.put_slice(&bytes[run..i]);
        match b {
            b'"' => buf.put_slice(b"\\\""),
            b'\\' => buf.put_slice(b"\\\\"),
            0x08 => buf.put_slice(b"\\b"),
            0x0c => buf.put_slice(b"\\f"),
            b'\n' => buf.put_slice(b"\\n"),
            b'\r' => buf.put_slice(b"\\r"),
            b'\t' => buf.put_slice(b"\\t"),
            _ => {
                let esc = [
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[(b >> 4) as usize],
                    HEX[(b & 0x0f) as usize],
                ];
                buf.put_slice(&esc);
            }
        }
        run = i + 1;
    }
    buf.put_slice(&bytes[run..]);
    buf.put_u8(b'"');
}
