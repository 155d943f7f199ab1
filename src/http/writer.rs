use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::{Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serialize a complete response (status line, headers, body) into one
/// buffer. Used for error responses and other bodies of known length.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&resp.body);

    buf
}

/// The head of a streamed response: status line, content type, and a
/// Connection: close marker, since the body length is not known up front.
/// The serializer's chunks follow directly after this.
pub fn response_head(status: StatusCode, content_type: &str) -> Vec<u8> {
    format!(
        "{} {} {}\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase(),
        content_type
    )
    .into_bytes()
}

/// Write a complete response to the stream.
pub async fn write_response<W: AsyncWrite + Unpin>(
    resp: &Response,
    stream: &mut W,
) -> io::Result<()> {
    stream.write_all(&serialize_response(resp)).await?;
    stream.flush().await
}
