use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::gateway::Gateway;
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer;

const READ_BUFFER_SIZE: usize = 4096;

/// One client connection: reads requests, hands them to the gateway, and
/// loops while keep-alive holds. Successful view output is streamed straight
/// onto the socket by the gateway; only error responses are buffered.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    gateway: Arc<Gateway>,
}

impl Connection {
    pub fn new(stream: TcpStream, gateway: Arc<Gateway>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            gateway,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let request = match self.read_request().await? {
                Some(request) => request,
                // Client closed the connection.
                None => return Ok(()),
            };

            let keep_alive = self
                .gateway
                .dispatch(&request, &mut self.stream)
                .await?;

            if !keep_alive {
                return Ok(());
            }
        }
    }

    /// Read one request off the socket, growing the buffer until the parser
    /// has a complete request.
    ///
    /// A malformed request gets a direct error response and closes the
    /// connection; there is no view to resolve for it.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data, fall through to read
                }

                Err(ParseError::InvalidMethod) => {
                    let response = Response::plain_text(
                        StatusCode::MethodNotAllowed,
                        b"method not allowed\n".to_vec(),
                    );
                    writer::write_response(&response, &mut self.stream).await?;
                    return Ok(None);
                }

                Err(err) => {
                    let response = Response::plain_text(
                        StatusCode::BadRequest,
                        format!("malformed request: {err:?}\n").into_bytes(),
                    );
                    writer::write_response(&response, &mut self.stream).await?;
                    return Ok(None);
                }
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                // Client closed; anything left in the buffer was not a
                // complete request.
                return Ok(None);
            }
        }
    }
}
