//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! One TCP listener serves three kinds of request, routed by path before
//! the WebSocket handshake runs:
//!
//! - `GET /ws` — upgraded to a WebSocket connection and returned to the
//!   accept loop.
//! - `GET /health` — answered inline with a liveness JSON body.
//! - anything else — answered with a 404.
//!
//! Routing requires reading the request head off the socket, but
//! `tungstenite` performs its own handshake parse, so upgraded streams are
//! wrapped in [`Rewind`], which replays the already-consumed bytes.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, Transport, TransportError};

/// Path of the WebSocket endpoint.
pub const WS_PATH: &str = "/ws";

/// Path of the liveness endpoint.
const HEALTH_PATH: &str = "/health";

/// Liveness response body, verbatim from the original deployment.
const HEALTH_BODY: &str = r#"{"status":"healthy","server":"quiz-app"}"#;

/// Upper bound on an HTTP request head before the peer is rejected.
const MAX_REQUEST_HEAD: usize = 8 * 1024;

type WsStream = WebSocketStream<Rewind>;

/// A WebSocket [`Transport`] listening on one TCP socket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds the transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener =
            TcpListener::bind(addr).await.map_err(TransportError::Bind)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves one accepted TCP stream.
    ///
    /// Returns `Ok(Some(_))` for an upgraded WebSocket, `Ok(None)` for a
    /// plain HTTP request that was answered and closed.
    async fn serve(
        &self,
        mut stream: TcpStream,
    ) -> Result<Option<WebSocketConnection>, TransportError> {
        let head = read_request_head(&mut stream).await?;
        let path = request_path(&head)
            .ok_or_else(|| {
                TransportError::BadRequest("malformed request line".into())
            })?
            .to_owned();

        match path.as_str() {
            WS_PATH => {
                // The Origin header is deliberately not checked here —
                // development posture, same as the original server.
                let ws = tokio_tungstenite::accept_async(Rewind::new(
                    head, stream,
                ))
                .await
                .map_err(TransportError::Handshake)?;
                Ok(Some(WebSocketConnection::new(ws)))
            }
            HEALTH_PATH => {
                respond(&mut stream, "200 OK", HEALTH_BODY).await;
                Ok(None)
            }
            other => {
                tracing::debug!(path = other, "no route for request");
                respond(&mut stream, "404 Not Found", "404 page not found")
                    .await;
                Ok(None)
            }
        }
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Accepts connections until one of them is a WebSocket upgrade.
    ///
    /// Plain HTTP requests (health checks, stray browsers) are answered
    /// inline and the loop continues. Per-connection failures are logged
    /// and skipped; only listener-level errors surface to the caller.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        loop {
            let (stream, addr) = self
                .listener
                .accept()
                .await
                .map_err(TransportError::Accept)?;

            match self.serve(stream).await {
                Ok(Some(conn)) => {
                    tracing::debug!(%addr, "accepted WebSocket connection");
                    return Ok(conn);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connection setup failed");
                    continue;
                }
            }
        }
    }
}

/// A single WebSocket connection.
///
/// The stream is split so the session layer's reader and writer tasks can
/// operate concurrently; each half has its own lock.
pub struct WebSocketConnection {
    reader: Mutex<SplitStream<WsStream>>,
    writer: Mutex<SplitSink<WsStream, Message>>,
}

impl WebSocketConnection {
    fn new(ws: WsStream) -> Self {
        let (writer, reader) = ws.split();
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        self.writer
            .lock()
            .await
            .send(msg)
            .await
            .map_err(TransportError::Send)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => return Err(TransportError::Receive(e)),
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(TransportError::Send)
    }
}

// ---------------------------------------------------------------------------
// HTTP plumbing
// ---------------------------------------------------------------------------

/// Reads from the socket until the end of the HTTP request head.
///
/// Returns every byte consumed so far, which is exactly what [`Rewind`]
/// must replay for `tungstenite`'s own handshake parse.
async fn read_request_head(
    stream: &mut TcpStream,
) -> Result<Vec<u8>, TransportError> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(TransportError::Accept)?;
        if n == 0 {
            return Err(TransportError::BadRequest(
                "connection closed before request head".into(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);

        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return Ok(buf);
        }
        if buf.len() > MAX_REQUEST_HEAD {
            return Err(TransportError::BadRequest(
                "request head too large".into(),
            ));
        }
    }
}

/// Extracts the request path (query string stripped) from a raw head.
fn request_path(head: &[u8]) -> Option<&str> {
    let head = std::str::from_utf8(head).ok()?;
    let request_line = head.lines().next()?;
    let target = request_line.split_whitespace().nth(1)?;
    Some(target.split('?').next().unwrap_or(target))
}

/// Writes a minimal HTTP/1.1 response and shuts the stream down.
/// Best-effort: the peer may already be gone.
async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::debug!(error = %e, "failed to write HTTP response");
        return;
    }
    let _ = stream.shutdown().await;
}

// ---------------------------------------------------------------------------
// Rewind — replay consumed bytes ahead of the inner stream
// ---------------------------------------------------------------------------

/// An `AsyncRead + AsyncWrite` wrapper that yields a buffered prefix before
/// reading from the inner stream. Writes pass straight through.
struct Rewind {
    prefix: Vec<u8>,
    pos: usize,
    inner: TcpStream,
}

impl Rewind {
    fn new(prefix: Vec<u8>, inner: TcpStream) -> Self {
        Self {
            prefix,
            pos: 0,
            inner,
        }
    }
}

impl AsyncRead for Rewind {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if this.pos < this.prefix.len() {
            let n = (this.prefix.len() - this.pos).min(buf.remaining());
            buf.put_slice(&this.prefix[this.pos..this.pos + n]);
            this.pos += n;
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for Rewind {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
