//! Per-connection session pumps.
//!
//! Every accepted WebSocket gets a generated [`ClientId`], a bounded
//! outbound queue registered with the hub, and two tasks sharing the
//! connection:
//!
//! - the **reader** decodes inbound frames into [`Message`]s and forwards
//!   them to the hub tagged with the session id. Undecodable frames are
//!   logged and dropped; the session stays connected. Transport close or
//!   error triggers deregistration and ends the task.
//! - the **writer** drains the outbound queue onto the transport. The hub
//!   closes the queue by dropping its sender (deregistration); the writer
//!   then finishes delivering whatever was already queued and closes the
//!   socket.
//!
//! The session's room and username tags live in the hub's registry entry,
//! mutated only by the hub loop.

use std::sync::Arc;

use tokio::sync::mpsc;

use quizhub_protocol::{ClientId, Codec, JsonCodec, Message};
use quizhub_transport::{Connection, WebSocketConnection};

use crate::HubHandle;

/// Capacity of a session's outbound queue. A client that falls this many
/// messages behind is dropped rather than awaited.
pub const OUTBOUND_QUEUE: usize = 256;

/// Registers a new session with the hub and starts its pumps.
///
/// Returns the generated session id. The tasks own the connection from
/// here on; they end on transport close or hub-driven deregistration.
pub fn spawn(conn: WebSocketConnection, hub: HubHandle) -> ClientId {
    let id = ClientId::generate();
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
    hub.register(id.clone(), tx);

    let conn = Arc::new(conn);
    tokio::spawn(write_pump(Arc::clone(&conn), rx, id.clone(), hub.clone()));
    tokio::spawn(read_pump(conn, id.clone(), hub));
    id
}

async fn read_pump(
    conn: Arc<WebSocketConnection>,
    id: ClientId,
    hub: HubHandle,
) {
    let codec = JsonCodec;
    loop {
        match conn.recv().await {
            Ok(Some(frame)) => match codec.decode::<Message>(&frame) {
                Ok(message) => hub.inbound(&id, message),
                Err(e) => {
                    tracing::debug!(
                        client_id = %id,
                        error = %e,
                        "dropping undecodable frame"
                    );
                }
            },
            Ok(None) => {
                tracing::info!(client_id = %id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(client_id = %id, error = %e, "recv failed");
                break;
            }
        }
    }
    hub.unregister(&id);
}

async fn write_pump(
    conn: Arc<WebSocketConnection>,
    mut outbound: mpsc::Receiver<Vec<u8>>,
    id: ClientId,
    hub: HubHandle,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(client_id = %id, error = %e, "send failed");
            hub.unregister(&id);
            return;
        }
    }
    // The hub dropped our sender: everything queued before closure has
    // been delivered, so the socket can be shut cleanly.
    tracing::debug!(client_id = %id, "outbound queue closed, closing socket");
    let _ = conn.close().await;
}
