//! `QuizServer` builder and accept loop.
//!
//! Ties the layers together: bind the transport, spawn the hub actor, and
//! turn every accepted WebSocket into a client session.

use quizhub_transport::{Transport, WebSocketTransport};

use crate::hub::{Hub, HubHandle};
use crate::{ServerError, session};

/// Builder for configuring and starting a quiz server.
pub struct QuizServerBuilder {
    bind_addr: String,
}

impl QuizServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the transport and builds the server.
    ///
    /// Binding is the only failure that should stop the process; every
    /// later error is scoped to a single connection.
    pub async fn build(self) -> Result<QuizServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let (hub, handle) = Hub::new();
        Ok(QuizServer {
            transport,
            hub,
            handle,
        })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A quiz server ready to accept connections.
pub struct QuizServer {
    transport: WebSocketTransport,
    hub: Hub,
    handle: HubHandle,
}

impl QuizServer {
    /// Creates a new builder.
    pub fn builder() -> QuizServerBuilder {
        QuizServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server: spawns the hub actor, then accepts connections
    /// until the process is terminated. Accept-time errors are logged and
    /// the loop continues.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tokio::spawn(self.hub.run());
        tracing::info!("quiz server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let id = session::spawn(conn, self.handle.clone());
                    tracing::debug!(client_id = %id, "session started");
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
