// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and serving
//! one routed envelope per connection through the daemon's router.

use std::time::Duration;

use hz_adapters::wire::{self, ProtocolError};
use hz_core::{RouteEnvelope, RouteReply};
use hz_engine::RequestRouter;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    router: RequestRouter,
    timeout: Duration,
}

impl Listener {
    pub fn new(socket: UnixListener, router: RequestRouter) -> Self {
        Self {
            socket,
            router,
            timeout: wire::DEFAULT_TIMEOUT,
        }
    }

    /// Per-message read/write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let router = self.router.clone();
                    let timeout = self.timeout;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, router, timeout).await {
                            match e {
                                ProtocolError::ConnectionClosed => debug!("client disconnected"),
                                ProtocolError::Timeout => warn!("connection timeout"),
                                _ => error!("connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}

/// Serve a single envelope.
///
/// The reply is always written when the envelope decodes; routing failures
/// travel inside it.
async fn handle_connection(
    stream: UnixStream,
    router: RequestRouter,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();

    let envelope: RouteEnvelope = wire::read_with_timeout(&mut reader, timeout).await?;
    let key = envelope.request.key.clone();
    debug!(%key, hops = envelope.hops.len(), "received routed request");

    let reply = router.dispatch_envelope(envelope).await;
    if let RouteReply::Err { kind, message, .. } = &reply {
        debug!(%key, ?kind, %message, "routed request failed");
    }

    wire::write_with_timeout(&mut writer, &reply, timeout).await
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
