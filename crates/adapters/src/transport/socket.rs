// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket transport to a peer daemon

use super::wire::{self, ProtocolError};
use super::{Transport, TransportError};
use async_trait::async_trait;
use hz_core::{RouteEnvelope, RouteReply};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::UnixStream;

/// Opens one connection per request to a peer's listener socket
#[derive(Debug, Clone)]
pub struct SocketTransport {
    path: PathBuf,
    timeout: Duration,
}

impl SocketTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: crate::env::transport_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Transport for SocketTransport {
    async fn send(&self, envelope: RouteEnvelope) -> Result<RouteReply, TransportError> {
        let mut stream = tokio::time::timeout(self.timeout, UnixStream::connect(&self.path))
            .await
            .map_err(|_| ProtocolError::Timeout)?
            .map_err(|source| TransportError::Connect {
                path: self.path.clone(),
                source,
            })?;

        let (mut reader, mut writer) = stream.split();
        wire::write_with_timeout(&mut writer, &envelope, self.timeout).await?;
        let reply = wire::read_with_timeout(&mut reader, self.timeout).await?;
        Ok(reply)
    }

    fn endpoint(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
