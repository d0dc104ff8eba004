//! Test helpers for behavioral specifications.
//!
//! A [`TestDaemon`] is a started daemon in a temporary state directory with
//! its listener running. A [`Workstation`] talks to it only through the
//! socket, via remote routes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use hz_core::test_support::{hazard, hazard_at, square, window, TEST_SITE};
pub use hz_core::{
    keys, EventFilters, EventId, EventRequest, EventResponse, HazardEvent, LockRefusal,
    LockRequest, LockResponse, LockStatus, RecommenderRequest, RecommenderResponse,
    RoutedRequest, ServiceRequest, WorkstationId,
};
pub use hz_daemon::{Config, DaemonState, PeerConfig, Settings};
pub use hz_engine::{RemoteRoute, RequestRouter, RoutingError};
pub use serde_json::{json, Value};

use hz_adapters::SocketTransport;
use hz_daemon::{lifecycle, Listener};
use tempfile::TempDir;

pub struct TestDaemon {
    pub daemon: DaemonState,
    pub dir: TempDir,
}

impl TestDaemon {
    /// Start a daemon for [`TEST_SITE`] named `node`
    pub async fn start(node: &str) -> Self {
        Self::start_with(Settings {
            node: node.to_string(),
            site: TEST_SITE.to_string(),
            sync_timeout_ms: 5_000,
            ..Settings::default()
        })
        .await
    }

    pub async fn start_with(settings: Settings) -> Self {
        let dir = TempDir::new().unwrap();
        Self::start_in(dir, settings).await
    }

    /// Start (or restart) in an existing state directory
    pub async fn start_in(dir: TempDir, settings: Settings) -> Self {
        let config = Config::with_settings(dir.path().to_path_buf(), settings);
        let result = lifecycle::startup(&config).await.unwrap();
        let listener = Listener::new(result.listener, result.daemon.services.router.clone());
        tokio::spawn(listener.run());
        Self {
            daemon: result.daemon,
            dir,
        }
    }

    pub fn socket(&self) -> PathBuf {
        self.daemon.config.socket_path.clone()
    }

    pub fn recommender_dir(&self) -> &Path {
        &self.daemon.config.recommender_dir
    }

    /// Install an executable recommender script
    pub fn install_recommender(&self, name: &str, body: &str) {
        let dir = self.recommender_dir();
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn workstation(&self, name: &str) -> Workstation {
        Workstation::connect(name, &self.socket())
    }

    /// Shut down and hand back the state directory
    pub async fn stop(mut self) -> TempDir {
        self.daemon.shutdown().await.unwrap();
        let TestDaemon { daemon, dir } = self;
        drop(daemon);
        dir
    }
}

/// A client session reaching the daemon only over its socket
pub struct Workstation {
    pub id: WorkstationId,
    pub router: RequestRouter,
}

impl Workstation {
    pub fn connect(name: &str, socket: &Path) -> Self {
        let router = RequestRouter::new(format!("ws-{name}"));
        for key in [keys::EVENTS, keys::LOCKS, keys::RECOMMENDER] {
            router.register(
                key,
                RemoteRoute::new(
                    SocketTransport::new(socket).with_timeout(Duration::from_secs(10)),
                ),
            );
        }
        Self {
            id: WorkstationId::new(name),
            router,
        }
    }

    pub async fn send<R: RoutedRequest>(&self, request: R) -> R::Response {
        self.router.send_typed(&request).await.unwrap()
    }

    pub async fn acquire(&self, event: &str) -> LockResponse {
        self.send(LockRequest::Acquire {
            event_id: EventId::new(event),
            workstation: self.id.clone(),
        })
        .await
    }

    pub async fn release(&self, event: &str) -> LockResponse {
        self.send(LockRequest::Release {
            event_id: EventId::new(event),
            workstation: self.id.clone(),
        })
        .await
    }

    pub async fn lock_status(&self, event: &str) -> LockStatus {
        match self
            .send(LockRequest::Query {
                event_id: EventId::new(event),
                viewer: self.id.clone(),
            })
            .await
        {
            LockResponse::Info { info } => info.lock_status,
            other => panic!("unexpected lock response: {other:?}"),
        }
    }

    pub async fn store(&self, events: Vec<HazardEvent>) {
        let response = self.send(EventRequest::Store { events }).await;
        assert_eq!(response, EventResponse::Done);
    }

    pub async fn all_events(&self) -> Vec<HazardEvent> {
        match self.send(EventRequest::All).await {
            EventResponse::Events { events } => events,
            other => panic!("unexpected event response: {other:?}"),
        }
    }
}
