// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service wiring.
//!
//! [`Services`] owns every shared registry of one daemon and registers the
//! local service routes on its router. Nothing here is a process-wide
//! singleton; tests build as many independent instances as they need.

mod events;
mod locks;
mod recommender;

pub use events::EventsRoute;
pub use locks::LocksRoute;
pub use recommender::RecommenderRoute;

use crate::config::Settings;
use hz_adapters::{wire, RecommenderHost, SocketTransport};
use hz_core::{keys, Clock, ValidatorRegistry};
use hz_engine::{
    ActionRegistry, LockManager, RecommenderEngine, RemoteRoute, RequestRouter, TimerNotice,
};
use hz_storage::{EventBackend, EventStore, StorageError};
use serde_json::json;
use std::sync::Arc;

/// Action posted on every heartbeat notice
pub const TICK_ACTION: &str = "timer.tick";

pub struct Services<H: RecommenderHost, C: Clock> {
    pub actions: Arc<ActionRegistry>,
    pub locks: Arc<LockManager>,
    pub store: Arc<EventStore<C>>,
    pub validators: Arc<ValidatorRegistry>,
    pub router: RequestRouter,
    pub engine: RecommenderEngine<H>,
}

impl<H: RecommenderHost, C: Clock> Services<H, C> {
    /// Build the registries and register local routes, then peers.
    ///
    /// A peer configured for a key that is also served locally replaces the
    /// local route.
    pub fn new(
        settings: &Settings,
        backend: Arc<dyn EventBackend>,
        host: H,
        clock: C,
        validators: Arc<ValidatorRegistry>,
    ) -> Result<Self, StorageError> {
        let actions = Arc::new(ActionRegistry::new());
        let locks = Arc::new(
            LockManager::new(settings.lock_shards).with_actions(Arc::clone(&actions)),
        );
        let store = Arc::new(EventStore::new(backend, clock.clone(), settings.site.clone())?);
        let engine = RecommenderEngine::new(host, settings.engine_config());
        let router = RequestRouter::new(settings.node.clone());

        router.register(keys::EVENTS, EventsRoute::new(Arc::clone(&store)));
        router.register(keys::LOCKS, LocksRoute::new(Arc::clone(&locks)));
        router.register(
            keys::RECOMMENDER,
            RecommenderRoute::new(
                engine.clone(),
                Arc::clone(&store),
                Arc::clone(&validators),
                clock,
                settings.sync_timeout(),
            ),
        );
        for peer in &settings.peers {
            tracing::info!(
                key = %peer.key,
                socket = %peer.socket.display(),
                "registering peer route"
            );
            // A forwarded recommender run may take the whole sync timeout
            let transport = SocketTransport::new(peer.socket.clone())
                .with_timeout(settings.sync_timeout() + wire::DEFAULT_TIMEOUT);
            router.register(peer.key.as_str(), RemoteRoute::new(transport));
        }

        let services = Self {
            actions,
            locks,
            store,
            validators,
            router,
            engine,
        };
        services.register_heartbeat();
        Ok(services)
    }

    fn register_heartbeat(&self) {
        let jobs = self.engine.clone();
        self.actions.register(TICK_ACTION, move |args| {
            let active = jobs.active_jobs();
            tracing::debug!(
                seq = args["seq"].as_u64().unwrap_or_default(),
                drift_ms = args["driftMs"].as_u64().unwrap_or_default(),
                active_jobs = active.len(),
                "heartbeat"
            );
            Ok(())
        });
    }

    /// Dispatch a timer notice as a [`TICK_ACTION`] post
    pub fn tick(&self, notice: &TimerNotice) -> usize {
        let args = json!({
            "seq": notice.seq,
            "requestedMs": notice.requested.as_millis() as u64,
            "actualMs": notice.actual.as_millis() as u64,
            "driftMs": notice.drift().as_millis() as u64,
            "clockMs": notice.clock_ms,
        });
        match self.actions.post_action(TICK_ACTION, &args) {
            Ok(invoked) => invoked,
            Err(e) => {
                tracing::warn!(error = %e, "heartbeat handlers failed");
                e.invoked
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
pub(crate) mod tests;
