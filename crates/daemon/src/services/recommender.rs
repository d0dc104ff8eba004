// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hazards.recommender`: run a recommender and wait for its result.
//!
//! The input set holds the latest stored events of the requested site that
//! overlap the requested window, with `siteId`, `timeRange` and
//! `currentTime` set.

use async_trait::async_trait;
use hz_adapters::RecommenderHost;
use hz_core::{
    Clock, DialogInfo, EventSet, RecommenderRequest, RecommenderResponse, ServiceRequest,
    SpatialInfo, ValidatorRegistry,
};
use hz_engine::{
    decode_payload, encode_payload, RecommenderEngine, Route, RouteContext, RoutingError,
};
use hz_storage::{EventStore, StorageError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub struct RecommenderRoute<H: RecommenderHost, C: Clock> {
    engine: RecommenderEngine<H>,
    store: Arc<EventStore<C>>,
    validators: Arc<ValidatorRegistry>,
    clock: C,
    timeout: Duration,
}

impl<H: RecommenderHost, C: Clock> RecommenderRoute<H, C> {
    pub fn new(
        engine: RecommenderEngine<H>,
        store: Arc<EventStore<C>>,
        validators: Arc<ValidatorRegistry>,
        clock: C,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            store,
            validators,
            clock,
            timeout,
        }
    }

    fn input_for(&self, request: &RecommenderRequest) -> Result<EventSet, StorageError> {
        let mut input = EventSet::new(Arc::clone(&self.validators));
        input.set_site_id(request.site.clone());
        input.set_time_range(request.time_range);
        input.set_current_time(self.clock.utc());
        let candidates: Vec<_> = self
            .store
            .get_by_time_range(&request.time_range)?
            .into_iter()
            .filter(|event| event.site_id == request.site)
            .collect();
        input.add_all(&candidates);
        Ok(input)
    }

    pub async fn serve(&self, request: RecommenderRequest) -> RecommenderResponse {
        let input = match self.input_for(&request) {
            Ok(input) => input,
            Err(e) => {
                return RecommenderResponse::Failed {
                    message: e.to_string(),
                }
            }
        };
        let dialog = DialogInfo::new().with("siteId", request.site.clone());
        let result = self
            .engine
            .run_recommender_sync(
                &request.recommender_name,
                input,
                SpatialInfo::new(),
                dialog,
                self.timeout,
            )
            .await;
        match result {
            Ok(events) => RecommenderResponse::Events {
                events: events.into_events(),
            },
            Err(e) => {
                tracing::warn!(
                    recommender = %request.recommender_name,
                    error = %e,
                    "routed recommender run failed"
                );
                RecommenderResponse::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl<H: RecommenderHost, C: Clock> Route for RecommenderRoute<H, C> {
    async fn handle(
        &self,
        request: ServiceRequest,
        _ctx: RouteContext,
    ) -> Result<Value, RoutingError> {
        let body: RecommenderRequest = decode_payload(&request)?;
        let response = self.serve(body).await;
        encode_payload(&request.key, &response)
    }
}

#[cfg(test)]
#[path = "recommender_tests.rs"]
mod tests;
