// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hazards.events`: event store access over the router

use async_trait::async_trait;
use hz_core::{Clock, EventRequest, EventResponse, ServiceRequest};
use hz_engine::{decode_payload, encode_payload, Route, RouteContext, RoutingError};
use hz_storage::{EventStore, StorageError};
use serde_json::Value;
use std::sync::Arc;

pub struct EventsRoute<C: Clock> {
    store: Arc<EventStore<C>>,
}

impl<C: Clock> EventsRoute<C> {
    pub fn new(store: Arc<EventStore<C>>) -> Self {
        Self { store }
    }

    /// Storage refusals travel back as [`EventResponse::Failed`]
    pub fn serve(&self, request: EventRequest) -> EventResponse {
        match self.execute(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "event request refused");
                EventResponse::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    fn execute(&self, request: EventRequest) -> Result<EventResponse, StorageError> {
        let store = &self.store;
        Ok(match request {
            EventRequest::Create { template } => EventResponse::Created {
                event: match template {
                    Some(template) => store.create_event_from(&template),
                    None => store.create_event(),
                },
            },
            EventRequest::Store { events } => {
                store.store_events(events)?;
                EventResponse::Done
            }
            EventRequest::Update { events } => {
                store.update_events(events)?;
                EventResponse::Done
            }
            EventRequest::Remove { ids } => {
                store.remove_events(ids)?;
                EventResponse::Done
            }
            EventRequest::Get { id } => EventResponse::Event {
                event: store.get_event(&id)?,
            },
            EventRequest::History { id } => EventResponse::Events {
                events: store.history(&id)?,
            },
            EventRequest::Filter { filters } => EventResponse::Versions {
                versions: store.get_events_by_filter(&filters)?.into_iter().collect(),
            },
            EventRequest::ByGeometry { geometry } => EventResponse::Events {
                events: store.get_by_geometry(&geometry)?,
            },
            EventRequest::ByTime { range } => EventResponse::Events {
                events: store.get_by_time_range(&range)?,
            },
            EventRequest::All => EventResponse::Events {
                events: store.get_all()?,
            },
        })
    }
}

#[async_trait]
impl<C: Clock> Route for EventsRoute<C> {
    async fn handle(
        &self,
        request: ServiceRequest,
        _ctx: RouteContext,
    ) -> Result<Value, RoutingError> {
        let body: EventRequest = decode_payload(&request)?;
        encode_payload(&request.key, &self.serve(body))
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
