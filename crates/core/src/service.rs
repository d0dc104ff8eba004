// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service routing envelope and the typed requests the backend serves.
//!
//! Every request carries a service key. Typed requests derive the key from
//! their type through [`RoutedRequest`] and travel as JSON inside a
//! [`ServiceRequest`].

use crate::event::{EventId, HazardEvent};
use crate::geometry::Geometry;
use crate::lock::{LockInfo, WorkstationId};
use crate::time_range::TimeRange;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

crate::define_id! {
    /// Key that selects which route services a request.
    pub struct ServiceKey;
}

/// Service keys served by the backend
pub mod keys {
    pub const EVENTS: &str = "hazards.events";
    pub const LOCKS: &str = "hazards.locks";
    pub const RECOMMENDER: &str = "hazards.recommender";
}

/// A request addressed by service key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub key: ServiceKey,
    pub payload: Value,
}

impl ServiceRequest {
    pub fn new(key: impl Into<ServiceKey>, payload: Value) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }

    /// Encode a typed request under its own service key
    pub fn encode<R: RoutedRequest>(request: &R) -> Result<Self, serde_json::Error> {
        Ok(Self {
            key: ServiceKey::new(R::SERVICE_KEY),
            payload: serde_json::to_value(request)?,
        })
    }
}

/// A request type that knows which service handles it
pub trait RoutedRequest: Serialize {
    const SERVICE_KEY: &'static str;
    type Response: DeserializeOwned;
}

/// One routing step: which node, which route on that node, which key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub node: String,
    pub route: u64,
    pub key: ServiceKey,
}

/// What crosses a process boundary: the request plus the hops it has taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEnvelope {
    pub request: ServiceRequest,
    #[serde(default)]
    pub hops: Vec<Hop>,
}

/// Failure categories that survive the trip back across a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteFailureKind {
    NoRoute,
    SelfLoop,
    Handler,
    Transport,
    Codec,
}

/// Reply to a [`RouteEnvelope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteReply {
    Ok {
        payload: Value,
    },
    Err {
        kind: RouteFailureKind,
        key: ServiceKey,
        message: String,
    },
}

// -- hazards.events --

/// Equality constraints keyed by field name
pub type EventFilters = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EventRequest {
    Create { template: Option<HazardEvent> },
    Store { events: Vec<HazardEvent> },
    Update { events: Vec<HazardEvent> },
    Remove { ids: Vec<EventId> },
    Get { id: EventId },
    History { id: EventId },
    Filter { filters: EventFilters },
    ByGeometry { geometry: Geometry },
    ByTime { range: TimeRange },
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EventResponse {
    Created { event: HazardEvent },
    Done,
    Event { event: Option<HazardEvent> },
    Events { events: Vec<HazardEvent> },
    Versions { versions: BTreeMap<EventId, Vec<HazardEvent>> },
    Failed { message: String },
}

impl RoutedRequest for EventRequest {
    const SERVICE_KEY: &'static str = keys::EVENTS;
    type Response = EventResponse;
}

// -- hazards.locks --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LockRequest {
    Acquire { event_id: EventId, workstation: WorkstationId },
    Release { event_id: EventId, workstation: WorkstationId },
    Query { event_id: EventId, viewer: WorkstationId },
    ReleaseAll { workstation: WorkstationId },
    Break { event_id: EventId, by: WorkstationId },
}

/// Why a lock operation was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LockRefusal {
    Conflict { holder: WorkstationId },
    NotOwner { holder: Option<WorkstationId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LockResponse {
    Info { info: LockInfo },
    Released { count: usize },
    Broken { previous: Option<WorkstationId> },
    Refused { refusal: LockRefusal },
}

impl RoutedRequest for LockRequest {
    const SERVICE_KEY: &'static str = keys::LOCKS;
    type Response = LockResponse;
}

// -- hazards.recommender --

/// Run a recommender for a site over a time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommenderRequest {
    pub recommender_name: String,
    pub site: String,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RecommenderResponse {
    Events { events: Vec<HazardEvent> },
    Failed { message: String },
}

impl RoutedRequest for RecommenderRequest {
    const SERVICE_KEY: &'static str = keys::RECOMMENDER;
    type Response = RecommenderResponse;
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
