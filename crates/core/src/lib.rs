// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hz-core: Hazard event model shared by the coordination services

pub mod clock;
pub mod event;
pub mod event_set;
pub mod geometry;
pub mod id;
pub mod lock;
pub mod recommender;
pub mod service;
pub mod time_range;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{fields, EventId, EventStatus, HazardEvent};
pub use event_set::{EventSet, EventSetPayload};
pub use geometry::{Coordinate, Geometry};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use lock::{LockInfo, LockStatus, WorkstationId};
pub use recommender::{DialogInfo, JobStatus, RecommenderInfo, RecommenderJobId, SpatialInfo};
pub use service::{
    keys, EventFilters, EventRequest, EventResponse, Hop, LockRefusal, LockRequest, LockResponse,
    RecommenderRequest, RecommenderResponse, RouteEnvelope, RouteFailureKind, RouteReply,
    RoutedRequest, ServiceKey, ServiceRequest,
};
pub use time_range::{TimeRange, TimeRangeError};
pub use validation::{
    describe_panic, EventValidator, RequiredAttributes, Validation, ValidationError,
    ValidatorRegistry,
};
