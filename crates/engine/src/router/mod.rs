// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-key request routing.
//!
//! A [`RequestRouter`] maps service keys to routes. A route either handles
//! the request in-process or forwards it across a process boundary. Every
//! dispatch records a hop `(node, route, key)`; a request that would re-enter
//! a hop already on its chain fails with [`RoutingError::SelfLoop`]. The hop
//! chain travels with forwarded requests, so loops between nodes are caught
//! too.

mod remote;

pub use remote::RemoteRoute;

use async_trait::async_trait;
use hz_core::{
    Hop, RouteEnvelope, RouteFailureKind, RouteReply, RoutedRequest, ServiceKey, ServiceRequest,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("no route for service key {0}")]
    NoRoute(ServiceKey),
    #[error("route for {key} on node {node} would call itself")]
    SelfLoop { key: ServiceKey, node: String },
    #[error("handler for {key} failed: {message}")]
    Handler { key: ServiceKey, message: String },
    #[error("transport to {endpoint} failed for {key}: {message}")]
    Transport {
        key: ServiceKey,
        endpoint: String,
        message: String,
    },
    #[error("bad payload for {key}: {message}")]
    Codec { key: ServiceKey, message: String },
}

impl RoutingError {
    pub fn handler(key: &ServiceKey, message: impl std::fmt::Display) -> Self {
        RoutingError::Handler {
            key: key.clone(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> RouteFailureKind {
        match self {
            RoutingError::NoRoute(_) => RouteFailureKind::NoRoute,
            RoutingError::SelfLoop { .. } => RouteFailureKind::SelfLoop,
            RoutingError::Handler { .. } => RouteFailureKind::Handler,
            RoutingError::Transport { .. } => RouteFailureKind::Transport,
            RoutingError::Codec { .. } => RouteFailureKind::Codec,
        }
    }

    pub fn key(&self) -> &ServiceKey {
        match self {
            RoutingError::NoRoute(key)
            | RoutingError::SelfLoop { key, .. }
            | RoutingError::Handler { key, .. }
            | RoutingError::Transport { key, .. }
            | RoutingError::Codec { key, .. } => key,
        }
    }

    /// Wire form of this error
    pub fn to_reply(&self) -> RouteReply {
        let message = match self {
            RoutingError::NoRoute(_) => self.to_string(),
            RoutingError::SelfLoop { node, .. } => node.clone(),
            RoutingError::Handler { message, .. }
            | RoutingError::Transport { message, .. }
            | RoutingError::Codec { message, .. } => message.clone(),
        };
        RouteReply::Err {
            kind: self.kind(),
            key: self.key().clone(),
            message,
        }
    }

    /// Rebuild an error returned by the router behind `endpoint`
    pub fn from_reply(
        kind: RouteFailureKind,
        key: ServiceKey,
        message: String,
        endpoint: &str,
    ) -> Self {
        match kind {
            RouteFailureKind::NoRoute => RoutingError::NoRoute(key),
            RouteFailureKind::SelfLoop => RoutingError::SelfLoop { key, node: message },
            RouteFailureKind::Handler => RoutingError::Handler { key, message },
            RouteFailureKind::Transport => RoutingError::Transport {
                key,
                endpoint: endpoint.to_string(),
                message,
            },
            RouteFailureKind::Codec => RoutingError::Codec { key, message },
        }
    }
}

/// Something that can service requests for a key
#[async_trait]
pub trait Route: Send + Sync + 'static {
    async fn handle(&self, request: ServiceRequest, ctx: RouteContext)
        -> Result<Value, RoutingError>;
}

/// Dispatch state handed to a route: the router it was reached through and
/// the hops taken so far, including its own.
#[derive(Clone)]
pub struct RouteContext {
    router: RequestRouter,
    hops: Vec<Hop>,
}

impl RouteContext {
    /// Send a nested request, continuing this request's hop chain
    pub async fn send(&self, request: ServiceRequest) -> Result<Value, RoutingError> {
        self.router.dispatch(request, self.hops.clone()).await
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn router(&self) -> &RequestRouter {
        &self.router
    }
}

type RouteFuture = Pin<Box<dyn Future<Output = Result<Value, RoutingError>> + Send>>;

/// Route backed by an async closure
pub struct FnRoute {
    f: Box<dyn Fn(ServiceRequest, RouteContext) -> RouteFuture + Send + Sync>,
}

impl FnRoute {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ServiceRequest, RouteContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RoutingError>> + Send + 'static,
    {
        Self {
            f: Box::new(move |request, ctx| Box::pin(f(request, ctx))),
        }
    }
}

#[async_trait]
impl Route for FnRoute {
    async fn handle(
        &self,
        request: ServiceRequest,
        ctx: RouteContext,
    ) -> Result<Value, RoutingError> {
        (self.f)(request, ctx).await
    }
}

struct RouterInner {
    node: String,
    routes: RwLock<HashMap<ServiceKey, Arc<dyn Route>>>,
    default: RwLock<Option<Arc<dyn Route>>>,
}

/// Service-key route table; cheap to clone, clones share the table
#[derive(Clone)]
pub struct RequestRouter {
    inner: Arc<RouterInner>,
}

impl RequestRouter {
    /// Router for the node named `node` (used in hop chains and logs)
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                node: node.into(),
                routes: RwLock::new(HashMap::new()),
                default: RwLock::new(None),
            }),
        }
    }

    pub fn node(&self) -> &str {
        &self.inner.node
    }

    /// Route `key` to `route`, replacing any earlier registration
    pub fn register(&self, key: impl Into<ServiceKey>, route: impl Route) {
        self.register_arc(key, Arc::new(route));
    }

    pub fn register_arc(&self, key: impl Into<ServiceKey>, route: Arc<dyn Route>) {
        let key = key.into();
        tracing::debug!(node = %self.inner.node, %key, "route registered");
        self.inner.routes.write().insert(key, route);
    }

    pub fn unregister(&self, key: &str) -> bool {
        self.inner.routes.write().remove(key).is_some()
    }

    pub fn has_route(&self, key: &str) -> bool {
        self.inner.routes.read().contains_key(key)
    }

    /// Route used for keys with no registration
    pub fn set_default(&self, route: impl Route) {
        *self.inner.default.write() = Some(Arc::new(route));
    }

    /// Drop every registration and the default
    pub fn clear(&self) {
        self.inner.routes.write().clear();
        *self.inner.default.write() = None;
        tracing::debug!(node = %self.inner.node, "routes cleared");
    }

    pub async fn send(&self, request: ServiceRequest) -> Result<Value, RoutingError> {
        self.dispatch(request, Vec::new()).await
    }

    /// Send a typed request under its own key and decode the typed response
    pub async fn send_typed<R: RoutedRequest>(
        &self,
        request: &R,
    ) -> Result<R::Response, RoutingError> {
        let request = ServiceRequest::encode(request).map_err(|e| RoutingError::Codec {
            key: ServiceKey::new(R::SERVICE_KEY),
            message: e.to_string(),
        })?;
        let key = request.key.clone();
        let payload = self.send(request).await?;
        serde_json::from_value(payload).map_err(|e| RoutingError::Codec {
            key,
            message: e.to_string(),
        })
    }

    /// Serve an envelope that arrived from another process
    pub async fn dispatch_envelope(&self, envelope: RouteEnvelope) -> RouteReply {
        match self.dispatch(envelope.request, envelope.hops).await {
            Ok(payload) => RouteReply::Ok { payload },
            Err(e) => e.to_reply(),
        }
    }

    fn resolve(&self, key: &ServiceKey) -> Option<Arc<dyn Route>> {
        if let Some(route) = self.inner.routes.read().get(key) {
            return Some(Arc::clone(route));
        }
        self.inner.default.read().clone()
    }

    fn dispatch(
        &self,
        request: ServiceRequest,
        mut hops: Vec<Hop>,
    ) -> Pin<Box<dyn Future<Output = Result<Value, RoutingError>> + Send + '_>> {
        Box::pin(async move {
            let key = request.key.clone();
            let Some(route) = self.resolve(&key) else {
                tracing::debug!(node = %self.inner.node, %key, "no route");
                return Err(RoutingError::NoRoute(key));
            };

            let hop = Hop {
                node: self.inner.node.clone(),
                route: route_identity(&route),
                key: key.clone(),
            };
            if hops.contains(&hop) {
                tracing::warn!(node = %hop.node, %key, depth = hops.len(), "routing loop refused");
                return Err(RoutingError::SelfLoop {
                    key,
                    node: hop.node,
                });
            }
            hops.push(hop);

            let ctx = RouteContext {
                router: self.clone(),
                hops,
            };
            let result = route.handle(request, ctx).await;
            if let Err(e) = &result {
                tracing::debug!(node = %self.inner.node, %key, error = %e, "route failed");
            }
            result
        })
    }
}

/// Identity of a registered route instance within this process
fn route_identity(route: &Arc<dyn Route>) -> u64 {
    Arc::as_ptr(route) as *const () as usize as u64
}

/// Decode a request payload, reporting failures as [`RoutingError::Codec`]
pub fn decode_payload<T: DeserializeOwned>(request: &ServiceRequest) -> Result<T, RoutingError> {
    serde_json::from_value(request.payload.clone()).map_err(|e| RoutingError::Codec {
        key: request.key.clone(),
        message: e.to_string(),
    })
}

pub fn encode_payload<T: Serialize>(key: &ServiceKey, value: &T) -> Result<Value, RoutingError> {
    serde_json::to_value(value).map_err(|e| RoutingError::Codec {
        key: key.clone(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
