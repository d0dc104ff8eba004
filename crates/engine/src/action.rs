// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name-keyed synchronous multicast of actions.
//!
//! Handlers run on the posting thread in registration order. A failing or
//! panicking handler does not stop the fan-out; failures are collected and
//! reported once every handler has run.

use hz_core::describe_panic;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by one handler
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One handler's failure, by its position in the registration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub index: usize,
    pub error: ActionError,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("action '{action}': {} of {invoked} handlers failed", failures.len())]
pub struct ActionDispatchError {
    pub action: String,
    pub invoked: usize,
    pub failures: Vec<HandlerFailure>,
}

type Handler = Arc<dyn Fn(&Value) -> Result<(), ActionError> + Send + Sync>;

#[derive(Default)]
pub struct ActionRegistry {
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `action`; registering the same handler twice runs it twice
    pub fn register<F>(&self, action: impl Into<String>, handler: F)
    where
        F: Fn(&Value) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .entry(action.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Invoke every handler for `action` in registration order.
    ///
    /// Returns how many handlers ran. The handler list is snapshotted first,
    /// so handlers may register or unregister while a post is in progress.
    pub fn post_action(&self, action: &str, args: &Value) -> Result<usize, ActionDispatchError> {
        let snapshot: Vec<Handler> = match self.handlers.read().get(action) {
            Some(handlers) => handlers.clone(),
            None => return Ok(0),
        };

        let mut failures = Vec::new();
        for (index, handler) in snapshot.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(args)))
                .unwrap_or_else(|payload| Err(ActionError(describe_panic(payload))));
            if let Err(error) = outcome {
                tracing::warn!(action, index, error = %error, "action handler failed");
                failures.push(HandlerFailure { index, error });
            }
        }

        if failures.is_empty() {
            Ok(snapshot.len())
        } else {
            Err(ActionDispatchError {
                action: action.to_string(),
                invoked: snapshot.len(),
                failures,
            })
        }
    }

    /// Drop every handler for `action`, returning how many were removed
    pub fn unregister_all(&self, action: &str) -> usize {
        self.handlers
            .write()
            .remove(action)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }

    pub fn handler_count(&self, action: &str) -> usize {
        self.handlers.read().get(action).map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
