// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional per-hazard-type validation capability.
//!
//! A hazard type either declares a validator or it does not; the
//! [`Validation`] tag makes that explicit so callers never probe for the
//! capability at runtime.

use crate::event::HazardEvent;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Why a candidate event was refused
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
    #[error("validator failed: {0}")]
    Internal(String),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Checks a candidate hazard event
pub trait EventValidator: Send + Sync {
    fn validate(&self, event: &HazardEvent) -> Result<(), ValidationError>;
}

impl<F> EventValidator for F
where
    F: Fn(&HazardEvent) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, event: &HazardEvent) -> Result<(), ValidationError> {
        self(event)
    }
}

/// Rejects events missing any of the listed attributes
#[derive(Debug, Clone)]
pub struct RequiredAttributes(pub Vec<String>);

impl EventValidator for RequiredAttributes {
    fn validate(&self, event: &HazardEvent) -> Result<(), ValidationError> {
        match self.0.iter().find(|key| !event.attributes.contains_key(*key)) {
            Some(key) => Err(ValidationError::invalid(key.as_str(), "required attribute missing")),
            None => Ok(()),
        }
    }
}

/// Validation capability resolved for one hazard type
#[derive(Clone, Default)]
pub enum Validation {
    /// The type declares no validator; every candidate is accepted
    #[default]
    Unchecked,
    Checked(Arc<dyn EventValidator>),
}

impl Validation {
    /// Run the validator, folding a panic into [`ValidationError::Internal`]
    pub fn check(&self, event: &HazardEvent) -> Result<(), ValidationError> {
        match self {
            Validation::Unchecked => Ok(()),
            Validation::Checked(validator) => {
                catch_unwind(AssertUnwindSafe(|| validator.validate(event)))
                    .unwrap_or_else(|p| Err(ValidationError::Internal(describe_panic(p))))
            }
        }
    }
}

impl std::fmt::Debug for Validation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Validation::Unchecked => f.write_str("Unchecked"),
            Validation::Checked(_) => f.write_str("Checked"),
        }
    }
}

/// Hazard type → validator table
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    by_type: HashMap<String, Arc<dyn EventValidator>>,
    fallback: Option<Arc<dyn EventValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the validator for one hazard type (last write wins)
    pub fn register(
        &mut self,
        hazard_type: impl Into<String>,
        validator: impl EventValidator + 'static,
    ) {
        self.by_type.insert(hazard_type.into(), Arc::new(validator));
    }

    /// Validator for every hazard type without its own entry
    pub fn set_fallback(&mut self, validator: impl EventValidator + 'static) {
        self.fallback = Some(Arc::new(validator));
    }

    pub fn validation_for(&self, hazard_type: &str) -> Validation {
        self.by_type
            .get(hazard_type)
            .or(self.fallback.as_ref())
            .map(|v| Validation::Checked(Arc::clone(v)))
            .unwrap_or_default()
    }

    pub fn check(&self, event: &HazardEvent) -> Result<(), ValidationError> {
        self.validation_for(&event.hazard_type).check(event)
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&String> = self.by_type.keys().collect();
        types.sort();
        f.debug_struct("ValidatorRegistry")
            .field("types", &types)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Human-readable text of a caught panic payload
pub fn describe_panic(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
