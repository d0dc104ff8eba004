// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes and id allocation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Define a string-backed identifier newtype.
///
/// Generates `new()`, `as_str()`, `short()`, `Display`, `From<String>`,
/// `From<&str>`, `PartialEq<str>`, `PartialEq<&str>` and `Borrow<str>` so the
/// id can key a `HashMap` and still be looked up by `&str`.
///
/// ```ignore
/// define_id! {
///     /// Identity of a forecaster workstation.
///     pub struct WorkstationId;
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Leading `n` characters, for log lines.
            pub fn short(&self, n: usize) -> &str {
                match self.0.char_indices().nth(n) {
                    Some((idx, _)) => &self.0[..idx],
                    None => &self.0,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Allocates fresh identifiers
pub trait IdGen: Send + Sync {
    fn next(&self) -> String;
}

/// Random UUID ids (recommender jobs, anything without a natural sequence)
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Monotonic `<prefix>-<n>` ids, zero-padded to six digits.
///
/// Hazard event ids are issued per site (`OAX-000017`); tests use the same
/// generator for deterministic ids. Once the sequence reaches `u64::MAX`
/// it is exhausted and ids become `<prefix>-<uuid>` instead of wrapping.
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    /// Resume numbering after `first - 1` (e.g. after restoring a snapshot).
    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(first)),
        }
    }

    /// Push the counter past `seen` if it has not already passed it.
    pub fn observe(&self, seen: u64) {
        self.counter.fetch_max(seen.saturating_add(1), Ordering::SeqCst);
    }

    /// Parse the numeric suffix out of an id issued with this prefix.
    pub fn sequence_of(&self, id: &str) -> Option<u64> {
        id.strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')?
            .parse()
            .ok()
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let issued = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1));
        match issued {
            Ok(n) => format!("{}-{:06}", self.prefix, n),
            Err(_) => format!("{}-{}", self.prefix, uuid::Uuid::new_v4()),
        }
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
