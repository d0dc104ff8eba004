// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Wall-clock budget for one recommender script run (default: 10 minutes).
pub fn recommender_timeout() -> Duration {
    parse_duration_ms("HZ_RECOMMENDER_TIMEOUT_MS").unwrap_or(Duration::from_secs(600))
}

/// Budget for one remote routing round trip (default: 5000ms).
pub fn transport_timeout() -> Duration {
    parse_duration_ms("HZ_TRANSPORT_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}
