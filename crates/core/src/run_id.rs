// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifiers.
//!
//! A [`RunId`] names one pipeline run. The format
//! `YYYYMMDD-HHMMSS-<microseconds>-<hex>` sorts chronologically, which
//! makes workspace listings and queue prefixes time-ordered for free,
//! while the trailing hex keeps same-instant collisions out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique, sortable identifier for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a new id for a run starting at `now`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let micros = now.timestamp_subsec_micros();
        let hex = &uuid::Uuid::new_v4().simple().to_string()[..8];
        Self(format!("{}-{:06}-{}", now.format("%Y%m%d-%H%M%S"), micros, hex))
    }

    /// Wrap an existing id string (e.g. parsed from a queue item).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for RunId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RunId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for RunId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "run_id_tests.rs"]
mod tests;
