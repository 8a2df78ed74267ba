// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Capture Identity and Typed Identifiers
//!
//! `CaptureId` is the replay-safety primitive of the whole system: a
//! deterministic string derived from `(domain, partition, content hash[,
//! timestamp])`. Rehashing the same payload for the same partition always
//! yields the same id, which is what makes delete-by-`capture_id` +
//! re-insert idempotent.
//!
//! The other identifiers (`ExecutionId`, `AnomalyId`, `RunId`, `StepId`) are
//! ULIDs: time-ordered, so `core_executions`/`core_workflow_runs` queries can
//! range over creation order without a separate timestamp index. Keeping
//! them as distinct newtypes (rather than a shared `Uuid`/`String`) means a
//! `StepId` can never be passed where an `ExecutionId` is expected.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use ulid::Ulid;

use crate::error::SpineError;

/// Opaque, deterministic capture identifier: `domain:partition:hash[:ts]`.
///
/// Consumers must not parse this string; the only guarantees are
/// determinism for identical payloads, a 128-character ceiling, and safety
/// as a primary-key / JSON value.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct CaptureId(String);

impl CaptureId {
    const MAX_LEN: usize = 128;

    /// Builds a capture id from its constituent parts. `timestamp` is an
    /// optional disambiguator (e.g. an ingest run's short timestamp) used
    /// when the same content could legitimately recur across ingests.
    pub fn new(
        domain: &str,
        partition_key: &PartitionKey,
        content_hash: &ContentHash,
        timestamp: Option<&str>,
    ) -> Result<Self, SpineError> {
        let mut raw = format!("{domain}:{}:{content_hash}", partition_key.as_str());
        if let Some(ts) = timestamp {
            raw.push(':');
            raw.push_str(ts);
        }
        Self::parse(raw)
    }

    /// Wraps an already-formed capture id, validating the length ceiling.
    pub fn parse(raw: impl Into<String>) -> Result<Self, SpineError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(SpineError::validation("capture_id must not be empty"));
        }
        if raw.len() > Self::MAX_LEN {
            return Err(SpineError::validation(format!(
                "capture_id exceeds {} characters: {raw}",
                Self::MAX_LEN
            )));
        }
        Ok(Self(raw))
    }

    /// Deterministic capture id for a rollup spanning multiple source
    /// captures, derived from the sorted list of input capture ids so that
    /// replaying the same aggregation over the same inputs is idempotent.
    pub fn for_rollup(domain: &str, partition_key: &PartitionKey, inputs: &[CaptureId]) -> Self {
        let mut sorted: Vec<&str> = inputs.iter().map(|c| c.0.as_str()).collect();
        sorted.sort_unstable();
        let joined = sorted.join(",");
        let hash = ContentHash::of(joined.as_bytes());
        // Rollups cannot fail the length check: joined inputs are hashed down
        // to a fixed-width digest before being embedded.
        Self::new(domain, partition_key, &hash, None)
            .expect("rollup capture id is always within the length ceiling")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable content hash of a normalized source payload (SHA-256, hex-encoded,
/// truncated to 16 characters — enough entropy to avoid collisions within a
/// partition while keeping `CaptureId` short).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    const DISPLAY_LEN: usize = 16;

    /// Hashes `bytes` deterministically. Rehashing identical bytes always
    /// produces the same `ContentHash`.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let hex = hex::encode(digest);
        Self(hex[..Self::DISPLAY_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque business-dimensional slice of work (e.g. a week plus a tier). The
/// unit of stage tracking and anomaly scoping.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, SpineError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(SpineError::validation("partition_key must not be empty"));
        }
        if raw.chars().any(char::is_control) {
            return Err(SpineError::validation(
                "partition_key must not contain control characters",
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a time-ordered, newtype-wrapped ULID identifier.
macro_rules! ulid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generates a fresh, time-ordered identifier.
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            pub fn parse(raw: &str) -> Result<Self, SpineError> {
                Ulid::from_string(raw)
                    .map(Self)
                    .map_err(|e| SpineError::validation(format!("invalid {}: {e}", stringify!($name))))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id!(ExecutionId, "Identifies a `core_executions` row.");
ulid_id!(AnomalyId, "Identifies a `core_anomalies` row.");
ulid_id!(RunId, "Identifies a `core_workflow_runs` row.");
ulid_id!(StepId, "Identifies a `core_workflow_steps` row.");
