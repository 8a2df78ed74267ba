// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Manifest — Furthest-Stage-Reached Tracking
//!
//! One row per `(domain, partition_key, stage)`. `advance_to` upserts,
//! idempotently, the furthest stage reached; `is_at_least` is the skip gate
//! every pipeline must check before doing work.
//!
//! `stage_rank` is monotonic per domain's declared ordered stage list — it
//! is never derived by string comparison of stage names.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::SpineError;
use crate::ids::PartitionKey;

/// One row of `core_manifest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestRow {
    pub domain: String,
    pub partition_key: PartitionKey,
    pub stage: String,
    pub stage_rank: u32,
    pub row_count: Option<u64>,
    pub metrics: BTreeMap<String, Value>,
    pub execution_id: Option<String>,
    pub batch_id: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// An ordered list of stage names for one domain, the table from which
/// `stage_rank` is derived. Declared once per domain at wiring time.
#[derive(Debug, Clone)]
pub struct StageOrder {
    stages: Vec<String>,
}

impl StageOrder {
    pub fn new(stages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            stages: stages.into_iter().map(Into::into).collect(),
        }
    }

    /// The 0-based rank of `stage`, or a config error if `stage` isn't part
    /// of this domain's declared stage list.
    pub fn rank_of(&self, stage: &str) -> Result<u32, SpineError> {
        self.stages
            .iter()
            .position(|s| s == stage)
            .map(|p| p as u32)
            .ok_or_else(|| SpineError::config(format!("unknown stage: {stage}")))
    }
}

/// Persistence port for the manifest table. Implemented against SQLite in
/// `spine::infrastructure::repositories`.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Upserts `(domain, partition_key, stage)`, bumping `stage_rank` and
    /// replacing `metrics`. Idempotent: calling twice with identical
    /// arguments produces one row with the later `updated_at`.
    async fn advance_to(
        &self,
        domain: &str,
        partition_key: &PartitionKey,
        stage: &str,
        stage_rank: u32,
        row_count: Option<u64>,
        metrics: BTreeMap<String, Value>,
        execution_id: Option<String>,
        batch_id: Option<String>,
    ) -> Result<(), SpineError>;

    /// All stages reached so far for `partition_key`, ordered by rank.
    async fn get(&self, domain: &str, partition_key: &PartitionKey) -> Result<Vec<ManifestRow>, SpineError>;

    /// True if `partition_key` has reached at least `stage`'s rank.
    async fn is_at_least(
        &self,
        domain: &str,
        partition_key: &PartitionKey,
        stage_rank: u32,
    ) -> Result<bool, SpineError> {
        let rows = self.get(domain, partition_key).await?;
        Ok(rows.iter().any(|r| r.stage_rank >= stage_rank))
    }

    /// True if `stage` has been reached at all (any rank).
    async fn has_stage(&self, domain: &str, partition_key: &PartitionKey, stage: &str) -> Result<bool, SpineError> {
        let rows = self.get(domain, partition_key).await?;
        Ok(rows.iter().any(|r| r.stage == stage))
    }

    /// The name of the furthest stage reached, if any.
    async fn get_latest_stage(
        &self,
        domain: &str,
        partition_key: &PartitionKey,
    ) -> Result<Option<String>, SpineError> {
        let rows = self.get(domain, partition_key).await?;
        Ok(rows.into_iter().max_by_key(|r| r.stage_rank).map(|r| r.stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_rank_is_positional() {
        let order = StageOrder::new(["INGESTED", "NORMALIZED", "AGGREGATED"]);
        assert_eq!(order.rank_of("INGESTED").unwrap(), 0);
        assert_eq!(order.rank_of("NORMALIZED").unwrap(), 1);
        assert_eq!(order.rank_of("AGGREGATED").unwrap(), 2);
    }

    #[test]
    fn stage_order_rejects_unknown_stage() {
        let order = StageOrder::new(["INGESTED"]);
        assert!(order.rank_of("BOGUS").is_err());
    }
}
