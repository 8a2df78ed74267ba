// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Reject Sink — Per-Record Validation Failures
//!
//! A reject is a single record's failure to pass normalization or
//! validation, carrying enough context (`reason_code`, `reason_detail`, the
//! raw offending data) to diagnose and potentially reprocess it. Rejects do
//! not stop a pipeline; business-rule failures that affect a single record
//! are recorded here and the pipeline continues over the remaining records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SpineError;
use crate::ids::PartitionKey;

/// One row of `core_rejects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRow {
    pub stage: String,
    pub reason_code: String,
    pub reason_detail: String,
    pub raw_data: Value,
    pub partition_key: PartitionKey,
    pub execution_id: Option<String>,
    pub batch_id: Option<String>,
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

/// Persistence port for rejects.
#[async_trait]
pub trait RejectSink: Send + Sync {
    async fn record(&self, row: RejectRow) -> Result<(), SpineError>;

    /// Rejects recorded for a given partition, most recent first.
    async fn for_partition(&self, partition_key: &PartitionKey) -> Result<Vec<RejectRow>, SpineError>;

    /// Count of rejects for a partition — used by pipelines to compute
    /// `N - M` (ingested vs. normalized) for quality checks like
    /// `record_count_balance`.
    async fn count_for_partition(&self, partition_key: &PartitionKey) -> Result<u64, SpineError> {
        Ok(self.for_partition(partition_key).await?.len() as u64)
    }
}
