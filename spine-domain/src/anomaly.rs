// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Anomaly Sink — Partition-Scoped Quality Events
//!
//! Anomalies are append-only plus resolution: nothing is ever deleted. The
//! scope rule is absolute — every anomaly-based filter must match
//! `(domain, stage, partition_key)` exactly. A broader filter (e.g. "any
//! ERROR in this domain") is a defect: it would hide unrelated partitions.
//!
//! See [`AnomalySink::active_in_scope`] for the one sanctioned filter shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::SpineError;
use crate::ids::{AnomalyId, PartitionKey};

/// Anomaly severity, most to least severe.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

/// Anomaly category. Deliberately an open string rather than a closed enum,
/// so a new source can introduce its own category
/// (`QUALITY_GATE|NETWORK|DATA_QUALITY|SCHEDULE|PROCESSING|...`) without a
/// schema change.
pub type Category = String;

pub const CATEGORY_QUALITY_GATE: &str = "QUALITY_GATE";
pub const CATEGORY_NETWORK: &str = "NETWORK";
pub const CATEGORY_DATA_QUALITY: &str = "DATA_QUALITY";
pub const CATEGORY_SCHEDULE: &str = "SCHEDULE";
pub const CATEGORY_PROCESSING: &str = "PROCESSING";

/// One row of `core_anomalies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRow {
    pub anomaly_id: AnomalyId,
    pub domain: String,
    pub stage: String,
    pub partition_key: PartitionKey,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub detected_at: chrono::DateTime<chrono::Utc>,
    pub metadata: Option<Value>,
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AnomalyRow {
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Persistence port for anomalies. Every read method takes `(domain, stage,
/// partition_key)` together — there is no method that filters by severity
/// alone across partitions, by design.
#[async_trait]
pub trait AnomalySink: Send + Sync {
    /// Appends a new anomaly, returning its id.
    async fn record(
        &self,
        domain: &str,
        stage: &str,
        partition_key: &PartitionKey,
        severity: Severity,
        category: Category,
        message: &str,
        metadata: Option<Value>,
    ) -> Result<AnomalyId, SpineError>;

    /// Marks `anomaly_id` resolved (sets `resolved_at`). Never deletes.
    async fn resolve(&self, anomaly_id: &AnomalyId) -> Result<(), SpineError>;

    /// All anomalies recorded for the exact `(domain, stage, partition_key)`
    /// scope, including resolved ones.
    async fn for_partition(
        &self,
        domain: &str,
        stage: &str,
        partition_key: &PartitionKey,
    ) -> Result<Vec<AnomalyRow>, SpineError>;

    /// Active (unresolved) anomalies at or above `min_severity` for the
    /// exact `(domain, stage, partition_key)` scope. This is the one
    /// sanctioned shape for an anomaly-based filter — every caller that
    /// needs to know "is this partition clean" goes through this method
    /// rather than hand-rolling a broader predicate.
    async fn active_in_scope(
        &self,
        domain: &str,
        stage: &str,
        partition_key: &PartitionKey,
        min_severity: Severity,
    ) -> Result<Vec<AnomalyRow>, SpineError> {
        let rows = self.for_partition(domain, stage, partition_key).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.is_active() && r.severity >= min_severity)
            .collect())
    }
}
