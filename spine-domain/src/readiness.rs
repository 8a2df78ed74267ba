// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Data Readiness — the One-Glance Downstream Gate
//!
//! `core_data_readiness` is computed, not merely described: a partition is
//! ready once the manifest shows it reached a final stage and no unresolved
//! `ERROR`/`CRITICAL` anomaly exists for that exact
//! `(domain, stage, partition_key)` scope. [`DataReadiness::blocking_issues`]
//! cites the anomaly that is holding a partition back.

use serde::{Deserialize, Serialize};

use crate::anomaly::AnomalyRow;
use crate::ids::PartitionKey;

/// The readiness read model for one `(domain, stage, partition_key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataReadiness {
    pub domain: String,
    pub stage: String,
    pub partition_key: PartitionKey,
    pub is_ready: bool,
    pub blocking_issues: Vec<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl DataReadiness {
    /// Computes readiness from whether the partition has reached `stage`
    /// and the active ERROR+/unresolved anomalies in that exact scope.
    pub fn compute(
        domain: &str,
        stage: &str,
        partition_key: &PartitionKey,
        has_reached_stage: bool,
        blocking_anomalies: &[AnomalyRow],
    ) -> Self {
        let mut blocking_issues: Vec<String> = blocking_anomalies
            .iter()
            .map(|a| format!("{} [{}]: {}", a.anomaly_id, a.severity, a.message))
            .collect();
        if !has_reached_stage {
            blocking_issues.insert(0, format!("partition has not reached stage {stage}"));
        }
        Self {
            domain: domain.to_string(),
            stage: stage.to_string(),
            partition_key: partition_key.clone(),
            is_ready: has_reached_stage && blocking_anomalies.is_empty(),
            blocking_issues,
            checked_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{Category, Severity};
    use crate::ids::AnomalyId;

    fn anomaly(severity: Severity) -> AnomalyRow {
        AnomalyRow {
            anomaly_id: AnomalyId::new(),
            domain: "finra.otc".into(),
            stage: "AGGREGATED".into(),
            partition_key: PartitionKey::new("2025-12-26|OTC").unwrap(),
            severity,
            category: Category::from("QUALITY_GATE"),
            message: "shares sum to 1.02".into(),
            detected_at: chrono::Utc::now(),
            metadata: None,
            resolved_at: None,
        }
    }

    #[test]
    fn ready_when_stage_reached_and_no_anomalies() {
        let p = PartitionKey::new("2025-12-26|NMS_TIER_1").unwrap();
        let r = DataReadiness::compute("finra.otc", "AGGREGATED", &p, true, &[]);
        assert!(r.is_ready);
        assert!(r.blocking_issues.is_empty());
    }

    #[test]
    fn not_ready_when_error_anomaly_present() {
        let p = PartitionKey::new("2025-12-26|OTC").unwrap();
        let r = DataReadiness::compute("finra.otc", "AGGREGATED", &p, true, &[anomaly(Severity::Error)]);
        assert!(!r.is_ready);
        assert_eq!(r.blocking_issues.len(), 1);
    }
}
