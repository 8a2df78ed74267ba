// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Readiness Service
//!
//! Wires [`DataReadiness::compute`] (`spine_domain::readiness`, a pure
//! function) against the live `ManifestStore`/`AnomalySink` repositories and
//! persists the result to `core_data_readiness` — the operation the
//! `is_ready` read model is for, rather than a formula callers re-derive.

use std::sync::Arc;

use spine_domain::anomaly::{AnomalySink, Severity};
use spine_domain::error::SpineError;
use spine_domain::ids::PartitionKey;
use spine_domain::manifest::ManifestStore;
use spine_domain::readiness::DataReadiness;

use crate::infrastructure::repositories::ReadinessRepository;

pub struct ReadinessService {
    manifest: Arc<dyn ManifestStore>,
    anomalies: Arc<dyn AnomalySink>,
    readiness_repo: Arc<ReadinessRepository>,
}

impl ReadinessService {
    pub fn new(manifest: Arc<dyn ManifestStore>, anomalies: Arc<dyn AnomalySink>, readiness_repo: Arc<ReadinessRepository>) -> Self {
        Self { manifest, anomalies, readiness_repo }
    }

    /// Computes and persists readiness for `(domain, stage, partition_key)`:
    /// ready once the manifest shows `stage` reached and no unresolved
    /// ERROR-or-above anomaly exists in that exact scope.
    pub async fn is_data_ready(&self, domain: &str, stage: &str, partition_key: &PartitionKey) -> Result<DataReadiness, SpineError> {
        let has_reached_stage = self.manifest.has_stage(domain, partition_key, stage).await?;
        let blocking = self.anomalies.active_in_scope(domain, stage, partition_key, Severity::Error).await?;
        let readiness = DataReadiness::compute(domain, stage, partition_key, has_reached_stage, &blocking);
        self.readiness_repo.record(&readiness).await?;
        Ok(readiness)
    }
}
