// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ManifestStore` over `core_manifest`, built on the generic [`Repository`]
//! rather than a raw `SqlitePool` so it inherits whichever dialect the
//! repository was paired with.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use spine_domain::error::SpineError;
use spine_domain::ids::PartitionKey;
use spine_domain::manifest::{ManifestRow, ManifestStore};
use spine_domain::repository::{Param, Repository};

use super::row_ext::{get_datetime, get_opt_str, get_opt_u64, get_str, get_u32};

const COLS: &[&str] = &[
    "domain",
    "partition_key",
    "stage",
    "stage_rank",
    "row_count",
    "metrics",
    "execution_id",
    "batch_id",
    "updated_at",
];
const PK_COLS: &[&str] = &["domain", "partition_key", "stage"];
const UPDATE_COLS: &[&str] = &["stage_rank", "row_count", "metrics", "execution_id", "batch_id", "updated_at"];

pub struct SqliteManifestStore {
    repo: Arc<dyn Repository>,
}

impl SqliteManifestStore {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }
}

fn row_to_manifest_row(row: &spine_domain::repository::Row) -> Result<ManifestRow, SpineError> {
    let metrics_value = row.get("metrics").cloned().unwrap_or(Value::Null);
    let metrics: BTreeMap<String, Value> = match metrics_value {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    };
    Ok(ManifestRow {
        domain: get_str(row, "domain")?,
        partition_key: PartitionKey::new(get_str(row, "partition_key")?)?,
        stage: get_str(row, "stage")?,
        stage_rank: get_u32(row, "stage_rank")?,
        row_count: get_opt_u64(row, "row_count"),
        metrics,
        execution_id: get_opt_str(row, "execution_id"),
        batch_id: get_opt_str(row, "batch_id"),
        updated_at: get_datetime(row, "updated_at")?,
    })
}

#[async_trait]
impl ManifestStore for SqliteManifestStore {
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
    ) -> Result<(), SpineError> {
        let sql = self.repo.dialect().upsert("core_manifest", COLS, PK_COLS, UPDATE_COLS);
        let params = vec![
            Param::from(domain.to_string()),
            Param::from(partition_key.as_str().to_string()),
            Param::from(stage.to_string()),
            Param::from(stage_rank as i64),
            Param::from(row_count.map(|v| v as i64)),
            Param::Json(Value::Object(metrics.into_iter().collect())),
            Param::from(execution_id),
            Param::from(batch_id),
            Param::from(chrono::Utc::now().to_rfc3339()),
        ];
        self.repo.execute(&sql, &params).await.map(|_| ())
    }

    async fn get(&self, domain: &str, partition_key: &PartitionKey) -> Result<Vec<ManifestRow>, SpineError> {
        let sql = "SELECT * FROM core_manifest WHERE domain = ? AND partition_key = ? ORDER BY stage_rank";
        let params = vec![Param::from(domain.to_string()), Param::from(partition_key.as_str().to_string())];
        let rows = self.repo.query(sql, &params).await?;
        rows.iter().map(row_to_manifest_row).collect()
    }
}
