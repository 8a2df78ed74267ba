// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persists [`QualityResult`]s to `core_quality`. `QualityRunner` itself
//! stays in-memory (`spine_domain::quality`); this is the durability layer
//! a pipeline calls after a run to make quality outcomes queryable.

use serde_json::Value;
use std::sync::Arc;

use spine_domain::error::SpineError;
use spine_domain::quality::{QualityResult, QualityStatus};
use spine_domain::repository::{Param, Repository, Row};

use super::row_ext::{get_datetime, get_opt_str, get_str};

pub struct QualityRepository {
    repo: Arc<dyn Repository>,
}

impl QualityRepository {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Records every result from one run, tagged with the domain, partition,
    /// and execution it was evaluated for.
    pub async fn record_all(
        &self,
        results: &[QualityResult],
        domain: Option<&str>,
        partition_key: Option<&str>,
        execution_id: Option<&str>,
    ) -> Result<(), SpineError> {
        let checked_at = chrono::Utc::now().to_rfc3339();
        let rows: Vec<Row> = results
            .iter()
            .map(|r| {
                let mut row = Row::new();
                row.insert("domain".to_string(), domain.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null));
                row.insert("check_name".to_string(), Value::String(r.check_name.clone()));
                row.insert("category".to_string(), Value::String(r.category.clone()));
                row.insert("status".to_string(), Value::String(r.status.to_string()));
                row.insert("message".to_string(), Value::String(r.message.clone()));
                row.insert("actual".to_string(), r.actual.map(Value::from).unwrap_or(Value::Null));
                row.insert("expected".to_string(), r.expected.map(Value::from).unwrap_or(Value::Null));
                row.insert(
                    "partition_key".to_string(),
                    partition_key.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null),
                );
                row.insert(
                    "execution_id".to_string(),
                    execution_id.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null),
                );
                row.insert("checked_at".to_string(), Value::String(checked_at.clone()));
                row
            })
            .collect();
        self.repo.insert_many("core_quality", &rows).await
    }

    pub async fn for_partition(&self, partition_key: &str) -> Result<Vec<QualityResult>, SpineError> {
        let rows = self
            .repo
            .query(
                "SELECT * FROM core_quality WHERE partition_key = ? ORDER BY checked_at",
                &[Param::from(partition_key.to_string())],
            )
            .await?;
        rows.iter().map(row_to_quality_result).collect()
    }

    /// True if any recorded result for `partition_key` is `FAIL` or `ERROR`.
    pub async fn has_failures_for_partition(&self, partition_key: &str) -> Result<bool, SpineError> {
        Ok(self
            .for_partition(partition_key)
            .await?
            .iter()
            .any(|r| matches!(r.status, QualityStatus::Fail | QualityStatus::Error)))
    }
}

fn row_to_quality_result(row: &Row) -> Result<QualityResult, SpineError> {
    let status = match get_str(row, "status")?.as_str() {
        "PASS" => QualityStatus::Pass,
        "WARN" => QualityStatus::Warn,
        "FAIL" => QualityStatus::Fail,
        "ERROR" => QualityStatus::Error,
        other => return Err(SpineError::storage(format!("unknown quality status: {other}"), false)),
    };
    // `checked_at` is dropped here since callers query by partition already
    // in chronological order.
    let _ = get_datetime(row, "checked_at");
    Ok(QualityResult {
        check_name: get_str(row, "check_name")?,
        category: get_str(row, "category")?,
        status,
        message: get_opt_str(row, "message").unwrap_or_default(),
        actual: row.get("actual").and_then(Value::as_f64),
        expected: row.get("expected").and_then(Value::as_f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dialect::SqliteDialect;
    use crate::infrastructure::repositories::{schema, SqliteRepository};
    use spine_domain::quality::CheckOutcome;
    use tempfile::NamedTempFile;

    async fn repo() -> (QualityRepository, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = schema::initialize_database(&db_url).await.unwrap();
        let r: Arc<dyn Repository> = Arc::new(SqliteRepository::new(pool, Arc::new(SqliteDialect)));
        (QualityRepository::new(r), temp)
    }

    #[tokio::test]
    async fn record_all_then_detect_failures() {
        let (repo, _temp) = repo().await;
        let results = vec![QualityResult {
            check_name: "record_count_balance".to_string(),
            category: "DATA_QUALITY".to_string(),
            status: CheckOutcome::fail("counts do not balance", 9.0, 10.0).status,
            message: "counts do not balance".to_string(),
            actual: Some(9.0),
            expected: Some(10.0),
        }];
        repo.record_all(&results, Some("finra.otc"), Some("2025-12-26|OTC"), None).await.unwrap();
        assert!(repo.has_failures_for_partition("2025-12-26|OTC").await.unwrap());
    }

    #[tokio::test]
    async fn actual_and_expected_round_trip() {
        let (repo, _temp) = repo().await;
        let results = vec![QualityResult {
            check_name: "shares_sum_to_one".to_string(),
            category: "DATA_QUALITY".to_string(),
            status: CheckOutcome::fail("shares sum to 1.02", 1.02, 1.0).status,
            message: "shares sum to 1.02".to_string(),
            actual: Some(1.02),
            expected: Some(1.0),
        }];
        repo.record_all(&results, Some("finra.otc"), Some("2025-12-26|OTC"), None).await.unwrap();

        let fetched = repo.for_partition("2025-12-26|OTC").await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].actual, Some(1.02));
        assert_eq!(fetched[0].expected, Some(1.0));
    }
}
