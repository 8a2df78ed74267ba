// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed implementations of every `spine_domain` persistence port.

pub mod anomaly_repository;
pub mod execution_repository;
pub mod manifest_repository;
pub mod quality_repository;
pub mod readiness_repository;
pub mod reject_repository;
mod row_ext;
pub mod schema;
pub mod sqlite_repository;
pub mod workflow_repository;

pub use anomaly_repository::SqliteAnomalySink;
pub use execution_repository::ExecutionRepository;
pub use manifest_repository::SqliteManifestStore;
pub use quality_repository::QualityRepository;
pub use readiness_repository::ReadinessRepository;
pub use reject_repository::SqliteRejectSink;
pub use sqlite_repository::SqliteRepository;
pub use workflow_repository::WorkflowRepository;

use sqlx::Error as SqlxError;
use spine_domain::error::SpineError;

/// Maps a `sqlx::Error` onto the closed `SpineError` taxonomy. A free
/// function rather than `impl From<sqlx::Error> for SpineError` — both the
/// trait and `SpineError` are foreign to this crate, so a `From` impl would
/// violate the orphan rule; every repository method calls this explicitly
/// instead.
pub(crate) fn sqlx_err_to_spine(e: SqlxError) -> SpineError {
    match &e {
        SqlxError::PoolTimedOut | SqlxError::Io(_) => SpineError::transient(e.to_string()),
        SqlxError::Database(db_err) if db_err.is_unique_violation() => {
            SpineError::storage(e.to_string(), false)
        }
        _ => SpineError::storage(e.to_string(), false),
    }
}
