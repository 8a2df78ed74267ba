// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Small accessors shared by the repository implementations for pulling
//! typed values back out of a [`Row`]'s JSON values.

use chrono::{DateTime, Utc};
use serde_json::Value;

use spine_domain::error::SpineError;
use spine_domain::repository::Row;

fn missing(row: &Row, col: &str) -> SpineError {
    SpineError::storage(format!("column {col} missing from row {row:?}"), false)
}

pub fn get_str(row: &Row, col: &str) -> Result<String, SpineError> {
    row.get(col)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(row, col))
}

pub fn get_opt_str(row: &Row, col: &str) -> Option<String> {
    row.get(col).and_then(Value::as_str).map(str::to_string)
}

pub fn get_u32(row: &Row, col: &str) -> Result<u32, SpineError> {
    row.get(col)
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .ok_or_else(|| missing(row, col))
}

pub fn get_opt_u64(row: &Row, col: &str) -> Option<u64> {
    row.get(col).and_then(Value::as_u64)
}

pub fn get_datetime(row: &Row, col: &str) -> Result<DateTime<Utc>, SpineError> {
    let raw = get_str(row, col)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SpineError::storage(format!("invalid timestamp in {col}: {e}"), false))
}

pub fn get_opt_datetime(row: &Row, col: &str) -> Option<DateTime<Utc>> {
    get_opt_str(row, col).and_then(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}
