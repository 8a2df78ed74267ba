// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Generic Name-Keyed Registry
//!
//! Both the Pipeline Registry and the Calculation Registry are, at their
//! core, an append-only `name -> T` map with `register/get/list/
//! list_by_prefix`. This module implements that shape once;
//! `spine::application::pipeline_registry` and
//! `crate::calc_registry::CalcRegistry` specialize it.
//!
//! Registration is append-only: re-registering an existing name is a
//! programmer error, not a silent overwrite, so a fresh registry is built
//! per test harness rather than mutated after process start.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::SpineError;

/// A plain, append-only `name -> T` map, safe to share behind an `Arc`.
#[derive(Debug)]
pub struct Registry<T> {
    entries: RwLock<BTreeMap<String, T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T: Clone> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registers `value` under `name`. Fails if `name` is already taken —
    /// the registry forbids duplicate names.
    pub fn register(&self, name: impl Into<String>, value: T) -> Result<(), SpineError> {
        let name = name.into();
        let mut entries = self.entries.write();
        if entries.contains_key(&name) {
            return Err(SpineError::config(format!("name already registered: {name}")));
        }
        entries.insert(name, value);
        Ok(())
    }

    /// Looks up `name`, failing on unknown names (the registry forbids
    /// unknown-name lookups).
    pub fn get(&self, name: &str) -> Result<T, SpineError> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SpineError::pipeline(format!("unknown name: {name}")))
    }

    /// True if `name` has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Lists every registered name, in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Lists every registered name beginning with `prefix`.
    pub fn list_by_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .read()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_rejected() {
        let reg: Registry<i32> = Registry::new();
        reg.register("a", 1).unwrap();
        assert!(reg.register("a", 2).is_err());
    }

    #[test]
    fn unknown_lookup_is_rejected() {
        let reg: Registry<i32> = Registry::new();
        assert!(reg.get("missing").is_err());
    }

    #[test]
    fn list_by_prefix_filters() {
        let reg: Registry<i32> = Registry::new();
        reg.register("finra.otc", 1).unwrap();
        reg.register("finra.nms", 2).unwrap();
        reg.register("other.x", 3).unwrap();
        let mut names = reg.list_by_prefix("finra.");
        names.sort();
        assert_eq!(names, vec!["finra.nms", "finra.otc"]);
    }
}
