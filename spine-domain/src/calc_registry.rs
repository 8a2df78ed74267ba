// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Calculation Registry — Policy Table for Multi-Version Computations
//!
//! The registry is declarative data, not a scan of `MAX(version)`. For every
//! calculation name it holds the tuple `{versions, current, deprecated,
//! business_keys, table}`; `current_version` and `version_rank` are the only
//! sanctioned way to resolve "which version of this calculation applies."
//!
//! Version identifiers are strings like `v1`, `v10`; rank is the integer
//! after the `v` prefix, so `version_rank("v10") > version_rank("v2")` even
//! though that is false under a naive string comparison.

use std::collections::BTreeSet;

use crate::error::SpineError;
use crate::registry::Registry;

/// The policy tuple for one calculation name.
#[derive(Debug, Clone)]
pub struct CalcRegistryEntry {
    pub versions: Vec<String>,
    pub current: String,
    pub deprecated: BTreeSet<String>,
    pub business_keys: Vec<String>,
    pub table: String,
}

impl CalcRegistryEntry {
    /// Builds and validates an entry against the contract invariants:
    /// `current ∈ versions`, `current ∉ deprecated`,
    /// `deprecated ⊆ versions`, `versions` and `business_keys` non-empty.
    pub fn new(
        versions: impl IntoIterator<Item = impl Into<String>>,
        current: impl Into<String>,
        deprecated: impl IntoIterator<Item = impl Into<String>>,
        business_keys: impl IntoIterator<Item = impl Into<String>>,
        table: impl Into<String>,
    ) -> Result<Self, SpineError> {
        let versions: Vec<String> = versions.into_iter().map(Into::into).collect();
        let current = current.into();
        let deprecated: BTreeSet<String> = deprecated.into_iter().map(Into::into).collect();
        let business_keys: Vec<String> = business_keys.into_iter().map(Into::into).collect();
        let table = table.into();

        if versions.is_empty() {
            return Err(SpineError::config("calc registry entry requires at least one version"));
        }
        if business_keys.is_empty() {
            return Err(SpineError::config("calc registry entry requires at least one business key"));
        }
        if !versions.contains(&current) {
            return Err(SpineError::config(format!(
                "current version {current} is not in versions {versions:?}"
            )));
        }
        if deprecated.contains(&current) {
            return Err(SpineError::config(format!("current version {current} cannot be deprecated")));
        }
        if let Some(stray) = deprecated.iter().find(|d| !versions.contains(d)) {
            return Err(SpineError::config(format!("deprecated version {stray} is not in versions")));
        }

        Ok(Self {
            versions,
            current,
            deprecated,
            business_keys,
            table,
        })
    }

    pub fn is_deprecated(&self, version: &str) -> bool {
        self.deprecated.contains(version)
    }

    /// A human-readable warning when `version` is deprecated, else `None`.
    pub fn deprecation_warning(&self, version: &str) -> Option<String> {
        self.is_deprecated(version).then(|| {
            format!(
                "calc version {version} is deprecated; current is {}",
                self.current
            )
        })
    }
}

/// The integer rank after the `v` prefix (`"v10"` -> `10`). Never a string
/// comparison — `version_rank` is the only sanctioned ordering.
pub fn version_rank(version: &str) -> Result<u64, SpineError> {
    version
        .strip_prefix('v')
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| SpineError::config(format!("malformed version identifier: {version}")))
}

/// Policy table of calculation name -> [`CalcRegistryEntry`], built on the
/// shared [`Registry`] shape.
#[derive(Debug, Default)]
pub struct CalcRegistry {
    inner: Registry<CalcRegistryEntry>,
}

impl CalcRegistry {
    pub fn new() -> Self {
        Self {
            inner: Registry::new(),
        }
    }

    pub fn register(&self, calc_name: impl Into<String>, entry: CalcRegistryEntry) -> Result<(), SpineError> {
        self.inner.register(calc_name, entry)
    }

    /// The policy-defined current version for `calc_name`. Never derived
    /// from `MAX(version)`.
    pub fn current_version(&self, calc_name: &str) -> Result<String, SpineError> {
        Ok(self.inner.get(calc_name)?.current)
    }

    pub fn version_rank(&self, calc_name: &str, version: &str) -> Result<u64, SpineError> {
        let entry = self.inner.get(calc_name)?;
        if !entry.versions.contains(&version.to_string()) {
            return Err(SpineError::config(format!(
                "unknown version {version} for calc {calc_name}"
            )));
        }
        version_rank(version)
    }

    pub fn is_deprecated(&self, calc_name: &str, version: &str) -> Result<bool, SpineError> {
        Ok(self.inner.get(calc_name)?.is_deprecated(version))
    }

    pub fn deprecation_warning(&self, calc_name: &str, version: &str) -> Result<Option<String>, SpineError> {
        Ok(self.inner.get(calc_name)?.deprecation_warning(version))
    }

    /// Validates a write of `version` for `calc_name`. Unknown versions are
    /// always fatal; deprecated versions are fatal unless
    /// `allow_deprecated` is set, in which case a warning is returned
    /// alongside success.
    pub fn validate_write(
        &self,
        calc_name: &str,
        version: &str,
        allow_deprecated: bool,
    ) -> Result<Option<String>, SpineError> {
        let entry = self.inner.get(calc_name)?;
        if !entry.versions.contains(&version.to_string()) {
            return Err(SpineError::config(format!(
                "unknown calc version: {calc_name} {version}"
            )));
        }
        if entry.is_deprecated(version) && !allow_deprecated {
            return Err(SpineError::validation(format!(
                "calc version {version} is deprecated for {calc_name}; pass allow_deprecated=true to write it anyway"
            )));
        }
        Ok(entry.deprecation_warning(version))
    }

    pub fn get(&self, calc_name: &str) -> Result<CalcRegistryEntry, SpineError> {
        self.inner.get(calc_name)
    }

    pub fn list(&self) -> Vec<String> {
        self.inner.list()
    }

    pub fn list_by_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner.list_by_prefix(prefix)
    }
}
