// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `PipelineRegistry` — name-keyed table of [`PipelineFactory`]s, built on
//! the shared [`Registry`] shape. A factory, not a live `Pipeline`, is
//! registered: each dispatch needs a fresh instance bound to that
//! invocation's execution context.

use spine_domain::error::SpineError;
use spine_domain::pipeline::{Pipeline, PipelineFactory};
use spine_domain::registry::Registry;

#[derive(Default)]
pub struct PipelineRegistry {
    inner: Registry<PipelineFactory>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, factory: PipelineFactory) -> Result<(), SpineError> {
        self.inner.register(name, factory)
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Pipeline>, SpineError> {
        let factory = self.inner.get(name)?;
        Ok(factory())
    }

    pub fn list(&self) -> Vec<String> {
        self.inner.list()
    }

    pub fn list_by_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner.list_by_prefix(prefix)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }
}
