// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Spine
//!
//! The application and infrastructure layer of the Spine execution substrate:
//! vendor-neutral SQL dialects, a SQLite-backed repository, the pipeline
//! registry and dispatcher, the workflow engine, and the scheduler facade.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              spine-bootstrap                │
//! │   (CLI, signal handling, composition root)   │
//! └───────────────────┬───────────────────────────┘
//! ┌───────────────────┴───────────────────────────┐
//! │                   spine                      │
//! │  application: pipeline registry, dispatcher, │
//! │  workflow engine, scheduler facade           │
//! │  infrastructure: dialect, SQLite repository, │
//! │  config, logging                             │
//! └───────────────────┬───────────────────────────┘
//! ┌───────────────────┴───────────────────────────┐
//! │                spine-domain                  │
//! │   types, traits, value objects, no I/O       │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod application;
pub mod infrastructure;

pub use spine_domain::*;
