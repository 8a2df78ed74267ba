// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scheduler Facade — Polling, Deduplicating Dispatch
//!
//! `SchedulerFacade` polls a fixed set of named schedules on
//! `SchedulerConfig::poll_interval_seconds` and dispatches each schedule's
//! pipeline through the shared [`Dispatcher`] at its next fire time. A
//! schedule only ever fires once per `(schedule_id, fire_time)` pair — an
//! in-memory `HashSet` is the dedup ledger, so a process restart may
//! re-fire a schedule whose fire time already passed; this is accepted
//! (see the ledger in `DESIGN.md`) rather than persisted, since schedules
//! are cron-like and idempotent dispatch is cheaper than a durable lock.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use spine_domain::error::SpineError;
use spine_domain::execution::TriggerSource;
use spine_domain::pipeline::PipelineResult;

use crate::application::dispatcher::Dispatcher;
use crate::infrastructure::config::SchedulerConfig;

/// One registered recurring dispatch.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub schedule_id: String,
    pub pipeline_name: String,
    pub params: BTreeMap<String, Value>,
    pub interval: chrono::Duration,
}

impl Schedule {
    pub fn new(schedule_id: impl Into<String>, pipeline_name: impl Into<String>, interval: chrono::Duration) -> Self {
        Self {
            schedule_id: schedule_id.into(),
            pipeline_name: pipeline_name.into(),
            params: BTreeMap::new(),
            interval,
        }
    }

    fn next_fire_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let since_epoch = now.timestamp_millis();
        let interval_ms = self.interval.num_milliseconds().max(1);
        let floored = (since_epoch / interval_ms) * interval_ms;
        DateTime::from_timestamp_millis(floored).unwrap_or(now)
    }
}

pub struct SchedulerFacade {
    dispatcher: Arc<Dispatcher>,
    config: SchedulerConfig,
    schedules: Mutex<Vec<Schedule>>,
    fired: Mutex<HashSet<(String, i64)>>,
}

impl SchedulerFacade {
    pub fn new(dispatcher: Arc<Dispatcher>, config: SchedulerConfig) -> Self {
        Self {
            dispatcher,
            config,
            schedules: Mutex::new(Vec::new()),
            fired: Mutex::new(HashSet::new()),
        }
    }

    pub fn add_schedule(&self, schedule: Schedule) {
        self.schedules.lock().push(schedule);
    }

    /// Polls every registered schedule once, dispatching each whose current
    /// fire time has not already been dispatched. Returns the results of
    /// whatever fired this tick (errors included — a failed dispatch does
    /// not stop the remaining schedules from polling).
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<(String, Result<PipelineResult, SpineError>)> {
        let due: Vec<Schedule> = {
            let mut fired = self.fired.lock();
            self.schedules
                .lock()
                .iter()
                .filter_map(|s| {
                    let fire_time = s.next_fire_time(now);
                    let key = (s.schedule_id.clone(), fire_time.timestamp_millis());
                    if fired.insert(key) {
                        Some(s.clone())
                    } else {
                        None
                    }
                })
                .collect()
        };

        let mut results = Vec::with_capacity(due.len());
        for schedule in due {
            let fire_time = schedule.next_fire_time(now);
            let trigger = TriggerSource::Scheduled {
                schedule_id: schedule.schedule_id.clone(),
                fire_time,
            };
            let result = self.dispatcher.dispatch(&schedule.pipeline_name, schedule.params.clone(), trigger, false).await;
            results.push((schedule.schedule_id, result));
        }
        results
    }

    /// Runs `tick` in a loop at `poll_interval_seconds` until `shutdown` is
    /// signalled. Intended as the scheduler's long-running task, spawned
    /// once at process startup.
    pub async fn run_until(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(self.config.poll_interval_seconds));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for (schedule_id, result) in self.tick(chrono::Utc::now()).await {
                        if let Err(err) = result {
                            tracing::warn!(schedule_id, error = %err, "scheduled dispatch failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
