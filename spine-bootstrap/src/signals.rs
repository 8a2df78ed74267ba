// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Signals
//!
//! [`install`] spawns a task that waits for SIGTERM/SIGINT (or Ctrl-C on
//! Windows) and flips a [`tokio::sync::watch`] channel, the same shape
//! [`spine::application::scheduler::SchedulerFacade::run_until`] and the
//! [`crate::shutdown::ShutdownCoordinator`] consume.

use tokio::sync::watch;

/// Installs the signal handler and returns the receiver half. Dropping every
/// clone of the returned receiver without calling this again leaves no
/// handler running past process exit.
pub fn install() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutdown signal received");
        let _ = tx.send(true);
    });
    rx
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    let mut interrupt = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    tokio::select! {
        _ = terminate.recv() => {}
        _ = interrupt.recv() => {}
    }
}

#[cfg(windows)]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn receiver_starts_false() {
        let rx = install();
        assert!(!*rx.borrow());
    }

    #[tokio::test]
    async fn receiver_is_still_pending_without_a_signal() {
        let mut rx = install();
        let changed = tokio::time::timeout(Duration::from_millis(50), rx.changed()).await;
        assert!(changed.is_err(), "no signal was sent, so the receiver should not have changed");
    }
}
