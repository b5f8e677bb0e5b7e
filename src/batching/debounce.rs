// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Restart-on-trigger timer.
//!
//! Each [`Debouncer::trigger`] aborts the pending timer task and spawns a
//! fresh one, so the callback only runs after a full quiet window. The
//! callback is synchronous: once the sleep completes nothing can abort it
//! halfway.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub struct Debouncer {
    window: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration, runtime: Handle) -> Self {
        Self {
            window,
            runtime,
            pending: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// (Re)start the window; `callback` replaces any earlier one.
    pub fn trigger<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let window = self.window;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            callback();
        });
        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    /// Drop the pending callback, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
