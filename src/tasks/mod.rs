// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Background task processing.
//!
//! Network lookups, process spawning and session file I/O must not block the
//! player's event loop. They are handed to a [`TaskRunner`] which executes
//! them elsewhere and posts the resulting [`PlayerEvent`] back onto the
//! player's channel; the player only ever applies results while draining that
//! channel on its own thread.
//!
//! Only work that may block, or may take more than a trivial amount of time,
//! should be implemented as a task.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
    },
    thread,
};

use log::{debug, warn};

use crate::player::PlayerEvent;

/// A unit of background work, returning the event to post, if any.
pub type Task = Box<dyn FnOnce() -> Option<PlayerEvent> + Send + 'static>;

pub trait TaskRunner {
    fn spawn(&self, name: &str, task: Task);
}

/// Runs every task on its own worker thread.
pub struct ThreadTaskRunner {
    event_tx: Sender<PlayerEvent>,
}

impl ThreadTaskRunner {
    pub fn new(event_tx: Sender<PlayerEvent>) -> Self {
        Self { event_tx }
    }
}

impl TaskRunner for ThreadTaskRunner {
    fn spawn(&self, name: &str, task: Task) {
        let event_tx = self.event_tx.clone();
        let result = thread::Builder::new()
            .name(format!("task-{}", name))
            .spawn(move || {
                if let Some(event) = task() {
                    let _ = event_tx.send(event);
                }
            });

        if let Err(e) = result {
            warn!("Unable to spawn task {}: {}", name, e);
        }
    }
}

/// Runs tasks on the calling thread.
///
/// Results still go through the event channel, so the player sees them only
/// when it next drains its queue.
pub struct InlineTaskRunner {
    event_tx: Sender<PlayerEvent>,
}

impl InlineTaskRunner {
    pub fn new(event_tx: Sender<PlayerEvent>) -> Self {
        Self { event_tx }
    }
}

impl TaskRunner for InlineTaskRunner {
    fn spawn(&self, name: &str, task: Task) {
        debug!("Running task {} inline", name);
        if let Some(event) = task() {
            let _ = self.event_tx.send(event);
        }
    }
}

/// Shared flag telling a background task its result is no longer wanted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancels this token and installs a fresh one in its place.
    pub fn renew(&mut self) -> CancellationToken {
        self.cancel();
        *self = Self::new();
        self.clone()
    }
}
