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

//! The user queue.
//!
//! Queued tracks take absolute priority over every other ordering. The
//! queue is forward only and never takes part in `prev` resolution.

use log::warn;

use crate::{
    model::Track,
    player::{ResolveContext, Resolver},
};

#[derive(Debug, Default)]
pub struct QueueState {
    ids: Vec<i64>,
    /// Next track pending when the queue was first filled, restored once the
    /// queue drains.
    backup: Option<Track>,
}

impl QueueState {
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn append(&mut self, id: i64, pending_next: Option<&Track>) {
        self.insert(id, usize::MAX, pending_next);
    }

    /// Moves `id` to `position`, clamped to the queue length.
    pub fn insert(&mut self, id: i64, position: usize, pending_next: Option<&Track>) {
        if self.ids.is_empty() && self.backup.is_none() {
            self.backup = pending_next.cloned();
        }

        self.ids.retain(|queued| *queued != id);
        let position = position.min(self.ids.len());
        self.ids.insert(position, id);
    }

    /// Removes `id`, handing back the backed up next track if the queue is
    /// now empty.
    pub fn remove(&mut self, id: i64) -> Option<Track> {
        let len = self.ids.len();
        self.ids.retain(|queued| *queued != id);

        if self.ids.len() != len && self.ids.is_empty() {
            self.backup.take()
        } else {
            None
        }
    }

    pub fn clear(&mut self) -> Option<Track> {
        self.ids.clear();
        self.backup.take()
    }

    /// Replaces the queue content, used when restoring a session.
    pub fn set_ids(&mut self, ids: Vec<i64>) {
        self.ids.clear();
        self.backup = None;
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }
}

impl Resolver for QueueState {
    fn next(&mut self, ctx: &ResolveContext) -> Option<Track> {
        let head = *self.ids.first()?;
        match ctx.library.track(head) {
            Ok(track) => track,
            Err(e) => {
                warn!("Unable to load queued track {}: {:#}", head, e);
                None
            }
        }
    }

    fn prev(&mut self, _ctx: &ResolveContext) -> Option<Track> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64) -> Track {
        Track {
            id: Some(id),
            ..Default::default()
        }
    }

    #[test]
    fn queue_holds_unique_ids_in_latest_order() {
        let mut queue = QueueState::default();
        queue.append(5, None);
        queue.append(7, None);
        queue.append(5, None);
        queue.insert(9, 0, None);
        queue.insert(7, 42, None);

        assert_eq!(queue.ids(), &[9, 5, 7]);
    }

    #[test]
    fn draining_restores_backup() {
        let mut queue = QueueState::default();
        queue.append(5, Some(&track(2)));
        queue.append(7, Some(&track(3)));

        assert_eq!(queue.remove(5), None);
        assert_eq!(queue.remove(42), None);
        assert_eq!(queue.remove(7), Some(track(2)));
        assert!(queue.is_empty());

        queue.append(8, None);
        assert_eq!(queue.clear(), None);
    }
}
