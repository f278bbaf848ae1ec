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

//! The resolver seam.
//!
//! Each ordering the player knows about (queue, shuffle, playlist, linear
//! album traversal) answers "what comes next" and "what came before" for the
//! current state. The player asks them in precedence order and keeps the
//! first answer.

use crate::{
    config::{Repeat, Shuffle},
    library::Library,
    model::Track,
    player::PlaybackState,
};

/// Read-only view of everything a resolver needs.
pub struct ResolveContext<'a> {
    pub state: &'a PlaybackState,
    pub library: &'a dyn Library,
    pub repeat: Repeat,
    pub shuffle: Shuffle,
}

impl ResolveContext<'_> {
    /// Random track selection is in charge, either because tracks are
    /// shuffled or because party mode is on.
    pub fn is_shuffling(&self) -> bool {
        self.state.is_party || self.shuffle == Shuffle::Tracks
    }

    /// The current track, when repeating a single track.
    pub fn repeated_track(&self) -> Option<Track> {
        match self.repeat {
            Repeat::Track => self.state.current.clone(),
            _ => None,
        }
    }
}

pub trait Resolver {
    fn next(&mut self, ctx: &ResolveContext) -> Option<Track>;
    fn prev(&mut self, ctx: &ResolveContext) -> Option<Track>;
}
