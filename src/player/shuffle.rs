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

//! Random track selection with a traversable history.
//!
//! Picks are drawn album first, then track, from the albums in play (or from
//! the playlist when one is active). Every track is played at most once per
//! cycle: once all tracks of an album went by, the album is retired until the
//! whole pool is exhausted.
//!
//! Played tracks are recorded in a history so `prev` and a following `next`
//! walk the same path instead of picking again.

use std::collections::{HashMap, HashSet};

use log::debug;
use rand::{rng, seq::SliceRandom};

use crate::{
    config::Repeat,
    model::Track,
    player::{ResolveContext, Resolver},
};

/// Album key used for tracks without an album.
const NO_ALBUM: i64 = -1;

#[derive(Debug, Default)]
pub struct ShuffleState {
    history: Vec<Track>,
    cursor: Option<usize>,
    played: HashMap<i64, HashSet<i64>>,
    played_albums: HashSet<i64>,
}

impl ShuffleState {
    /// Forgets the history and every played track.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn history(&self) -> &[Track] {
        &self.history
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Records a track that started playing.
    pub fn on_started(&mut self, track: &Track, ctx: &ResolveContext) {
        self.mark_played(track, ctx);
        self.relink(track);
    }

    fn mark_played(&mut self, track: &Track, ctx: &ResolveContext) {
        let Some(id) = track.id else {
            return;
        };
        let album_id = track.album_id.unwrap_or(NO_ALBUM);
        if self.played_albums.contains(&album_id) {
            return;
        }

        let played = self.played.entry(album_id).or_default();
        played.insert(id);

        let exhausted = pool(ctx)
            .into_iter()
            .filter(|(key, _)| *key == album_id)
            .flat_map(|(_, tracks)| tracks)
            .filter_map(|t| t.id)
            .all(|id| played.contains(&id));

        if exhausted {
            debug!("Album {} fully played, retiring it", album_id);
            self.played.remove(&album_id);
            self.played_albums.insert(album_id);
        }
    }

    /// Moves the cursor onto `track` when it is a neighbour in the history,
    /// inserts it after the cursor otherwise.
    fn relink(&mut self, track: &Track) {
        let Some(cursor) = self.cursor else {
            self.history.push(track.clone());
            self.cursor = Some(self.history.len() - 1);
            return;
        };

        if self.history.get(cursor + 1) == Some(track) {
            self.cursor = Some(cursor + 1);
        } else if cursor > 0 && self.history.get(cursor - 1) == Some(track) {
            self.cursor = Some(cursor - 1);
        } else if self.history.get(cursor) != Some(track) {
            self.history.insert(cursor + 1, track.clone());
            self.cursor = Some(cursor + 1);
        }
    }

    fn is_played(&self, album_id: i64, track_id: i64) -> bool {
        self.played_albums.contains(&album_id)
            || self
                .played
                .get(&album_id)
                .is_some_and(|played| played.contains(&track_id))
    }

    fn pick(&self, ctx: &ResolveContext) -> Option<Track> {
        let current = ctx.state.current.as_ref();

        let mut albums: Vec<Vec<&Track>> = pool(ctx)
            .into_iter()
            .map(|(album_id, tracks)| {
                tracks
                    .into_iter()
                    .filter(|t| {
                        Some(*t) != current
                            && t.id.is_some_and(|id| !self.is_played(album_id, id))
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|tracks| !tracks.is_empty())
            .collect();

        let mut rng = rng();
        albums.shuffle(&mut rng);
        let mut tracks = albums.into_iter().next()?;
        tracks.shuffle(&mut rng);
        tracks.first().map(|t| (*t).clone())
    }
}

/// Tracks the picks are drawn from, grouped by album in play order.
fn pool<'a>(ctx: &ResolveContext<'a>) -> Vec<(i64, Vec<&'a Track>)> {
    let mut groups: Vec<(i64, Vec<&'a Track>)> = Vec::new();
    let mut add = |album_id: i64, track: &'a Track| {
        match groups.iter_mut().find(|(key, _)| *key == album_id) {
            Some((_, tracks)) => {
                if !tracks.contains(&track) {
                    tracks.push(track);
                }
            }
            None => groups.push((album_id, vec![track])),
        }
    };

    let state = ctx.state;
    if state.has_playlist() {
        for track in &state.playlist_tracks {
            add(track.album_id.unwrap_or(NO_ALBUM), track);
        }
    } else {
        for album in &state.albums {
            for track in album.tracks() {
                add(album.id, track);
            }
        }
    }

    groups
}

impl Resolver for ShuffleState {
    fn next(&mut self, ctx: &ResolveContext) -> Option<Track> {
        if !ctx.is_shuffling() {
            return None;
        }
        if let Some(track) = ctx.repeated_track() {
            return Some(track);
        }

        let forward = self
            .cursor
            .and_then(|cursor| self.history.get(cursor + 1))
            .cloned();
        if forward.is_some() {
            return forward;
        }

        if let Some(track) = self.pick(ctx) {
            return Some(track);
        }

        debug!("Every track was played, resetting shuffle");
        self.played.clear();
        self.played_albums.clear();
        match ctx.repeat {
            Repeat::All => self.pick(ctx),
            _ => None,
        }
    }

    fn prev(&mut self, ctx: &ResolveContext) -> Option<Track> {
        if !ctx.is_shuffling() {
            return None;
        }
        if let Some(track) = ctx.repeated_track() {
            return Some(track);
        }

        match self.cursor {
            Some(cursor) if cursor > 0 => self.history.get(cursor - 1).cloned(),
            _ => ctx.state.current.clone(),
        }
    }
}
