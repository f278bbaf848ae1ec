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

//! Flat playlist traversal.

use crate::{
    config::Repeat,
    model::Track,
    player::{ResolveContext, Resolver},
};

#[derive(Debug, Default)]
pub struct PlaylistResolver;

fn current_index(ctx: &ResolveContext) -> Option<usize> {
    let current = ctx.state.current.as_ref()?;
    ctx.state.playlist_tracks.iter().position(|t| t == current)
}

impl Resolver for PlaylistResolver {
    fn next(&mut self, ctx: &ResolveContext) -> Option<Track> {
        let tracks = &ctx.state.playlist_tracks;
        if tracks.is_empty() || ctx.is_shuffling() {
            return None;
        }
        if let Some(track) = ctx.repeated_track() {
            return Some(track);
        }

        let index = match current_index(ctx) {
            None => 0,
            Some(index) if index + 1 < tracks.len() => index + 1,
            Some(_) if ctx.repeat == Repeat::All => 0,
            Some(_) => return None,
        };
        tracks.get(index).cloned()
    }

    fn prev(&mut self, ctx: &ResolveContext) -> Option<Track> {
        let tracks = &ctx.state.playlist_tracks;
        if tracks.is_empty() || ctx.is_shuffling() {
            return None;
        }
        if let Some(track) = ctx.repeated_track() {
            return Some(track);
        }

        match current_index(ctx)? {
            0 if ctx.repeat == Repeat::All => tracks.last().cloned(),
            0 => None,
            index => tracks.get(index - 1).cloned(),
        }
    }
}
