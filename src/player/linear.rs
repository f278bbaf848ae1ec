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

//! Sequential album by album traversal, the fallback ordering.

use crate::{
    config::Repeat,
    model::{Album, Track},
    player::{ResolveContext, Resolver},
};

#[derive(Debug, Default)]
pub struct LinearResolver;

/// Album and track position of the current track. An album missing from the
/// list falls back to the first album.
fn position(ctx: &ResolveContext) -> (usize, Option<usize>) {
    let state = ctx.state;
    match (state.current_album_index(), state.current.as_ref()) {
        (Some(album), Some(current)) => (album, state.albums[album].position_of(current)),
        _ => (0, None),
    }
}

/// First track of the first non-empty album found walking `order`.
fn first_of(albums: &[Album], order: impl Iterator<Item = usize>) -> Option<Track> {
    order
        .filter_map(|index| albums.get(index))
        .find_map(|album| album.tracks().first().cloned())
}

fn last_of(albums: &[Album], order: impl Iterator<Item = usize>) -> Option<Track> {
    order
        .filter_map(|index| albums.get(index))
        .find_map(|album| album.tracks().last().cloned())
}

impl Resolver for LinearResolver {
    fn next(&mut self, ctx: &ResolveContext) -> Option<Track> {
        let albums = &ctx.state.albums;
        if albums.is_empty() || ctx.is_shuffling() {
            return None;
        }
        if let Some(track) = ctx.repeated_track() {
            return Some(track);
        }
        if ctx.state.current.is_none() {
            return first_of(albums, 0..albums.len());
        }

        let (index, track) = position(ctx);
        let album = &albums[index];
        let Some(track) = track else {
            return first_of(albums, index..albums.len());
        };

        if let Some(next) = album.tracks().get(track + 1) {
            return Some(next.clone());
        }

        match ctx.repeat {
            Repeat::Album => album.tracks().first().cloned(),
            Repeat::All => first_of(albums, (index + 1..albums.len()).chain(0..=index)),
            _ => first_of(albums, index + 1..albums.len()),
        }
    }

    fn prev(&mut self, ctx: &ResolveContext) -> Option<Track> {
        let albums = &ctx.state.albums;
        if albums.is_empty() || ctx.state.current.is_none() || ctx.is_shuffling() {
            return None;
        }
        if let Some(track) = ctx.repeated_track() {
            return Some(track);
        }

        let (index, track) = position(ctx);
        let album = &albums[index];
        let Some(track) = track else {
            return album.tracks().first().cloned();
        };

        if track > 0 {
            return album.tracks().get(track - 1).cloned();
        }

        match ctx.repeat {
            Repeat::Album => album.tracks().last().cloned(),
            Repeat::All => last_of(albums, (0..index).rev().chain((index..albums.len()).rev())),
            _ => last_of(albums, (0..index).rev()),
        }
    }
}
