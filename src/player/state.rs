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

//! Mutable playback state shared by the resolvers.

use crate::model::{Album, Track};

#[derive(Debug, Default)]
pub struct PlaybackState {
    pub current: Option<Track>,
    pub next: Option<Track>,
    pub prev: Option<Track>,
    /// Albums in play, in playback order.
    pub albums: Vec<Album>,
    pub playlist_ids: Vec<i64>,
    /// Flat track list of the playlist in play, without duplicates.
    pub playlist_tracks: Vec<Track>,
    pub stop_after: Option<i64>,
    pub is_party: bool,
}

impl PlaybackState {
    pub fn current_is_radio(&self) -> bool {
        self.current.as_ref().is_some_and(Track::is_radio)
    }

    /// Index of the album holding the current track.
    pub fn current_album_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.albums
            .iter()
            .position(|album| Some(album.id) == current.album_id && album.contains(current))
    }

    pub fn has_playlist(&self) -> bool {
        !self.playlist_tracks.is_empty()
    }

    /// Whether playback should stop once the current track ends.
    pub fn stops_after_current(&self) -> bool {
        self.stop_after.is_some()
            && self.current.as_ref().and_then(|t| t.id) == self.stop_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64, album_id: i64) -> Track {
        Track {
            id: Some(id),
            album_id: Some(album_id),
            ..Default::default()
        }
    }

    #[test]
    fn current_album_requires_membership() {
        let mut album = Album::new(1, "A".into(), None, vec![], vec![]);
        album.set_tracks(vec![track(1, 1)]);

        let mut state = PlaybackState {
            albums: vec![album],
            current: Some(track(1, 1)),
            ..Default::default()
        };
        assert_eq!(state.current_album_index(), Some(0));

        state.current = Some(track(2, 1));
        assert_eq!(state.current_album_index(), None);
    }

    #[test]
    fn stop_after_matches_current_id() {
        let mut state = PlaybackState {
            current: Some(track(4, 1)),
            ..Default::default()
        };
        assert!(!state.stops_after_current());

        state.stop_after = Some(4);
        assert!(state.stops_after_current());
    }
}
