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

//! Albums and their discs.

use anyhow::{Context, Result};

use crate::{library::Library, model::Track};

/// An ordered set of tracks sharing an album row.
///
/// The track list is loaded from the library scoped by the genre and artist
/// filters the album was created with. Once [`Album::set_tracks`] has been
/// called the list is pinned and [`Album::refresh`] leaves it alone, which is
/// what lets two playback instances of the same album carry different track
/// subsets.
#[derive(Debug, Clone, Default)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub artist_ids: Vec<i64>,
    pub artists: Vec<String>,
    pub year: Option<i64>,
    pub genre_filter: Vec<i64>,
    pub artist_filter: Vec<i64>,
    tracks: Vec<Track>,
    pinned: bool,
}

impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A subdivision of an album by disc number.
#[derive(Debug, Clone, PartialEq)]
pub struct Disc {
    pub album_id: i64,
    pub number: u32,
    pub tracks: Vec<Track>,
}

impl Disc {
    pub fn track_ids(&self) -> Vec<i64> {
        self.tracks.iter().filter_map(|t| t.id).collect()
    }
}

impl Album {
    pub fn new(
        id: i64,
        name: String,
        year: Option<i64>,
        artist_ids: Vec<i64>,
        artists: Vec<String>,
    ) -> Self {
        Self {
            id,
            name,
            year,
            artist_ids,
            artists,
            ..Default::default()
        }
    }

    /// Loads an album and its tracks, restricted to `genre_ids` and
    /// `artist_ids` when they are not empty.
    pub fn load(
        library: &dyn Library,
        id: i64,
        genre_ids: &[i64],
        artist_ids: &[i64],
    ) -> Result<Self> {
        let mut album = library
            .album(id)?
            .with_context(|| format!("Album {} not found", id))?;
        album.genre_filter = genre_ids.to_vec();
        album.artist_filter = artist_ids.to_vec();
        album.tracks = Self::fetch_tracks(library, id, genre_ids, artist_ids)?;

        Ok(album)
    }

    fn fetch_tracks(
        library: &dyn Library,
        id: i64,
        genre_ids: &[i64],
        artist_ids: &[i64],
    ) -> Result<Vec<Track>> {
        library
            .album_track_ids(id, genre_ids, artist_ids)?
            .into_iter()
            .filter_map(|track_id| library.track(track_id).transpose())
            .collect()
    }

    /// Reloads the track list from the library unless it was pinned.
    pub fn refresh(&mut self, library: &dyn Library) -> Result<()> {
        if !self.pinned {
            self.tracks =
                Self::fetch_tracks(library, self.id, &self.genre_filter, &self.artist_filter)?;
        }

        Ok(())
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_ids(&self) -> Vec<i64> {
        self.tracks.iter().filter_map(|t| t.id).collect()
    }

    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.pinned = true;
    }

    /// Snapshot of this album carrying its own track list.
    pub fn clone_with_tracks(&self, tracks: Vec<Track>) -> Self {
        let mut album = self.clone();
        album.set_tracks(tracks);
        album
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.tracks.iter().any(|t| t == track)
    }

    pub fn position_of(&self, track: &Track) -> Option<usize> {
        self.tracks.iter().position(|t| t == track)
    }

    /// Appends tracks missing from this album, keeping album order.
    pub fn merge(&mut self, other: &Album) {
        let mut tracks = self.tracks.clone();
        for track in other.tracks() {
            if !tracks.contains(track) {
                tracks.push(track.clone());
            }
        }
        tracks.sort_by_key(|t| (t.disc_number, t.number));
        self.set_tracks(tracks);
    }

    pub fn remove_track_ids(&mut self, ids: &[i64]) {
        let tracks = self
            .tracks
            .iter()
            .filter(|t| t.id.is_none_or(|id| !ids.contains(&id)))
            .cloned()
            .collect();
        self.set_tracks(tracks);
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn discs(&self) -> Vec<Disc> {
        let mut discs: Vec<Disc> = Vec::new();
        for track in &self.tracks {
            match discs.iter_mut().find(|d| d.number == track.disc_number) {
                Some(disc) => disc.tracks.push(track.clone()),
                None => discs.push(Disc {
                    album_id: self.id,
                    number: track.disc_number,
                    tracks: vec![track.clone()],
                }),
            }
        }
        discs.sort_by_key(|d| d.number);
        discs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64, disc: u32, number: u32) -> Track {
        Track {
            id: Some(id),
            album_id: Some(1),
            disc_number: disc,
            number,
            ..Default::default()
        }
    }

    fn album(tracks: Vec<Track>) -> Album {
        let mut album = Album {
            id: 1,
            ..Default::default()
        };
        album.set_tracks(tracks);
        album
    }

    #[test]
    fn discs_group_by_number() {
        let album = album(vec![track(1, 1, 1), track(2, 2, 1), track(3, 1, 2)]);
        let discs = album.discs();

        assert_eq!(discs.len(), 2);
        assert_eq!(discs[0].track_ids(), vec![1, 3]);
        assert_eq!(discs[1].track_ids(), vec![2]);
    }

    #[test]
    fn snapshots_do_not_alias() {
        let full = album(vec![track(1, 1, 1), track(2, 1, 2)]);
        let partial = full.clone_with_tracks(vec![track(2, 1, 2)]);

        assert_eq!(full, partial);
        assert_eq!(full.track_ids(), vec![1, 2]);
        assert_eq!(partial.track_ids(), vec![2]);
    }

    #[test]
    fn merge_keeps_album_order() {
        let mut a = album(vec![track(3, 1, 3)]);
        let b = album(vec![track(1, 1, 1), track(3, 1, 3)]);
        a.merge(&b);

        assert_eq!(a.track_ids(), vec![1, 3]);
    }

    #[test]
    fn remove_tracks() {
        let mut a = album(vec![track(1, 1, 1), track(2, 1, 2)]);
        a.remove_track_ids(&[1]);
        assert_eq!(a.track_ids(), vec![2]);
    }
}
