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

//! Data access layer.
//!
//! The playback engine treats the music collection as an opaque, synchronous
//! query service: it asks for ordered id lists and hydrated tracks and albums,
//! and writes popularity, love and rating changes straight through.
//!
//! [`SqliteLibrary`] is the collection database used by the application.

mod row;
mod sqlite;

pub use sqlite::{NewTrack, SqliteLibrary};

use anyhow::Result;

use crate::model::{Album, Selection, Track};

pub trait Library {
    /// Hydrates a track, `None` if no such row exists.
    fn track(&self, id: i64) -> Result<Option<Track>>;

    /// Hydrates album metadata. The returned album carries no tracks, see
    /// [`Album::load`].
    fn album(&self, id: i64) -> Result<Option<Album>>;

    /// Track ids of an album in playback order, restricted to the given
    /// genres and artists when those lists are not empty.
    fn album_track_ids(
        &self,
        album_id: i64,
        genre_ids: &[i64],
        artist_ids: &[i64],
    ) -> Result<Vec<i64>>;

    /// Album ids matching a browser selection, in display order.
    fn album_ids(&self, selection: &Selection) -> Result<Vec<i64>>;

    fn album_ids_for_artist(&self, name: &str) -> Result<Vec<i64>>;

    /// Track count of the longest album in the collection.
    fn max_album_track_count(&self) -> Result<i64>;

    fn increment_track_popularity(&self, track_id: i64) -> Result<()>;

    fn increment_album_popularity(&self, album_id: i64, by: i64) -> Result<()>;

    fn set_listened_at(&self, track_id: i64, timestamp: i64) -> Result<()>;

    fn set_loved(&self, track_id: i64, loved: bool) -> Result<()>;

    fn set_rate(&self, track_id: i64, rate: u8) -> Result<()>;
}
