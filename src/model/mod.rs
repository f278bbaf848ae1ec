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

//! Domain models and core data structures.
//!
//! This module defines the entities the playback engine works with: tracks,
//! albums and discs. They are cheap views over the library; several instances
//! may refer to the same database row, and every mutation is written through
//! to the [`Library`](crate::library::Library) straight away.

mod album;
mod selection;

pub use album::{Album, Disc};
pub use selection::Selection;

use std::time::Duration;

/// Where a track comes from, which decides how it is loaded and whether it
/// takes part in popularity and scrobbling bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TrackKind {
    #[default]
    Library,
    /// Internet radio, the uri may be a playlist file.
    Radio,
    /// A file opened from outside the collection.
    External,
    /// A search result whose stream has to be resolved before playback.
    Web,
}

/// A playable unit.
///
/// `Track::default()` is the empty track: it has no id and callers treat it
/// as "nothing to play".
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub id: Option<i64>,
    pub kind: TrackKind,
    pub title: String,
    pub uri: String,
    /// Playable uri of a web track once resolved.
    pub stream_uri: Option<String>,
    pub duration: Duration,
    pub album_id: Option<i64>,
    pub album_name: String,
    pub artist_ids: Vec<i64>,
    pub artists: Vec<String>,
    pub genre_ids: Vec<i64>,
    pub number: u32,
    pub disc_number: u32,
    pub year: Option<i64>,
    pub loved: bool,
    pub rate: u8,
    pub popularity: i64,
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Eq for Track {}

impl Track {
    /// A radio station, played from its (possibly playlist) uri.
    pub fn radio(id: i64, name: &str, uri: &str) -> Self {
        Self {
            id: Some(id),
            kind: TrackKind::Radio,
            title: name.to_string(),
            uri: uri.to_string(),
            ..Default::default()
        }
    }

    pub fn external(uri: &str) -> Self {
        Self {
            id: Some(-1),
            kind: TrackKind::External,
            title: uri.to_string(),
            uri: uri.to_string(),
            ..Default::default()
        }
    }

    /// A track found on the web, `page_uri` must be resolved to a stream.
    pub fn web(id: i64, title: &str, page_uri: &str, duration: Duration) -> Self {
        Self {
            id: Some(id),
            kind: TrackKind::Web,
            title: title.to_string(),
            uri: page_uri.to_string(),
            duration,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_radio(&self) -> bool {
        self.kind == TrackKind::Radio
    }

    pub fn is_web(&self) -> bool {
        self.kind == TrackKind::Web
    }

    /// Tracks backed by a collection row, the only ones that take part in
    /// popularity, queueing and scrobbling.
    pub fn library_id(&self) -> Option<i64> {
        match self.kind {
            TrackKind::Library => self.id.filter(|id| *id >= 0),
            _ => None,
        }
    }

    /// Web tracks need their stream resolved before the pipeline can load
    /// them.
    pub fn needs_resolution(&self) -> bool {
        self.is_web() && self.stream_uri.is_none()
    }

    pub fn playable_uri(&self) -> &str {
        self.stream_uri.as_deref().unwrap_or(&self.uri)
    }

    pub fn set_uri(&mut self, uri: &str) {
        self.uri = uri.to_string();
    }

    pub fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    pub fn artist_label(&self) -> String {
        self.artists.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_track_is_empty() {
        let track = Track::default();
        assert!(track.is_empty());
        assert_eq!(track.library_id(), None);
    }

    #[test]
    fn identity_ignores_metadata() {
        let a = Track {
            id: Some(3),
            title: "a".into(),
            ..Default::default()
        };
        let b = Track {
            id: Some(3),
            title: "b".into(),
            ..Default::default()
        };
        let radio = Track::radio(3, "r", "http://example.org/stream");

        assert_eq!(a, b);
        assert_ne!(a, radio);
        assert_eq!(radio.library_id(), None);
    }

    #[test]
    fn web_tracks_use_resolved_stream() {
        let mut track = Track::web(9, "song", "https://youtube.com/watch?v=x", Duration::ZERO);
        assert!(track.needs_resolution());
        assert_eq!(track.playable_uri(), "https://youtube.com/watch?v=x");

        track.stream_uri = Some("https://cdn/audio".into());
        assert!(!track.needs_resolution());
        assert_eq!(track.playable_uri(), "https://cdn/audio");
    }
}
