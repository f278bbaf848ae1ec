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

//! Database row mapping for domain models.
//!
//! This module provides the conversion logic between raw SQLite result rows
//! and the domain models, including the aggregated artist and genre columns
//! produced by `GROUP_CONCAT`.

use std::time::Duration;

use rusqlite::Row;

use crate::model::{Album, Track, TrackKind};

/// Separator used when concatenating names, ids use the default comma.
const NAME_SEPARATOR: char = '\u{1f}';

fn split_ids(value: Option<String>) -> Vec<i64> {
    value
        .unwrap_or_default()
        .split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}

fn split_names(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(NAME_SEPARATOR)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl Track {
    /// Maps an SQLite row to a [`Track`] instance.
    ///
    /// The column order matches [`super::sqlite::TRACK_COLUMNS`].
    pub(super) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let duration_ms: i64 = row.get(3)?;
        let rate: i64 = row.get(10)?;

        Ok(Self {
            id: Some(row.get(0)?),
            kind: TrackKind::Library,
            title: row.get(1)?,
            uri: row.get(2)?,
            stream_uri: None,
            duration: Duration::from_millis(duration_ms.max(0) as u64),
            album_id: Some(row.get(4)?),
            album_name: row.get(5)?,
            number: row.get::<_, Option<u32>>(6)?.unwrap_or(0),
            disc_number: row.get::<_, Option<u32>>(7)?.unwrap_or(0),
            year: row.get(8)?,
            loved: row.get(9)?,
            rate: rate.clamp(0, 5) as u8,
            popularity: row.get(11)?,
            artist_ids: split_ids(row.get(12)?),
            artists: split_names(row.get(13)?),
            genre_ids: split_ids(row.get(14)?),
        })
    }
}

impl Album {
    /// Maps an SQLite row to an [`Album`] without tracks.
    pub(super) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self::new(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            split_ids(row.get(3)?),
            split_names(row.get(4)?),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_columns_are_split() {
        assert_eq!(split_ids(Some("3,1, 2".into())), vec![3, 1, 2]);
        assert!(split_ids(None).is_empty());
        assert_eq!(
            split_names(Some(format!("A{}B", NAME_SEPARATOR))),
            vec!["A".to_string(), "B".to_string()]
        );
    }
}
