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

//! Decoding of the pseudo-genre ids the browser passes to
//! [`Player::play_albums`](crate::player::Player::play_albums).
//!
//! The first filter list either holds real genre ids or a single negative
//! sentinel naming a smart selection; the second list holds artist ids, or
//! years for [`Selection::Years`].

pub const ALL: i64 = -1;
pub const POPULARS: i64 = -2;
pub const RANDOMS: i64 = -3;
pub const RECENTS: i64 = -4;
pub const LOVED: i64 = -5;
pub const COMPILATIONS: i64 = -6;
pub const YEARS: i64 = -7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All { artist_ids: Vec<i64> },
    Compilations,
    Populars,
    Randoms,
    Recents,
    Loved,
    Years(Vec<i64>),
    Genres {
        genre_ids: Vec<i64>,
        artist_ids: Vec<i64>,
    },
}

impl Selection {
    pub fn from_filters(filter1_ids: &[i64], filter2_ids: &[i64]) -> Self {
        let sentinel = filter1_ids.iter().copied().find(|id| *id < 0);

        match sentinel {
            Some(POPULARS) => Self::Populars,
            Some(RANDOMS) => Self::Randoms,
            Some(RECENTS) => Self::Recents,
            Some(LOVED) => Self::Loved,
            Some(COMPILATIONS) => Self::Compilations,
            Some(YEARS) => Self::Years(filter2_ids.to_vec()),
            Some(_) => Self::All {
                artist_ids: filter2_ids.to_vec(),
            },
            None if filter1_ids.is_empty() => Self::All {
                artist_ids: filter2_ids.to_vec(),
            },
            None => Self::Genres {
                genre_ids: filter1_ids.to_vec(),
                artist_ids: filter2_ids.to_vec(),
            },
        }
    }

    /// Genre filter applied to album track lists for this selection.
    pub fn genre_ids(&self) -> &[i64] {
        match self {
            Self::Genres { genre_ids, .. } => genre_ids,
            _ => &[],
        }
    }

    pub fn artist_ids(&self) -> &[i64] {
        match self {
            Self::Genres { artist_ids, .. } | Self::All { artist_ids } => artist_ids,
            _ => &[],
        }
    }
}
