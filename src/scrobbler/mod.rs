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

//! Listen reporting.
//!
//! The player reports "playing now" when a track starts and a listen once it
//! was played long enough. Calls go through the task runner; a failed report
//! is logged and forgotten.

mod lastfm;
mod listenbrainz;

pub use lastfm::LastFmScrobbler;
pub use listenbrainz::ListenBrainz;

use crate::{error::WebError, model::Track};

pub trait Scrobbler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Network and authentication gate, reports are skipped when false.
    fn available(&self) -> bool;

    fn listen(&self, track: &Track, timestamp: i64) -> Result<(), WebError>;

    fn playing_now(&self, track: &Track) -> Result<(), WebError>;
}
