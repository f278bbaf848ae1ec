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

//! Typed failures of the playback engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("pipeline {0} failure: {1}")]
    Pipeline(usize, String),

    #[error("no audio backend available")]
    NoBackend,

    #[error("session file error: {0}")]
    SessionIo(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    SessionFormat(#[from] serde_json::Error),

    #[error("unsupported session version {0}")]
    SessionVersion(u32),

    #[error(transparent)]
    Library(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("network access is disabled")]
    Offline,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no stream found in playlist {0}")]
    EmptyPlaylist(String),

    #[error("youtube helper failed: {0}")]
    Helper(String),

    #[error("no similar artists for {0}")]
    NoSimilarArtists(String),

    #[error("missing api key for {0}")]
    MissingKey(&'static str),
}
