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

//! Events flowing into and out of the player.
//!
//! [`PlayerEvent`]s are received on the player's channel: pipeline bus
//! messages, the periodic tick and the results of background tasks.
//! [`Notification`]s are published to every subscriber after the player's
//! state changed; the player does not know who is listening.

use std::time::Duration;

use crate::{
    engine::PlaybackStatus,
    error::{PlayerError, WebError},
    model::Track,
    player::session::SessionState,
};

/// Messages posted by a playback pipeline, in pipeline order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Started,
    Duration(Duration),
    Position(Duration),
    /// The stream is close enough to its end to prepare the next one.
    AboutToFinish,
    Eos,
    Error(String),
    /// A decoder is missing for the loaded stream.
    MissingPlugin(String),
}

#[derive(Debug)]
pub enum PlayerEvent {
    Tick,

    Stream {
        pipeline: usize,
        event: StreamEvent,
    },

    RadioResolved {
        track: Track,
        result: Result<String, WebError>,
    },
    WebUriResolved {
        track: Track,
        result: Result<String, WebError>,
    },
    SimilarArtists {
        track: Track,
        result: Result<Vec<String>, WebError>,
    },
    SessionLoaded(Result<SessionState, PlayerError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    CurrentChanged(Track),
    NextChanged(Option<Track>),
    PrevChanged(Option<Track>),
    QueueChanged,
    AlbumsChanged,
    StatusChanged(PlaybackStatus),
    PartyChanged(bool),
    /// A track is being resolved before it can start.
    Loading(Track),
    VolumeChanged(f64),
    Seeked(Duration),
    /// Playback stopped because a decoder is missing, the front end should
    /// offer to install it.
    CodecMissing(String),
}
