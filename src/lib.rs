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

//! # Lollypop playback engine.
//!
//! The playback core of the Lollypop music player: the state machine that
//! decides what plays next, the dual pipeline audio engine with crossfade,
//! and session persistence.
//!
//! ## Architecture
//!
//! * The [`player::Player`] owns all playback state and runs on a single
//!   thread, draining one `std::sync::mpsc` channel of
//!   [`player::PlayerEvent`]s.
//! * **Pipelines** ([`engine::Pipeline`]) post stream events on that channel
//!   from their own worker threads.
//! * **Background tasks** ([`tasks::TaskRunner`]) run network lookups,
//!   external helpers and file I/O elsewhere and post their results back.
//! * Front ends subscribe to [`player::Notification`]s.

pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod model;
pub mod player;
pub mod scrobbler;
pub mod tasks;
pub mod web;
