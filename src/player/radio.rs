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

//! Radio and web track loading.
//!
//! Both kinds need their stream resolved off the event loop before the
//! engine can load them. Results are applied only while they are still
//! about the track being loaded, or about the pending next track for
//! streams resolved ahead of time.

use log::{debug, warn};

use crate::{
    error::WebError,
    model::Track,
    player::{Notification, Player, PlayerEvent},
};

impl Player {
    /// Starts resolving a radio. Radios are not part of the party pool, so
    /// party mode ends here.
    pub(super) fn load_radio(&mut self, track: Track) {
        if self.state.is_party {
            self.set_party(false);
        }

        self.loading = Some(track.clone());
        self.notify(Notification::Loading(track.clone()));

        let token = self.load_token.renew();
        let resolver = self.context.stream_resolver.clone();
        self.context.tasks.spawn(
            "radio",
            Box::new(move || {
                if token.is_cancelled() {
                    return None;
                }
                let result = resolver.resolve_radio(&track.uri);
                (!token.is_cancelled()).then_some(PlayerEvent::RadioResolved { track, result })
            }),
        );
    }

    pub(super) fn load_web(&mut self, track: Track) {
        self.loading = Some(track.clone());
        self.notify(Notification::Loading(track.clone()));

        let token = self.load_token.renew();
        let resolver = self.context.stream_resolver.clone();
        self.context.tasks.spawn(
            "web",
            Box::new(move || {
                if token.is_cancelled() {
                    return None;
                }
                let result = resolver.resolve_web(&track.uri);
                (!token.is_cancelled()).then_some(PlayerEvent::WebUriResolved { track, result })
            }),
        );
    }

    /// Resolves the stream of the next track while the current one plays.
    pub(super) fn prepare_web_stream(&mut self, track: Track) {
        let token = self.next_token.renew();
        let resolver = self.context.stream_resolver.clone();
        self.context.tasks.spawn(
            "web-next",
            Box::new(move || {
                if token.is_cancelled() {
                    return None;
                }
                let result = resolver.resolve_web(&track.uri);
                (!token.is_cancelled()).then_some(PlayerEvent::WebUriResolved { track, result })
            }),
        );
    }

    pub(super) fn on_stream_resolved(
        &mut self,
        mut track: Track,
        result: Result<String, WebError>,
        is_radio: bool,
    ) {
        let is_loading = self.loading.as_ref() == Some(&track);
        let is_next = !is_radio && !is_loading && self.state.next.as_ref() == Some(&track);
        if !is_loading && !is_next {
            debug!("Ignoring stale stream for {}", track.title);
            return;
        }

        match result {
            Ok(uri) => {
                debug!("{} resolved to {}", track.uri, uri);
                track.stream_uri = Some(uri);
                if is_loading {
                    self.play_track(track, false);
                } else {
                    self.state.next = Some(track);
                }
            }
            Err(e) => {
                warn!("Unable to resolve {}: {}", track.uri, e);
                if is_loading {
                    self.stop();
                }
            }
        }
    }
}
