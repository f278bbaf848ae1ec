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

//! Endless playback with similar artists.
//!
//! With repeat set to auto, running out of tracks triggers a lookup of
//! artists similar to the one playing. The first of them with albums in the
//! collection extends playback: a whole album in album playback, a single
//! track in playlist playback. Lookup failures end playback normally.

use log::{debug, info, warn};
use rand::{rng, seq::SliceRandom};

use crate::{
    config::Repeat,
    error::WebError,
    model::{Album, Track},
    player::{Player, PlayerEvent},
    web,
};

impl Player {
    pub(super) fn lookup_similars(&mut self) {
        let settings = &self.context.settings;
        if settings.repeat != Repeat::Auto
            || !settings.network_access
            || self.context.similar_providers.is_empty()
            || self.state.stops_after_current()
        {
            return;
        }

        let Some(track) = self
            .state
            .current
            .clone()
            .filter(|t| t.library_id().is_some())
        else {
            return;
        };
        let Some(artist) = track.artists.first().cloned() else {
            return;
        };

        debug!("Looking up artists similar to {}", artist);
        let token = self.similar_token.renew();
        let providers = self.context.similar_providers.clone();
        self.context.tasks.spawn(
            "similars",
            Box::new(move || {
                if token.is_cancelled() {
                    return None;
                }
                let result = web::similar_artists(&providers, &artist);
                (!token.is_cancelled()).then_some(PlayerEvent::SimilarArtists { track, result })
            }),
        );
    }

    pub(super) fn on_similar_artists(&mut self, track: Track, result: Result<Vec<String>, WebError>) {
        if self.state.current.as_ref() != Some(&track) || self.state.next.is_some() {
            debug!("Ignoring similar artists of {}", track.title);
            return;
        }

        let artists = match result {
            Ok(artists) => artists,
            Err(e) => {
                debug!("No similar artists for {}: {}", track.title, e);
                return;
            }
        };

        let Some(album) = self.similar_album(&artists) else {
            debug!("No similar artist in the collection");
            return;
        };
        info!("Extending playback with {}", album.name);

        if self.state.has_playlist() {
            let mut tracks = album.tracks().to_vec();
            tracks.retain(|t| !self.state.playlist_tracks.contains(t));
            tracks.shuffle(&mut rng());
            if let Some(track) = tracks.into_iter().next() {
                self.state.playlist_tracks.push(track);
                self.set_next();
                self.set_prev();
            }
        } else {
            self.add_album(album);
        }
    }

    /// A random album, not in play yet, of the closest artist present in the
    /// collection.
    fn similar_album(&self, artists: &[String]) -> Option<Album> {
        let library = self.context.library.as_ref();
        let mut rng = rng();

        for artist in artists {
            let mut ids = match library.album_ids_for_artist(artist) {
                Ok(ids) => ids,
                Err(e) => {
                    warn!("Unable to look up albums of {}: {:#}", artist, e);
                    continue;
                }
            };
            ids.retain(|id| !self.state.albums.iter().any(|album| album.id == *id));
            ids.shuffle(&mut rng);

            for id in ids {
                match Album::load(library, id, &[], &[]) {
                    Ok(album) if !album.is_empty() => return Some(album),
                    Ok(_) => {}
                    Err(e) => warn!("Unable to load album {}: {:#}", id, e),
                }
            }
        }

        None
    }
}
