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

//! Session persistence.
//!
//! The playback session is saved as one versioned JSON document, written to
//! a temporary file first and renamed over the previous session so a crash
//! never leaves half a session behind. A session that cannot be read, or
//! was written by another version, is ignored and playback starts empty.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::PlayerError,
    library::Library,
    model::{Album, Track},
    player::{Notification, Player, PlayerEvent},
};

pub const SESSION_VERSION: u32 = 1;

/// An album in play, with the exact track list it was playing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AlbumSnapshot {
    pub id: i64,
    pub genre_ids: Vec<i64>,
    pub artist_ids: Vec<i64>,
    pub track_ids: Vec<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionState {
    pub version: u32,
    pub track_id: Option<i64>,
    pub position_ms: u64,
    pub is_playing: bool,
    pub is_party: bool,
    #[serde(default)]
    pub queue: Vec<i64>,
    #[serde(default)]
    pub albums: Vec<AlbumSnapshot>,
    #[serde(default)]
    pub playlist_ids: Vec<i64>,
    #[serde(default)]
    pub playlist_track_ids: Vec<i64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            version: SESSION_VERSION,
            track_id: None,
            position_ms: 0,
            is_playing: false,
            is_party: false,
            queue: vec![],
            albums: vec![],
            playlist_ids: vec![],
            playlist_track_ids: vec![],
        }
    }
}

impl SessionState {
    pub fn save(&self, path: &Path) -> Result<(), PlayerError> {
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        fs::write(&temp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&temp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PlayerError> {
        let data = fs::read(path)?;
        let session: SessionState = serde_json::from_slice(&data)?;
        if session.version != SESSION_VERSION {
            return Err(PlayerError::SessionVersion(session.version));
        }
        Ok(session)
    }
}

fn load_tracks(library: &dyn Library, ids: &[i64]) -> anyhow::Result<Vec<Track>> {
    ids.iter()
        .filter_map(|id| library.track(*id).transpose())
        .collect()
}

impl Player {
    fn session_path(&self) -> PathBuf {
        PathBuf::from(&self.context.settings.session_file)
    }

    /// Snapshot of the playback session.
    pub fn session(&self) -> SessionState {
        SessionState {
            version: SESSION_VERSION,
            track_id: self.state.current.as_ref().and_then(Track::library_id),
            position_ms: self.bin.position().as_millis() as u64,
            is_playing: self.bin.is_playing(),
            is_party: self.state.is_party,
            queue: self.queue.ids().to_vec(),
            albums: if self.state.is_party {
                vec![]
            } else {
                self.state
                    .albums
                    .iter()
                    .map(|album| AlbumSnapshot {
                        id: album.id,
                        genre_ids: album.genre_filter.clone(),
                        artist_ids: album.artist_filter.clone(),
                        track_ids: album.track_ids(),
                    })
                    .collect()
            },
            playlist_ids: self.state.playlist_ids.clone(),
            playlist_track_ids: self
                .state
                .playlist_tracks
                .iter()
                .filter_map(Track::library_id)
                .collect(),
        }
    }

    pub fn save_state(&self) -> Result<(), PlayerError> {
        let path = self.session_path();
        self.session().save(&path)?;
        info!("Session saved to {}", path.display());
        Ok(())
    }

    /// Reads the saved session in the background, it is applied once the
    /// result reaches the event loop.
    pub fn restore_state(&mut self) {
        let path = self.session_path();
        self.context.tasks.spawn(
            "session",
            Box::new(move || Some(PlayerEvent::SessionLoaded(SessionState::load(&path)))),
        );
    }

    pub(super) fn on_session_loaded(&mut self, result: Result<SessionState, PlayerError>) {
        let session = match result {
            Ok(session) => session,
            Err(PlayerError::SessionIo(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session to restore");
                return;
            }
            Err(e) => {
                warn!("Unable to read session, starting empty: {}", e);
                return;
            }
        };

        if let Err(e) = self.apply_session(session) {
            warn!("Unable to restore session, starting empty: {:#}", e);
            self.reset_session();
        }
    }

    fn reset_session(&mut self) {
        self.stop();
        self.state = Default::default();
        self.queue.set_ids(vec![]);
        self.shuffle.reset();
        self.notify(Notification::AlbumsChanged);
        self.notify(Notification::QueueChanged);
    }

    fn apply_session(&mut self, session: SessionState) -> anyhow::Result<()> {
        let library = self.context.library.clone();
        let library = library.as_ref();

        if session.is_party {
            if !self.state.is_party {
                self.enter_party(false);
            }
        } else {
            let mut albums = Vec::with_capacity(session.albums.len());
            for snapshot in &session.albums {
                let album = Album::load(library, snapshot.id, &snapshot.genre_ids, &snapshot.artist_ids)
                    .with_context(|| format!("Unable to restore album {}", snapshot.id))?;
                let tracks = load_tracks(library, &snapshot.track_ids)?;
                albums.push(album.clone_with_tracks(tracks));
            }
            self.state.albums = albums;
            self.state.playlist_ids = session.playlist_ids;
            self.state.playlist_tracks = load_tracks(library, &session.playlist_track_ids)?;
            self.notify(Notification::AlbumsChanged);
        }

        self.queue.set_ids(session.queue);
        self.notify(Notification::QueueChanged);

        let track = match session.track_id {
            Some(id) => library.track(id)?,
            None => None,
        };
        match track {
            Some(track) => {
                info!("Restoring {}", track.title);
                if session.position_ms > 0 {
                    self.pending_seek = Some(Duration::from_millis(session.position_ms));
                }
                self.pending_pause = !session.is_playing;
                self.load(track);
            }
            None => {
                self.set_next();
                self.set_prev();
            }
        }

        Ok(())
    }
}
