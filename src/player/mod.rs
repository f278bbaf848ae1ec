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

//! Playback orchestration.
//!
//! The [`Player`] owns the playback state, the orderings that resolve what
//! plays next and the audio engine. It runs on a single thread: every
//! mutation happens either through its public API or while draining its
//! event channel, on which pipelines post stream events and background tasks
//! post their results.
//!
//! # Resolution
//!
//! Whenever the state changes the next and previous tracks are resolved
//! again by asking, in order:
//!
//! 1. The user queue (next only).
//! 2. Shuffle, when tracks are shuffled or party mode is on.
//! 3. The playlist in play.
//! 4. Linear traversal of the albums in play.
//!
//! The first ordering with an answer wins. Radios have no next track, and
//! neither has the track playback is set to stop after.

mod events;
mod linear;
mod playlist;
mod queue;
mod radio;
mod resolver;
mod session;
mod shuffle;
mod similars;
mod state;

pub use events::{Notification, PlayerEvent, StreamEvent};
pub use linear::LinearResolver;
pub use playlist::PlaylistResolver;
pub use queue::QueueState;
pub use resolver::{ResolveContext, Resolver};
pub use session::{AlbumSnapshot, SESSION_VERSION, SessionState};
pub use shuffle::ShuffleState;
pub use state::PlaybackState;

use std::{
    rc::Rc,
    sync::{
        Arc,
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::Result;
use log::{debug, error, info, warn};
use rand::{rng, seq::SliceRandom};

use crate::{
    config::{ReplayGain, Repeat, Settings, Shuffle},
    engine::{BinPlayer, Pipeline, PipelineState, PlaybackStatus, TICK_INTERVAL},
    error::PlayerError,
    library::Library,
    model::{Album, Disc, Selection, Track},
    scrobbler::Scrobbler,
    tasks::{CancellationToken, TaskRunner},
    web::{SimilarArtistProvider, StreamResolver},
};

/// Past this position `prev` restarts the current track.
const RESTART_THRESHOLD: Duration = Duration::from_secs(2);

/// Play time after which a listen is always reported.
const SCROBBLE_CAP: Duration = Duration::from_secs(240);

/// Collaborators of the player.
pub struct PlayerContext {
    pub settings: Settings,
    pub library: Rc<dyn Library>,
    pub scrobblers: Vec<Arc<dyn Scrobbler>>,
    pub similar_providers: Vec<Arc<dyn SimilarArtistProvider>>,
    pub stream_resolver: Arc<dyn StreamResolver>,
    pub tasks: Box<dyn TaskRunner>,
}

pub struct Player {
    context: PlayerContext,
    state: PlaybackState,

    queue: QueueState,
    shuffle: ShuffleState,
    playlist: PlaylistResolver,
    linear: LinearResolver,

    bin: BinPlayer,

    event_rx: Receiver<PlayerEvent>,
    subscribers: Vec<Sender<Notification>>,

    /// Track whose stream is being resolved before it can start.
    loading: Option<Track>,
    load_token: CancellationToken,
    next_token: CancellationToken,
    similar_token: CancellationToken,

    /// Position to restore once the loaded stream started.
    pending_seek: Option<Duration>,
    /// Pause the loaded stream once it started.
    pending_pause: bool,
    started_at: Option<i64>,
    stats_recorded: bool,
    /// Playback stopped because the current track reached its end.
    ended: bool,
}

fn resolve_context<'a>(state: &'a PlaybackState, context: &'a PlayerContext) -> ResolveContext<'a> {
    ResolveContext {
        state,
        library: context.library.as_ref(),
        repeat: context.settings.repeat,
        shuffle: context.settings.shuffle,
    }
}

pub(crate) fn unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Album popularity gained when one of its tracks was played.
///
/// Inversely proportional to the album length, so playing a whole short
/// album weighs as much as playing a whole long one. Never below one.
pub fn popularity_increment(max_album_track_count: i64, album_track_count: i64) -> i64 {
    if album_track_count <= 0 {
        return 1;
    }
    (max_album_track_count / album_track_count).max(1)
}

/// Loads albums by id, skipping the ones that fail to load or have no
/// tracks left under the filters.
fn load_albums(library: &dyn Library, ids: &[i64], genre_ids: &[i64], artist_ids: &[i64]) -> Vec<Album> {
    ids.iter()
        .filter_map(|id| match Album::load(library, *id, genre_ids, artist_ids) {
            Ok(album) if !album.is_empty() => Some(album),
            Ok(_) => None,
            Err(e) => {
                warn!("Unable to load album {}: {:#}", id, e);
                None
            }
        })
        .collect()
}

fn update_popularity(library: &dyn Library, track: &Track, track_id: i64) -> Result<()> {
    library.increment_track_popularity(track_id)?;

    if let Some(album_id) = track.album_id {
        let max = library.max_album_track_count()?;
        let count = library.album_track_ids(album_id, &[], &[])?.len() as i64;
        library.increment_album_popularity(album_id, popularity_increment(max, count))?;
    }

    library.set_listened_at(track_id, unix_time())
}

impl Player {
    pub fn new(
        context: PlayerContext,
        pipelines: [Box<dyn Pipeline>; 2],
        event_rx: Receiver<PlayerEvent>,
    ) -> Self {
        let mut bin = BinPlayer::new(pipelines, context.settings.volume);
        bin.set_replay_gain(context.settings.replay_gain);
        let is_party = context.settings.party_mix;

        let mut player = Self {
            context,
            state: PlaybackState::default(),
            queue: QueueState::default(),
            shuffle: ShuffleState::default(),
            playlist: PlaylistResolver,
            linear: LinearResolver,
            bin,
            event_rx,
            subscribers: Vec::new(),
            loading: None,
            load_token: CancellationToken::new(),
            next_token: CancellationToken::new(),
            similar_token: CancellationToken::new(),
            pending_seek: None,
            pending_pause: false,
            started_at: None,
            stats_recorded: false,
            ended: false,
        };

        if is_party {
            player.enter_party(false);
        }

        player
    }

    /// Registers a new listener. Dropped receivers are forgotten on the
    /// next notification.
    pub fn subscribe(&mut self) -> Receiver<Notification> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, notification: Notification) {
        self.subscribers
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }

    // Accessors

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current.as_ref()
    }

    pub fn next_track(&self) -> Option<&Track> {
        self.state.next.as_ref()
    }

    pub fn prev_track(&self) -> Option<&Track> {
        self.state.prev.as_ref()
    }

    pub fn albums(&self) -> &[Album] {
        &self.state.albums
    }

    pub fn queue(&self) -> &[i64] {
        self.queue.ids()
    }

    pub fn playlist_tracks(&self) -> &[Track] {
        &self.state.playlist_tracks
    }

    pub fn shuffle_history(&self) -> &[Track] {
        self.shuffle.history()
    }

    pub fn is_party(&self) -> bool {
        self.state.is_party
    }

    pub fn status(&self) -> PlaybackStatus {
        self.bin.status()
    }

    pub fn position(&self) -> Duration {
        self.bin.position()
    }

    pub fn volume(&self) -> f64 {
        self.bin.volume()
    }

    pub fn settings(&self) -> &Settings {
        &self.context.settings
    }

    pub fn bin(&self) -> &BinPlayer {
        &self.bin
    }

    fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.context.settings.transition_duration_ms)
    }

    // Resolution

    /// Resolves the next track, see the module documentation.
    pub fn set_next(&mut self) {
        self.next_token.cancel();

        let next = if self.state.current_is_radio() || self.state.stops_after_current() {
            None
        } else {
            let ctx = resolve_context(&self.state, &self.context);
            let resolvers: [&mut dyn Resolver; 4] = [
                &mut self.queue,
                &mut self.shuffle,
                &mut self.playlist,
                &mut self.linear,
            ];
            resolvers.into_iter().find_map(|resolver| resolver.next(&ctx))
        };

        // Keep a stream resolved ahead of time for the same next track.
        let next = next.map(|mut track| {
            let previous = self.state.next.as_ref();
            if let Some(previous) = previous.filter(|p| **p == track && track.stream_uri.is_none()) {
                track.stream_uri = previous.stream_uri.clone();
            }
            track
        });

        self.state.next = next;
        self.next_changed();
    }

    fn next_changed(&mut self) {
        match self.state.next.clone() {
            Some(track) if track.needs_resolution() => self.prepare_web_stream(track),
            Some(_) => {}
            None => self.lookup_similars(),
        }

        self.notify(Notification::NextChanged(self.state.next.clone()));
    }

    pub fn set_prev(&mut self) {
        let prev = if self.state.current_is_radio() {
            None
        } else {
            let ctx = resolve_context(&self.state, &self.context);
            let resolvers: [&mut dyn Resolver; 3] =
                [&mut self.shuffle, &mut self.playlist, &mut self.linear];
            resolvers.into_iter().find_map(|resolver| resolver.prev(&ctx))
        };

        self.state.prev = prev;
        self.notify(Notification::PrevChanged(self.state.prev.clone()));
    }

    /// First track to play when playback starts over with new albums or a
    /// new playlist. The queue is not consulted.
    fn first_track(&mut self) -> Option<Track> {
        let current = self.state.current.take();

        let first = {
            let ctx = resolve_context(&self.state, &self.context);
            let resolvers: [&mut dyn Resolver; 3] =
                [&mut self.shuffle, &mut self.playlist, &mut self.linear];
            resolvers.into_iter().find_map(|resolver| resolver.next(&ctx))
        };

        self.state.current = current;
        first
    }

    // Transport

    /// Plays `track`, crossfading from the current one when smooth
    /// transitions are on.
    pub fn load(&mut self, track: Track) {
        self.load_track(track, true);
    }

    fn load_track(&mut self, track: Track, allow_crossfade: bool) {
        self.load_token.cancel();
        self.loading = None;

        if track.is_radio() {
            self.load_radio(track);
        } else if track.needs_resolution() {
            self.load_web(track);
        } else {
            self.play_track(track, allow_crossfade);
        }
    }

    /// Hands a playable track to the engine.
    fn play_track(&mut self, track: Track, allow_crossfade: bool) {
        self.loading = None;

        let crossfade = allow_crossfade
            && self.context.settings.smooth_transitions
            && self.bin.is_playing()
            && !self.state.current_is_radio()
            && !track.is_radio();

        let result = if crossfade {
            self.record_stats();
            let duration = self.transition_duration();
            self.bin.crossfade(track.playable_uri(), duration)
        } else {
            self.bin.load(track.playable_uri())
        };

        match result {
            Ok(()) => {
                info!("Playing {}", track.playable_uri());
                self.state.current = Some(track);
                self.ended = false;
                self.stats_recorded = false;
                self.started_at = None;
                self.notify(Notification::StatusChanged(PlaybackStatus::Playing));
            }
            Err(e) => {
                error!("Unable to play {}: {}", track.playable_uri(), e);
                self.stop();
            }
        }
    }

    /// Resumes playback. A stopped engine loads the current track again, or
    /// the next one when the current track played to its end.
    pub fn play(&mut self) {
        let active = self.bin.active();
        if self.bin.pipeline(active).state() == PipelineState::Null {
            let (current, next) = (self.state.current.clone(), self.state.next.clone());
            let track = if self.ended {
                next.or(current)
            } else {
                current.or(next)
            };
            if let Some(track) = track {
                self.load(track);
            }
            return;
        }

        match self.bin.play() {
            Ok(()) => self.notify(Notification::StatusChanged(PlaybackStatus::Playing)),
            Err(e) => error!("Unable to resume playback: {}", e),
        }
    }

    pub fn pause(&mut self) {
        match self.bin.pause() {
            Ok(()) => self.notify(Notification::StatusChanged(PlaybackStatus::Paused)),
            Err(e) => error!("Unable to pause playback: {}", e),
        }
    }

    pub fn play_pause(&mut self) {
        if self.bin.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&mut self) {
        self.load_token.cancel();
        self.loading = None;
        self.pending_seek = None;
        self.pending_pause = false;
        self.ended = false;

        if let Err(e) = self.bin.stop() {
            error!("Unable to stop playback: {}", e);
        }
        self.notify(Notification::StatusChanged(PlaybackStatus::Stopped));
    }

    pub fn next(&mut self) {
        if let Some(track) = self.state.next.clone() {
            self.load(track);
        }
    }

    /// Steps back, or restarts the current track when it played for a
    /// while.
    pub fn prev(&mut self) {
        if self.state.current.is_some() && self.bin.position() > RESTART_THRESHOLD {
            self.seek(Duration::ZERO);
        } else if let Some(track) = self.state.prev.clone() {
            self.load(track);
        }
    }

    pub fn seek(&mut self, position: Duration) {
        match self.bin.seek(position) {
            Ok(()) => self.notify(Notification::Seeked(position)),
            Err(e) => warn!("Unable to seek to {:?}: {}", position, e),
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        if let Err(e) = self.bin.set_volume(volume) {
            warn!("Unable to set volume: {}", e);
            return;
        }

        self.context.settings.volume = self.bin.volume();
        self.notify(Notification::VolumeChanged(self.bin.volume()));
    }

    // Albums

    fn albums_changed(&mut self) {
        self.notify(Notification::AlbumsChanged);
        self.set_next();
        self.set_prev();
    }

    /// Appends an album, merging it with the last one if both share an id.
    pub fn add_album(&mut self, album: Album) {
        match self.state.albums.last_mut() {
            Some(last) if last.id == album.id => last.merge(&album),
            _ => self.state.albums.push(album),
        }
        self.albums_changed();
    }

    pub fn remove_album(&mut self, album_id: i64) {
        self.state.albums.retain(|album| album.id != album_id);
        self.albums_changed();
    }

    pub fn remove_disc(&mut self, disc: &Disc) {
        let track_ids = disc.track_ids();
        for album in self
            .state
            .albums
            .iter_mut()
            .filter(|album| album.id == disc.album_id)
        {
            album.remove_track_ids(&track_ids);
        }
        self.state.albums.retain(|album| !album.is_empty());
        self.albums_changed();
    }

    pub fn set_albums(&mut self, albums: Vec<Album>) {
        self.state.albums = albums;
        self.albums_changed();
    }

    pub fn clear_albums(&mut self) {
        self.state.albums.clear();
        self.albums_changed();
    }

    /// Leaves party and playlist playback before new albums are played.
    fn reset_modes(&mut self) {
        if self.state.is_party {
            self.state.is_party = false;
            self.bin.set_replay_gain(self.context.settings.replay_gain);
            self.notify(Notification::PartyChanged(false));
        }
        self.state.playlist_ids.clear();
        self.state.playlist_tracks.clear();
        self.shuffle.reset();
    }

    fn start_from_scratch(&mut self) {
        match self.first_track() {
            Some(track) => self.load(track),
            None => {
                self.set_next();
                self.set_prev();
            }
        }
    }

    /// Plays `album` alone.
    pub fn play_album(&mut self, album: Album) {
        self.reset_modes();
        self.state.albums = vec![album];
        self.notify(Notification::AlbumsChanged);
        self.start_from_scratch();
    }

    pub fn play_track_in_album(&mut self, track: Track, album: Album) {
        self.reset_modes();
        if !self.state.albums.contains(&album) {
            self.state.albums = vec![album];
            self.notify(Notification::AlbumsChanged);
        }
        self.load(track);
    }

    /// Plays every album of a browser selection.
    ///
    /// `filter1_ids` holds genre ids or a selection sentinel, `filter2_ids`
    /// artist ids or years. Playback starts with `album_id` when given,
    /// unless tracks are shuffled.
    pub fn play_albums(
        &mut self,
        album_id: Option<i64>,
        filter1_ids: &[i64],
        filter2_ids: &[i64],
    ) -> Result<(), PlayerError> {
        let selection = Selection::from_filters(filter1_ids, filter2_ids);
        let library = self.context.library.as_ref();
        let ids = library.album_ids(&selection)?;
        let mut albums = load_albums(library, &ids, selection.genre_ids(), selection.artist_ids());
        debug!("Selection {:?} holds {} albums", selection, albums.len());

        let shuffle = self.context.settings.shuffle;
        if shuffle == Shuffle::Albums {
            albums.shuffle(&mut rng());
        }
        if let Some(index) = album_id.and_then(|id| albums.iter().position(|a| a.id == id)) {
            if shuffle == Shuffle::Albums {
                let album = albums.remove(index);
                albums.insert(0, album);
            }
        }

        self.reset_modes();
        self.state.albums = albums;
        self.notify(Notification::AlbumsChanged);

        let start = match (shuffle, album_id) {
            (Shuffle::Tracks, _) | (_, None) => None,
            (_, Some(id)) => self
                .state
                .albums
                .iter()
                .find(|a| a.id == id)
                .and_then(|a| a.tracks().first().cloned()),
        };

        match start {
            Some(track) => self.load(track),
            None => self.start_from_scratch(),
        }

        Ok(())
    }

    /// Moves to the next album, or lets shuffle pick when tracks are
    /// shuffled.
    pub fn skip_album(&mut self) {
        if self.state.is_party || self.context.settings.shuffle == Shuffle::Tracks {
            self.set_next();
            self.next();
            return;
        }

        let albums = &self.state.albums;
        if albums.is_empty() {
            return;
        }
        let start = self
            .state
            .current_album_index()
            .map_or(0, |index| (index + 1) % albums.len());

        let track = (start..albums.len())
            .chain(0..start)
            .find_map(|index| albums[index].tracks().first().cloned());
        if let Some(track) = track {
            self.load(track);
        }
    }

    // Playlists

    /// Replaces album playback with a flat track list.
    pub fn populate_playlist_by_tracks(
        &mut self,
        tracks: Vec<Track>,
        playlist_ids: Vec<i64>,
        start: Option<Track>,
    ) {
        self.reset_modes();
        self.state.albums.clear();

        let mut unique: Vec<Track> = Vec::with_capacity(tracks.len());
        for track in tracks {
            if !unique.contains(&track) {
                unique.push(track);
            }
        }
        self.state.playlist_tracks = unique;
        self.state.playlist_ids = playlist_ids;
        self.notify(Notification::AlbumsChanged);

        match start {
            Some(track) => self.load(track),
            None => self.start_from_scratch(),
        }
    }

    pub fn insert_track(&mut self, track: Track, position: usize) {
        let tracks = &mut self.state.playlist_tracks;
        tracks.retain(|t| *t != track);
        let position = position.min(tracks.len());
        tracks.insert(position, track);

        self.set_next();
        self.set_prev();
    }

    pub fn remove_track(&mut self, track_id: i64) {
        self.state
            .playlist_tracks
            .retain(|t| t.id != Some(track_id));

        self.set_next();
        self.set_prev();
    }

    // Queue

    pub fn append_to_queue(&mut self, track_id: i64) {
        self.queue.append(track_id, self.state.next.as_ref());
        self.notify(Notification::QueueChanged);
        self.set_next();
    }

    pub fn insert_in_queue(&mut self, track_id: i64, position: usize) {
        self.queue
            .insert(track_id, position, self.state.next.as_ref());
        self.notify(Notification::QueueChanged);
        self.set_next();
    }

    pub fn del_from_queue(&mut self, track_id: i64) {
        let restored = self.queue.remove(track_id);
        self.notify(Notification::QueueChanged);
        self.queue_drained(restored);
    }

    pub fn clear_queue(&mut self) {
        let restored = self.queue.clear();
        self.notify(Notification::QueueChanged);
        self.queue_drained(restored);
    }

    /// Restores the next track backed up when the queue was filled instead
    /// of resolving it again.
    fn queue_drained(&mut self, restored: Option<Track>) {
        match restored {
            Some(track) if self.queue.is_empty() && !self.state.stops_after_current() => {
                self.state.next = Some(track);
                self.next_changed();
            }
            _ => self.set_next(),
        }
    }

    // Party

    /// Enters or leaves party mode. Asking for party mode while it is
    /// already on starts a track when nothing plays.
    pub fn set_party(&mut self, party: bool) {
        if party == self.state.is_party {
            if party && self.bin.status() == PlaybackStatus::Stopped {
                self.start_from_scratch();
            }
            return;
        }

        if party {
            self.enter_party(true);
        } else {
            self.leave_party();
        }
    }

    fn party_albums(&self) -> Vec<Album> {
        let genre_ids = self.context.settings.party_ids.clone();
        let selection = if genre_ids.is_empty() {
            Selection::All { artist_ids: vec![] }
        } else {
            Selection::Genres {
                genre_ids: genre_ids.clone(),
                artist_ids: vec![],
            }
        };

        let library = self.context.library.as_ref();
        match library.album_ids(&selection) {
            Ok(ids) => load_albums(library, &ids, &genre_ids, &[]),
            Err(e) => {
                warn!("Unable to load party albums: {:#}", e);
                Vec::new()
            }
        }
    }

    fn enter_party(&mut self, autostart: bool) {
        info!("Entering party mode");
        self.state.is_party = true;
        self.shuffle.reset();
        self.state.playlist_ids.clear();
        self.state.playlist_tracks.clear();
        self.state.albums = self.party_albums();
        self.bin.set_replay_gain(ReplayGain::Track);

        self.notify(Notification::PartyChanged(true));
        self.notify(Notification::AlbumsChanged);

        if autostart && !self.bin.is_playing() {
            self.start_from_scratch();
        } else {
            self.set_next();
            self.set_prev();
        }
    }

    /// Narrows playback down to the album of the current track.
    fn leave_party(&mut self) {
        info!("Leaving party mode");
        self.state.is_party = false;
        self.shuffle.reset();
        self.bin.set_replay_gain(self.context.settings.replay_gain);

        let library = self.context.library.as_ref();
        self.state.albums = match self.state.current.as_ref().and_then(|t| t.album_id) {
            Some(album_id) => load_albums(library, &[album_id], &[], &[]),
            None => Vec::new(),
        };

        self.notify(Notification::PartyChanged(false));
        self.albums_changed();
    }

    // Settings

    pub fn set_shuffle(&mut self, shuffle: Shuffle) {
        self.context.settings.shuffle = shuffle;
        self.shuffle.reset();
        self.set_next();
        self.set_prev();
    }

    pub fn set_repeat(&mut self, repeat: Repeat) {
        self.context.settings.repeat = repeat;
        self.set_next();
        self.set_prev();
    }

    pub fn set_smooth_transitions(&mut self, enabled: bool) {
        self.context.settings.smooth_transitions = enabled;
    }

    pub fn set_transition_duration(&mut self, duration: Duration) {
        self.context.settings.transition_duration_ms = duration.as_millis() as u64;
    }

    pub fn set_replay_gain(&mut self, mode: ReplayGain) {
        self.context.settings.replay_gain = mode;
        if !self.state.is_party {
            self.bin.set_replay_gain(mode);
        }
    }

    pub fn set_stop_after(&mut self, track_id: Option<i64>) {
        self.state.stop_after = track_id;
        self.set_next();
    }

    // Write-through track edits

    fn update_copies(&mut self, track_id: i64, update: impl Fn(&mut Track)) {
        let state = &mut self.state;
        let copies = [&mut state.current, &mut state.next, &mut state.prev];
        for track in copies.into_iter().flatten() {
            if track.library_id() == Some(track_id) {
                update(track);
            }
        }
    }

    pub fn set_loved(&mut self, track_id: i64, loved: bool) -> Result<(), PlayerError> {
        self.context.library.set_loved(track_id, loved)?;
        self.update_copies(track_id, |track| track.loved = loved);
        Ok(())
    }

    /// Rates a track from 0 to 5 stars.
    pub fn set_rating(&mut self, track_id: i64, rate: u8) -> Result<(), PlayerError> {
        let rate = rate.min(5);
        self.context.library.set_rate(track_id, rate)?;
        self.update_copies(track_id, |track| track.rate = rate);
        Ok(())
    }

    // Stats

    /// Updates popularity and reports a listen for the current track, once
    /// per playback.
    fn record_stats(&mut self) {
        if self.stats_recorded {
            return;
        }
        let Some(track) = self.state.current.clone() else {
            return;
        };
        self.stats_recorded = true;

        let Some(track_id) = track.library_id() else {
            return;
        };
        if let Err(e) = update_popularity(self.context.library.as_ref(), &track, track_id) {
            warn!("Unable to update popularity of {}: {:#}", track_id, e);
        }

        let threshold = (track.duration / 2).min(SCROBBLE_CAP);
        if self.bin.position() >= threshold {
            let timestamp = self.started_at.unwrap_or_else(unix_time);
            self.scrobble(track, Some(timestamp));
        }
    }

    /// Reports a listen, or "playing now" when no timestamp is given.
    fn scrobble(&mut self, track: Track, timestamp: Option<i64>) {
        if self.context.settings.disable_scrobbling || track.library_id().is_none() {
            return;
        }

        for scrobbler in self.context.scrobblers.iter().filter(|s| s.available()) {
            let scrobbler = scrobbler.clone();
            let track = track.clone();
            self.context.tasks.spawn(
                scrobbler.name(),
                Box::new(move || {
                    let result = match timestamp {
                        Some(timestamp) => scrobbler.listen(&track, timestamp),
                        None => scrobbler.playing_now(&track),
                    };
                    if let Err(e) = result {
                        warn!("{} report for {} failed: {}", scrobbler.name(), track.title, e);
                    }
                    None
                }),
            );
        }
    }

    // Events

    /// Applies every event already waiting on the channel.
    pub fn process_pending(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Waits up to `timeout` for an event, then applies everything pending.
    ///
    /// Returns `false` once every sender is gone.
    pub fn process_events(&mut self, timeout: Duration) -> bool {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                self.process_pending();
                true
            }
            Err(RecvTimeoutError::Timeout) => true,
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Tick => self.on_tick(),
            PlayerEvent::Stream { pipeline, event } => self.on_stream_event(pipeline, event),
            PlayerEvent::RadioResolved { track, result } => {
                self.on_stream_resolved(track, result, true)
            }
            PlayerEvent::WebUriResolved { track, result } => {
                self.on_stream_resolved(track, result, false)
            }
            PlayerEvent::SimilarArtists { track, result } => {
                self.on_similar_artists(track, result)
            }
            PlayerEvent::SessionLoaded(result) => self.on_session_loaded(result),
        }
    }

    fn on_tick(&mut self) {
        if let Err(e) = self.bin.tick(TICK_INTERVAL) {
            warn!("Unable to advance fades: {}", e);
        }

        if !self.context.settings.smooth_transitions
            || !self.bin.is_playing()
            || self.bin.is_fading()
            || self.state.current_is_radio()
        {
            return;
        }

        let Some(remaining) = self.bin.remaining() else {
            return;
        };
        if remaining > self.transition_duration() {
            return;
        }

        let next = self
            .state
            .next
            .clone()
            .filter(|t| !t.is_radio() && !t.needs_resolution());
        if let Some(next) = next {
            debug!("Smooth transition to {}", next.title);
            self.load_track(next, true);
        }
    }

    fn on_stream_event(&mut self, pipeline: usize, event: StreamEvent) {
        if pipeline != self.bin.active() {
            if let StreamEvent::Error(message) = &event {
                warn!("Inactive pipeline {} failed: {}", pipeline, message);
            }
            return;
        }

        match event {
            StreamEvent::Started => self.on_stream_started(),
            StreamEvent::Duration(duration) => self.bin.set_duration(duration),
            StreamEvent::Position(position) => self.bin.set_position(position),
            StreamEvent::AboutToFinish => self.record_stats(),
            StreamEvent::Eos => self.on_eos(),
            StreamEvent::Error(message) => {
                error!("Playback error: {}", message);
                self.stop();
            }
            StreamEvent::MissingPlugin(message) => {
                error!("Missing decoder: {}", message);
                self.stop();
                self.notify(Notification::CodecMissing(message));
            }
        }
    }

    fn on_stream_started(&mut self) {
        let Some(track) = self.state.current.clone() else {
            return;
        };
        debug!("Stream started: {}", track.title);

        if let Some(position) = self.pending_seek.take() {
            self.seek(position);
        }
        if std::mem::take(&mut self.pending_pause) {
            self.pause();
        }

        let mut restored = None;
        if let Some(track_id) = track.library_id().filter(|id| self.queue.contains(*id)) {
            restored = self.queue.remove(track_id);
            self.notify(Notification::QueueChanged);
        }

        let ctx = resolve_context(&self.state, &self.context);
        if ctx.is_shuffling() {
            self.shuffle.on_started(&track, &ctx);
        }

        self.started_at = Some(unix_time());
        self.scrobble(track.clone(), None);
        self.notify(Notification::CurrentChanged(track));

        self.queue_drained(restored);
        self.set_prev();
    }

    fn on_eos(&mut self) {
        self.record_stats();

        if self.state.stops_after_current() {
            info!("Stopping after the current track");
            self.state.stop_after = None;
            self.stop();
            self.ended = true;
            self.set_next();
            return;
        }

        match self.state.next.clone() {
            Some(track) => self.load_track(track, false),
            None => {
                self.stop();
                self.ended = true;
            }
        }
    }
}
