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

//! # Lollypop command line player.
//!
//! A small front end driving the playback engine: it opens the collection,
//! starts playback from the command line arguments and prints what plays
//! until playback stops.
//!
//! ## Architecture
//!
//! * The **Main Thread** owns the player and drains its event channel.
//! * A **Ticker** thread posts a tick every 250ms to advance fades and
//!   smooth transitions.
//! * **Pipeline** and **Task** threads post stream events and background
//!   results on the same channel.

use std::{
    rc::Rc,
    sync::{
        Arc,
        mpsc::{self, Sender},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use lollypop::{
    config::{self, Settings},
    engine::{PlaybackStatus, Pipeline, SilentPipeline, TICK_INTERVAL},
    library::SqliteLibrary,
    model::Track,
    player::{Notification, Player, PlayerContext, PlayerEvent},
    scrobbler::{LastFmScrobbler, ListenBrainz, Scrobbler},
    tasks::ThreadTaskRunner,
    web::{Deezer, LastFm, RadioResolver, SimilarArtistProvider},
};

/// How long to wait for playback to start before giving up.
const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(about = "Plays albums from a Lollypop collection", version)]
struct Args {
    /// Album to start with
    #[arg(short = 'a', long = "album")]
    album: Option<i64>,

    /// Genre ids, or one of -1 (all), -2 (popular), -3 (random), -4 (recent),
    /// -5 (loved), -6 (compilations), -7 (years)
    #[arg(short = 'g', long = "genres", value_delimiter = ',', allow_negative_numbers = true)]
    genres: Vec<i64>,

    /// Artist ids, or years with -7
    #[arg(short = 'f', long = "filter", value_delimiter = ',')]
    filter: Vec<i64>,

    /// Play a file or a radio url
    #[arg(short = 'u', long = "uri")]
    uri: Option<String>,

    /// Start party mode
    #[arg(short = 'p', long = "party")]
    party: bool,

    /// Restore the previous session
    #[arg(short = 'r', long = "restore")]
    restore: bool,

    /// Collection database, overrides the configuration
    #[arg(long = "database")]
    database: Option<String>,

    /// Walk the play order without audio output
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Log debug messages
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter(Some("lollypop"), LevelFilter::Debug);
    } else {
        builder.filter(Some("lollypop"), LevelFilter::Info);
    }
    builder.init();

    let mut settings = config::load_config();
    if let Some(database) = args.database.clone() {
        settings.database = database;
    }

    let (event_tx, event_rx) = mpsc::channel();
    let library = SqliteLibrary::open(&settings.database)
        .with_context(|| format!("Failed to open collection {}", settings.database))?;

    let context = PlayerContext {
        scrobblers: scrobblers(&settings),
        similar_providers: similar_providers(&settings),
        stream_resolver: Arc::new(
            RadioResolver::new(settings.network_access)
                .context("Failed to create the stream resolver")?,
        ),
        tasks: Box::new(ThreadTaskRunner::new(event_tx.clone())),
        library: Rc::new(library),
        settings,
    };

    let pipelines = pipelines(&event_tx, args.dry_run);
    let mut player = Player::new(context, pipelines, event_rx);
    let notifications = player.subscribe();

    spawn_ticker(event_tx);
    start(&mut player, &args)?;

    let started = Instant::now();
    let mut playing = false;
    loop {
        if !player.process_events(TICK_INTERVAL) {
            break;
        }

        let mut stopped = false;
        for notification in notifications.try_iter() {
            match notification {
                Notification::CurrentChanged(track) => print_track(&track),
                Notification::Loading(track) => println!("Loading {}", track.title),
                Notification::StatusChanged(PlaybackStatus::Playing) => playing = true,
                Notification::StatusChanged(PlaybackStatus::Stopped) => stopped = true,
                Notification::CodecMissing(message) => {
                    eprintln!("A decoder is missing to play this track: {}", message)
                }
                other => debug!("{:?}", other),
            }
        }

        if stopped && player.status() == PlaybackStatus::Stopped {
            break;
        }
        if !playing && started.elapsed() > IDLE_TIMEOUT {
            info!("Nothing to play");
            break;
        }
    }

    if let Err(e) = player.save_state() {
        warn!("Unable to save session: {}", e);
    }
    if let Err(e) = config::save_config(player.settings()) {
        warn!("Unable to save configuration: {}", e);
    }

    Ok(())
}

fn start(player: &mut Player, args: &Args) -> Result<()> {
    if args.restore {
        player.restore_state();
    } else if let Some(uri) = &args.uri {
        let track = if uri.starts_with("http://") || uri.starts_with("https://") {
            Track::radio(0, uri, uri)
        } else {
            Track::external(uri)
        };
        player.load(track);
    } else if args.party {
        player.set_party(true);
    } else {
        player
            .play_albums(args.album, &args.genres, &args.filter)
            .context("Failed to load albums")?;
    }

    Ok(())
}

fn print_track(track: &Track) {
    if track.artists.is_empty() {
        println!("Now playing: {}", track.title);
    } else {
        println!("Now playing: {} - {}", track.artist_label(), track.title);
    }
}

/// Posts a tick on the player channel until the player is gone.
fn spawn_ticker(event_tx: Sender<PlayerEvent>) {
    thread::spawn(move || {
        while event_tx.send(PlayerEvent::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });
}

fn silent_pipelines(event_tx: &Sender<PlayerEvent>) -> [Box<dyn Pipeline>; 2] {
    [
        Box::new(SilentPipeline::simulating(0, event_tx.clone())),
        Box::new(SilentPipeline::simulating(1, event_tx.clone())),
    ]
}

#[cfg(feature = "mpv")]
fn pipelines(event_tx: &Sender<PlayerEvent>, dry_run: bool) -> [Box<dyn Pipeline>; 2] {
    use lollypop::engine::MpvPipeline;

    if dry_run {
        return silent_pipelines(event_tx);
    }
    [
        Box::new(MpvPipeline::new(0, event_tx.clone())),
        Box::new(MpvPipeline::new(1, event_tx.clone())),
    ]
}

#[cfg(not(feature = "mpv"))]
fn pipelines(event_tx: &Sender<PlayerEvent>, _dry_run: bool) -> [Box<dyn Pipeline>; 2] {
    warn!("Built without mpv, no audio output");
    silent_pipelines(event_tx)
}

fn scrobblers(settings: &Settings) -> Vec<Arc<dyn Scrobbler>> {
    let mut scrobblers: Vec<Arc<dyn Scrobbler>> = Vec::new();

    if settings.lastfm_session_key.is_some() {
        match LastFmScrobbler::new(
            settings.lastfm_api_key.as_deref(),
            settings.lastfm_api_secret.as_deref(),
            settings.lastfm_session_key.as_deref(),
            settings.network_access,
        ) {
            Ok(lastfm) => scrobblers.push(Arc::new(lastfm)),
            Err(e) => warn!("Last.fm scrobbling disabled: {}", e),
        }
    }

    if settings.listenbrainz_token.is_some() {
        match ListenBrainz::new(settings.listenbrainz_token.clone(), settings.network_access) {
            Ok(listenbrainz) => scrobblers.push(Arc::new(listenbrainz)),
            Err(e) => warn!("ListenBrainz disabled: {}", e),
        }
    }

    scrobblers
}

fn similar_providers(settings: &Settings) -> Vec<Arc<dyn SimilarArtistProvider>> {
    let mut providers: Vec<Arc<dyn SimilarArtistProvider>> = Vec::new();
    if !settings.network_access {
        return providers;
    }

    match LastFm::new(settings.lastfm_api_key.as_deref()) {
        Ok(lastfm) => providers.push(Arc::new(lastfm)),
        Err(e) => debug!("Last.fm disabled: {}", e),
    }
    match Deezer::new() {
        Ok(deezer) => providers.push(Arc::new(deezer)),
        Err(e) => warn!("Deezer disabled: {}", e),
    }

    providers
}
