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

#![allow(dead_code)]

use std::{
    rc::Rc,
    sync::{Arc, mpsc},
    time::Duration,
};

use lollypop::{
    config::Settings,
    engine::SilentPipeline,
    error::WebError,
    library::{Library, NewTrack, SqliteLibrary},
    model::{Album, Track},
    player::{Player, PlayerContext, PlayerEvent, StreamEvent},
    tasks::InlineTaskRunner,
    web::{SimilarArtistProvider, StreamResolver},
};

pub struct Collection {
    pub library: Rc<SqliteLibrary>,
    pub album_ids: Vec<i64>,
    pub genre_id: i64,
}

impl Collection {
    /// One album per entry of `sizes`, each by its own artist.
    pub fn new(sizes: &[u32]) -> Self {
        let library = SqliteLibrary::open_in_memory().unwrap();
        let genre_id = library.add_genre("Rock").unwrap();

        let album_ids = sizes
            .iter()
            .enumerate()
            .map(|(index, size)| {
                let artist = library.add_artist(&format!("Artist {}", index)).unwrap();
                let album = library
                    .add_album(&format!("Album {}", index), &[artist], Some(2000), false)
                    .unwrap();
                for number in 1..=*size {
                    library
                        .add_track(&NewTrack {
                            album_id: album,
                            title: format!("Track {}.{}", index, number),
                            uri: format!("file:///music/{}/{}.flac", index, number),
                            duration_ms: 200_000,
                            number,
                            disc_number: 1,
                            artist_ids: vec![artist],
                            genre_ids: vec![genre_id],
                            ..Default::default()
                        })
                        .unwrap();
                }
                album
            })
            .collect();

        Self {
            library: Rc::new(library),
            album_ids,
            genre_id,
        }
    }

    pub fn album(&self, index: usize) -> Album {
        Album::load(self.library.as_ref(), self.album_ids[index], &[], &[]).unwrap()
    }

    pub fn track(&self, album: usize, number: usize) -> Track {
        self.album(album).tracks()[number].clone()
    }
}

pub struct FakeResolver;

impl StreamResolver for FakeResolver {
    fn resolve_radio(&self, uri: &str) -> Result<String, WebError> {
        Ok(uri.to_string())
    }

    fn resolve_web(&self, uri: &str) -> Result<String, WebError> {
        Ok(uri.to_string())
    }
}

pub struct FixedSimilars(pub Vec<String>);

impl SimilarArtistProvider for FixedSimilars {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn similar_artists(&self, _artist: &str) -> Result<Vec<String>, WebError> {
        Ok(self.0.clone())
    }
}

pub fn player_with(
    collection: &Collection,
    settings: Settings,
    similar_providers: Vec<Arc<dyn SimilarArtistProvider>>,
) -> Player {
    let (tx, rx) = mpsc::channel();
    let library: Rc<dyn Library> = collection.library.clone();
    let context = PlayerContext {
        settings,
        library,
        scrobblers: vec![],
        similar_providers,
        stream_resolver: Arc::new(FakeResolver),
        tasks: Box::new(InlineTaskRunner::new(tx)),
    };

    Player::new(
        context,
        [
            Box::new(SilentPipeline::new()),
            Box::new(SilentPipeline::new()),
        ],
        rx,
    )
}

pub fn player(collection: &Collection, settings: Settings) -> Player {
    player_with(collection, settings, vec![])
}

fn stream(player: &mut Player, event: StreamEvent) {
    let pipeline = player.bin().active();
    player.handle_event(PlayerEvent::Stream { pipeline, event });
}

/// Reports the loaded stream as started, as a pipeline would.
pub fn start(player: &mut Player) {
    stream(player, StreamEvent::Started);
}

pub fn finish(player: &mut Player) {
    stream(player, StreamEvent::Eos);
}

pub fn advance(player: &mut Player, position: Duration, duration: Duration) {
    stream(player, StreamEvent::Duration(duration));
    stream(player, StreamEvent::Position(position));
}

pub fn current_id(player: &Player) -> Option<i64> {
    player.current_track().and_then(|t| t.id)
}

pub fn next_id(player: &Player) -> Option<i64> {
    player.next_track().and_then(|t| t.id)
}

pub fn prev_id(player: &Player) -> Option<i64> {
    player.prev_track().and_then(|t| t.id)
}
