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

//! Web services consumed by the player.
//!
//! Similar artist lookups keep playback going once the albums in play run
//! out, stream resolution turns radio playlists and web pages into playable
//! uris. Every call here blocks and must run as a background task.

mod deezer;
mod lastfm;
mod radio;

pub use deezer::Deezer;
pub use lastfm::LastFm;
pub use radio::{RadioResolver, parse_m3u, parse_pls};

use std::sync::Arc;

use log::debug;
use reqwest::blocking::Client;

use crate::error::WebError;

const USER_AGENT: &str = concat!("lollypop/", env!("CARGO_PKG_VERSION"));

pub trait SimilarArtistProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Names of artists similar to `artist`, closest first.
    fn similar_artists(&self, artist: &str) -> Result<Vec<String>, WebError>;
}

/// Turns track uris into something a pipeline can play.
pub trait StreamResolver: Send + Sync {
    /// Resolves a radio uri, which may point to a playlist file or a YouTube
    /// page.
    fn resolve_radio(&self, uri: &str) -> Result<String, WebError>;

    /// Resolves the audio stream of a web page.
    fn resolve_web(&self, uri: &str) -> Result<String, WebError>;
}

pub fn http_client() -> Result<Client, WebError> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

/// Asks each provider in turn, the first non-empty answer wins.
pub fn similar_artists(
    providers: &[Arc<dyn SimilarArtistProvider>],
    artist: &str,
) -> Result<Vec<String>, WebError> {
    let mut last_error = None;

    for provider in providers {
        match provider.similar_artists(artist) {
            Ok(artists) if !artists.is_empty() => return Ok(artists),
            Ok(_) => debug!("{} knows no artist similar to {}", provider.name(), artist),
            Err(e) => {
                debug!("{} lookup for {} failed: {}", provider.name(), artist, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| WebError::NoSimilarArtists(artist.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Vec<String>, ()>);

    impl SimilarArtistProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn similar_artists(&self, _artist: &str) -> Result<Vec<String>, WebError> {
            self.0.clone().map_err(|_| WebError::Offline)
        }
    }

    #[test]
    fn falls_back_to_next_provider() {
        let providers: Vec<Arc<dyn SimilarArtistProvider>> = vec![
            Arc::new(Fixed(Err(()))),
            Arc::new(Fixed(Ok(vec![]))),
            Arc::new(Fixed(Ok(vec!["Other".into()]))),
        ];

        assert_eq!(
            similar_artists(&providers, "Band").unwrap(),
            vec!["Other".to_string()]
        );
    }

    #[test]
    fn reports_last_failure() {
        let providers: Vec<Arc<dyn SimilarArtistProvider>> = vec![Arc::new(Fixed(Err(())))];
        assert!(matches!(
            similar_artists(&providers, "Band"),
            Err(WebError::Offline)
        ));

        assert!(matches!(
            similar_artists(&[], "Band"),
            Err(WebError::NoSimilarArtists(_))
        ));
    }
}
