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

//! Last.fm similar artists.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{
    error::WebError,
    web::{SimilarArtistProvider, http_client},
};

const API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Number of similar artists requested per lookup.
const LIMIT: &str = "20";

#[derive(Deserialize)]
struct SimilarResponse {
    similarartists: SimilarArtists,
}

#[derive(Deserialize)]
struct SimilarArtists {
    #[serde(default)]
    artist: Vec<Artist>,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

pub struct LastFm {
    client: Client,
    api_key: String,
}

impl LastFm {
    pub fn new(api_key: Option<&str>) -> Result<Self, WebError> {
        let api_key = api_key
            .filter(|key| !key.is_empty())
            .ok_or(WebError::MissingKey("last.fm"))?;

        Ok(Self {
            client: http_client()?,
            api_key: api_key.to_string(),
        })
    }
}

impl SimilarArtistProvider for LastFm {
    fn name(&self) -> &'static str {
        "last.fm"
    }

    fn similar_artists(&self, artist: &str) -> Result<Vec<String>, WebError> {
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("method", "artist.getsimilar"),
                ("artist", artist),
                ("api_key", self.api_key.as_str()),
                ("limit", LIMIT),
                ("format", "json"),
            ])
            .send()?
            .error_for_status()?
            .json::<SimilarResponse>()?;

        Ok(response
            .similarartists
            .artist
            .into_iter()
            .map(|a| a.name)
            .collect())
    }
}
