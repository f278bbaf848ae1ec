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

//! Deezer related artists, used when Last.fm has no answer.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{
    error::WebError,
    web::{SimilarArtistProvider, http_client},
};

const API_URL: &str = "https://api.deezer.com";

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<Artist>,
}

#[derive(Deserialize)]
struct Artist {
    id: u64,
    name: String,
}

pub struct Deezer {
    client: Client,
}

impl Deezer {
    pub fn new() -> Result<Self, WebError> {
        Ok(Self {
            client: http_client()?,
        })
    }

    fn artist_id(&self, artist: &str) -> Result<Option<u64>, WebError> {
        let page = self
            .client
            .get(format!("{}/search/artist", API_URL))
            .query(&[("q", artist)])
            .send()?
            .error_for_status()?
            .json::<Page>()?;

        Ok(page
            .data
            .into_iter()
            .find(|a| a.name.eq_ignore_ascii_case(artist))
            .map(|a| a.id))
    }
}

impl SimilarArtistProvider for Deezer {
    fn name(&self) -> &'static str {
        "deezer"
    }

    fn similar_artists(&self, artist: &str) -> Result<Vec<String>, WebError> {
        let Some(id) = self.artist_id(artist)? else {
            return Err(WebError::NoSimilarArtists(artist.to_string()));
        };

        let page = self
            .client
            .get(format!("{}/artist/{}/related", API_URL, id))
            .send()?
            .error_for_status()?
            .json::<Page>()?;

        Ok(page.data.into_iter().map(|a| a.name).collect())
    }
}
