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

//! ListenBrainz submissions.

use reqwest::blocking::Client;
use serde_json::{Value, json};

use crate::{
    error::WebError,
    model::Track,
    scrobbler::Scrobbler,
    web::http_client,
};

const SUBMIT_URL: &str = "https://api.listenbrainz.org/1/submit-listens";

pub struct ListenBrainz {
    client: Client,
    token: Option<String>,
    network_access: bool,
}

impl ListenBrainz {
    pub fn new(token: Option<String>, network_access: bool) -> Result<Self, WebError> {
        Ok(Self {
            client: http_client()?,
            token: token.filter(|t| !t.is_empty()),
            network_access,
        })
    }

    fn submit(&self, body: &Value) -> Result<(), WebError> {
        let token = self
            .token
            .as_deref()
            .ok_or(WebError::MissingKey("listenbrainz"))?;

        self.client
            .post(SUBMIT_URL)
            .header("Authorization", format!("Token {}", token))
            .json(body)
            .send()?
            .error_for_status()?;

        Ok(())
    }
}

fn track_metadata(track: &Track) -> Value {
    json!({
        "artist_name": track.artist_label(),
        "track_name": track.title,
        "release_name": track.album_name,
    })
}

fn listen_body(track: &Track, timestamp: i64) -> Value {
    json!({
        "listen_type": "single",
        "payload": [{
            "listened_at": timestamp,
            "track_metadata": track_metadata(track),
        }],
    })
}

fn playing_now_body(track: &Track) -> Value {
    json!({
        "listen_type": "playing_now",
        "payload": [{ "track_metadata": track_metadata(track) }],
    })
}

impl Scrobbler for ListenBrainz {
    fn name(&self) -> &'static str {
        "listenbrainz"
    }

    fn available(&self) -> bool {
        self.network_access && self.token.is_some()
    }

    fn listen(&self, track: &Track, timestamp: i64) -> Result<(), WebError> {
        self.submit(&listen_body(track, timestamp))
    }

    fn playing_now(&self, track: &Track) -> Result<(), WebError> {
        self.submit(&playing_now_body(track))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            id: Some(1),
            title: "Song".into(),
            album_name: "Album".into(),
            artists: vec!["A".into(), "B".into()],
            ..Default::default()
        }
    }

    #[test]
    fn listen_payload() {
        let body = listen_body(&track(), 1_700_000_000);

        assert_eq!(body["listen_type"], "single");
        assert_eq!(body["payload"][0]["listened_at"], 1_700_000_000);
        assert_eq!(body["payload"][0]["track_metadata"]["artist_name"], "A, B");
        assert_eq!(body["payload"][0]["track_metadata"]["release_name"], "Album");
    }

    #[test]
    fn playing_now_has_no_timestamp() {
        let body = playing_now_body(&track());

        assert_eq!(body["listen_type"], "playing_now");
        assert!(body["payload"][0].get("listened_at").is_none());
    }
}
