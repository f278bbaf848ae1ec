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

//! Last.fm scrobbling.
//!
//! Write calls need an API key, its shared secret and a session key obtained
//! once through the Last.fm authentication flow. Every request is signed with
//! the md5 of its sorted parameters followed by the secret.

use md5::{Digest, Md5};
use reqwest::blocking::Client;

use crate::{
    error::WebError,
    model::Track,
    scrobbler::Scrobbler,
    web::http_client,
};

const API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

struct Credentials {
    api_key: String,
    api_secret: String,
    session_key: String,
}

pub struct LastFmScrobbler {
    client: Client,
    credentials: Option<Credentials>,
    network_access: bool,
}

impl LastFmScrobbler {
    pub fn new(
        api_key: Option<&str>,
        api_secret: Option<&str>,
        session_key: Option<&str>,
        network_access: bool,
    ) -> Result<Self, WebError> {
        let present = |value: Option<&str>| value.filter(|v| !v.is_empty()).map(str::to_string);
        let credentials = match (present(api_key), present(api_secret), present(session_key)) {
            (Some(api_key), Some(api_secret), Some(session_key)) => Some(Credentials {
                api_key,
                api_secret,
                session_key,
            }),
            _ => None,
        };

        Ok(Self {
            client: http_client()?,
            credentials,
            network_access,
        })
    }

    fn call(&self, method: &str, params: Vec<(&'static str, String)>) -> Result<(), WebError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(WebError::MissingKey("last.fm"))?;

        self.client
            .post(API_URL)
            .form(&signed_params(method, params, credentials))
            .send()?
            .error_for_status()?;

        Ok(())
    }
}

fn track_params(track: &Track) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("artist", track.artists.first().cloned().unwrap_or_default()),
        ("track", track.title.clone()),
        ("duration", track.duration.as_secs().to_string()),
    ];
    if !track.album_name.is_empty() {
        params.push(("album", track.album_name.clone()));
    }
    params
}

/// Adds the authentication parameters and the `api_sig` signature.
fn signed_params(
    method: &str,
    mut params: Vec<(&'static str, String)>,
    credentials: &Credentials,
) -> Vec<(&'static str, String)> {
    params.push(("method", method.to_string()));
    params.push(("api_key", credentials.api_key.clone()));
    params.push(("sk", credentials.session_key.clone()));
    params.sort_by(|a, b| a.0.cmp(b.0));

    let mut signature = String::new();
    for (key, value) in &params {
        signature.push_str(key);
        signature.push_str(value);
    }
    signature.push_str(&credentials.api_secret);

    params.push(("api_sig", format!("{:x}", Md5::digest(signature.as_bytes()))));
    params.push(("format", "json".to_string()));
    params
}

impl Scrobbler for LastFmScrobbler {
    fn name(&self) -> &'static str {
        "last.fm"
    }

    fn available(&self) -> bool {
        self.network_access && self.credentials.is_some()
    }

    fn listen(&self, track: &Track, timestamp: i64) -> Result<(), WebError> {
        let mut params = track_params(track);
        params.push(("timestamp", timestamp.to_string()));
        self.call("track.scrobble", params)
    }

    fn playing_now(&self, track: &Track) -> Result<(), WebError> {
        self.call("track.updateNowPlaying", track_params(track))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            api_key: "key".into(),
            api_secret: "secret".into(),
            session_key: "session".into(),
        }
    }

    fn track() -> Track {
        Track {
            id: Some(1),
            title: "Song".into(),
            album_name: "Album".into(),
            artists: vec!["A".into(), "B".into()],
            duration: Duration::from_secs(200),
            ..Default::default()
        }
    }

    fn value<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn needs_every_credential() {
        let scrobbler = LastFmScrobbler::new(Some("key"), Some("secret"), None, true).unwrap();
        assert!(!scrobbler.available());
        assert!(matches!(
            scrobbler.listen(&track(), 0),
            Err(WebError::MissingKey("last.fm"))
        ));

        let scrobbler =
            LastFmScrobbler::new(Some("key"), Some("secret"), Some("session"), false).unwrap();
        assert!(!scrobbler.available());

        let scrobbler =
            LastFmScrobbler::new(Some("key"), Some("secret"), Some("session"), true).unwrap();
        assert!(scrobbler.available());
    }

    #[test]
    fn scrobble_is_signed() {
        let mut params = track_params(&track());
        params.push(("timestamp", "1700000000".to_string()));
        let params = signed_params("track.scrobble", params, &credentials());

        assert_eq!(value(&params, "artist"), Some("A"));
        assert_eq!(value(&params, "album"), Some("Album"));
        assert_eq!(value(&params, "sk"), Some("session"));
        assert_eq!(
            value(&params, "api_sig"),
            Some("d50cd1d8c4ba8775f946ffd4d8c79a5d")
        );
        assert_eq!(value(&params, "format"), Some("json"));
    }

    #[test]
    fn now_playing_has_no_timestamp() {
        let params = signed_params("track.updateNowPlaying", track_params(&track()), &credentials());

        assert_eq!(value(&params, "method"), Some("track.updateNowPlaying"));
        assert!(value(&params, "timestamp").is_none());
    }
}
