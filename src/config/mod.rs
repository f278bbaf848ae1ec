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

//! Application configuration.
//!
//! This module manages the application configuration file, which holds the
//! enumerated playback options consumed by the player (shuffle, repeat,
//! smooth transitions, party mode and so on).

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

const CONFIG_NAME: &str = "lollypop";

/// How tracks are picked when no explicit ordering applies.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Shuffle {
    #[default]
    None,
    Tracks,
    Albums,
}

/// What happens once the current ordering runs out of tracks.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    None,
    /// Keep playback going with albums from similar artists.
    Auto,
    Track,
    Album,
    All,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplayGain {
    Off,
    Track,
    #[default]
    Album,
}

impl Display for Shuffle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Shuffle::None => write!(f, "none"),
            Shuffle::Tracks => write!(f, "tracks"),
            Shuffle::Albums => write!(f, "albums"),
        }
    }
}

impl Display for Repeat {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Repeat::None => write!(f, "none"),
            Repeat::Auto => write!(f, "auto"),
            Repeat::Track => write!(f, "track"),
            Repeat::Album => write!(f, "album"),
            Repeat::All => write!(f, "all"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    pub version: u32,
    pub shuffle: Shuffle,
    pub repeat: Repeat,
    pub smooth_transitions: bool,
    pub transition_duration_ms: u64,
    pub party_mix: bool,
    pub party_ids: Vec<i64>,
    pub disable_scrobbling: bool,
    pub replay_gain: ReplayGain,
    pub volume: f64,
    pub network_access: bool,
    pub lastfm_api_key: Option<String>,
    pub lastfm_api_secret: Option<String>,
    /// Session key of the authorised Last.fm account, needed to scrobble.
    pub lastfm_session_key: Option<String>,
    pub listenbrainz_token: Option<String>,
    pub database: String,
    pub session_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            shuffle: Shuffle::None,
            repeat: Repeat::None,
            smooth_transitions: false,
            transition_duration_ms: 2000,
            party_mix: false,
            party_ids: vec![],
            disable_scrobbling: false,
            replay_gain: ReplayGain::Album,
            volume: 1.0,
            network_access: true,
            lastfm_api_key: None,
            lastfm_api_secret: None,
            lastfm_session_key: None,
            listenbrainz_token: None,
            database: "lollypop.db".to_string(),
            session_file: "session.json".to_string(),
        }
    }
}

pub fn load_config() -> Settings {
    confy::load(CONFIG_NAME, None).unwrap_or_default()
}

pub fn save_config(cfg: &Settings) -> Result<(), confy::ConfyError> {
    confy::store(CONFIG_NAME, None, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"repeat": "all"}"#).unwrap();

        assert_eq!(settings.repeat, Repeat::All);
        assert_eq!(settings.shuffle, Shuffle::None);
        assert_eq!(settings.transition_duration_ms, 2000);
        assert_eq!(settings.replay_gain, ReplayGain::Album);
    }

    #[test]
    fn enums_use_lowercase_names() {
        let json = serde_json::to_string(&Shuffle::Tracks).unwrap();
        assert_eq!(json, "\"tracks\"");
        assert_eq!(Repeat::Auto.to_string(), "auto");
    }
}
