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

//! Radio and web stream resolution.
//!
//! Radio uris either point straight at a stream, at a playlist file listing
//! streams, or at a YouTube page. Pages are handed to the `yt-dlp` helper
//! which prints the direct url of the best audio stream.

use std::process::Command;

use log::debug;
use reqwest::blocking::Client;

use crate::{
    error::WebError,
    web::{StreamResolver, http_client},
};

const YOUTUBE_HELPER: &str = "yt-dlp";

/// First stream of an M3U or M3U8 playlist.
pub fn parse_m3u(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// First `FileN=` entry of a PLS playlist, lowest N first.
pub fn parse_pls(content: &str) -> Option<String> {
    let mut entries: Vec<(u32, String)> = content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once('=')?;
            let key = key.trim().to_ascii_lowercase();
            let index = key.strip_prefix("file")?.parse().ok()?;
            let value = value.trim();
            (!value.is_empty()).then(|| (index, value.to_string()))
        })
        .collect();

    entries.sort_by_key(|(index, _)| *index);
    entries.into_iter().next().map(|(_, uri)| uri)
}

pub fn is_youtube(uri: &str) -> bool {
    ["youtube.com/", "youtu.be/"]
        .iter()
        .any(|domain| uri.contains(domain))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaylistFormat {
    M3u,
    Pls,
}

fn playlist_format(uri: &str) -> Option<PlaylistFormat> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri).to_ascii_lowercase();
    if path.ends_with(".m3u") || path.ends_with(".m3u8") {
        Some(PlaylistFormat::M3u)
    } else if path.ends_with(".pls") {
        Some(PlaylistFormat::Pls)
    } else {
        None
    }
}

pub struct RadioResolver {
    client: Client,
    network_access: bool,
}

impl RadioResolver {
    pub fn new(network_access: bool) -> Result<Self, WebError> {
        Ok(Self {
            client: http_client()?,
            network_access,
        })
    }

    fn check_network(&self) -> Result<(), WebError> {
        if self.network_access {
            Ok(())
        } else {
            Err(WebError::Offline)
        }
    }

    fn youtube_stream(&self, uri: &str) -> Result<String, WebError> {
        debug!("Resolving {} with {}", uri, YOUTUBE_HELPER);
        let output = Command::new(YOUTUBE_HELPER)
            .args(["-g", "-f", "bestaudio", uri])
            .output()
            .map_err(|e| WebError::Helper(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WebError::Helper(stderr.trim().to_string()));
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| WebError::Helper(format!("no stream for {}", uri)))
    }
}

impl StreamResolver for RadioResolver {
    fn resolve_radio(&self, uri: &str) -> Result<String, WebError> {
        if is_youtube(uri) {
            self.check_network()?;
            return self.youtube_stream(uri);
        }

        let Some(format) = playlist_format(uri) else {
            return Ok(uri.to_string());
        };

        self.check_network()?;
        let content = self.client.get(uri).send()?.error_for_status()?.text()?;
        let stream = match format {
            PlaylistFormat::M3u => parse_m3u(&content),
            PlaylistFormat::Pls => parse_pls(&content),
        };

        stream.ok_or_else(|| WebError::EmptyPlaylist(uri.to_string()))
    }

    fn resolve_web(&self, uri: &str) -> Result<String, WebError> {
        self.check_network()?;
        self.youtube_stream(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn m3u_skips_comments() {
        let content = "#EXTM3U\n\n#EXTINF:-1,Station\n http://radio.example/stream \nhttp://backup\n";
        assert_eq!(
            parse_m3u(content).as_deref(),
            Some("http://radio.example/stream")
        );
        assert_eq!(parse_m3u("#EXTM3U\n"), None);
    }

    #[test]
    fn pls_takes_lowest_file_entry() {
        let content = "[playlist]\nNumberOfEntries=2\nFile2=http://two\nTitle1=One\nfile1=http://one\n";
        assert_eq!(parse_pls(content).as_deref(), Some("http://one"));
        assert_eq!(parse_pls("[playlist]\nFile1=\n"), None);
    }

    #[test]
    fn formats_are_detected_from_path() {
        assert_eq!(
            playlist_format("http://x/listen.PLS?token=1"),
            Some(PlaylistFormat::Pls)
        );
        assert_eq!(playlist_format("http://x/a.m3u8"), Some(PlaylistFormat::M3u));
        assert_eq!(playlist_format("http://x/stream.mp3"), None);
    }

    #[test]
    fn youtube_domains() {
        assert!(is_youtube("https://www.youtube.com/watch?v=abc"));
        assert!(is_youtube("https://youtu.be/abc"));
        assert!(!is_youtube("http://radio.example/stream"));
    }

    #[test]
    fn direct_streams_need_no_network() {
        let resolver = RadioResolver {
            client: Client::new(),
            network_access: false,
        };

        assert_eq!(
            resolver.resolve_radio("http://radio.example/stream").unwrap(),
            "http://radio.example/stream"
        );
        assert!(matches!(
            resolver.resolve_radio("http://radio.example/a.pls"),
            Err(WebError::Offline)
        ));
    }
}
