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

mod common;

use std::{fs, path::Path, time::Duration};

use lollypop::{
    config::Settings,
    engine::PlaybackStatus,
    player::{SESSION_VERSION, SessionState},
};

use common::*;

fn settings(dir: &tempfile::TempDir) -> Settings {
    Settings {
        session_file: dir.path().join("session.json").display().to_string(),
        ..Default::default()
    }
}

#[test]
fn session_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let collection = Collection::new(&[3, 2]);

    let mut before = player(&collection, settings(&dir));
    before.play_albums(None, &[], &[]).unwrap();
    start(&mut before);
    finish(&mut before);
    start(&mut before);
    let queued = collection.track(1, 1).id.unwrap();
    before.append_to_queue(queued);
    advance(&mut before, Duration::from_secs(42), Duration::from_secs(200));
    before.save_state().unwrap();

    let mut after = player(&collection, settings(&dir));
    after.restore_state();
    after.process_pending();

    let album_ids: Vec<i64> = after.albums().iter().map(|a| a.id).collect();
    assert_eq!(album_ids, collection.album_ids);
    assert_eq!(after.queue(), &[queued]);
    assert_eq!(current_id(&after), collection.track(0, 1).id);

    start(&mut after);
    assert_eq!(after.position(), Duration::from_secs(42));
    assert_eq!(after.status(), PlaybackStatus::Playing);
    assert_eq!(next_id(&after), Some(queued));
}

#[test]
fn paused_session_restores_paused() {
    let dir = tempfile::tempdir().unwrap();
    let collection = Collection::new(&[2]);

    let mut before = player(&collection, settings(&dir));
    before.play_albums(None, &[], &[]).unwrap();
    start(&mut before);
    before.pause();
    before.save_state().unwrap();

    let mut after = player(&collection, settings(&dir));
    after.restore_state();
    after.process_pending();
    start(&mut after);

    assert_eq!(current_id(&after), collection.track(0, 0).id);
    assert_eq!(after.status(), PlaybackStatus::Paused);
}

#[test]
fn party_session_restores_party() {
    let dir = tempfile::tempdir().unwrap();
    let collection = Collection::new(&[2, 2]);

    let mut before = player(&collection, settings(&dir));
    before.set_party(true);
    start(&mut before);
    let session = before.session();
    assert!(session.is_party);
    assert!(session.albums.is_empty());
    before.save_state().unwrap();

    let mut after = player(&collection, settings(&dir));
    after.restore_state();
    after.process_pending();

    assert!(after.is_party());
    assert_eq!(after.albums().len(), 2);
    assert_eq!(current_id(&after), session.track_id);
}

#[test]
fn corrupt_session_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let collection = Collection::new(&[2]);
    let settings = settings(&dir);
    fs::write(&settings.session_file, "{ not a session").unwrap();

    let mut player = player(&collection, settings);
    player.restore_state();
    player.process_pending();

    assert!(player.current_track().is_none());
    assert!(player.albums().is_empty());
    assert_eq!(player.status(), PlaybackStatus::Stopped);
}

#[test]
fn session_of_another_version_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let collection = Collection::new(&[2]);
    let settings = settings(&dir);
    SessionState {
        version: SESSION_VERSION + 1,
        track_id: collection.track(0, 0).id,
        queue: collection.album(0).track_ids(),
        ..Default::default()
    }
    .save(Path::new(&settings.session_file))
    .unwrap();

    let mut player = player(&collection, settings);
    player.restore_state();
    player.process_pending();

    assert!(player.current_track().is_none());
    assert!(player.queue().is_empty());
}

#[test]
fn missing_session_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let collection = Collection::new(&[2]);

    let mut player = player(&collection, settings(&dir));
    player.restore_state();
    player.process_pending();

    assert!(player.current_track().is_none());
}
