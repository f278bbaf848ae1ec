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

use std::{collections::HashSet, sync::Arc, time::Duration};

use lollypop::{
    config::{Repeat, Settings, Shuffle},
    engine::{PipelineState, PlaybackStatus},
    player::PlayerEvent,
};

use common::*;

#[test]
fn queue_takes_precedence_and_restores_next() {
    let collection = Collection::new(&[3, 1]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);

    let queued = collection.track(1, 0);
    let following = collection.track(0, 1);
    assert_eq!(next_id(&player), following.id);

    player.append_to_queue(queued.id.unwrap());
    assert_eq!(next_id(&player), queued.id);
    assert_eq!(player.queue(), &[queued.id.unwrap()]);

    finish(&mut player);
    start(&mut player);

    assert_eq!(current_id(&player), queued.id);
    assert!(player.queue().is_empty());
    assert_eq!(next_id(&player), following.id);
}

#[test]
fn clearing_the_queue_restores_next() {
    let collection = Collection::new(&[3, 2]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);

    player.append_to_queue(collection.track(1, 0).id.unwrap());
    player.append_to_queue(collection.track(1, 1).id.unwrap());
    player.clear_queue();

    assert_eq!(next_id(&player), collection.track(0, 1).id);
}

#[test]
fn repeat_all_wraps_across_albums() {
    let collection = Collection::new(&[2, 2]);
    let mut player = player(
        &collection,
        Settings {
            repeat: Repeat::All,
            ..Default::default()
        },
    );
    player.play_albums(None, &[], &[]).unwrap();

    let mut played = Vec::new();
    for _ in 0..4 {
        start(&mut player);
        played.extend(current_id(&player));
        finish(&mut player);
    }
    start(&mut player);

    let expected: Vec<i64> = [(0, 0), (0, 1), (1, 0), (1, 1)]
        .iter()
        .filter_map(|(album, track)| collection.track(*album, *track).id)
        .collect();
    assert_eq!(played, expected);
    assert_eq!(current_id(&player), collection.track(0, 0).id);
}

#[test]
fn playback_stops_at_the_end_without_repeat() {
    let collection = Collection::new(&[2]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();

    start(&mut player);
    finish(&mut player);
    start(&mut player);
    assert!(player.next_track().is_none());

    finish(&mut player);
    assert_eq!(player.status(), PlaybackStatus::Stopped);
}

#[test]
fn repeat_track_replays_the_current_track() {
    let collection = Collection::new(&[3]);
    let mut player = player(
        &collection,
        Settings {
            repeat: Repeat::Track,
            ..Default::default()
        },
    );
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);

    let first = current_id(&player);
    assert_eq!(next_id(&player), first);
    assert_eq!(prev_id(&player), first);

    finish(&mut player);
    start(&mut player);
    assert_eq!(current_id(&player), first);
}

#[test]
fn shuffle_plays_every_track_once() {
    let collection = Collection::new(&[3, 2]);
    let mut player = player(
        &collection,
        Settings {
            shuffle: Shuffle::Tracks,
            ..Default::default()
        },
    );
    player.play_albums(None, &[], &[]).unwrap();

    let mut played = Vec::new();
    for _ in 0..10 {
        start(&mut player);
        played.extend(current_id(&player));
        finish(&mut player);
        if player.status() == PlaybackStatus::Stopped {
            break;
        }
    }

    let expected: HashSet<i64> = (0..2)
        .flat_map(|album| collection.album(album).track_ids())
        .collect();
    assert_eq!(played.len(), 5);
    assert_eq!(played.iter().copied().collect::<HashSet<_>>(), expected);
}

#[test]
fn prev_walks_the_shuffle_history_back() {
    let collection = Collection::new(&[5]);
    let mut player = player(
        &collection,
        Settings {
            shuffle: Shuffle::Tracks,
            ..Default::default()
        },
    );
    player.play_albums(None, &[], &[]).unwrap();

    let mut played = Vec::new();
    for step in 0..3 {
        if step > 0 {
            finish(&mut player);
        }
        start(&mut player);
        played.extend(current_id(&player));
    }
    assert_eq!(prev_id(&player), Some(played[1]));

    player.prev();
    start(&mut player);
    assert_eq!(current_id(&player), Some(played[1]));
    assert_eq!(prev_id(&player), Some(played[0]));

    player.prev();
    start(&mut player);
    assert_eq!(current_id(&player), Some(played[0]));
    assert_eq!(next_id(&player), Some(played[1]));
    assert_eq!(player.shuffle_history().len(), 3);
}

#[test]
fn prev_restarts_a_track_played_for_a_while() {
    let collection = Collection::new(&[3]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);
    finish(&mut player);
    start(&mut player);

    let current = current_id(&player);
    advance(&mut player, Duration::from_secs(30), Duration::from_secs(200));
    player.prev();

    assert_eq!(current_id(&player), current);
    assert_eq!(player.position(), Duration::ZERO);
}

fn smooth_settings() -> Settings {
    Settings {
        smooth_transitions: true,
        transition_duration_ms: 1000,
        ..Default::default()
    }
}

#[test]
fn skipping_crossfades_to_the_idle_pipeline() {
    let collection = Collection::new(&[3]);
    let mut player = player(&collection, smooth_settings());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);
    assert_eq!(player.bin().active(), 0);

    player.next();
    assert_eq!(player.bin().active(), 1);
    assert_eq!(current_id(&player), collection.track(0, 1).id);
    assert!(player.bin().is_fading());

    for _ in 0..4 {
        player.handle_event(PlayerEvent::Tick);
    }

    let bin = player.bin();
    assert!(!bin.is_fading());
    assert_eq!(bin.pipeline(0).state(), PipelineState::Null);
    assert_eq!(bin.pipeline(0).volume(), 0.0);
    assert_eq!(bin.pipeline(1).state(), PipelineState::Playing);
    assert_eq!(bin.pipeline(1).volume(), 1.0);
}

#[test]
fn transition_starts_before_the_end_of_the_track() {
    let collection = Collection::new(&[3]);
    let mut player = player(&collection, smooth_settings());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);

    advance(&mut player, Duration::from_secs(150), Duration::from_secs(200));
    player.handle_event(PlayerEvent::Tick);
    assert_eq!(player.bin().active(), 0);

    advance(
        &mut player,
        Duration::from_millis(199_500),
        Duration::from_secs(200),
    );
    player.handle_event(PlayerEvent::Tick);

    assert_eq!(player.bin().active(), 1);
    assert_eq!(current_id(&player), collection.track(0, 1).id);
}

#[test]
fn events_of_the_faded_pipeline_are_ignored() {
    let collection = Collection::new(&[3]);
    let mut player = player(&collection, smooth_settings());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);
    player.next();

    player.handle_event(PlayerEvent::Stream {
        pipeline: 0,
        event: lollypop::player::StreamEvent::Eos,
    });

    assert_eq!(current_id(&player), collection.track(0, 1).id);
    assert_eq!(player.status(), PlaybackStatus::Playing);
}

#[test]
fn popularity_favours_short_albums() {
    let collection = Collection::new(&[1, 4]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();

    start(&mut player);
    finish(&mut player);
    start(&mut player);
    finish(&mut player);

    let library = &collection.library;
    assert_eq!(library.album_popularity(collection.album_ids[0]).unwrap(), 4);
    assert_eq!(library.album_popularity(collection.album_ids[1]).unwrap(), 1);
}

#[test]
fn party_mode_starts_and_narrows_on_exit() {
    let collection = Collection::new(&[2, 3, 1]);
    let mut player = player(&collection, Settings::default());

    player.set_party(true);
    assert!(player.is_party());
    assert_eq!(player.albums().len(), 3);
    assert_eq!(player.status(), PlaybackStatus::Playing);
    start(&mut player);

    let album_id = player.current_track().and_then(|t| t.album_id);
    assert!(album_id.is_some());

    player.set_party(false);
    assert!(!player.is_party());
    assert_eq!(player.albums().len(), 1);
    assert_eq!(Some(player.albums()[0].id), album_id);
}

#[test]
fn stop_after_stops_once() {
    let collection = Collection::new(&[3]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);

    player.set_stop_after(current_id(&player));
    assert!(player.next_track().is_none());

    finish(&mut player);
    assert_eq!(player.status(), PlaybackStatus::Stopped);
    assert_eq!(player.state().stop_after, None);
    assert_eq!(next_id(&player), collection.track(0, 1).id);
}

fn auto_player(collection: &Collection) -> lollypop::player::Player {
    player_with(
        collection,
        Settings {
            repeat: Repeat::Auto,
            ..Default::default()
        },
        vec![Arc::new(FixedSimilars(vec![
            "Nobody".to_string(),
            "Artist 1".to_string(),
        ]))],
    )
}

#[test]
fn similar_artists_extend_playback() {
    let collection = Collection::new(&[2, 1]);
    let mut player = auto_player(&collection);
    player.play_album(collection.album(0));
    start(&mut player);
    finish(&mut player);
    start(&mut player);
    assert!(player.next_track().is_none());

    player.process_pending();

    assert_eq!(player.albums().len(), 2);
    assert_eq!(player.albums()[1].id, collection.album_ids[1]);
    assert_eq!(next_id(&player), collection.track(1, 0).id);
}

#[test]
fn stop_after_suppresses_similar_artists() {
    let collection = Collection::new(&[2, 1]);
    let mut player = auto_player(&collection);
    player.play_album(collection.album(0));
    start(&mut player);
    finish(&mut player);

    player.set_stop_after(collection.track(0, 1).id);
    start(&mut player);
    player.process_pending();

    assert_eq!(player.albums().len(), 1);
    assert!(player.next_track().is_none());
}

#[test]
fn party_mix_setting_starts_playback_on_request() {
    let collection = Collection::new(&[2, 2]);
    let mut player = player(
        &collection,
        Settings {
            party_mix: true,
            ..Default::default()
        },
    );
    assert!(player.is_party());
    assert!(player.current_track().is_none());

    player.set_party(true);

    assert!(player.current_track().is_some());
    assert_eq!(player.status(), PlaybackStatus::Playing);
}

#[test]
fn play_after_stop_after_loads_the_next_track() {
    let collection = Collection::new(&[3]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);
    player.set_stop_after(current_id(&player));
    finish(&mut player);
    assert_eq!(player.status(), PlaybackStatus::Stopped);

    player.play();

    let next = collection.track(0, 1);
    assert_eq!(current_id(&player), next.id);
    let bin = player.bin();
    assert_eq!(bin.pipeline(bin.active()).uri(), Some(next.uri.as_str()));
    assert_eq!(bin.pipeline(bin.active()).state(), PipelineState::Playing);
    assert_eq!(player.status(), PlaybackStatus::Playing);
}

#[test]
fn play_after_stop_reloads_the_current_track() {
    let collection = Collection::new(&[3]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);
    advance(&mut player, Duration::from_secs(30), Duration::from_secs(200));
    player.stop();

    player.play();

    assert_eq!(current_id(&player), collection.track(0, 0).id);
    assert_eq!(player.status(), PlaybackStatus::Playing);
}

#[test]
fn added_snapshots_of_one_album_merge() {
    let collection = Collection::new(&[3]);
    let mut player = player(&collection, Settings::default());
    let album = collection.album(0);
    let tracks = album.tracks().to_vec();

    player.add_album(album.clone_with_tracks(vec![tracks[2].clone()]));
    player.add_album(album.clone_with_tracks(vec![tracks[0].clone()]));

    assert_eq!(player.albums().len(), 1);
    assert_eq!(
        player.albums()[0].track_ids(),
        vec![tracks[0].id.unwrap(), tracks[2].id.unwrap()]
    );

    let disc = player.albums()[0].discs()[0].clone();
    player.remove_disc(&disc);
    assert!(player.albums().is_empty());
}

#[test]
fn removing_the_following_album_clears_next() {
    let collection = Collection::new(&[1, 2]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);
    assert_eq!(next_id(&player), collection.track(1, 0).id);

    player.remove_album(collection.album_ids[1]);

    assert_eq!(player.albums().len(), 1);
    assert!(player.next_track().is_none());
}

#[test]
fn skip_album_wraps_to_the_first_album() {
    let collection = Collection::new(&[2, 2, 2]);
    let mut player = player(&collection, Settings::default());
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);

    for album in [1, 2, 0] {
        player.skip_album();
        start(&mut player);
        assert_eq!(current_id(&player), collection.track(album, 0).id);
    }
}

#[test]
fn skip_album_lets_shuffle_pick_when_tracks_are_shuffled() {
    let collection = Collection::new(&[3, 3]);
    let mut player = player(
        &collection,
        Settings {
            shuffle: Shuffle::Tracks,
            ..Default::default()
        },
    );
    player.play_albums(None, &[], &[]).unwrap();
    start(&mut player);
    let first = current_id(&player);

    player.skip_album();
    start(&mut player);

    assert!(current_id(&player).is_some());
    assert_ne!(current_id(&player), first);
    assert_eq!(player.shuffle_history().len(), 2);
}

#[test]
fn play_albums_starts_with_the_chosen_album() {
    let collection = Collection::new(&[2, 2, 2]);
    let mut player = player(&collection, Settings::default());

    player
        .play_albums(Some(collection.album_ids[1]), &[], &[])
        .unwrap();
    start(&mut player);

    assert_eq!(current_id(&player), collection.track(1, 0).id);
    let order: Vec<i64> = player.albums().iter().map(|a| a.id).collect();
    assert_eq!(order, collection.album_ids);
}

#[test]
fn shuffled_albums_put_the_chosen_album_first() {
    let collection = Collection::new(&[2, 2, 2, 2]);
    let mut player = player(
        &collection,
        Settings {
            shuffle: Shuffle::Albums,
            ..Default::default()
        },
    );
    let chosen = collection.album_ids[2];

    player.play_albums(Some(chosen), &[], &[]).unwrap();
    start(&mut player);

    assert_eq!(player.albums()[0].id, chosen);
    assert_eq!(player.albums().len(), 4);
    assert_eq!(current_id(&player), collection.track(2, 0).id);
}

#[test]
fn playlist_edits_recompute_neighbours() {
    let collection = Collection::new(&[4]);
    let mut player = player(&collection, Settings::default());
    let tracks = collection.album(0).tracks().to_vec();
    player.populate_playlist_by_tracks(
        vec![tracks[0].clone(), tracks[1].clone(), tracks[2].clone()],
        vec![],
        Some(tracks[1].clone()),
    );
    start(&mut player);
    assert_eq!(next_id(&player), tracks[2].id);
    assert_eq!(prev_id(&player), tracks[0].id);

    player.insert_track(tracks[3].clone(), 2);
    assert_eq!(next_id(&player), tracks[3].id);

    player.remove_track(tracks[0].id.unwrap());
    assert!(player.prev_track().is_none());
    assert_eq!(next_id(&player), tracks[3].id);
}
