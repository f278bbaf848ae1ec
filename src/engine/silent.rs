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

//! A pipeline that produces no audio.
//!
//! It keeps the state a real pipeline would report, which makes it usable
//! for headless dry runs. When created with [`SilentPipeline::simulating`]
//! every started stream immediately reports its start and its end, so the
//! player walks its whole play order.

use std::{sync::mpsc::Sender, time::Duration};

use crate::{
    config::ReplayGain,
    engine::{Pipeline, PipelineState},
    error::PlayerError,
    player::{PlayerEvent, StreamEvent},
};

#[derive(Default)]
pub struct SilentPipeline {
    uri: Option<String>,
    state: PipelineState,
    volume: f64,
    position: Duration,
    replay_gain: ReplayGain,
    simulate: Option<(usize, Sender<PlayerEvent>)>,
}

impl SilentPipeline {
    pub fn new() -> Self {
        Self {
            volume: 1.0,
            ..Default::default()
        }
    }

    pub fn simulating(index: usize, event_tx: Sender<PlayerEvent>) -> Self {
        Self {
            simulate: Some((index, event_tx)),
            ..Self::new()
        }
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn replay_gain(&self) -> ReplayGain {
        self.replay_gain
    }

    fn post(&self, event: StreamEvent) {
        if let Some((pipeline, event_tx)) = &self.simulate {
            let _ = event_tx.send(PlayerEvent::Stream {
                pipeline: *pipeline,
                event,
            });
        }
    }
}

impl Pipeline for SilentPipeline {
    fn load(&mut self, uri: &str) -> Result<(), PlayerError> {
        self.uri = Some(uri.to_string());
        self.state = PipelineState::Paused;
        self.position = Duration::ZERO;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let starting = self.state != PipelineState::Playing;
        self.state = PipelineState::Playing;

        if starting && self.position.is_zero() {
            self.post(StreamEvent::Started);
            self.post(StreamEvent::Eos);
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.state = PipelineState::Paused;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        self.state = PipelineState::Null;
        self.position = Duration::ZERO;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.position = position;
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        self.volume = volume;
        Ok(())
    }

    fn set_replay_gain(&mut self, mode: ReplayGain) -> Result<(), PlayerError> {
        self.replay_gain = mode;
        Ok(())
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn state(&self) -> PipelineState {
        self.state
    }

    fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}
