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

//! Audio engine.
//!
//! [`BinPlayer`] owns two playback pipelines so one can fade out while the
//! other fades in. Only one of them is active at any time; the active index
//! is swapped when a crossfade starts, not when it ends, so bus messages from
//! the pipeline being faded out can be told apart from the ones that matter.
//!
//! Fades are advanced by the player's periodic tick rather than by timers of
//! their own, which keeps all pipeline control on the event loop thread.

#[cfg(feature = "mpv")]
mod mpv;
mod silent;

#[cfg(feature = "mpv")]
pub use mpv::MpvPipeline;
pub use silent::SilentPipeline;

use std::time::Duration;

use log::{debug, warn};

use crate::{config::ReplayGain, error::PlayerError};

/// Interval at which fades are advanced.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Represents the current playback status of the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// State of a single pipeline. `Null` releases the stream entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Null,
    Paused,
    Playing,
}

/// One playback pipeline: a uri decoder feeding a replay gain chain and an
/// audio sink. Bus messages are posted to the player's channel by the
/// implementation, tagged with the pipeline index.
pub trait Pipeline {
    fn load(&mut self, uri: &str) -> Result<(), PlayerError>;
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    /// Moves the pipeline to `Null`.
    fn stop(&mut self) -> Result<(), PlayerError>;
    fn seek(&mut self, position: Duration) -> Result<(), PlayerError>;
    /// Linear volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError>;
    fn set_replay_gain(&mut self, mode: ReplayGain) -> Result<(), PlayerError>;

    fn volume(&self) -> f64;
    fn state(&self) -> PipelineState;
    fn uri(&self) -> Option<&str>;
}

#[derive(Debug, Clone)]
struct Fade {
    pipeline: usize,
    from: f64,
    to: f64,
    elapsed: Duration,
    duration: Duration,
}

impl Fade {
    fn volume(&self) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let progress = (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0);
        self.from + (self.to - self.from) * progress
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

pub struct BinPlayer {
    pipelines: [Box<dyn Pipeline>; 2],
    active: usize,
    volume: f64,
    status: PlaybackStatus,
    position: Duration,
    duration: Duration,
    fades: Vec<Fade>,
}

impl BinPlayer {
    pub fn new(pipelines: [Box<dyn Pipeline>; 2], volume: f64) -> Self {
        Self {
            pipelines,
            active: 0,
            volume: volume.clamp(0.0, 1.0),
            status: PlaybackStatus::Stopped,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            fades: Vec::new(),
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn pipeline(&self, index: usize) -> &dyn Pipeline {
        self.pipelines[index].as_ref()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn is_fading(&self) -> bool {
        !self.fades.is_empty()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_position(&mut self, position: Duration) {
        self.position = position;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Remaining time of the active stream, if its duration is known.
    pub fn remaining(&self) -> Option<Duration> {
        if self.duration.is_zero() {
            None
        } else {
            Some(self.duration.saturating_sub(self.position))
        }
    }

    /// Replaces the stream of the active pipeline and starts it.
    pub fn load(&mut self, uri: &str) -> Result<(), PlayerError> {
        self.finish_fades()?;

        let active = &mut self.pipelines[self.active];
        active.set_volume(self.volume)?;
        active.load(uri)?;
        active.play()?;

        self.reset_clock();
        self.status = PlaybackStatus::Playing;
        Ok(())
    }

    /// Starts `uri` on the idle pipeline while the active one fades out.
    ///
    /// The idle pipeline becomes the active one immediately.
    pub fn crossfade(&mut self, uri: &str, duration: Duration) -> Result<(), PlayerError> {
        self.finish_fades()?;

        let previous = self.active;
        let next = 1 - previous;
        debug!("Crossfading pipeline {} -> {} over {:?}", previous, next, duration);

        self.active = next;
        let incoming = &mut self.pipelines[next];
        incoming.set_volume(0.0)?;
        incoming.load(uri)?;
        incoming.play()?;

        let outgoing_volume = self.pipelines[previous].volume();
        self.fades = vec![
            Fade {
                pipeline: previous,
                from: outgoing_volume,
                to: 0.0,
                elapsed: Duration::ZERO,
                duration,
            },
            Fade {
                pipeline: next,
                from: 0.0,
                to: self.volume,
                elapsed: Duration::ZERO,
                duration,
            },
        ];

        self.reset_clock();
        self.status = PlaybackStatus::Playing;
        Ok(())
    }

    /// Advances running fades by `step`. Pipelines faded out to silence are
    /// moved to `Null`.
    pub fn tick(&mut self, step: Duration) -> Result<(), PlayerError> {
        if self.fades.is_empty() {
            return Ok(());
        }

        for fade in self.fades.iter_mut() {
            fade.elapsed += step;
            self.pipelines[fade.pipeline].set_volume(fade.volume())?;
        }

        let (done, running): (Vec<Fade>, Vec<Fade>) =
            self.fades.drain(..).partition(|fade| fade.is_done());
        self.fades = running;

        for fade in done {
            if fade.pipeline != self.active {
                self.pipelines[fade.pipeline].stop()?;
            }
        }

        Ok(())
    }

    /// Jumps every fade to its end state.
    fn finish_fades(&mut self) -> Result<(), PlayerError> {
        for fade in std::mem::take(&mut self.fades) {
            let pipeline = &mut self.pipelines[fade.pipeline];
            if fade.pipeline == self.active {
                pipeline.set_volume(self.volume)?;
            } else {
                pipeline.set_volume(0.0)?;
                pipeline.stop()?;
            }
        }

        Ok(())
    }

    pub fn play(&mut self) -> Result<(), PlayerError> {
        if self.pipelines[self.active].uri().is_none() {
            return Ok(());
        }

        self.pipelines[self.active].play()?;
        self.status = PlaybackStatus::Playing;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        self.finish_fades()?;
        self.pipelines[self.active].pause()?;
        self.status = PlaybackStatus::Paused;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), PlayerError> {
        self.fades.clear();
        for pipeline in self.pipelines.iter_mut() {
            pipeline.stop()?;
        }

        self.reset_clock();
        self.status = PlaybackStatus::Stopped;
        Ok(())
    }

    pub fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.pipelines[self.active].seek(position)?;
        self.position = position;
        Ok(())
    }

    /// Sets the volume of both pipelines. Running fades pick the new level
    /// up as their target.
    pub fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        self.volume = volume.clamp(0.0, 1.0);

        if self.fades.is_empty() {
            for pipeline in self.pipelines.iter_mut() {
                pipeline.set_volume(self.volume)?;
            }
            return Ok(());
        }

        for fade in self.fades.iter_mut() {
            if fade.pipeline == self.active {
                fade.to = self.volume;
            } else {
                fade.from = fade.from.min(self.volume);
            }
        }

        Ok(())
    }

    pub fn set_replay_gain(&mut self, mode: ReplayGain) {
        for (index, pipeline) in self.pipelines.iter_mut().enumerate() {
            if let Err(e) = pipeline.set_replay_gain(mode) {
                warn!("Unable to set replay gain on pipeline {}: {}", index, e);
            }
        }
    }

    fn reset_clock(&mut self) {
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
    }
}
