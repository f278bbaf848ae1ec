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

//! MPV-backed playback pipeline.
//!
//! Every pipeline drives its own `libmpv` context from a dedicated worker
//! thread. The worker uses a dual-channel pattern:
//!
//! 1. **Command Channel**: receives [`PipelineCommand`]s from the engine.
//! 2. **Event Channel**: posts [`StreamEvent`]s, tagged with the pipeline
//!    index, onto the player's event channel.
//!
//! The handle kept on the event loop side mirrors the state it asked for, so
//! state and volume queries never wait on the worker.

use std::{
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use log::{debug, error};
use mpv::Format;

use crate::{
    config::ReplayGain,
    engine::{Pipeline, PipelineState},
    error::PlayerError,
    player::{PlayerEvent, StreamEvent},
};

/// How long before the end of a stream `AboutToFinish` is posted.
const ABOUT_TO_FINISH: f64 = 2.0;

#[derive(Debug)]
enum PipelineCommand {
    Load(String),
    Play,
    Pause,
    Stop,
    Seek(f64),
    Volume(f64),
    ReplayGain(&'static str),
}

pub struct MpvPipeline {
    index: usize,
    command_tx: Sender<PipelineCommand>,
    uri: Option<String>,
    state: PipelineState,
    volume: f64,
}

impl MpvPipeline {
    /// Spawns the worker thread for pipeline `index`.
    ///
    /// # Arguments
    ///
    /// * `index` - The pipeline slot, echoed back in every stream event.
    /// * `event_tx` - The player's event channel.
    pub fn new(index: usize, event_tx: Sender<PlayerEvent>) -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        spawn_pipeline_worker(index, command_rx, event_tx);

        Self {
            index,
            command_tx,
            uri: None,
            state: PipelineState::Null,
            volume: 1.0,
        }
    }

    fn send(&self, command: PipelineCommand) -> Result<(), PlayerError> {
        self.command_tx
            .send(command)
            .map_err(|e| PlayerError::Pipeline(self.index, e.to_string()))
    }
}

impl Pipeline for MpvPipeline {
    fn load(&mut self, uri: &str) -> Result<(), PlayerError> {
        self.send(PipelineCommand::Load(uri.to_string()))?;
        self.uri = Some(uri.to_string());
        self.state = PipelineState::Paused;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        // mpv unloads the file on stop
        if let (PipelineState::Null, Some(uri)) = (self.state, self.uri.clone()) {
            self.send(PipelineCommand::Load(uri))?;
        }
        self.send(PipelineCommand::Play)?;
        self.state = PipelineState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.send(PipelineCommand::Pause)?;
        self.state = PipelineState::Paused;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        self.send(PipelineCommand::Stop)?;
        self.state = PipelineState::Null;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.send(PipelineCommand::Seek(position.as_secs_f64()))
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        self.send(PipelineCommand::Volume(volume * 100.0))?;
        self.volume = volume;
        Ok(())
    }

    fn set_replay_gain(&mut self, mode: ReplayGain) -> Result<(), PlayerError> {
        let value = match mode {
            ReplayGain::Off => "no",
            ReplayGain::Track => "track",
            ReplayGain::Album => "album",
        };
        self.send(PipelineCommand::ReplayGain(value))
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

/// Spawns the worker thread owning the MPV context.
///
/// If the worker fails, the failure is posted as a stream error so the player
/// stops cleanly instead of waiting for a stream that will never start.
fn spawn_pipeline_worker(
    index: usize,
    command_rx: Receiver<PipelineCommand>,
    event_tx: Sender<PlayerEvent>,
) {
    let error_tx = event_tx.clone();

    thread::spawn(move || {
        if let Err(e) = pipeline_worker(index, command_rx, event_tx) {
            error!("Pipeline {} worker failure: {:?}", index, e);
            let _ = error_tx.send(PlayerEvent::Stream {
                pipeline: index,
                event: StreamEvent::Error(format!("MPV worker failure: {:#}", e)),
            });
        }
    });
}

/// Per-stream bookkeeping used to derive `AboutToFinish`.
#[derive(Default)]
struct StreamClock {
    duration: f64,
    about_to_finish_sent: bool,
}

fn pipeline_worker(
    index: usize,
    command_rx: Receiver<PipelineCommand>,
    event_tx: Sender<PlayerEvent>,
) -> Result<()> {
    let mut handler = (|| {
        let mut builder = mpv::MpvHandlerBuilder::new().context("Failed to create MPV builder")?;
        builder
            .set_option("vo", "null")
            .context("Failed to set no video output")?;
        builder
            .set_option("audio-display", "no")
            .context("Failed to disable cover display")?;
        builder.build().context("Failed to build MPV handler")
    })()?;

    handler
        .observe_property::<f64>("duration", 0)
        .context("Failed to observe duration")?;
    handler
        .observe_property::<f64>("time-pos", 0)
        .context("Failed to observe time-pos")?;

    let mut clock = StreamClock::default();

    loop {
        if !process_commands(&mut handler, &command_rx, &mut clock)? {
            debug!("Pipeline {} handle dropped, stopping worker", index);
            return Ok(());
        }
        process_mpv_events(&mut handler, index, &mut clock, &event_tx)?;
    }
}

/// Drains and executes all pending commands.
///
/// Returns `false` once the engine side of the channel is gone.
fn process_commands(
    handler: &mut mpv::MpvHandler,
    command_rx: &Receiver<PipelineCommand>,
    clock: &mut StreamClock,
) -> Result<bool> {
    loop {
        let command = match command_rx.try_recv() {
            Ok(command) => command,
            Err(TryRecvError::Empty) => return Ok(true),
            Err(TryRecvError::Disconnected) => return Ok(false),
        };

        match command {
            PipelineCommand::Load(uri) => {
                *clock = StreamClock::default();
                handler.set_property("pause", true)?;
                handler
                    .command(&["loadfile", &uri, "replace"])
                    .context(format!("Failed to load: {}", &uri))?;
            }
            PipelineCommand::Play => handler.set_property("pause", false)?,
            PipelineCommand::Pause => handler.set_property("pause", true)?,
            PipelineCommand::Stop => {
                *clock = StreamClock::default();
                handler.command(&["stop"])?;
            }
            PipelineCommand::Seek(seconds) => {
                handler.command(&["seek", &seconds.to_string(), "absolute"])?;
            }
            PipelineCommand::Volume(volume) => handler.set_property("volume", volume)?,
            PipelineCommand::ReplayGain(mode) => handler.set_property("replaygain", mode)?,
        }
    }
}

/// Stream events derived from an observed property. Negative and non-finite
/// values are dropped.
fn property_events(name: &str, value: f64, clock: &mut StreamClock) -> Vec<StreamEvent> {
    let Ok(time) = Duration::try_from_secs_f64(value) else {
        return vec![];
    };

    let mut events = Vec::new();
    match name {
        "duration" => {
            clock.duration = value;
            events.push(StreamEvent::Duration(time));
        }
        "time-pos" => {
            events.push(StreamEvent::Position(time));
            if clock.duration > 0.0
                && !clock.about_to_finish_sent
                && value >= clock.duration - ABOUT_TO_FINISH
            {
                clock.about_to_finish_sent = true;
                events.push(StreamEvent::AboutToFinish);
            }
        }
        _ => {}
    }
    events
}

/// Waits up to 50ms for an MPV event and translates it into a stream event.
fn process_mpv_events(
    handler: &mut mpv::MpvHandler,
    index: usize,
    clock: &mut StreamClock,
    event_tx: &Sender<PlayerEvent>,
) -> Result<()> {
    let Some(mpv_event) = handler.wait_event(0.05) else {
        return Ok(());
    };

    let mut events = Vec::new();
    match mpv_event {
        mpv::Event::FileLoaded => events.push(StreamEvent::Started),
        mpv::Event::PropertyChange {
            name,
            change: Format::Double(value),
            ..
        } => events = property_events(name, value, clock),
        mpv::Event::EndFile(result) => match result {
            Ok(mpv::EndFileReason::MPV_END_FILE_REASON_EOF) => events.push(StreamEvent::Eos),
            Ok(_) => {}
            Err(e) => {
                let message = format!("{:?}", e);
                if message.contains("UNKNOWN_FORMAT") {
                    events.push(StreamEvent::MissingPlugin(message));
                } else {
                    events.push(StreamEvent::Error(message));
                }
            }
        },
        _ => {}
    }

    for event in events {
        event_tx
            .send(PlayerEvent::Stream {
                pipeline: index,
                event,
            })
            .context("Failed to send stream event")?;
    }

    Ok(())
}
