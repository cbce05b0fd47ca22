//! Background thread that owns the audio output device.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use super::decode::{decode_audio, DecodedAudio};
use super::{AudioError, AudioRequest};
use crate::event::AppEvent;

/// Starts the audio thread and returns the channel that feeds it.
///
/// Clips are played one after another in arrival order. The thread exits
/// once every sender is dropped.
pub fn spawn_audio_worker(event_tx: UnboundedSender<AppEvent>) -> Sender<AudioRequest> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let spawned = std::thread::Builder::new()
        .name("linguachat-audio".to_owned())
        .spawn(move || audio_worker_loop(rx, event_tx));
    if let Err(e) = spawned {
        error!("failed to start audio thread, speech playback disabled: {e}");
    }
    tx
}

fn audio_worker_loop(rx: Receiver<AudioRequest>, event_tx: UnboundedSender<AppEvent>) {
    for request in rx {
        let result = match request {
            AudioRequest::Play(bytes) => decode_audio(bytes).and_then(|audio| play(&audio)),
        };
        if let Err(ref e) = result {
            error!("audio playback failed: {e}");
        }
        let _ = event_tx.send(AppEvent::AudioFinished(result));
    }
    debug!("audio worker stopped");
}

struct PlaybackBuffer {
    samples: Vec<f32>,
    position: usize,
    finished: bool,
}

/// Plays `audio` on the default output device, blocking until it ends.
fn play(audio: &DecodedAudio) -> Result<(), AudioError> {
    if audio.samples.is_empty() {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Output("no default output device".into()))?;
    let device_name = device
        .description()
        .map(|d| d.name().to_owned())
        .unwrap_or_else(|_| "<unknown>".into());
    info!(
        device = %device_name,
        sample_rate = audio.sample_rate,
        channels = audio.channels,
        "playing speech audio"
    );

    let stream_config = StreamConfig {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let buffer = Arc::new(Mutex::new(PlaybackBuffer {
        samples: audio.samples.clone(),
        position: 0,
        finished: false,
    }));
    let buffer_clone = Arc::clone(&buffer);

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let Ok(mut buf) = buffer_clone.lock() else {
                    return;
                };
                for sample in data.iter_mut() {
                    if buf.position < buf.samples.len() {
                        *sample = buf.samples[buf.position];
                        buf.position += 1;
                    } else {
                        *sample = 0.0;
                        buf.finished = true;
                    }
                }
            },
            move |err| {
                error!("audio output stream error: {err}");
            },
            None,
        )
        .map_err(|e| AudioError::Output(format!("failed to build output stream: {e}")))?;

    stream
        .play()
        .map_err(|e| AudioError::Output(format!("failed to start output stream: {e}")))?;

    loop {
        std::thread::sleep(Duration::from_millis(10));
        let buf = buffer
            .lock()
            .map_err(|e| AudioError::Output(format!("playback buffer lock poisoned: {e}")))?;
        if buf.finished {
            break;
        }
    }

    drop(stream);
    Ok(())
}
