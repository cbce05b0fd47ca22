//! Audio playback for server-rendered speech.
//!
//! A dedicated `std::thread` owns the output device for its lifetime; cpal
//! streams are not `Send` on every platform, so nothing audio-related crosses
//! a thread boundary except the encoded bytes going in and the result coming
//! back as `AppEvent::AudioFinished`.
pub mod decode;
pub mod worker;

pub use worker::spawn_audio_worker;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("audio has no playable track")]
    NoTrack,

    #[error("audio has an unknown sample rate")]
    UnknownSampleRate,

    #[error("audio output error: {0}")]
    Output(String),
}

/// Work item for the audio thread.
#[derive(Debug)]
pub enum AudioRequest {
    /// Encoded audio (MP3, WAV, ...) to decode and play to completion.
    Play(Vec<u8>),
}
