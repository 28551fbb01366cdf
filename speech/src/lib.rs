mod adapter;
mod envelope;
mod format;
mod lipsync;
mod player;
mod queue;
mod voicevox;

pub use adapter::{SpeechAdapter, SpeechError, validate_host};
pub use envelope::{Envelope, EnvelopeTap};
pub use format::{default_template, format_speech_text};
pub use lipsync::{LipSync, LipSyncConfig, LipSyncState, MAX_OPENNESS, rms};
pub use player::AudioPlayer;
pub use queue::{MAX_QUEUE, PlaybackBackend, SpeechQueue};
pub use voicevox::VoicevoxAdapter;
