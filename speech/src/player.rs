use std::io::{BufReader, Cursor};
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::Source;
use tokio::sync::watch;

use crate::adapter::SpeechAdapter;
use crate::envelope::{Envelope, EnvelopeTap};
use crate::lipsync::{LipSync, LipSyncConfig};
use crate::queue::PlaybackBackend;

/// Frame cadence for lip-sync updates while a clip plays.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Real playback: synthesize, decode, play through an envelope tap, and
/// drive a fresh lip-sync instance per utterance, publishing its level on a
/// watch channel.
pub struct AudioPlayer {
    mixer: Mixer,
    lip_tx: watch::Sender<u8>,
    config: LipSyncConfig,
}

impl AudioPlayer {
    pub fn new(mixer: Mixer, lip_tx: watch::Sender<u8>, config: LipSyncConfig) -> Self {
        Self {
            mixer,
            lip_tx,
            config,
        }
    }
}

#[async_trait::async_trait]
impl PlaybackBackend for AudioPlayer {
    async fn speak(&mut self, adapter: &dyn SpeechAdapter, text: &str) -> anyhow::Result<()> {
        let audio = adapter.synthesize(text).await?;

        // decode once for the duration, once for playback
        let total = {
            let reader = BufReader::new(Cursor::new(audio.clone()));
            rodio::Decoder::new(reader)
                .ok()
                .and_then(|source| source.total_duration())
        };

        let envelope = Envelope::new();
        {
            let reader = BufReader::new(Cursor::new(audio));
            let source = rodio::Decoder::new(reader)?;
            self.mixer.add(EnvelopeTap::new(source, envelope.clone()));
        }

        let mut lipsync = LipSync::new(self.config);
        let duration = total.unwrap_or(Duration::from_secs(3));
        let deadline = tokio::time::Instant::now() + duration;
        let mut frames = tokio::time::interval(FRAME_INTERVAL);

        while tokio::time::Instant::now() < deadline {
            frames.tick().await;
            let level = lipsync.update(envelope.rms());
            let _ = self.lip_tx.send(level);
        }

        // per-utterance teardown
        lipsync.reset();
        let _ = self.lip_tx.send(0);
        Ok(())
    }
}
