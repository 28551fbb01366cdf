use bytes::Bytes;
use serde_json::json;

use crate::adapter::{SpeechAdapter, SpeechError, validate_host};

/// VOICEVOX engine client: `audio_query` then `synthesis` against the local
/// engine, returning the rendered WAV.
pub struct VoicevoxAdapter {
    client: reqwest::Client,
    host: String,
    port: u16,
    speaker: u32,
    speed: f32,
    volume: f32,
}

impl VoicevoxAdapter {
    pub fn new(host: impl Into<String>, port: u16, speaker: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into(),
            port,
            speaker,
            speed: 1.0,
            volume: 1.0,
        }
    }

    /// Returns false and keeps the previous host when the value is not a
    /// bare host name.
    pub fn set_host(&mut self, host: &str) -> bool {
        if !validate_host(host) {
            log::warn!("rejecting speech host {host:?}: not a bare host name");
            return false;
        }
        self.host = host.to_string();
        true
    }

    pub fn set_speaker(&mut self, speaker: u32) {
        self.speaker = speaker;
    }

    pub fn set_params(&mut self, speed: f32, volume: f32) {
        self.speed = speed;
        self.volume = volume;
    }

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[async_trait::async_trait]
impl SpeechAdapter for VoicevoxAdapter {
    fn id(&self) -> &str {
        "voicevox"
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError> {
        let speaker = self.speaker.to_string();

        // build the query prosody first
        let query_res = self
            .client
            .post(format!("{}/audio_query", self.base_url()))
            .query(&[("text", text), ("speaker", speaker.as_str())])
            .send()
            .await?;
        if !query_res.status().is_success() {
            return Err(SpeechError::Engine(format!(
                "audio_query failed: {}",
                query_res.status()
            )));
        }
        let mut query: serde_json::Value = query_res.json().await?;
        if let Some(object) = query.as_object_mut() {
            object.insert("speedScale".to_string(), json!(self.speed));
            object.insert("volumeScale".to_string(), json!(self.volume));
        }

        // then render it
        let synth_res = self
            .client
            .post(format!("{}/synthesis", self.base_url()))
            .query(&[("speaker", speaker.as_str())])
            .json(&query)
            .send()
            .await?;
        if !synth_res.status().is_success() {
            return Err(SpeechError::Engine(format!(
                "synthesis failed: {}",
                synth_res.status()
            )));
        }

        Ok(synth_res.bytes().await?)
    }
}
