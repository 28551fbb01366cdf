use bytes::Bytes;

#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error("Failed to send request {0}")]
    Request(#[from] reqwest::Error),
    #[error("Engine rejected the request: {0}")]
    Engine(String),
}

/// A text-to-speech engine. Adapters synthesize text into an audio clip;
/// playback and lip-sync happen on our side.
#[async_trait::async_trait]
pub trait SpeechAdapter: Send + Sync {
    fn id(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError>;
}

/// A host setting must be a bare host name. Anything smuggling a scheme,
/// path, query, fragment or credentials is refused so a hostile settings
/// update cannot redirect synthesis requests (SSRF).
pub fn validate_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
