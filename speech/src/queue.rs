use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::adapter::SpeechAdapter;

/// Queued utterances beyond this are silently dropped, bounding memory when
/// speech production outpaces playback.
pub const MAX_QUEUE: usize = 30;

/// Performs one utterance end to end: synthesize, play, drive lip-sync.
/// Exactly one runs at a time; the next starts only after it returns.
#[async_trait::async_trait]
pub trait PlaybackBackend: Send + 'static {
    async fn speak(&mut self, adapter: &dyn SpeechAdapter, text: &str) -> anyhow::Result<()>;
}

enum QueueCommand {
    Speak(String),
    SetAdapter(Option<Arc<dyn SpeechAdapter>>),
    Clear,
}

/// Serializes utterances through one playback at a time. Items accumulate
/// while no adapter is set; a failing item is logged and the queue advances.
#[derive(Clone)]
pub struct SpeechQueue {
    tx: mpsc::UnboundedSender<QueueCommand>,
}

impl SpeechQueue {
    pub fn spawn(backend: impl PlaybackBackend) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx, backend));
        Self { tx }
    }

    /// Queue one utterance. A full queue drops it silently.
    pub fn enqueue(&self, text: &str) {
        let _ = self.tx.send(QueueCommand::Speak(text.to_string()));
    }

    pub fn set_adapter(&self, adapter: Option<Arc<dyn SpeechAdapter>>) {
        let _ = self.tx.send(QueueCommand::SetAdapter(adapter));
    }

    /// Discard everything not yet started. An in-flight playback finishes
    /// undisturbed, but nothing queued after it will run.
    pub fn clear(&self) {
        let _ = self.tx.send(QueueCommand::Clear);
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<QueueCommand>, mut backend: impl PlaybackBackend) {
    let mut items: VecDeque<String> = VecDeque::new();
    let mut adapter: Option<Arc<dyn SpeechAdapter>> = None;

    loop {
        // take everything that arrived, including during the last playback
        while let Ok(command) = rx.try_recv() {
            apply(command, &mut items, &mut adapter);
        }

        let job = match (&adapter, items.pop_front()) {
            (Some(adapter), Some(text)) => Some((adapter.clone(), text)),
            (None, Some(text)) => {
                // no adapter yet, keep accumulating
                items.push_front(text);
                None
            }
            (_, None) => None,
        };

        match job {
            Some((adapter, text)) => {
                if let Err(err) = backend.speak(adapter.as_ref(), &text).await {
                    // one bad utterance never stalls the queue
                    log::warn!("speech playback failed: {err}");
                }
            }
            None => match rx.recv().await {
                Some(command) => apply(command, &mut items, &mut adapter),
                None => break,
            },
        }
    }
}

fn apply(
    command: QueueCommand,
    items: &mut VecDeque<String>,
    adapter: &mut Option<Arc<dyn SpeechAdapter>>,
) {
    match command {
        QueueCommand::Speak(text) => {
            if items.len() < MAX_QUEUE {
                items.push_back(text);
            }
        }
        QueueCommand::SetAdapter(new_adapter) => {
            *adapter = new_adapter;
        }
        QueueCommand::Clear => {
            items.clear();
        }
    }
}
