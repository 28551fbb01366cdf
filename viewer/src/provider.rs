use overlay_server::{
    ChatProvider, ConnectionState, ProviderEvent, ProviderFactory, ProviderOptions,
};
use tokio::sync::mpsc;

/// Placeholder upstream: reports connected and stays silent until a real
/// chat source is plugged in. Comments injected over `POST /comments/add`
/// reach overlays through the hub directly.
pub struct IdleProvider {
    stream_id: String,
    live: Option<mpsc::Sender<ProviderEvent>>,
}

#[async_trait::async_trait]
impl ChatProvider for IdleProvider {
    async fn connect(&mut self) -> mpsc::Receiver<ProviderEvent> {
        let (tx, rx) = mpsc::channel(16);
        let _ = tx
            .send(ProviderEvent::StateChange(ConnectionState::Connected))
            .await;
        log::info!("idle chat provider attached to stream {}", self.stream_id);
        self.live = Some(tx);
        rx
    }

    fn disconnect(&mut self) {
        // dropping the sender ends the stream
        self.live = None;
    }
}

pub fn idle_provider_factory() -> ProviderFactory {
    Box::new(|options: ProviderOptions| {
        Box::new(IdleProvider {
            stream_id: options.stream_id,
            live: None,
        })
    })
}
