use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::event::{ConnectionState, EventKind};
use crate::hub::HubHandle;

/// Typed events an upstream chat provider can emit.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    Event { kind: EventKind, payload: Value },
    StateChange(ConnectionState),
    Error(String),
    /// End of stream. Not an error; resolves to `Disconnected`.
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    pub stream_id: String,
    pub credentials: Option<String>,
}

/// One upstream connection. `connect` hands back the event channel right
/// away and never fails synchronously: failures arrive on the channel as
/// [`ProviderEvent::Error`].
#[async_trait::async_trait]
pub trait ChatProvider: Send {
    async fn connect(&mut self) -> mpsc::Receiver<ProviderEvent>;
    fn disconnect(&mut self);
}

pub type ProviderFactory = Box<dyn Fn(ProviderOptions) -> Box<dyn ChatProvider> + Send + Sync>;

/// Local consumer the relay feeds besides the hub (the speech queue).
pub trait EventSink: Send + Sync {
    fn deliver(&self, kind: EventKind, payload: &Value);
}

struct ActiveProvider {
    provider: Box<dyn ChatProvider>,
    forward: tokio::task::JoinHandle<()>,
}

/// Owns at most one provider at a time, relays its typed events to the hub
/// and the local sink, and maps its lifecycle onto [`ConnectionState`].
pub struct CommentRelay {
    factory: ProviderFactory,
    hub: HubHandle,
    sink: Option<std::sync::Arc<dyn EventSink>>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    active: Option<ActiveProvider>,
}

impl CommentRelay {
    pub fn new(
        factory: ProviderFactory,
        hub: HubHandle,
        sink: Option<std::sync::Arc<dyn EventSink>>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            factory,
            hub,
            sink,
            state_tx,
            state_rx,
            active: None,
        }
    }

    /// Observe connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Tear down any active provider, then connect a new one scoped to
    /// `stream_id`. Two providers never run concurrently.
    pub async fn connect(&mut self, stream_id: &str, credentials: Option<&str>) {
        self.teardown();
        let _ = self.state_tx.send(ConnectionState::Connecting);

        let mut provider = (self.factory)(ProviderOptions {
            stream_id: stream_id.to_string(),
            credentials: credentials.map(str::to_string),
        });
        let mut events = provider.connect().await;

        let hub = self.hub.clone();
        let sink = self.sink.clone();
        let state_tx = self.state_tx.clone();
        let forward = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ProviderEvent::Event { kind, payload } => {
                        if let Some(sink) = &sink {
                            sink.deliver(kind, &payload);
                        }
                        hub.broadcast(kind, payload).await;
                    }
                    ProviderEvent::StateChange(state) => {
                        let _ = state_tx.send(state);
                    }
                    ProviderEvent::Error(reason) => {
                        tracing::warn!("chat provider error: {reason}");
                        let _ = state_tx.send(ConnectionState::Error);
                    }
                    ProviderEvent::Closed => {
                        let _ = state_tx.send(ConnectionState::Disconnected);
                    }
                }
            }
        });

        self.active = Some(ActiveProvider { provider, forward });
    }

    /// Idempotent teardown of the active provider.
    pub fn disconnect(&mut self) {
        self.teardown();
        let _ = self.state_tx.send(ConnectionState::Disconnected);
    }

    fn teardown(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.forward.abort();
            active.provider.disconnect();
        }
    }
}

impl Drop for CommentRelay {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    use crate::event::{ConnectionState, EventKind};
    use crate::hub::{ClientClosed, ClientSink, spawn_hub};
    use crate::relay::{
        ChatProvider, CommentRelay, EventSink, ProviderEvent, ProviderFactory, ProviderOptions,
    };

    type Log = Arc<Mutex<Vec<String>>>;

    struct MockProvider {
        stream_id: String,
        log: Log,
        feed: Option<mpsc::Receiver<ProviderEvent>>,
    }

    #[async_trait::async_trait]
    impl ChatProvider for MockProvider {
        async fn connect(&mut self) -> mpsc::Receiver<ProviderEvent> {
            self.log
                .lock()
                .unwrap()
                .push(format!("connect:{}", self.stream_id));
            match self.feed.take() {
                Some(rx) => rx,
                None => mpsc::channel(1).1,
            }
        }

        fn disconnect(&mut self) {
            self.log
                .lock()
                .unwrap()
                .push(format!("disconnect:{}", self.stream_id));
        }
    }

    fn factory(log: Log, feeds: Arc<Mutex<Vec<mpsc::Receiver<ProviderEvent>>>>) -> ProviderFactory {
        Box::new(move |options: ProviderOptions| {
            let feed = feeds.lock().unwrap().pop();
            Box::new(MockProvider {
                stream_id: options.stream_id,
                log: log.clone(),
                feed,
            })
        })
    }

    struct RecordingSink {
        seen: Mutex<Vec<(EventKind, Value)>>,
    }

    impl EventSink for RecordingSink {
        fn deliver(&self, kind: EventKind, payload: &Value) {
            self.seen.lock().unwrap().push((kind, payload.clone()));
        }
    }

    struct NullSink;

    #[async_trait::async_trait]
    impl ClientSink for NullSink {
        async fn send(&mut self, _message: String) -> Result<(), ClientClosed> {
            Ok(())
        }
        async fn close(&mut self) {}
    }

    #[tokio::test]
    async fn reconnect_tears_down_the_old_provider_first() {
        let log: Log = Arc::default();
        let feeds = Arc::new(Mutex::new(Vec::new()));
        let (hub, _task) = spawn_hub(16);
        let mut relay = CommentRelay::new(factory(log.clone(), feeds), hub, None);

        relay.connect("stream-1", None).await;
        relay.connect("stream-2", None).await;

        let entries = log.lock().unwrap().clone();
        assert_eq!(
            entries,
            ["connect:stream-1", "disconnect:stream-1", "connect:stream-2"],
            "exactly one disconnect of the old provider before the new connect"
        );
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let log: Log = Arc::default();
        let feeds = Arc::new(Mutex::new(Vec::new()));
        let (hub, _task) = spawn_hub(16);
        let mut relay = CommentRelay::new(factory(log.clone(), feeds), hub, None);

        relay.disconnect();
        relay.disconnect();

        assert!(log.lock().unwrap().is_empty(), "no provider, nothing to tear down");
        assert_eq!(*relay.state().borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn relays_events_to_hub_and_sink() {
        let log: Log = Arc::default();
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let feeds = Arc::new(Mutex::new(vec![feed_rx]));
        let (hub, hub_task) = spawn_hub(16);

        let (client_tx, mut client_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        struct Fwd(tokio::sync::mpsc::UnboundedSender<String>);
        #[async_trait::async_trait]
        impl ClientSink for Fwd {
            async fn send(&mut self, message: String) -> Result<(), ClientClosed> {
                self.0.send(message).map_err(|_| ClientClosed)
            }
            async fn close(&mut self) {}
        }
        hub.register(Box::new(Fwd(client_tx))).await;

        let sink = Arc::new(RecordingSink { seen: Mutex::new(Vec::new()) });
        let mut relay = CommentRelay::new(
            factory(log, feeds),
            hub.clone(),
            Some(sink.clone()),
        );
        relay.connect("stream", None).await;

        feed_tx
            .send(ProviderEvent::Event {
                kind: EventKind::Comment,
                payload: json!({"content": "hello"}),
            })
            .await
            .unwrap();

        // recv blocks until the forward task has pushed the event through
        let message: Value = serde_json::from_str(&client_rx.recv().await.unwrap()).unwrap();
        hub.shutdown().await;
        hub_task.await.unwrap();
        assert_eq!(message["event"], json!("comment"));
        assert_eq!(message["data"]["content"], json!("hello"));

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, EventKind::Comment);
    }

    #[tokio::test]
    async fn provider_error_surfaces_as_error_state() {
        let log: Log = Arc::default();
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let feeds = Arc::new(Mutex::new(vec![feed_rx]));
        let (hub, _task) = spawn_hub(16);
        let mut relay = CommentRelay::new(factory(log, feeds), hub, None);

        let mut state = relay.state();
        relay.connect("stream", None).await;
        assert_eq!(*state.borrow_and_update(), ConnectionState::Connecting);

        feed_tx
            .send(ProviderEvent::Error("boom".to_string()))
            .await
            .unwrap();
        state.changed().await.unwrap();
        assert_eq!(*state.borrow(), ConnectionState::Error);
    }

    #[tokio::test]
    async fn stream_end_resolves_to_disconnected() {
        let log: Log = Arc::default();
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let feeds = Arc::new(Mutex::new(vec![feed_rx]));
        let (hub, _task) = spawn_hub(16);
        let mut relay = CommentRelay::new(factory(log, feeds), hub, None);

        let mut state = relay.state();
        relay.connect("stream", None).await;
        state.borrow_and_update();

        feed_tx.send(ProviderEvent::Closed).await.unwrap();
        state.changed().await.unwrap();
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn provider_state_changes_pass_through() {
        let log: Log = Arc::default();
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let feeds = Arc::new(Mutex::new(vec![feed_rx]));
        let (hub, _task) = spawn_hub(16);
        let mut relay = CommentRelay::new(factory(log, feeds), hub, None);

        let mut state = relay.state();
        relay.connect("stream", None).await;
        state.borrow_and_update();

        feed_tx
            .send(ProviderEvent::StateChange(ConnectionState::Connected))
            .await
            .unwrap();
        state.changed().await.unwrap();
        assert_eq!(*state.borrow(), ConnectionState::Connected);
    }
}
