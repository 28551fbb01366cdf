use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::event::{BroadcastEvent, EventKind, clear_message};
use crate::history::HistoryBuffer;

/// Delivery failed because the peer is gone; the hub drops the client.
#[derive(thiserror::Error, Debug)]
#[error("client is closed")]
pub struct ClientClosed;

/// One connected overlay client. The production sink wraps an actix-ws
/// session; tests use channel-backed sinks.
#[async_trait::async_trait]
pub trait ClientSink: Send {
    async fn send(&mut self, message: String) -> Result<(), ClientClosed>;
    async fn close(&mut self);
}

enum HubCommand {
    Broadcast { kind: EventKind, payload: Value },
    Register { client: Box<dyn ClientSink> },
    Clear,
    Shutdown { done: oneshot::Sender<()> },
}

/// Handle to the hub task. Cheap to clone; all operations enqueue onto the
/// hub's command channel, which serializes history mutation and fan-out.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Append to history and fan out to every connected client. Never fails,
    /// zero connected clients included.
    pub async fn broadcast(&self, kind: EventKind, payload: Value) {
        let _ = self.tx.send(HubCommand::Broadcast { kind, payload }).await;
    }

    /// Add a client. The full history replays to it before it joins the live
    /// list, so no later broadcast can interleave with the replay.
    pub async fn register(&self, client: Box<dyn ClientSink>) {
        let _ = self.tx.send(HubCommand::Register { client }).await;
    }

    /// Empty the history and tell every overlay to wipe its local state.
    pub async fn clear_history(&self) {
        let _ = self.tx.send(HubCommand::Clear).await;
    }

    /// Close every client session and stop the hub task, awaiting completion.
    pub async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self.tx.send(HubCommand::Shutdown { done }).await.is_ok() {
            let _ = finished.await;
        }
    }
}

pub fn spawn_hub(buffer: usize) -> (HubHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(buffer);
    let task = tokio::spawn(run_hub(rx));
    (HubHandle { tx }, task)
}

async fn run_hub(mut rx: mpsc::Receiver<HubCommand>) {
    let mut history = HistoryBuffer::default();
    let mut clients: Vec<Box<dyn ClientSink>> = Vec::new();

    while let Some(command) = rx.recv().await {
        match command {
            HubCommand::Broadcast { kind, payload } => {
                let event = BroadcastEvent::new(kind, payload);
                let message = event.to_message(false);
                history.push(event);
                deliver(&mut clients, &message).await;
            }
            HubCommand::Register { mut client } => {
                let mut open = true;
                for entry in history.iter() {
                    if client.send(entry.to_message(true)).await.is_err() {
                        open = false;
                        break;
                    }
                }
                if open {
                    clients.push(client);
                }
            }
            HubCommand::Clear => {
                history.clear();
                deliver(&mut clients, &clear_message()).await;
            }
            HubCommand::Shutdown { done } => {
                for mut client in clients.drain(..) {
                    client.close().await;
                }
                let _ = done.send(());
                break;
            }
        }
    }
}

// A client whose socket closed between being listed and being sent to is
// skipped and dropped; the rest of the broadcast proceeds.
async fn deliver(clients: &mut Vec<Box<dyn ClientSink>>, message: &str) {
    let mut open = Vec::with_capacity(clients.len());
    for mut client in clients.drain(..) {
        if client.send(message.to_string()).await.is_ok() {
            open.push(client);
        }
    }
    *clients = open;
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    use crate::event::EventKind;
    use crate::history::HISTORY_MAX;
    use crate::hub::{ClientClosed, ClientSink, HubHandle, spawn_hub};

    struct TestSink {
        tx: mpsc::UnboundedSender<String>,
        closed: bool,
    }

    #[async_trait::async_trait]
    impl ClientSink for TestSink {
        async fn send(&mut self, message: String) -> Result<(), ClientClosed> {
            if self.closed {
                return Err(ClientClosed);
            }
            self.tx.send(message).map_err(|_| ClientClosed)
        }

        async fn close(&mut self) {
            self.closed = true;
        }
    }

    async fn connect_client(hub: &HubHandle) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        hub.register(Box::new(TestSink { tx, closed: false })).await;
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(serde_json::from_str(&message).unwrap());
        }
        messages
    }

    // Tests use `shutdown().await` as the flush barrier: it is ordered behind
    // every earlier command and acknowledged by the hub task.

    #[tokio::test]
    async fn fan_out_reaches_every_client_once() {
        let (hub, task) = spawn_hub(64);
        let mut clients = Vec::new();
        for _ in 0..3 {
            clients.push(connect_client(&hub).await);
        }

        hub.broadcast(EventKind::Comment, json!({"content": "x"})).await;
        hub.shutdown().await;

        for rx in &mut clients {
            let messages = drain(rx);
            assert_eq!(messages.len(), 1);
            assert_eq!(
                messages[0],
                json!({"event": "comment", "data": {"content": "x"}})
            );
        }
        task.await.unwrap();
    }

    #[tokio::test]
    async fn broadcast_with_zero_clients_does_not_fail() {
        let (hub, task) = spawn_hub(8);
        hub.broadcast(EventKind::Comment, json!({"content": "x"})).await;
        hub.shutdown().await;
        task.await.unwrap();
    }

    #[tokio::test]
    async fn late_joiner_replays_bounded_history_in_order() {
        let (hub, task) = spawn_hub(512);
        for n in 0..HISTORY_MAX + 20 {
            hub.broadcast(EventKind::Comment, json!({"content": n})).await;
        }

        let mut rx = connect_client(&hub).await;
        hub.shutdown().await;
        task.await.unwrap();

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), HISTORY_MAX, "exactly the most recent 200");
        assert_eq!(messages[0]["data"]["content"], json!(20));
        assert_eq!(
            messages[HISTORY_MAX - 1]["data"]["content"],
            json!(HISTORY_MAX + 19)
        );
        for message in &messages {
            assert_eq!(message["data"]["isHistory"], json!(true));
        }
    }

    #[tokio::test]
    async fn replay_is_fully_enqueued_before_live_events() {
        let (hub, task) = spawn_hub(64);
        hub.broadcast(EventKind::Comment, json!({"content": "old"})).await;

        let mut rx = connect_client(&hub).await;
        hub.broadcast(EventKind::Comment, json!({"content": "new"})).await;
        hub.shutdown().await;
        task.await.unwrap();

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["data"]["content"], json!("old"));
        assert_eq!(messages[0]["data"]["isHistory"], json!(true));
        assert_eq!(messages[1]["data"]["content"], json!("new"));
        assert_eq!(messages[1]["data"].get("isHistory"), None, "live events carry no flag");
    }

    #[tokio::test]
    async fn clear_empties_history_and_signals_overlays() {
        let (hub, task) = spawn_hub(64);
        hub.broadcast(EventKind::Comment, json!({"content": "x"})).await;
        let mut before = connect_client(&hub).await;

        hub.clear_history().await;
        let mut after = connect_client(&hub).await;
        hub.shutdown().await;
        task.await.unwrap();

        let seen = drain(&mut before);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], json!({"event": "clear", "data": {}}));
        assert!(drain(&mut after).is_empty(), "history is gone after clear");
    }

    #[tokio::test]
    async fn closed_client_is_skipped_not_fatal() {
        let (hub, task) = spawn_hub(64);

        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        drop(dead_rx);
        hub.register(Box::new(TestSink { tx: dead_tx, closed: false })).await;
        let mut alive = connect_client(&hub).await;

        hub.broadcast(EventKind::Comment, json!({"content": "x"})).await;
        hub.shutdown().await;
        task.await.unwrap();

        assert_eq!(drain(&mut alive).len(), 1, "the open client still got it");
    }

    #[tokio::test]
    async fn gift_event_arrives_verbatim() {
        let (hub, task) = spawn_hub(64);
        let mut rx = connect_client(&hub).await;

        hub.broadcast(
            EventKind::Gift,
            json!({"userName": "Taro", "itemName": "Star", "point": 100}),
        )
        .await;
        hub.shutdown().await;
        task.await.unwrap();

        let messages = drain(&mut rx);
        assert_eq!(
            messages,
            [json!({
                "event": "gift",
                "data": {"userName": "Taro", "itemName": "Star", "point": 100}
            })]
        );
    }
}
