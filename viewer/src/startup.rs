use std::{fs::File, net::TcpListener, sync::Arc};

use layer_stage::{AvatarRenderer, BlinkDriver, LayerDocument, resolve_sequence};
use overlay_server::{
    ClientClosed, ClientSink, CommentRelay, ConnectionState, EventKind, HubHandle, PluginRegistry,
    create_server, discover_plugins, spawn_hub,
};
use rodio::mixer::Mixer;
use serde_json::Value;
use speech::{
    AudioPlayer, LipSyncConfig, SpeechQueue, VoicevoxAdapter, default_template, format_speech_text,
};
use tokio::sync::{broadcast, watch};

use crate::{
    bus::UiEvent,
    config::{AppConfig, AvatarSettings},
    gui,
    provider::idle_provider_factory,
};

/// Blink and lip-sync share the window's repaint cadence.
const FRAME_RATE: f32 = 60.0;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // the output stream must outlive every playback
    let audio_stream = rodio::OutputStreamBuilder::open_default_stream()
        .map_err(|err| anyhow::anyhow!("Failed to open audio output: {err}"))?;

    let (frontend, shutdown) = start_orchestrator(config, audio_stream.mixer().clone()).await?;

    gui::run_gui(frontend).map_err(|err| anyhow::anyhow!("Gui error: {err}"))?;

    shutdown.finish().await;
    Ok(())
}

pub struct AvatarView {
    pub renderer: AvatarRenderer,
    pub blink: BlinkDriver,
    pub preview: bool,
}

pub struct FrontendHandle {
    pub ui_rx: broadcast::Receiver<UiEvent>,
    pub lip_rx: watch::Receiver<u8>,
    pub state_rx: watch::Receiver<ConnectionState>,
    pub avatar: Result<AvatarView, String>,
    pub relay: CommentRelay,
}

pub struct ShutdownHandle {
    hub: HubHandle,
    server: actix_web::dev::ServerHandle,
}

impl ShutdownHandle {
    /// Close client sockets, then stop accepting, then stop the HTTP
    /// workers, in that order.
    pub async fn finish(self) {
        self.hub.shutdown().await;
        self.server.stop(true).await;
    }
}

async fn start_orchestrator(
    config: AppConfig,
    mixer: Mixer,
) -> anyhow::Result<(FrontendHandle, ShutdownHandle)> {
    let (hub, _hub_task) = spawn_hub(1024);

    // overlay server + plugin discovery
    let registry = Arc::new(PluginRegistry::default());
    if let Some(dir) = &config.server.plugins_dir {
        let count = discover_plugins(dir, &registry);
        log::info!("discovered {count} plugins in {}", dir.display());
    }
    let listener = TcpListener::bind(&config.server.addr)?;
    log::info!("overlay server on http://{}", listener.local_addr()?);
    let server = create_server(listener, hub.clone(), registry)?;
    let server_handle = server.handle();
    tokio::spawn(server);

    // speech pipeline
    let (lip_tx, lip_rx) = watch::channel(0u8);
    let lip_config = LipSyncConfig {
        threshold: config.avatar.config.threshold,
        hold_frames: config.avatar.config.hold_frames,
        transition_frames: config.avatar.config.transition_frames,
    };
    let queue = SpeechQueue::spawn(AudioPlayer::new(mixer, lip_tx, lip_config));
    let mut adapter = VoicevoxAdapter::new("localhost", config.speech.port, config.speech.speaker);
    if !adapter.set_host(&config.speech.host) {
        log::warn!("keeping default speech host");
    }
    queue.set_adapter(Some(Arc::new(adapter)));

    // the window is just another hub client, so it sees replay and clear too
    let (ui_tx, ui_rx) = broadcast::channel(256);
    hub.register(Box::new(UiClient { tx: ui_tx })).await;

    // chat relay, speaking relayed events
    let sink = Arc::new(SpeechSink {
        queue: queue.clone(),
    });
    let mut relay = CommentRelay::new(idle_provider_factory(), hub.clone(), Some(sink));
    let state_rx = relay.state();
    if let Some(stream_id) = &config.server.stream_id {
        relay.connect(stream_id, None).await;
    }

    let avatar = load_avatar(&config.avatar).map_err(|err| {
        log::error!("avatar document failed to load: {err}");
        err.to_string()
    });

    Ok((
        FrontendHandle {
            ui_rx,
            lip_rx,
            state_rx,
            avatar,
            relay,
        },
        ShutdownHandle {
            hub,
            server: server_handle,
        },
    ))
}

fn load_avatar(settings: &AvatarSettings) -> anyhow::Result<AvatarView> {
    let document = LayerDocument::from_reader(File::open(&settings.document_path)?)?;
    let config = &settings.config;

    let mouth = config.mouth_assignment();
    let eye = config.eye_assignment();
    let sequence = resolve_sequence(&document, &mouth, &eye, &config.resolve_options());
    let renderer = AvatarRenderer::new(sequence, &mouth, &eye, config.preview);

    let blink_enabled = !config.preview && !eye.is_empty();
    let blink = BlinkDriver::new(
        config.blink_interval,
        config.blink_speed,
        FRAME_RATE,
        blink_enabled,
    );

    Ok(AvatarView {
        renderer,
        blink,
        preview: config.preview,
    })
}

struct UiClient {
    tx: broadcast::Sender<UiEvent>,
}

#[async_trait::async_trait]
impl ClientSink for UiClient {
    async fn send(&mut self, message: String) -> Result<(), ClientClosed> {
        let Ok(parsed) = serde_json::from_str::<Value>(&message) else {
            return Ok(());
        };
        match parsed["event"].as_str() {
            Some("comment") => {
                let user = parsed["data"]["userName"].as_str().unwrap_or("").to_string();
                let text = parsed["data"]["content"].as_str().unwrap_or("").to_string();
                let _ = self.tx.send(UiEvent::NewComment { user, text });
            }
            Some("clear") => {
                let _ = self.tx.send(UiEvent::Cleared);
            }
            _ => {}
        }
        Ok(())
    }

    async fn close(&mut self) {}
}

struct SpeechSink {
    queue: SpeechQueue,
}

impl overlay_server::EventSink for SpeechSink {
    fn deliver(&self, kind: EventKind, payload: &Value) {
        if let Some(template) = default_template(kind.as_str()) {
            if let Some(text) = format_speech_text(template, payload) {
                self.queue.enqueue(&text);
            }
        }
    }
}
