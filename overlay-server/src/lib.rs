pub mod event;
pub(crate) mod handler;
pub mod history;
pub mod hub;
pub mod plugins;
pub mod relay;
pub(crate) mod scope;
pub mod server;
pub mod telemetry;

pub use event::{BroadcastEvent, ConnectionState, EventKind};
pub use hub::{ClientClosed, ClientSink, HubHandle, spawn_hub};
pub use plugins::{PluginManifest, PluginRegistry, discover_plugins};
pub use relay::{
    ChatProvider, CommentRelay, EventSink, ProviderEvent, ProviderFactory, ProviderOptions,
};
pub use server::create_server;
