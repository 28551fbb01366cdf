use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    dev::Server,
    middleware::DefaultHeaders,
    web::{self, ServiceConfig},
};
use tracing_actix_web::TracingLogger;

use crate::handler;
use crate::hub::HubHandle;
use crate::plugins::PluginRegistry;
use crate::scope::{comments::comments_scope, plugins::plugins_scope};

fn config_server(config: &mut ServiceConfig) {
    config
        .route("/", web::get().to(handler::index::plugin_index))
        .route("/ws", web::get().to(handler::ws::connect_overlay))
        .service(comments_scope())
        .service(plugins_scope());
}

/// Host values a legitimate local client (OBS browser source, a local
/// browser) sends. Anything else looks like DNS rebinding from a hostile
/// page and the websocket upgrade is refused.
pub struct WsGuard {
    allowed: [String; 2],
}

impl WsGuard {
    pub fn new(port: u16) -> Self {
        Self {
            allowed: [format!("localhost:{port}"), format!("127.0.0.1:{port}")],
        }
    }

    pub fn host_allowed(&self, host: Option<&str>) -> bool {
        host.map(|h| self.allowed.iter().any(|a| a == h))
            .unwrap_or(false)
    }
}

pub fn create_server(
    listener: TcpListener,
    hub: HubHandle,
    registry: Arc<PluginRegistry>,
) -> anyhow::Result<Server> {
    let guard = web::Data::new(WsGuard::new(listener.local_addr()?.port()));
    let hub = web::Data::new(hub);
    let registry = web::Data::from(registry);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            // overlays are framed by OBS on purpose, so nosniff only
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .configure(config_server)
            .app_data(hub.clone())
            .app_data(registry.clone())
            .app_data(guard.clone())
    });

    Ok(server.listen(listener)?.run())
}
