use actix_web::{HttpRequest, HttpResponse, http::header, web};
use actix_ws::{Message, MessageStream, Session};
use futures_util::StreamExt;

use crate::hub::{ClientClosed, ClientSink, HubHandle};
use crate::server::WsGuard;

struct WsClient {
    session: Session,
}

#[async_trait::async_trait]
impl ClientSink for WsClient {
    async fn send(&mut self, message: String) -> Result<(), ClientClosed> {
        self.session.text(message).await.map_err(|_| ClientClosed)
    }

    async fn close(&mut self) {
        let _ = self.session.clone().close(None).await;
    }
}

/// Upgrade an overlay connection and hand it to the hub, which replays the
/// history before any live event can reach the new client.
pub async fn connect_overlay(
    req: HttpRequest,
    body: web::Payload,
    hub: web::Data<HubHandle>,
    guard: web::Data<WsGuard>,
) -> actix_web::Result<HttpResponse> {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());
    if !guard.host_allowed(host) {
        tracing::warn!("rejecting websocket upgrade for host {host:?}");
        return Ok(HttpResponse::Forbidden().finish());
    }

    let (response, session, stream) = actix_ws::handle(&req, body)?;
    hub.register(Box::new(WsClient {
        session: session.clone(),
    }))
    .await;
    actix_web::rt::spawn(drive_session(session, stream));

    Ok(response)
}

// Overlays only listen; inbound frames are protocol upkeep.
async fn drive_session(mut session: Session, mut stream: MessageStream) {
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Ping(bytes) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}
