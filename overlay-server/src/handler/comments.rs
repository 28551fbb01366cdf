use actix_web::{Responder, web};
use serde_json::json;

use crate::event::EventKind;
use crate::hub::HubHandle;

#[derive(serde::Deserialize)]
pub struct AddCommentModel {
    user: String,
    text: String,
}

/// Local test injection: broadcast a comment as if the stream produced it.
pub async fn add_comment(
    payload: web::Json<AddCommentModel>,
    hub: web::Data<HubHandle>,
) -> impl Responder {
    hub.broadcast(
        EventKind::Comment,
        json!({ "userName": payload.user, "content": payload.text }),
    )
    .await;

    "ok"
}
