use actix_web::{HttpResponse, Responder, web};

use crate::plugins::PluginRegistry;

/// Discovery page linking every registered plugin's overlay.
pub async fn plugin_index(registry: web::Data<PluginRegistry>) -> impl Responder {
    let links: String = registry
        .ids()
        .iter()
        .map(|id| format!("<li><a href=\"/plugins/{id}/overlay/\">{id}</a></li>"))
        .collect();

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(format!(
            "<html><body><h1>Overlay Plugins</h1><ul>{links}</ul></body></html>"
        ))
}
