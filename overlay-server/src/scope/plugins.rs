use actix_web::{Scope, web};

use crate::handler::plugins::plugin_file;

pub fn plugins_scope() -> Scope {
    web::scope("/plugins").route("{plugin_id}/{tail:.*}", web::get().to(plugin_file))
}
