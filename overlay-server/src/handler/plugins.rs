use std::path::PathBuf;

use actix_files::NamedFile;
use actix_web::{ResponseError, http::StatusCode, web};

use crate::plugins::PluginRegistry;

#[derive(thiserror::Error, Debug)]
pub enum PluginFileError {
    #[error("No plugin {0}")]
    UnknownPlugin(String),
    #[error("Invalid path")]
    InvalidPath,
    #[error("File not found")]
    NotFound(#[from] std::io::Error),
}

impl ResponseError for PluginFileError {
    fn status_code(&self) -> StatusCode {
        match self {
            PluginFileError::InvalidPath => StatusCode::BAD_REQUEST,
            PluginFileError::UnknownPlugin(_) | PluginFileError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
        }
    }
}

/// Serve one static file out of a registered plugin's directory.
pub async fn plugin_file(
    path: web::Path<(String, String)>,
    registry: web::Data<PluginRegistry>,
) -> Result<NamedFile, PluginFileError> {
    let (plugin_id, tail) = path.into_inner();
    let base = registry
        .path_of(&plugin_id)
        .ok_or(PluginFileError::UnknownPlugin(plugin_id))?;
    let relative = sanitize(&tail).ok_or(PluginFileError::InvalidPath)?;

    Ok(NamedFile::open_async(base.join(relative)).await?)
}

// Normalize the request path and keep it inside the plugin directory.
// Directory-style requests fall through to the bundle entry point.
fn sanitize(tail: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in tail.split('/') {
        match component {
            "" | "." => continue,
            ".." => return None,
            c if c.contains('\\') || c.contains(':') => return None,
            c => clean.push(c),
        }
    }
    if tail.is_empty() || tail.ends_with('/') || clean.as_os_str().is_empty() {
        clean.push("index.html");
    }
    Some(clean)
}
