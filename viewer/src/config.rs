use std::{
    fs::{self, File},
    path::PathBuf,
};

use layer_stage::AvatarConfig;

use crate::utils::get_env;

pub struct AppConfig {
    pub server: ServerConfig,
    pub avatar: AvatarSettings,
    pub speech: SpeechConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            avatar: AvatarSettings::from_env()?,
            speech: SpeechConfig::from_env(),
        })
    }
}

pub struct ServerConfig {
    pub addr: String,
    pub plugins_dir: Option<PathBuf>,
    pub stream_id: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            addr: get_env("VIEWER_SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1:3939".to_string()),
            plugins_dir: get_env("VIEWER_PLUGINS_DIR").ok().map(PathBuf::from),
            stream_id: get_env("VIEWER_STREAM_ID").ok(),
        })
    }
}

pub struct AvatarSettings {
    pub document_path: PathBuf,
    pub config: AvatarConfig,
}

impl AvatarSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let document_path = fs::canonicalize(get_env("VIEWER_AVATAR_MODEL")?)?;
        let config = match get_env("VIEWER_AVATAR_CONFIG") {
            Ok(path) => load_avatar_config(&path),
            Err(_) => AvatarConfig::default(),
        };
        Ok(Self {
            document_path,
            config,
        })
    }
}

// A broken config file must not keep the app from starting.
fn load_avatar_config(path: &str) -> AvatarConfig {
    let parsed = File::open(path)
        .map_err(anyhow::Error::from)
        .and_then(|file| Ok(serde_json::from_reader(file)?));
    match parsed {
        Ok(config) => config,
        Err(err) => {
            log::warn!("avatar config {path} unusable ({err}), using defaults");
            AvatarConfig::default()
        }
    }
}

pub struct SpeechConfig {
    pub host: String,
    pub port: u16,
    pub speaker: u32,
}

impl SpeechConfig {
    pub fn from_env() -> Self {
        Self {
            host: get_env("VIEWER_TTS_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: get_env("VIEWER_TTS_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(50021),
            speaker: get_env("VIEWER_TTS_SPEAKER")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(0),
        }
    }
}
