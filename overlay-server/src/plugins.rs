use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Descriptor each plugin ships as `manifest.json`. The server only needs
/// `id` for routing; the rest is read by the shell.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub overlay: bool,
    #[serde(default)]
    pub settings: bool,
}

struct PluginRoute {
    id: String,
    fs_path: PathBuf,
}

/// Plugin ids and their static roots, shared between the discovery index and
/// the file handler. Registration works while the server is running.
#[derive(Default)]
pub struct PluginRegistry {
    routes: RwLock<Vec<PluginRoute>>,
}

impl PluginRegistry {
    /// Expose `fs_path` under `/plugins/{id}/` and list `id` at `/`.
    pub fn register(&self, id: impl Into<String>, fs_path: impl Into<PathBuf>) {
        let mut routes = self.routes.write().unwrap();
        routes.push(PluginRoute {
            id: id.into(),
            fs_path: fs_path.into(),
        });
    }

    pub fn ids(&self) -> Vec<String> {
        self.routes
            .read()
            .unwrap()
            .iter()
            .map(|route| route.id.clone())
            .collect()
    }

    pub fn path_of(&self, id: &str) -> Option<PathBuf> {
        self.routes
            .read()
            .unwrap()
            .iter()
            .find(|route| route.id == id)
            .map(|route| route.fs_path.clone())
    }
}

/// Scan `root` for plugin directories and register every readable manifest.
/// A malformed manifest is logged and skipped; the others still load.
pub fn discover_plugins(root: &Path, registry: &PluginRegistry) -> usize {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("cannot read plugins dir {}: {err}", root.display());
            return 0;
        }
    };

    let mut count = 0;
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        match read_manifest(&dir) {
            Ok(manifest) => {
                tracing::info!("registering plugin {} v{}", manifest.id, manifest.version);
                registry.register(manifest.id, dir);
                count += 1;
            }
            Err(err) => {
                tracing::warn!("skipping plugin at {}: {err}", dir.display());
            }
        }
    }
    count
}

fn read_manifest(dir: &Path) -> anyhow::Result<PluginManifest> {
    let file = fs::File::open(dir.join("manifest.json"))?;
    Ok(serde_json::from_reader(file)?)
}
