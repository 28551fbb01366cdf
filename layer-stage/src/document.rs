use std::io::Read;

use image::RgbaImage;
use zip::ZipArchive;

use crate::name::decode_name;

mod json_model {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Root {
        pub width: u32,
        pub height: u32,
        pub layers: Vec<Node>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Node {
        pub name: String,
        #[serde(default)]
        pub hidden: bool,
        #[serde(default)]
        pub x: i64,
        #[serde(default)]
        pub y: i64,
        #[serde(default = "default_opacity")]
        pub opacity: f32,
        #[serde(default)]
        pub image: Option<String>,
        #[serde(default)]
        pub children: Vec<Node>,
    }

    fn default_opacity() -> f32 {
        1.0
    }
}

/// One flattened drawable unit of a layered document, flags already decoded.
#[derive(Debug, Clone)]
pub struct PsdLayer {
    /// Slash-joined chain of path names, unique within the document.
    pub path: String,
    pub display_name: String,
    /// Owned pixel buffer; absent for empty layers.
    pub raster: Option<RgbaImage>,
    pub x: i64,
    pub y: i64,
    pub opacity: f32,
    pub is_group: bool,
    pub force_visible: bool,
    pub is_radio: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
    /// The document's native visibility flag, cascaded from ancestors.
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct LayerDocument {
    pub width: u32,
    pub height: u32,
    /// All layers in back-to-front document order, groups included.
    pub layers: Vec<PsdLayer>,
}

impl LayerDocument {
    pub fn from_reader<T: std::io::Read + std::io::Seek>(
        reader: T,
    ) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(reader)?;
        parse_document(&mut archive)
    }

    pub fn leaf_layers(&self) -> impl Iterator<Item = &PsdLayer> {
        self.layers.iter().filter(|layer| !layer.is_group)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("Invalid document: no manifest.json found")]
    NoManifest,
    #[error("Failed to parse json {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Failed to open image")]
    ImageParsing(#[from] image::ImageError),
    #[error("IO error")]
    IOError(#[from] std::io::Error),
    #[error("Bad archive")]
    Zip(#[from] zip::result::ZipError),
}

pub fn parse_document<T: std::io::Read + std::io::Seek>(
    archive: &mut ZipArchive<T>,
) -> Result<LayerDocument, DocumentError> {
    // parse manifest json
    let root: json_model::Root = {
        let mut entry = archive
            .by_name("manifest.json")
            .map_err(|_err| DocumentError::NoManifest)?;
        serde_json::from_reader(&mut entry)?
    };

    let mut layers = Vec::new();
    flatten_into(archive, &root.layers, "", false, &mut layers)?;

    Ok(LayerDocument {
        width: root.width,
        height: root.height,
        layers,
    })
}

fn flatten_into<T: std::io::Read + std::io::Seek>(
    archive: &mut ZipArchive<T>,
    nodes: &[json_model::Node],
    parent_path: &str,
    parent_hidden: bool,
    out: &mut Vec<PsdLayer>,
) -> Result<(), DocumentError> {
    for node in nodes {
        let decoded = decode_name(&node.name);
        let path = if parent_path.is_empty() {
            decoded.path_name
        } else {
            format!("{parent_path}/{}", decoded.path_name)
        };
        let is_group = !node.children.is_empty();
        let hidden = parent_hidden || node.hidden;

        let raster = match &node.image {
            Some(entry_name) => load_raster(archive, entry_name)?,
            None => None,
        };

        out.push(PsdLayer {
            path: path.clone(),
            display_name: decoded.display_name,
            raster,
            x: node.x,
            y: node.y,
            opacity: node.opacity,
            is_group,
            force_visible: decoded.force_visible,
            is_radio: decoded.is_radio,
            mirror_x: decoded.mirror_x,
            mirror_y: decoded.mirror_y,
            hidden,
        });

        flatten_into(archive, &node.children, &path, hidden, out)?;
    }
    Ok(())
}

fn load_raster<T: std::io::Read + std::io::Seek>(
    archive: &mut ZipArchive<T>,
    entry_name: &str,
) -> Result<Option<RgbaImage>, DocumentError> {
    let Ok(mut entry) = archive.by_name(&format!("layers/{entry_name}")) else {
        // layer image not found, keep the layer as an empty one
        return Ok(None);
    };

    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;

    let image = image::load_from_memory(&buf)?;
    Ok(Some(image.to_rgba8()))
}
