use std::collections::HashMap;

use serde::Deserialize;

use crate::assignment::{FrameAssignment, LEVELS};
use crate::resolve::ResolveOptions;

/// Resolver and animation configuration for the avatar overlay. Arrives as
/// URL query parameters from the overlay page, or as the same shape in JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvatarConfig {
    /// Layer paths per mouth level 0..4.
    pub mouth: Vec<Vec<String>>,
    /// Layer paths per eye level 0..4.
    pub eye: Vec<Vec<String>>,
    pub layer_visibility: HashMap<String, bool>,
    pub flip_x: bool,
    pub flip_y: bool,
    pub threshold: f32,
    pub hold_frames: u32,
    pub transition_frames: u32,
    pub blink_interval: f32,
    pub blink_speed: u32,
    pub preview: bool,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            mouth: vec![Vec::new(); LEVELS],
            eye: vec![Vec::new(); LEVELS],
            layer_visibility: HashMap::new(),
            flip_x: false,
            flip_y: false,
            threshold: 0.15,
            hold_frames: 8,
            transition_frames: 4,
            blink_interval: 3.0,
            blink_speed: 6,
            preview: false,
        }
    }
}

impl AvatarConfig {
    /// Parse an overlay query string. Unknown keys are ignored and malformed
    /// values fall back to the defaults.
    pub fn from_query(query: &str) -> Self {
        let mut config = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "layerVisibility" => {
                    if let Ok(map) = serde_json::from_str(&value) {
                        config.layer_visibility = map;
                    }
                }
                "flipX" => config.flip_x = value == "true",
                "flipY" => config.flip_y = value == "true",
                "preview" => config.preview = value == "true",
                "threshold" => parse_into(&value, &mut config.threshold),
                "holdFrames" => parse_into(&value, &mut config.hold_frames),
                "transitionFrames" => parse_into(&value, &mut config.transition_frames),
                "blinkInterval" => parse_into(&value, &mut config.blink_interval),
                "blinkSpeed" => parse_into(&value, &mut config.blink_speed),
                other => {
                    if let Some(level) = level_key(other, "mouth") {
                        config.mouth[level] = parse_paths(&value);
                    } else if let Some(level) = level_key(other, "eye") {
                        config.eye[level] = parse_paths(&value);
                    }
                }
            }
        }
        config
    }

    pub fn mouth_assignment(&self) -> FrameAssignment {
        assignment_from(&self.mouth)
    }

    pub fn eye_assignment(&self) -> FrameAssignment {
        assignment_from(&self.eye)
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            visibility: self.layer_visibility.clone(),
            flip_x: self.flip_x,
            flip_y: self.flip_y,
        }
    }
}

fn assignment_from(levels: &[Vec<String>]) -> FrameAssignment {
    let mut assignment = FrameAssignment::default();
    for (level, paths) in levels.iter().take(LEVELS).enumerate() {
        for path in paths {
            if !path.is_empty() {
                assignment.assign(level, path.clone());
            }
        }
    }
    assignment
}

fn level_key(key: &str, prefix: &str) -> Option<usize> {
    let level: usize = key.strip_prefix(prefix)?.parse().ok()?;
    (level < LEVELS).then_some(level)
}

// A level value is a JSON array of paths; a bare string still counts as a
// single path so hand-written URLs keep working.
fn parse_paths(value: &str) -> Vec<String> {
    if let Ok(paths) = serde_json::from_str::<Vec<String>>(value) {
        return paths;
    }
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

fn parse_into<T: std::str::FromStr>(value: &str, slot: &mut T) {
    if let Ok(parsed) = value.parse() {
        *slot = parsed;
    }
}
