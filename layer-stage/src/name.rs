/// Behavior flags decoded from a raw layer name.
///
/// The display name has every marker stripped; the path name keeps the flip
/// suffix so a mirrored variant stays distinguishable from its base layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedName {
    pub display_name: String,
    pub path_name: String,
    pub force_visible: bool,
    pub is_radio: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
}

pub fn decode_name(raw: &str) -> DecodedName {
    let mut name = raw;
    let mut force_visible = false;
    let mut is_radio = false;

    if let Some(rest) = name.strip_prefix('!') {
        force_visible = true;
        name = rest;
    } else if let Some(rest) = name.strip_prefix('*') {
        is_radio = true;
        name = rest;
    }

    let path_name = name.to_string();

    let mut mirror_x = false;
    let mut mirror_y = false;
    let display_name = if let Some(rest) = name.strip_suffix(":flipxy") {
        mirror_x = true;
        mirror_y = true;
        rest
    } else if let Some(rest) = name.strip_suffix(":flipx") {
        mirror_x = true;
        rest
    } else if let Some(rest) = name.strip_suffix(":flipy") {
        mirror_y = true;
        rest
    } else {
        name
    }
    .to_string();

    DecodedName {
        display_name,
        path_name,
        force_visible,
        is_radio,
        mirror_x,
        mirror_y,
    }
}
