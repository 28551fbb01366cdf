use std::collections::{HashMap, HashSet};

use image::RgbaImage;

use crate::assignment::FrameAssignment;
use crate::compose::draw_layer;
use crate::document::{LayerDocument, PsdLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Mouth,
    Eye,
}

#[derive(Debug, Clone)]
pub enum SequenceItem {
    /// Consecutive static layers pre-flattened into one cached surface.
    StaticSegment { surface: RgbaImage },
    /// A position whose drawn content depends on the current mouth/eye level.
    DynamicSlot { role: SlotRole, layer: PsdLayer },
}

/// Visibility overrides and mirror state the resolver evaluates against.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Explicit per-path visibility, overriding the document flag.
    pub visibility: HashMap<String, bool>,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// Ordered drawing plan. Drawing the items in order, substituting each
/// dynamic slot's active layer, reproduces the document's back-to-front
/// stacking.
#[derive(Debug, Clone)]
pub struct RenderSequence {
    pub width: u32,
    pub height: u32,
    pub items: Vec<SequenceItem>,
}

/// Build the render sequence for the current configuration. Rebuilt wholesale
/// whenever the document, role assignments, overrides or flips change.
pub fn resolve_sequence(
    document: &LayerDocument,
    mouth: &FrameAssignment,
    eye: &FrameAssignment,
    options: &ResolveOptions,
) -> RenderSequence {
    let leaf_paths: HashSet<&str> = document.leaf_layers().map(|l| l.path.as_str()).collect();
    let mut claimed_groups: HashSet<String> = HashSet::new();

    let mut items = Vec::new();
    let mut pending: Vec<&PsdLayer> = Vec::new();

    for layer in document.leaf_layers() {
        if let Some(role) = slot_role(layer, mouth, eye) {
            flush_static_run(document, &mut pending, &mut items);
            items.push(SequenceItem::DynamicSlot {
                role,
                layer: layer.clone(),
            });
            continue;
        }

        if include_layer(layer, options, &leaf_paths, &mut claimed_groups) {
            pending.push(layer);
        }
    }
    flush_static_run(document, &mut pending, &mut items);

    RenderSequence {
        width: document.width,
        height: document.height,
        items,
    }
}

// A path assigned to both roles resolves as mouth.
fn slot_role(layer: &PsdLayer, mouth: &FrameAssignment, eye: &FrameAssignment) -> Option<SlotRole> {
    if mouth.contains(&layer.path) {
        Some(SlotRole::Mouth)
    } else if eye.contains(&layer.path) {
        Some(SlotRole::Eye)
    } else {
        None
    }
}

// Rules 2..7 of the resolution order; rule 1 (dynamic slots) is handled by
// the caller. Each rule short-circuits on first match.
fn include_layer(
    layer: &PsdLayer,
    options: &ResolveOptions,
    leaf_paths: &HashSet<&str>,
    claimed_groups: &mut HashSet<String>,
) -> bool {
    if layer.force_visible {
        return true;
    }
    if ancestor_overridden_hidden(&layer.path, &options.visibility) {
        return false;
    }
    if suppressed_by_flip(layer, options, leaf_paths) {
        return false;
    }
    if layer.mirror_x || layer.mirror_y {
        // an explicit override for the exact path beats the computed default
        if let Some(&visible) = options.visibility.get(&layer.path) {
            return visible;
        }
        return flip_active(layer.mirror_x, layer.mirror_y, options);
    }

    let effective = options
        .visibility
        .get(&layer.path)
        .copied()
        .unwrap_or(!layer.hidden);

    if layer.is_radio {
        // first effectively-visible sibling claims the group
        if !effective {
            return false;
        }
        let parent = parent_path(&layer.path);
        if claimed_groups.contains(parent) {
            return false;
        }
        claimed_groups.insert(parent.to_string());
        return true;
    }

    effective
}

fn ancestor_overridden_hidden(path: &str, visibility: &HashMap<String, bool>) -> bool {
    for (i, c) in path.char_indices() {
        if c == '/' && visibility.get(&path[..i]) == Some(&false) {
            return true;
        }
    }
    false
}

// A non-mirrored base is suppressed while a mirrored variant of it is active.
fn suppressed_by_flip(layer: &PsdLayer, options: &ResolveOptions, leaf_paths: &HashSet<&str>) -> bool {
    if layer.mirror_x || layer.mirror_y {
        return false;
    }
    let variants = [
        (":flipx", options.flip_x),
        (":flipy", options.flip_y),
        (":flipxy", options.flip_x && options.flip_y),
    ];
    variants.iter().any(|(suffix, active)| {
        *active && leaf_paths.contains(format!("{}{suffix}", layer.path).as_str())
    })
}

fn flip_active(mirror_x: bool, mirror_y: bool, options: &ResolveOptions) -> bool {
    (!mirror_x || options.flip_x) && (!mirror_y || options.flip_y)
}

fn parent_path(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

fn flush_static_run(
    document: &LayerDocument,
    pending: &mut Vec<&PsdLayer>,
    items: &mut Vec<SequenceItem>,
) {
    if pending.is_empty() {
        return;
    }
    let mut surface = RgbaImage::new(document.width, document.height);
    for layer in pending.drain(..) {
        draw_layer(&mut surface, layer);
    }
    items.push(SequenceItem::StaticSegment { surface });
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use crate::assignment::FrameAssignment;
    use crate::document::{LayerDocument, PsdLayer};
    use crate::resolve::{ResolveOptions, SequenceItem, SlotRole, resolve_sequence};

    fn leaf(path: &str) -> PsdLayer {
        let decoded = crate::name::decode_name(path.rsplit('/').next().unwrap_or(path));
        PsdLayer {
            path: {
                // strip markers from every path segment, like the parser does
                let segments: Vec<String> = path
                    .split('/')
                    .map(|s| crate::name::decode_name(s).path_name)
                    .collect();
                segments.join("/")
            },
            display_name: decoded.display_name,
            raster: Some(RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]))),
            x: 0,
            y: 0,
            opacity: 1.0,
            is_group: false,
            force_visible: decoded.force_visible,
            is_radio: decoded.is_radio,
            mirror_x: decoded.mirror_x,
            mirror_y: decoded.mirror_y,
            hidden: false,
        }
    }

    fn document(layers: Vec<PsdLayer>) -> LayerDocument {
        LayerDocument {
            width: 2,
            height: 2,
            layers,
        }
    }

    // Layers are 1x1 white rasters placed at distinct offsets so inclusion
    // can be checked per pixel.
    fn leaf_at(path: &str, x: i64, y: i64) -> PsdLayer {
        let mut l = leaf(path);
        l.x = x;
        l.y = y;
        l
    }

    fn drawn_at(sequence: &crate::resolve::RenderSequence, x: u32, y: u32) -> bool {
        sequence.items.iter().any(|item| match item {
            SequenceItem::StaticSegment { surface } => surface.get_pixel(x, y)[3] > 0,
            SequenceItem::DynamicSlot { .. } => false,
        })
    }

    #[test]
    fn radio_group_shows_first_sibling_only() {
        let doc = document(vec![
            leaf_at("face/*a", 0, 0),
            leaf_at("face/*b", 1, 0),
            leaf_at("face/*c", 0, 1),
        ]);
        let sequence = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &ResolveOptions::default(),
        );

        assert!(drawn_at(&sequence, 0, 0), "first radio sibling is shown");
        assert!(!drawn_at(&sequence, 1, 0), "second radio sibling is hidden");
        assert!(!drawn_at(&sequence, 0, 1), "third radio sibling is hidden");
    }

    #[test]
    fn radio_respects_visibility_override() {
        let doc = document(vec![leaf_at("face/*a", 0, 0), leaf_at("face/*b", 1, 0)]);
        let mut options = ResolveOptions::default();
        options.visibility.insert("face/a".to_string(), false);

        let sequence = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &options,
        );
        assert!(!drawn_at(&sequence, 0, 0));
        assert!(drawn_at(&sequence, 1, 0), "next sibling claims the group");
    }

    #[test]
    fn flip_precedence_swaps_base_and_variant() {
        let doc = document(vec![
            leaf_at("body/hair", 0, 0),
            leaf_at("body/hair:flipx", 1, 0),
        ]);

        let plain = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &ResolveOptions::default(),
        );
        assert!(drawn_at(&plain, 0, 0), "base visible without flip");
        // the mirrored variant draws flipped about the canvas axis; with the
        // canvas 2 wide and the raster 1 wide, x=1 mirrors to x=0 -- so check
        // it was excluded by checking its own offset stayed clear
        assert!(!drawn_at(&plain, 1, 0), "variant hidden without flip");

        let flipped = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &ResolveOptions {
                flip_x: true,
                ..Default::default()
            },
        );
        assert!(
            drawn_at(&flipped, 0, 0),
            "variant at x=1 mirrors onto x=0 when flipX is active"
        );
        // base suppressed: nothing may land on its unmirrored offset twice
        let opaque: u32 = flipped
            .items
            .iter()
            .map(|item| match item {
                SequenceItem::StaticSegment { surface } => {
                    surface.pixels().filter(|p| p[3] > 0).count() as u32
                }
                SequenceItem::DynamicSlot { .. } => 0,
            })
            .sum();
        assert_eq!(opaque, 1, "only the mirrored variant is drawn");
    }

    #[test]
    fn flipxy_variant_needs_both_flags() {
        let doc = document(vec![leaf_at("deco/ribbon:flipxy", 0, 0)]);

        let only_x = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &ResolveOptions {
                flip_x: true,
                ..Default::default()
            },
        );
        assert!(only_x.items.is_empty(), "flipxy needs both axes active");

        let both = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &ResolveOptions {
                flip_x: true,
                flip_y: true,
                ..Default::default()
            },
        );
        assert_eq!(both.items.len(), 1);
    }

    #[test]
    fn force_visible_survives_hidden_ancestor_override() {
        let mut outline = leaf_at("face/outline", 0, 0);
        outline.force_visible = true;
        let cheek = leaf_at("face/cheek", 1, 0);

        let doc = document(vec![outline, cheek]);
        let mut options = ResolveOptions::default();
        options.visibility.insert("face".to_string(), false);

        let sequence = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &options,
        );
        assert!(drawn_at(&sequence, 0, 0), "force-visible ignores the hidden group");
        assert!(!drawn_at(&sequence, 1, 0), "sibling cascades hidden");
    }

    #[test]
    fn document_hidden_flag_is_the_default() {
        let mut ghost = leaf_at("ghost", 0, 0);
        ghost.hidden = true;
        let doc = document(vec![ghost]);

        let hidden = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &ResolveOptions::default(),
        );
        assert!(hidden.items.is_empty());

        let mut options = ResolveOptions::default();
        options.visibility.insert("ghost".to_string(), true);
        let shown = resolve_sequence(
            &doc,
            &FrameAssignment::default(),
            &FrameAssignment::default(),
            &options,
        );
        assert_eq!(shown.items.len(), 1, "override beats the document flag");
    }

    #[test]
    fn dynamic_slots_split_static_runs_in_order() {
        let doc = document(vec![
            leaf_at("back", 0, 0),
            leaf_at("face/mouth0", 1, 0),
            leaf_at("front", 0, 1),
        ]);
        let mut mouth = FrameAssignment::default();
        mouth.assign(0, "face/mouth0");

        let sequence = resolve_sequence(
            &doc,
            &mouth,
            &FrameAssignment::default(),
            &ResolveOptions::default(),
        );

        assert_eq!(sequence.items.len(), 3);
        assert!(matches!(sequence.items[0], SequenceItem::StaticSegment { .. }));
        match &sequence.items[1] {
            SequenceItem::DynamicSlot { role, layer } => {
                assert_eq!(*role, SlotRole::Mouth);
                assert_eq!(layer.path, "face/mouth0");
            }
            other => panic!("expected dynamic slot, got {other:?}"),
        }
        assert!(matches!(sequence.items[2], SequenceItem::StaticSegment { .. }));
    }

    #[test]
    fn assigned_layer_is_a_slot_even_when_hidden() {
        let mut m = leaf_at("face/mouth0", 0, 0);
        m.hidden = true;
        let doc = document(vec![m]);
        let mut mouth = FrameAssignment::default();
        mouth.assign(0, "face/mouth0");

        let sequence = resolve_sequence(
            &doc,
            &mouth,
            &FrameAssignment::default(),
            &ResolveOptions::default(),
        );
        assert!(matches!(
            sequence.items.as_slice(),
            [SequenceItem::DynamicSlot { .. }]
        ));
    }
}
