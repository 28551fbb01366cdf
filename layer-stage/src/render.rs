use image::{RgbaImage, imageops};

use crate::assignment::{FrameAssignment, ResolvedFrames};
use crate::compose::draw_layer;
use crate::resolve::{RenderSequence, SequenceItem, SlotRole};

/// Draws the resolved sequence, substituting the active mouth/eye layers at
/// each dynamic slot. Redraws are event-driven: level or sequence changes set
/// a coalesced pending flag so any number of triggers in one tick produce a
/// single draw.
pub struct AvatarRenderer {
    sequence: RenderSequence,
    mouth_frames: ResolvedFrames,
    eye_frames: ResolvedFrames,
    mouth_level: Option<u8>,
    eye_level: Option<u8>,
    pending: bool,
    preview: bool,
}

impl AvatarRenderer {
    pub fn new(
        sequence: RenderSequence,
        mouth: &FrameAssignment,
        eye: &FrameAssignment,
        preview: bool,
    ) -> Self {
        // preview starts with no frame active, so "nothing assigned" stays
        // distinguishable from the neutral level-0 frame
        let initial = if preview { None } else { Some(0) };
        Self {
            sequence,
            mouth_frames: mouth.resolved(),
            eye_frames: eye.resolved(),
            mouth_level: initial,
            eye_level: initial,
            pending: true,
            preview,
        }
    }

    /// The level to fall back to when no animation is running.
    pub fn idle_level(&self) -> Option<u8> {
        if self.preview { None } else { Some(0) }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.sequence.width, self.sequence.height)
    }

    pub fn set_sequence(&mut self, sequence: RenderSequence) {
        self.sequence = sequence;
        self.pending = true;
    }

    pub fn set_assignments(&mut self, mouth: &FrameAssignment, eye: &FrameAssignment) {
        self.mouth_frames = mouth.resolved();
        self.eye_frames = eye.resolved();
        self.pending = true;
    }

    pub fn set_mouth_level(&mut self, level: Option<u8>) {
        if self.mouth_level != level {
            self.mouth_level = level;
            self.pending = true;
        }
    }

    pub fn set_eye_level(&mut self, level: Option<u8>) {
        if self.eye_level != level {
            self.eye_level = level;
            self.pending = true;
        }
    }

    /// Whether a redraw is due; clears the flag.
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Composite the full frame, back to front.
    pub fn draw(&self) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.sequence.width, self.sequence.height);
        for item in &self.sequence.items {
            match item {
                SequenceItem::StaticSegment { surface } => {
                    // already pre-flattened with opacity baked in
                    imageops::overlay(&mut canvas, surface, 0, 0);
                }
                SequenceItem::DynamicSlot { role, layer } => {
                    let active = match role {
                        SlotRole::Mouth => {
                            self.mouth_frames.is_active(self.mouth_level, &layer.path)
                        }
                        SlotRole::Eye => self.eye_frames.is_active(self.eye_level, &layer.path),
                    };
                    if active {
                        draw_layer(&mut canvas, layer);
                    }
                }
            }
        }
        canvas
    }
}
