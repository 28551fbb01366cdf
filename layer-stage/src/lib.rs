mod assignment;
mod blink;
mod compose;
mod config;
mod document;
mod name;
mod render;
mod resolve;

pub use assignment::{FrameAssignment, LEVELS, ResolvedFrames};
pub use blink::BlinkDriver;
pub use compose::draw_layer;
pub use config::AvatarConfig;
pub use document::{DocumentError, LayerDocument, PsdLayer, parse_document};
pub use name::{DecodedName, decode_name};
pub use render::AvatarRenderer;
pub use resolve::{RenderSequence, ResolveOptions, SequenceItem, SlotRole, resolve_sequence};
