use image::{RgbaImage, imageops};

use crate::document::PsdLayer;

/// Draw `layer` onto `canvas`, honoring its opacity and mirror flags.
pub fn draw_layer(canvas: &mut RgbaImage, layer: &PsdLayer) {
    let Some(raster) = &layer.raster else {
        return;
    };

    let mut top = raster.clone();
    if layer.mirror_x {
        top = imageops::flip_horizontal(&top);
    }
    if layer.mirror_y {
        top = imageops::flip_vertical(&top);
    }

    // Apply opacity
    if layer.opacity < 1.0 {
        for pixel in top.pixels_mut() {
            // get the alpha channel
            let a = pixel[3] as f32 / 255.0 * layer.opacity;
            // mut the alpha chan
            pixel[3] = (a * 255.0).round() as u8;
        }
    }

    let (x, y) = layer_position(canvas, layer, &top);
    imageops::overlay(canvas, &top, x, y);
}

// A mirrored variant lands where a flipped source would: its offset is
// reflected about the canvas axis.
fn layer_position(canvas: &RgbaImage, layer: &PsdLayer, top: &RgbaImage) -> (i64, i64) {
    let x = if layer.mirror_x {
        canvas.width() as i64 - layer.x - top.width() as i64
    } else {
        layer.x
    };
    let y = if layer.mirror_y {
        canvas.height() as i64 - layer.y - top.height() as i64
    } else {
        layer.y
    };
    (x, y)
}
