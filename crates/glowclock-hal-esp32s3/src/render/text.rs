use hub75::{FrameBuffer, protocol::WIDTH};

use super::glyph::{draw_glyph, glyph};

/// Draws `text` horizontally centred, shrinking to scale 1 if it would not fit.
pub(super) fn draw_text_centered(
    frame: &mut FrameBuffer,
    y: usize,
    text: &str,
    scale: usize,
    color: u16,
) {
    let scale = if text_pixel_width(text, scale) > WIDTH {
        1
    } else {
        scale
    };
    let width = text_pixel_width(text, scale);
    let x = WIDTH.saturating_sub(width) / 2;
    draw_text(frame, x, y, text, scale, color);
}

pub(super) fn text_pixel_width(text: &str, scale: usize) -> usize {
    let chars = text.chars().count();
    if chars == 0 {
        0
    } else {
        chars * (6 * scale) - scale
    }
}

pub(super) fn draw_text(
    frame: &mut FrameBuffer,
    x: usize,
    y: usize,
    text: &str,
    scale: usize,
    color: u16,
) {
    let mut cursor_x = x;

    for c in text.chars() {
        let bitmap = glyph(c);
        draw_glyph(frame, cursor_x, y, &bitmap, scale, color);
        cursor_x += 6 * scale;
    }
}
