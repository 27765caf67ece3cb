//! Custom status glyphs

use marquee_core::traits::{GlyphBitmap, PanelError};
use marquee_display::FrameBuffer;

/// Glyph slots 0-4: blank, play, pause, stop, transitioning
pub const STATUS_GLYPHS: [GlyphBitmap; 5] = [
    [0x00; 8],
    [0x08, 0x0c, 0x0e, 0x0f, 0x0e, 0x0c, 0x08, 0x00],
    [0x1b, 0x1b, 0x1b, 0x1b, 0x1b, 0x1b, 0x1b, 0x00],
    [0x00, 0x1f, 0x1f, 0x1f, 0x1f, 0x1f, 0x00, 0x00],
    [0x00, 0x0e, 0x1f, 0x1f, 0x1f, 0x0e, 0x00, 0x00],
];

/// Full block in the panel's character ROM
pub const BLOCK: char = '\u{ff}';

/// Program the status glyphs into the panel
pub fn load_status_glyphs(frame: &mut FrameBuffer) -> Result<(), PanelError> {
    for (slot, bitmap) in (0u8..).zip(STATUS_GLYPHS.iter()) {
        frame.panel().load_glyph(slot, bitmap)?;
    }
    Ok(())
}

/// Char that displays glyph `slot`
pub fn glyph_char(slot: u8) -> char {
    char::from(slot)
}
