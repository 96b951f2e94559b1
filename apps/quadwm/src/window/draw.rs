//! Core-font drawing for the launcher and the resize overlay.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Char2b, ConnectionExt, CreateGCAux, Font, Gcontext, Window};

use crate::core::context::Context;

pub const WHITE: u32 = 0xffffff;
pub const BLACK: u32 = 0x000000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GcSpec {
    window: Window,
    fg: u32,
    bg: u32,
    font: Option<Font>,
}

/// Graphics contexts, created on first use and kept per window.
#[derive(Debug, Default)]
pub struct GcCache {
    gcs: HashMap<GcSpec, Gcontext>,
}

impl GcCache {
    fn get(&mut self, ctx: &Context, spec: GcSpec) -> Result<Gcontext> {
        if let Some(gc) = self.gcs.get(&spec) {
            return Ok(*gc);
        }
        let gc = ctx.conn.generate_id()?;
        let mut values = CreateGCAux::new().foreground(spec.fg).background(spec.bg);
        if let Some(font) = spec.font {
            values = values.font(font);
        }
        ctx.conn.create_gc(gc, spec.window, &values)?;
        self.gcs.insert(spec, gc);
        Ok(gc)
    }

    /// Frees every context drawn into `window`. Call before destroying it.
    pub fn forget(&mut self, ctx: &Context, window: Window) {
        self.gcs.retain(|spec, gc| {
            if spec.window != window {
                return true;
            }
            if let Err(e) = ctx.conn.free_gc(*gc) {
                debug!("Failed to free GC: {}", e);
            }
            false
        });
    }
}

/// Opens the configured core font, falling back to `fixed`.
pub fn open_font(ctx: &Context, name: &str) -> Result<Font> {
    let font = ctx.conn.generate_id()?;
    if let Err(e) = ctx.conn.open_font(font, name.as_bytes())?.check() {
        warn!("Failed to open font {:?}: {}. Falling back to 'fixed'", name, e);
        ctx.conn.open_font(font, b"fixed")?.check()?;
    }
    Ok(font)
}

/// Draws `text` with its top-left corner at (`x`, `y`) and returns the
/// width and line height it took.
#[allow(clippy::too_many_arguments)]
pub fn text(
    ctx: &Context,
    cache: &mut GcCache,
    window: Window,
    font: Font,
    text: &str,
    fg: u32,
    bg: u32,
    x: i16,
    y: i16,
) -> Result<(i32, i32)> {
    let gc = cache.get(ctx, GcSpec { window, fg, bg, font: Some(font) })?;
    let chars = to_char2b(text);

    let extents = ctx.conn.query_text_extents(font, &chars)?.reply()?;
    // image_text16 takes at most 255 characters per request
    for (i, chunk) in chars.chunks(255).enumerate() {
        let offset = if i == 0 {
            0
        } else {
            ctx.conn.query_text_extents(font, &chars[..i * 255])?.reply()?.overall_width
        };
        ctx.conn.image_text16(window, gc, x.saturating_add(offset as i16), y + extents.font_ascent, chunk)?;
    }

    Ok((extents.overall_right, i32::from(extents.font_ascent) + i32::from(extents.font_descent)))
}

/// UCS-2 encoding as the core protocol's 16-bit text requests expect.
pub fn to_char2b(text: &str) -> Vec<Char2b> {
    text.encode_utf16()
        .map(|unit| Char2b { byte1: (unit >> 8) as u8, byte2: unit as u8 })
        .collect()
}
