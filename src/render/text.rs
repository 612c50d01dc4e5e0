//! Bitmap text layout with the 8×8 `font8x8` glyphs.
//!
//! Glyphs are scaled by an integer factor so the same text always lands on
//! the same pixels.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};

/// Glyph cell size in font pixels
pub const GLYPH_SIZE: u32 = 8;

/// Line pitch in font pixels (glyph plus spacing)
pub const LINE_HEIGHT: u32 = 10;

const ELLIPSIS: &str = "...";

/// A rectangle on the canvas, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Wrapped lines plus the scale they were fitted at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayout {
    pub scale: u32,
    pub lines: Vec<String>,
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Greedy word wrap to at most `max_chars` characters per line.
///
/// Words longer than a line are split across lines.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while !word.is_empty() {
            let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
            if needed <= max_chars {
                if line_len > 0 {
                    line.push(' ');
                    line_len += 1;
                }
                line.extend(word.iter());
                line_len += word.len();
                break;
            }

            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
                continue;
            }

            let rest = word.split_off(max_chars);
            lines.push(word.iter().collect());
            word = rest;
        }
    }

    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// Choose the largest scale (up to `max_scale`) at which the wrapped text
/// fits `region`. At scale 1 the overflow is cut and marked with `...`.
pub fn layout(text: &str, region: Region, max_scale: u32) -> TextLayout {
    let mut scale = max_scale.max(1);

    loop {
        let max_chars = (region.width / (GLYPH_SIZE * scale)) as usize;
        let max_lines = (region.height / (LINE_HEIGHT * scale)) as usize;
        let lines = wrap(text, max_chars);

        if lines.len() <= max_lines && max_chars > 0 {
            return TextLayout { scale, lines };
        }
        if scale == 1 {
            return TextLayout {
                scale,
                lines: truncate(lines, max_lines, max_chars),
            };
        }
        scale -= 1;
    }
}

fn truncate(mut lines: Vec<String>, max_lines: usize, max_chars: usize) -> Vec<String> {
    if max_lines == 0 || max_chars == 0 {
        return Vec::new();
    }
    if lines.len() <= max_lines {
        return lines;
    }

    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let keep = max_chars.saturating_sub(ELLIPSIS.len());
        let mut cut: String = last.chars().take(keep).collect();
        cut.push_str(ELLIPSIS);
        *last = cut.chars().take(max_chars).collect();
    }
    lines
}

/// Draw a laid-out block centered in `region`
pub fn draw(canvas: &mut RgbaImage, layout: &TextLayout, region: Region, color: Rgba<u8>) {
    let scale = layout.scale;
    let line_px = LINE_HEIGHT * scale;
    let block_height = line_px * layout.lines.len() as u32;
    let top = region.y + region.height.saturating_sub(block_height) / 2;

    for (row, line) in layout.lines.iter().enumerate() {
        let line_width = GLYPH_SIZE * scale * line.chars().count() as u32;
        let left = region.x + region.width.saturating_sub(line_width) / 2;
        // Center the 8px glyph inside the 10px line pitch.
        let y = top + row as u32 * line_px + (LINE_HEIGHT - GLYPH_SIZE) * scale / 2;

        for (col, c) in line.chars().enumerate() {
            let x = left + col as u32 * GLYPH_SIZE * scale;
            draw_glyph(canvas, glyph(c), x, y, scale, color);
        }
    }
}

fn draw_glyph(canvas: &mut RgbaImage, rows: [u8; 8], x: u32, y: u32, scale: u32, color: Rgba<u8>) {
    for (gy, &bits) in rows.iter().enumerate() {
        for gx in 0..GLYPH_SIZE {
            if (bits >> gx) & 1 == 0 {
                continue;
            }
            let px = x + gx * scale;
            let py = y + gy as u32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    if px + dx < canvas.width() && py + dy < canvas.height() {
                        canvas.put_pixel(px + dx, py + dy, color);
                    }
                }
            }
        }
    }
}
