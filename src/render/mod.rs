//! Title-card rendering.
//!
//! A title card is a `width × height` canvas in the background color with
//! the logo on the left and the episode text centered in the space to its
//! right. Rendering is fully deterministic: the same inputs give the same
//! PNG bytes.

pub mod text;

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use text::Region;

/// Errors from rendering a title card
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid color {value:?}: expected 6 hex digits like \"009688\"")]
    InvalidColor { value: String },

    #[error("invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("could not encode title card: {0}")]
    Encode(#[from] image::ImageError),
}

/// An RGB color written as six hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    /// Parse `"rrggbb"`
    pub fn parse(value: &str) -> Result<Self, RenderError> {
        let invalid = || RenderError::InvalidColor {
            value: value.to_string(),
        };

        if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&value[i..i + 2], 16).map_err(|_| invalid());

        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

impl FromStr for HexColor {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Everything needed to render a title card
#[derive(Debug, Clone)]
pub struct TitleCardSpec {
    pub logo: DynamicImage,
    pub text: String,
    pub foreground: HexColor,
    pub background: HexColor,
    pub width: u32,
    pub height: u32,
}

/// A rendered title card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pixels: RgbaImage,
}

impl RenderedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Raw pixel buffer
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Encode as PNG in memory
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// Write as a PNG file
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.pixels.save_with_format(path, ImageFormat::Png)
    }
}

/// Render a title card from already-parsed colors
pub fn render_title_card(spec: &TitleCardSpec) -> Result<RenderedImage, RenderError> {
    let (width, height) = (spec.width, spec.height);
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }

    let mut canvas = RgbaImage::from_pixel(width, height, spec.background.to_rgba());

    let margin = (width.min(height) / 16).max(1);
    let logo_box = (width / 3).min(height).saturating_sub(2 * margin);

    let text_left = if logo_box > 0 {
        let logo = fit_logo(&spec.logo, logo_box);
        let x = margin;
        let y = (height - logo.height()) / 2;
        imageops::overlay(&mut canvas, &logo, i64::from(x), i64::from(y));
        2 * margin + logo_box
    } else {
        margin
    };

    let region = Region {
        x: text_left,
        y: margin,
        width: width.saturating_sub(margin).saturating_sub(text_left),
        height: height.saturating_sub(2 * margin),
    };
    let max_scale = (height / 80).max(1);
    let laid_out = text::layout(&spec.text, region, max_scale);
    text::draw(&mut canvas, &laid_out, region, spec.foreground.to_rgba());

    Ok(RenderedImage { pixels: canvas })
}

/// Render a title card from hex color strings, validating them first
pub fn render_title_card_hex(
    logo: DynamicImage,
    text: &str,
    fg: &str,
    bg: &str,
    width: u32,
    height: u32,
) -> Result<RenderedImage, RenderError> {
    let spec = TitleCardSpec {
        logo,
        text: text.to_string(),
        foreground: HexColor::parse(fg)?,
        background: HexColor::parse(bg)?,
        width,
        height,
    };
    render_title_card(&spec)
}

/// Scale the logo to fit a `side × side` box, keeping its aspect ratio
fn fit_logo(logo: &DynamicImage, side: u32) -> RgbaImage {
    let rgba = logo.to_rgba8();
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return RgbaImage::new(0, 0);
    }

    let (new_w, new_h) = if w >= h {
        (side, ((u64::from(h) * u64::from(side)) / u64::from(w)).max(1) as u32)
    } else {
        (((u64::from(w) * u64::from(side)) / u64::from(h)).max(1) as u32, side)
    };

    if (new_w, new_h) == (w, h) {
        return rgba;
    }
    imageops::resize(&rgba, new_w, new_h, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgba<u8> = Rgba([0x00, 0x96, 0x88, 255]);
    const FG: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 255]);

    fn logo() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([200, 10, 10, 255])))
    }

    fn render(text: &str, width: u32, height: u32) -> Result<RenderedImage, RenderError> {
        render_title_card_hex(logo(), text, "ffffff", "009688", width, height)
    }

    #[test]
    fn test_hex_color_parsing() {
        assert_eq!(
            HexColor::parse("009688").unwrap(),
            HexColor {
                r: 0x00,
                g: 0x96,
                b: 0x88
            }
        );
        assert_eq!(HexColor::parse("FFfFff").unwrap().to_string(), "ffffff");
        for bad in ["", "fff", "#009688", "00968", "0096888", "gg0000", "00 968"] {
            assert!(
                matches!(HexColor::parse(bad), Err(RenderError::InvalidColor { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_output_has_requested_dimensions() {
        for (w, h) in [(1200, 800), (1, 1), (7, 3), (320, 1000)] {
            let image = render("5: Test", w, h).unwrap();
            assert_eq!((image.width(), image.height()), (w, h));
        }
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            render("x", 0, 10),
            Err(RenderError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            render("x", 10, 0),
            Err(RenderError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_invalid_colors_rejected() {
        assert!(matches!(
            render_title_card_hex(logo(), "x", "zzzzzz", "009688", 10, 10),
            Err(RenderError::InvalidColor { .. })
        ));
        assert!(matches!(
            render_title_card_hex(logo(), "x", "ffffff", "0096", 10, 10),
            Err(RenderError::InvalidColor { .. })
        ));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = render("42: Launch day for the new thing", 1200, 800).unwrap();
        let b = render("42: Launch day for the new thing", 1200, 800).unwrap();
        assert_eq!(a.to_png_bytes().unwrap(), b.to_png_bytes().unwrap());
    }

    #[test]
    fn test_layout_places_background_logo_and_text() {
        let image = render("5: Test", 1200, 800).unwrap();
        let pixels = image.pixels();

        // Corners keep the background.
        assert_eq!(*pixels.get_pixel(0, 0), BG);
        assert_eq!(*pixels.get_pixel(1199, 799), BG);

        // Logo box is 400 - 2*50 = 300 wide starting at the margin; a 2:1
        // logo becomes 300x150, vertically centered.
        let logo_pixel = pixels.get_pixel(50 + 150, 400);
        assert!(logo_pixel[0] > 150 && logo_pixel[1] < 50, "{:?}", logo_pixel);
        assert_eq!(*pixels.get_pixel(50 + 150, 300), BG);

        // Text is drawn to the right of the logo only.
        let text_pixels = pixels
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == FG)
            .collect::<Vec<_>>();
        assert!(!text_pixels.is_empty());
        assert!(text_pixels.iter().all(|(x, _, _)| *x >= 400 && *x < 1150));
    }

    #[test]
    fn test_long_text_does_not_error() {
        let text = "word ".repeat(500);
        let image = render(&text, 200, 100).unwrap();
        assert_eq!((image.width(), image.height()), (200, 100));
    }

    #[test]
    fn test_different_text_gives_different_image() {
        let a = render("1: One", 600, 400).unwrap();
        let b = render("2: Two", 600, 400).unwrap();
        assert_ne!(a, b);
    }
}
