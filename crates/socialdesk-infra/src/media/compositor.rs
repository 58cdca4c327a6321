//! Carousel slide rendering with the `image` crate.
//!
//! A slide is a background (cover-fit photo under a darkening scrim, or a
//! diagonal gradient) with a wrapped headline, optional body text, and an
//! optional footer label. Text needs a TTF/OTF font; without one, slides
//! are rendered without text.

use std::io::Cursor;
use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};

use socialdesk_core::service::storage::SlideRenderer;
use socialdesk_types::error::MediaError;
use socialdesk_types::media::{Rgb, SlideSpec};

/// Brightness multiplier applied over photo backgrounds.
const SCRIM: f32 = 0.55;

pub struct ImageSlideRenderer {
    font: Option<FontArc>,
}

impl ImageSlideRenderer {
    /// Renderer without a font. Slides get backgrounds only.
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font_bytes(bytes: Vec<u8>) -> Result<Self, MediaError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| MediaError::Render(format!("invalid font: {e}")))?;
        Ok(Self { font: Some(font) })
    }

    pub fn from_font_path(path: &Path) -> Result<Self, MediaError> {
        let bytes = std::fs::read(path)
            .map_err(|e| MediaError::Render(format!("cannot read font {}: {e}", path.display())))?;
        Self::with_font_bytes(bytes)
    }

    /// Use `path` when given and loadable, otherwise fall back to no font.
    pub fn from_optional_font(path: Option<&Path>) -> Self {
        match path.map(Self::from_font_path) {
            Some(Ok(renderer)) => renderer,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "slide font unavailable, rendering without text");
                Self::new()
            }
            None => Self::new(),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn draw_text(&self, canvas: &mut RgbImage, spec: &SlideSpec) {
        let Some(font) = &self.font else {
            tracing::debug!("no font configured, skipping slide text");
            return;
        };
        let (w, h) = (spec.width as f32, spec.height as f32);
        let margin = w * 0.08;
        let max_width = w - 2.0 * margin;
        let color = spec.text_color;

        let headline_scale = PxScale::from(h * 0.075);
        let body_scale = PxScale::from(h * 0.042);

        let mut y = h * 0.18;
        for line in wrap_text(&spec.headline, max_width, |s| measure(font, headline_scale, s)) {
            y += font.as_scaled(headline_scale).ascent();
            if y > h - margin {
                break;
            }
            draw_line(canvas, font, headline_scale, margin, y, &line, color);
            y += -font.as_scaled(headline_scale).descent() + font.as_scaled(headline_scale).line_gap() + h * 0.01;
        }

        if let Some(body) = spec.body.as_deref().filter(|b| !b.trim().is_empty()) {
            y += h * 0.04;
            for line in wrap_text(body, max_width, |s| measure(font, body_scale, s)) {
                y += font.as_scaled(body_scale).ascent();
                if y > h - margin {
                    break;
                }
                draw_line(canvas, font, body_scale, margin, y, &line, color);
                y += -font.as_scaled(body_scale).descent() + h * 0.012;
            }
        }

        if let Some(footer) = spec.footer.as_deref() {
            let scale = PxScale::from(h * 0.03);
            let x = w - margin - measure(font, scale, footer);
            draw_line(canvas, font, scale, x, h - margin * 0.6, footer, color);
        }
    }
}

impl Default for ImageSlideRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideRenderer for ImageSlideRenderer {
    fn render(&self, spec: &SlideSpec) -> Result<Vec<u8>, MediaError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(MediaError::Validation("slide size must be non-zero".to_string()));
        }

        let photo = spec.background.as_deref().and_then(|bytes| match image::load_from_memory(bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!(error = %e, "undecodable slide background, using gradient");
                None
            }
        });

        let mut canvas = match photo {
            Some(img) => {
                let mut canvas = img
                    .resize_to_fill(spec.width, spec.height, FilterType::Triangle)
                    .to_rgb8();
                darken(&mut canvas, SCRIM);
                canvas
            }
            None => gradient_image(spec.width, spec.height, spec.gradient_from, spec.gradient_to),
        };

        self.draw_text(&mut canvas, spec);
        encode_png(canvas)
    }

    fn gradient(&self, width: u32, height: u32, from: Rgb, to: Rgb) -> Result<Vec<u8>, MediaError> {
        if width == 0 || height == 0 {
            return Err(MediaError::Validation("image size must be non-zero".to_string()));
        }
        encode_png(gradient_image(width, height, from, to))
    }
}

/// Diagonal gradient: `from` at the top-left corner, `to` at the bottom-right.
fn gradient_image(width: u32, height: u32, from: Rgb, to: Rgb) -> RgbImage {
    let span = (width + height).saturating_sub(2).max(1) as f32;
    RgbImage::from_fn(width, height, |x, y| {
        let t = (x + y) as f32 / span;
        image::Rgb([lerp(from.0, to.0, t), lerp(from.1, to.1, t), lerp(from.2, to.2, t)])
    })
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

fn darken(canvas: &mut RgbImage, factor: f32) {
    for pixel in canvas.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * factor) as u8;
        }
    }
}

fn encode_png(canvas: RgbImage) -> Result<Vec<u8>, MediaError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| MediaError::Render(e.to_string()))?;
    Ok(out.into_inner())
}

/// Advance width of `text` at `scale`, including kerning.
fn measure(font: &FontArc, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut previous = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

/// Draw one line with its baseline at `baseline`, alpha-blending glyph
/// coverage into the canvas.
fn draw_line(canvas: &mut RgbImage, font: &FontArc, scale: PxScale, x: f32, baseline: f32, text: &str, color: Rgb) {
    let scaled = font.as_scaled(scale);
    let (cw, ch) = canvas.dimensions();
    let mut caret = x;
    let mut previous = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i64 + gx as i64;
            let py = bounds.min.y as i64 + gy as i64;
            if px < 0 || py < 0 || px >= cw as i64 || py >= ch as i64 {
                return;
            }
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            let c = coverage.clamp(0.0, 1.0);
            let target = [color.0, color.1, color.2];
            for (channel, t) in pixel.0.iter_mut().zip(target) {
                *channel = (*channel as f32 * (1.0 - c) + t as f32 * c).round() as u8;
            }
        });
    }
}

/// Greedy word wrap. Explicit newlines are kept; a word wider than
/// `max_width` on its own is broken between characters.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if measure(word) <= max_width {
                current = word.to_string();
                continue;
            }

            for c in word.chars() {
                let mut next = current.clone();
                next.push(c);
                if measure(&next) > max_width && !current.is_empty() {
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                } else {
                    current = next;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    fn spec(background: Option<Vec<u8>>) -> SlideSpec {
        SlideSpec {
            width: 120,
            height: 80,
            headline: "Spring menu".to_string(),
            body: Some("Three new drinks".to_string()),
            background,
            gradient_from: Rgb(255, 0, 0),
            gradient_to: Rgb(0, 0, 255),
            text_color: Rgb(255, 255, 255),
            footer: Some("1/3".to_string()),
        }
    }

    fn decode(png: &[u8]) -> RgbImage {
        image::load_from_memory_with_format(png, ImageFormat::Png).unwrap().to_rgb8()
    }

    #[test]
    fn test_wrap_text_greedy() {
        assert_eq!(
            wrap_text("the quick brown fox jumps", 10.0, chars),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap_text("", 10.0, chars), Vec::<String>::new());
        assert_eq!(wrap_text("one\ntwo three", 20.0, chars), vec!["one", "two three"]);
    }

    #[test]
    fn test_wrap_text_breaks_long_words() {
        assert_eq!(
            wrap_text("hi supercalifragilistic", 8.0, chars),
            vec!["hi", "supercal", "ifragili", "stic"]
        );
    }

    #[test]
    fn test_gradient_corners() {
        let renderer = ImageSlideRenderer::new();
        let img = decode(&renderer.gradient(50, 50, Rgb(255, 0, 0), Rgb(0, 0, 255)).unwrap());
        assert_eq!(img.dimensions(), (50, 50));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(49, 49).0, [0, 0, 255]);
    }

    #[test]
    fn test_render_without_font_uses_gradient() {
        let renderer = ImageSlideRenderer::new();
        assert!(!renderer.has_font());
        let img = decode(&renderer.render(&spec(None)).unwrap());
        assert_eq!(img.dimensions(), (120, 80));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_photo_background_is_cover_fit_and_darkened() {
        let photo = RgbImage::from_pixel(300, 100, image::Rgb([200, 200, 200]));
        let bytes = encode_png(photo).unwrap();
        let img = decode(&ImageSlideRenderer::new().render(&spec(Some(bytes))).unwrap());
        assert_eq!(img.dimensions(), (120, 80));
        assert_eq!(img.get_pixel(60, 40).0, [110, 110, 110]);
    }

    #[test]
    fn test_undecodable_background_falls_back() {
        let img = decode(
            &ImageSlideRenderer::new()
                .render(&spec(Some(b"not an image".to_vec())))
                .unwrap(),
        );
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut s = spec(None);
        s.width = 0;
        assert!(matches!(
            ImageSlideRenderer::new().render(&s),
            Err(MediaError::Validation(_))
        ));
    }

    const FONT: &[u8] = include_bytes!("../../tests/fixtures/DejaVuSansMono.ttf");

    fn with_font() -> ImageSlideRenderer {
        ImageSlideRenderer::with_font_bytes(FONT.to_vec()).unwrap()
    }

    fn large_spec(headline: &str, body: Option<&str>) -> SlideSpec {
        SlideSpec {
            width: 400,
            height: 400,
            headline: headline.to_string(),
            body: body.map(str::to_string),
            footer: None,
            ..spec(None)
        }
    }

    #[test]
    fn test_text_is_drawn_over_background() {
        let renderer = with_font();
        assert!(renderer.has_font());
        let s = large_spec("Spring menu", Some("Three new drinks"));
        let plain = decode(&ImageSlideRenderer::new().render(&s).unwrap());
        let text = decode(&renderer.render(&s).unwrap());

        assert_eq!(text.dimensions(), (400, 400));
        let changed = plain.pixels().zip(text.pixels()).filter(|(a, b)| a != b).count();
        assert!(changed > 100, "only {changed} pixels changed");
        // Text starts inside the left margin.
        assert_eq!(text.get_pixel(5, 100), plain.get_pixel(5, 100));
    }

    #[test]
    fn test_headline_wraps_within_width() {
        let renderer = with_font();
        let s = large_spec("A headline long enough to need several lines", None);
        let plain = decode(&ImageSlideRenderer::new().render(&s).unwrap());
        let text = decode(&renderer.render(&s).unwrap());

        let margin = 32;
        let touched_rows: Vec<u32> = (0..400)
            .filter(|&y| (0..400).any(|x| plain.get_pixel(x, y) != text.get_pixel(x, y)))
            .collect();
        let spread = touched_rows.last().unwrap() - touched_rows.first().unwrap();
        assert!(spread > 60, "text covers only {spread} rows");
        for y in 0..400 {
            for x in (400 - margin + 4)..400 {
                assert_eq!(plain.get_pixel(x, y), text.get_pixel(x, y), "drawn past the right margin at {x},{y}");
            }
        }
    }

    #[test]
    fn test_overlong_text_stops_at_bottom_margin() {
        let renderer = with_font();
        let words = "overflow ".repeat(400);
        let s = large_spec(&words, Some(&words));
        let plain = decode(&ImageSlideRenderer::new().render(&s).unwrap());
        let text = decode(&renderer.render(&s).unwrap());

        assert_eq!(text.dimensions(), (400, 400));
        for y in 380..400 {
            for x in 0..400 {
                assert_eq!(plain.get_pixel(x, y), text.get_pixel(x, y), "drawn into the bottom margin at {x},{y}");
            }
        }
    }

    #[test]
    fn test_invalid_font() {
        assert!(ImageSlideRenderer::with_font_bytes(b"nope".to_vec()).is_err());
        let renderer = ImageSlideRenderer::from_optional_font(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!renderer.has_font());
    }
}
