//! Page model → tiny-skia drawing commands.
//!
//! Walks a page's widgets in z-order and paints each one with its
//! transform, scaled by the export multiplier.

use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, PxScale, PxScaleFont, ScaleFont};
use bm_core::geometry::widget_affine;
use bm_core::model::*;
use image::DynamicImage;
use kurbo::Affine;
use std::collections::HashMap;
use tiny_skia::{
    FillRule, FilterQuality, IntSize, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    StrokeDash, Transform as SkTransform,
};

pub(crate) struct PaintContext<'a> {
    pub multiplier: f32,
    pub images: &'a HashMap<String, DynamicImage>,
    pub font: Option<&'a FontArc>,
}

/// Paint the page background and every widget.
pub(crate) fn paint_page(pixmap: &mut Pixmap, page: &Page, ctx: &PaintContext<'_>) {
    pixmap.fill(sk_color(page.background, 1.0));

    let prepared: HashMap<&str, Pixmap> = ctx
        .images
        .iter()
        .filter_map(|(src, img)| Some((src.as_str(), to_pixmap(img)?)))
        .collect();

    for widget in &page.widgets {
        let base = widget_transform(&widget.transform, ctx.multiplier);
        match widget.kind {
            WidgetKind::Line => paint_line(pixmap, widget, base),
            WidgetKind::Image => {
                let image = widget.content.as_deref().and_then(|src| prepared.get(src));
                match image {
                    Some(image) => paint_image(pixmap, widget, image, base),
                    None => log::trace!("IMAGE @{} has no source", widget.id),
                }
            }
            WidgetKind::Text => match ctx.font {
                Some(font) => paint_text(pixmap, widget, font, base),
                None => log::trace!(
                    "TEXT @{} {:?} skipped, no font loaded",
                    widget.id,
                    widget.content
                ),
            },
        }
    }
}

fn widget_transform(t: &Transform, multiplier: f32) -> SkTransform {
    let affine = Affine::scale(multiplier as f64) * widget_affine(t);
    let [a, b, c, d, e, f] = affine.as_coeffs();
    SkTransform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn sk_color(c: Color, opacity: f32) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        c.r.clamp(0.0, 1.0),
        c.g.clamp(0.0, 1.0),
        c.b.clamp(0.0, 1.0),
        (c.a * opacity).clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

fn solid(c: Color, opacity: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(sk_color(c, opacity));
    paint.anti_alias = true;
    paint
}

// ─── Shape painters ──────────────────────────────────────────────────────

fn paint_line(pixmap: &mut Pixmap, widget: &Widget, base: SkTransform) {
    let (w, h) = widget.transform.scaled_size();
    let s = &widget.style;
    log::trace!("LINE @{} {}x{}", widget.id, w, h);

    let mut pb = PathBuilder::new();
    pb.move_to(0.0, 0.0);
    pb.line_to(w as f32, h as f32);
    let Some(path) = pb.finish() else {
        return;
    };

    let width = s.stroke_width.unwrap_or(1.0).max(0.0);
    if width == 0.0 {
        return;
    }
    let dash = s
        .stroke_dash
        .as_ref()
        .filter(|d| !d.is_empty())
        .and_then(|d| StrokeDash::new(d.to_vec(), 0.0));
    let stroke = Stroke {
        width,
        line_cap: LineCap::Butt,
        dash,
        ..Stroke::default()
    };
    let paint = solid(s.stroke.unwrap_or(Color::BLACK), widget.opacity());
    pixmap.stroke_path(&path, &paint, &stroke, base, None);
}

fn paint_image(pixmap: &mut Pixmap, widget: &Widget, image: &Pixmap, base: SkTransform) {
    let (w, h) = widget.transform.scaled_size();
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    log::trace!(
        "IMAGE @{} {}x{} into {}x{}",
        widget.id,
        image.width(),
        image.height(),
        w,
        h
    );
    // Stretch the bitmap over the widget box.
    let fit = SkTransform::from_scale(
        (w / image.width() as f64) as f32,
        (h / image.height() as f64) as f32,
    );
    let paint = PixmapPaint {
        opacity: widget.opacity(),
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, base.pre_concat(fit), None);
}

/// Convert decoded pixels to a premultiplied pixmap.
fn to_pixmap(img: &DynamicImage) -> Option<Pixmap> {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, IntSize::from_wh(w, h)?)
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Slant applied when the font has no italic face of its own.
const FAUX_ITALIC_SKEW: f32 = -0.2;

fn paint_text(pixmap: &mut Pixmap, widget: &Widget, font: &FontArc, base: SkTransform) {
    let Some(content) = widget.content.as_deref() else {
        return;
    };
    let s = &widget.style;
    let size = s.font_size.unwrap_or(DEFAULT_FONT_SIZE).max(1.0);
    let scaled = font.as_scaled(em_scale(font, size));
    let box_width = (widget.transform.width * widget.transform.scale_x) as f32;
    let line_height = size * LINE_HEIGHT as f32;

    let lines = wrap_text(content, box_width, |text| measure(&scaled, text));
    log::trace!(
        "TEXT @{} {} lines at {}px",
        widget.id,
        lines.len(),
        size
    );

    let mut pb = PathBuilder::new();
    for (i, line) in lines.iter().enumerate() {
        let line_width = measure(&scaled, line);
        let x = match s.text_align.unwrap_or(TextAlign::Left) {
            TextAlign::Center => (box_width - line_width) / 2.0,
            TextAlign::Right => box_width - line_width,
            TextAlign::Left | TextAlign::Justify => 0.0,
        };
        let baseline = i as f32 * line_height + (line_height - size) / 2.0 + scaled.ascent();
        push_glyphs(&mut pb, font, &scaled, line, x, baseline);
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let transform = if s.font_style == Some(FontSlant::Italic) {
        base.pre_concat(SkTransform::from_skew(FAUX_ITALIC_SKEW, 0.0))
    } else {
        base
    };
    let paint = solid(s.fill.unwrap_or(Color::BLACK), widget.opacity());
    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
    if s.font_weight == Some(FontWeight::Bold) {
        let stroke = Stroke {
            width: size * 0.04,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, transform, None);
    }
}

/// Pixel scale for a CSS font size, which is measured in em units.
fn em_scale(font: &FontArc, size: f32) -> PxScale {
    let upem = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size * font.height_unscaled() / upem)
}

fn measure(scaled: &PxScaleFont<&FontArc>, text: &str) -> f32 {
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

fn push_glyphs(
    pb: &mut PathBuilder,
    font: &FontArc,
    scaled: &PxScaleFont<&FontArc>,
    text: &str,
    x: f32,
    baseline: f32,
) {
    let factor = scaled.scale_factor();
    let mut pen = x;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            pen += scaled.kern(p, id);
        }
        if let Some(outline) = font.outline(id) {
            // Font units are y-up; the page is y-down.
            let map = |p: ab_glyph::Point| {
                (pen + p.x * factor.horizontal, baseline - p.y * factor.vertical)
            };
            let mut last: Option<ab_glyph::Point> = None;
            for curve in &outline.curves {
                let start = match curve {
                    OutlineCurve::Line(a, _)
                    | OutlineCurve::Quad(a, _, _)
                    | OutlineCurve::Cubic(a, _, _, _) => *a,
                };
                if last != Some(start) {
                    if last.is_some() {
                        pb.close();
                    }
                    let (sx, sy) = map(start);
                    pb.move_to(sx, sy);
                }
                let end = match curve {
                    OutlineCurve::Line(_, b) => {
                        let (bx, by) = map(*b);
                        pb.line_to(bx, by);
                        *b
                    }
                    OutlineCurve::Quad(_, c, b) => {
                        let ((cx, cy), (bx, by)) = (map(*c), map(*b));
                        pb.quad_to(cx, cy, bx, by);
                        *b
                    }
                    OutlineCurve::Cubic(_, c1, c2, b) => {
                        let ((x1, y1), (x2, y2), (bx, by)) = (map(*c1), map(*c2), map(*b));
                        pb.cubic_to(x1, y1, x2, y2, bx, by);
                        *b
                    }
                };
                last = Some(end);
            }
            if last.is_some() {
                pb.close();
            }
        }
        pen += scaled.h_advance(id);
        prev = Some(id);
    }
}

/// Greedy word wrap to `max_width`. Explicit newlines always break; a
/// single word wider than the box is kept on its own line.
pub(crate) fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("Avisos da semana paroquial", 10.0, chars);
        assert_eq!(lines, vec!["Avisos da", "semana", "paroquial"]);
    }

    #[test]
    fn newlines_always_break() {
        let lines = wrap_text("Missa\n\nDomingo 10h", 100.0, chars);
        assert_eq!(lines, vec!["Missa", "", "Domingo 10h"]);
    }

    #[test]
    fn long_word_keeps_its_own_line() {
        let lines = wrap_text("a Pneumoultramicroscopico b", 5.0, chars);
        assert_eq!(lines, vec!["a", "Pneumoultramicroscopico", "b"]);
    }

    #[test]
    fn transform_scales_with_multiplier() {
        let t = Transform::new(10.0, 20.0, 5.0, 5.0);
        let sk = widget_transform(&t, 2.0);
        assert_eq!((sk.tx, sk.ty), (20.0, 40.0));
        assert_eq!((sk.sx, sk.sy), (2.0, 2.0));
    }

    #[test]
    fn transparent_pixels_are_premultiplied() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba([200, 100, 50, 0]),
        ));
        let pm = to_pixmap(&img).unwrap();
        let px = pm.pixels()[0];
        assert_eq!((px.red(), px.alpha()), (0, 0));
    }
}
