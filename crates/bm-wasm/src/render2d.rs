//! Canvas2D page thumbnails for the page strip.
//!
//! A quick approximation of a page: text with the browser's own fonts,
//! lines as strokes, and images as placeholder boxes. Exports use the
//! tiny-skia rasterizer instead.

use bm_core::geometry::widget_affine;
use bm_core::model::*;
use kurbo::Affine;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const PLACEHOLDER_FILL: &str = "rgba(142, 142, 147, 0.12)";
const PLACEHOLDER_BORDER: &str = "#86868B";

pub fn css_color(c: Color, opacity: f32) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {})",
        channel(c.r),
        channel(c.g),
        channel(c.b),
        (c.a * opacity).clamp(0.0, 1.0)
    )
}

/// CSS `font` shorthand for a text widget.
pub fn css_font(style: &WidgetStyle, scale: f64) -> String {
    let slant = match style.font_style {
        Some(FontSlant::Italic) => "italic",
        _ => "normal",
    };
    let weight = match style.font_weight {
        Some(FontWeight::Bold) => "bold",
        _ => "normal",
    };
    let size = style.font_size.unwrap_or(DEFAULT_FONT_SIZE) as f64 * scale;
    let family = style.font_family.as_deref().unwrap_or(DEFAULT_FONT_FAMILY);
    format!("{slant} {weight} {size}px {family}")
}

/// Paint `page` at `scale` into the top-left of the context.
pub fn render_page(
    ctx: &CanvasRenderingContext2d,
    page: &Page,
    config: &CanvasConfig,
    scale: f64,
) -> Result<(), JsValue> {
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.set_fill_style_str(&css_color(page.background, 1.0));
    ctx.fill_rect(0.0, 0.0, config.width * scale, config.height * scale);

    for widget in &page.widgets {
        let [a, b, c, d, e, f] = (Affine::scale(scale) * widget_affine(&widget.transform)).as_coeffs();
        ctx.save();
        ctx.set_transform(a, b, c, d, e, f)?;
        ctx.set_global_alpha(widget.opacity() as f64);
        match widget.kind {
            WidgetKind::Text => draw_text(ctx, widget)?,
            WidgetKind::Line => draw_line(ctx, widget)?,
            WidgetKind::Image => draw_placeholder(ctx, widget),
        }
        ctx.restore();
    }
    Ok(())
}

fn draw_text(ctx: &CanvasRenderingContext2d, widget: &Widget) -> Result<(), JsValue> {
    let Some(content) = widget.content.as_deref() else {
        return Ok(());
    };
    let style = &widget.style;
    let (width, _) = widget.transform.scaled_size();
    let size = style.font_size.unwrap_or(DEFAULT_FONT_SIZE) as f64;
    let line_height = size * LINE_HEIGHT;

    ctx.set_font(&css_font(style, 1.0));
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str(&css_color(style.fill.unwrap_or(Color::BLACK), 1.0));
    let (align, x) = match style.text_align.unwrap_or(TextAlign::Left) {
        TextAlign::Center => ("center", width / 2.0),
        TextAlign::Right => ("right", width),
        TextAlign::Left | TextAlign::Justify => ("left", 0.0),
    };
    ctx.set_text_align(align);
    for (i, line) in content.split('\n').enumerate() {
        log::trace!("TEXT @{} line {i}", widget.id);
        ctx.fill_text(line, x, (i as f64 + 0.5) * line_height)?;
    }
    Ok(())
}

fn draw_line(ctx: &CanvasRenderingContext2d, widget: &Widget) -> Result<(), JsValue> {
    let style = &widget.style;
    let (w, h) = widget.transform.scaled_size();
    let dash = js_sys::Array::new();
    for d in style.stroke_dash.iter().flatten() {
        dash.push(&JsValue::from_f64(*d as f64));
    }
    ctx.set_line_dash(&dash)?;
    ctx.set_line_width(style.stroke_width.unwrap_or(1.0) as f64);
    ctx.set_stroke_style_str(&css_color(style.stroke.unwrap_or(Color::BLACK), 1.0));
    ctx.begin_path();
    ctx.move_to(0.0, 0.0);
    ctx.line_to(w, h);
    ctx.stroke();
    Ok(())
}

fn draw_placeholder(ctx: &CanvasRenderingContext2d, widget: &Widget) {
    let (w, h) = widget.transform.scaled_size();
    ctx.set_fill_style_str(PLACEHOLDER_FILL);
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.set_stroke_style_str(PLACEHOLDER_BORDER);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(0.0, 0.0, w, h);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_keeps_alpha() {
        assert_eq!(
            css_color(Color::from_rgb8(255, 0, 128), 0.5),
            "rgba(255, 0, 128, 0.5)"
        );
    }

    #[test]
    fn font_shorthand() {
        let style = WidgetStyle {
            font_size: Some(20.0),
            font_weight: Some(FontWeight::Bold),
            font_style: Some(FontSlant::Italic),
            font_family: Some("Georgia".into()),
            ..WidgetStyle::default()
        };
        assert_eq!(css_font(&style, 0.5), "italic bold 10px Georgia");
        assert_eq!(css_font(&WidgetStyle::default(), 1.0), "normal normal 16px Arial");
    }
}
