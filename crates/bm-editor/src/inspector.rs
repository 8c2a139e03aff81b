//! Property inspector bridge.
//!
//! The host's inspector panel reads flat JSON property bags and writes
//! single `key = value` edits back as strings, the way a form control
//! reports them. Edits become [`WidgetPatch`]es applied through the
//! session, so identical values never create history entries.

use crate::document::WidgetPatch;
use crate::error::EditorError;
use crate::session::EditorSession;
use bm_core::model::*;
use bm_core::{parse_color, parse_dash};
use serde_json::{Map, Value, json};

// ─── Read ────────────────────────────────────────────────────────────────

/// Flat property bag for a widget.
pub fn widget_props(widget: &Widget) -> Value {
    let t = &widget.transform;
    let s = &widget.style;
    let mut props = Map::new();
    props.insert("id".into(), Value::String(widget.id.as_str().to_string()));
    props.insert("kind".into(), widget.kind.as_str().into());
    props.insert("x".into(), json!(t.x));
    props.insert("y".into(), json!(t.y));
    props.insert("width".into(), json!(t.width * t.scale_x));
    props.insert("height".into(), json!(t.height * t.scale_y));
    props.insert("angle".into(), json!(t.angle));
    props.insert("opacity".into(), json!(widget.opacity()));

    match widget.kind {
        WidgetKind::Text => {
            if let Some(content) = &widget.content {
                props.insert("content".into(), Value::String(content.clone()));
            }
            let family = s.font_family.as_deref().unwrap_or(DEFAULT_FONT_FAMILY);
            props.insert("fontFamily".into(), family.into());
            props.insert(
                "fontSize".into(),
                json!(s.font_size.unwrap_or(DEFAULT_FONT_SIZE)),
            );
            let bold = s.font_weight == Some(FontWeight::Bold);
            props.insert("fontWeight".into(), if bold { "bold" } else { "normal" }.into());
            let italic = s.font_style == Some(FontSlant::Italic);
            props.insert("fontStyle".into(), if italic { "italic" } else { "normal" }.into());
            props.insert(
                "fill".into(),
                Value::String(s.fill.unwrap_or(Color::BLACK).to_hex()),
            );
            props.insert(
                "textAlign".into(),
                s.text_align.unwrap_or(TextAlign::Left).as_str().into(),
            );
        }
        WidgetKind::Image => {
            if let Some(src) = &widget.content {
                props.insert("src".into(), Value::String(src.clone()));
            }
        }
        WidgetKind::Line => {
            props.insert(
                "stroke".into(),
                Value::String(s.stroke.unwrap_or(Color::BLACK).to_hex()),
            );
            props.insert("strokeWidth".into(), json!(s.stroke_width.unwrap_or(1.0)));
            let dash = s
                .stroke_dash
                .as_ref()
                .map(|d| d.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
                .unwrap_or_default();
            props.insert("strokeDash".into(), Value::String(dash));
        }
    }
    Value::Object(props)
}

/// Flat property bag for a page.
pub fn page_props(page: &Page) -> Value {
    json!({
        "id": page.id.as_str(),
        "title": page.title,
        "backgroundColor": page.background.to_hex(),
        "marginTop": page.margins.top,
        "marginRight": page.margins.right,
        "marginBottom": page.margins.bottom,
        "marginLeft": page.margins.left,
        "widgetCount": page.widgets.len(),
    })
}

// ─── Write ───────────────────────────────────────────────────────────────

/// Translate one inspector edit into a patch for `widget`.
pub fn patch_for_prop(widget: &Widget, key: &str, value: &str) -> Result<WidgetPatch, EditorError> {
    let mut patch = WidgetPatch::default();
    let text_only = || {
        if widget.is_text() {
            Ok(())
        } else {
            Err(invalid(key, "only text widgets have this property"))
        }
    };
    match key {
        "x" => patch.x = Some(number(key, value)?),
        "y" => patch.y = Some(number(key, value)?),
        // The inspector shows scaled sizes; writing one bakes the scale in.
        "width" => {
            patch.width = Some(non_negative(key, value)?);
            patch.scale_x = Some(1.0);
        }
        "height" => {
            patch.height = Some(non_negative(key, value)?);
            patch.scale_y = Some(1.0);
        }
        "angle" => patch.angle = Some(number(key, value)?.rem_euclid(360.0)),
        "opacity" => {
            let o = number(key, value)?;
            if !(0.0..=1.0).contains(&o) {
                return Err(invalid(key, "expected a value between 0 and 1"));
            }
            patch.style.opacity = Some(o as f32);
        }
        "content" => {
            text_only()?;
            patch.content = Some(value.to_string());
        }
        "src" => {
            if widget.kind != WidgetKind::Image {
                return Err(invalid(key, "only image widgets have a source"));
            }
            patch.content = Some(value.to_string());
        }
        "fontFamily" => {
            text_only()?;
            let family = value.trim();
            if family.is_empty() {
                return Err(invalid(key, "font family cannot be empty"));
            }
            patch.style.font_family = Some(family.to_string());
        }
        "fontSize" => {
            text_only()?;
            let size = number(key, value)?;
            if size <= 0.0 {
                return Err(invalid(key, "font size must be positive"));
            }
            patch.style.font_size = Some(size as f32);
        }
        "fontWeight" => {
            text_only()?;
            let weight = FontWeight::from_name(value)
                .ok_or_else(|| invalid(key, "expected `normal`, `bold` or a numeric weight"))?;
            patch.style.font_weight = Some(weight);
        }
        "fontStyle" => {
            text_only()?;
            let slant = FontSlant::from_name(value)
                .ok_or_else(|| invalid(key, "expected `normal` or `italic`"))?;
            patch.style.font_style = Some(slant);
        }
        "textAlign" => {
            text_only()?;
            let align = TextAlign::from_name(value)
                .ok_or_else(|| invalid(key, "expected left, center, right or justify"))?;
            patch.style.text_align = Some(align);
        }
        "fill" => patch.style.fill = Some(parse_color(value)?),
        "stroke" => patch.style.stroke = Some(parse_color(value)?),
        "strokeWidth" => patch.style.stroke_width = Some(non_negative(key, value)? as f32),
        "strokeDash" => patch.style.stroke_dash = Some(parse_dash(value)?),
        _ => return Err(invalid(key, "unknown property")),
    }
    Ok(patch)
}

/// Apply an inspector edit to the selected widget. Returns whether the
/// document changed.
pub fn set_widget_prop(
    session: &mut EditorSession,
    key: &str,
    value: &str,
) -> Result<bool, EditorError> {
    let id = session.selected_widget().ok_or(EditorError::NoSelection)?;
    let widget = session
        .document()
        .widget(id)
        .ok_or(EditorError::UnknownWidget(id))?;
    let patch = patch_for_prop(widget, key, value)?;
    Ok(session.update_widget(id, &patch))
}

/// Apply an inspector edit to the active page.
pub fn set_page_prop(
    session: &mut EditorSession,
    key: &str,
    value: &str,
) -> Result<bool, EditorError> {
    let Some(page_id) = session.document().active_page_id() else {
        return Ok(false);
    };
    let side = match key {
        "title" => return Ok(session.rename_page(page_id, value)),
        "backgroundColor" => return Ok(session.set_page_background(page_id, parse_color(value)?)),
        "linkVertical" | "linkHorizontal" => {
            let on = value
                .parse::<bool>()
                .map_err(|_| invalid(key, "expected true or false"))?;
            let mut link = session.view().margin_link();
            if key == "linkVertical" {
                link.vertical = on;
            } else {
                link.horizontal = on;
            }
            session.set_margin_link(link);
            return Ok(false);
        }
        "marginTop" => MarginSide::Top,
        "marginRight" => MarginSide::Right,
        "marginBottom" => MarginSide::Bottom,
        "marginLeft" => MarginSide::Left,
        _ => return Err(invalid(key, "unknown property")),
    };
    Ok(session.edit_margin(side, number(key, value)?))
}

fn invalid(key: &str, reason: &str) -> EditorError {
    EditorError::InvalidProp {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn number(key: &str, value: &str) -> Result<f64, EditorError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(key, "expected a number"))
}

fn non_negative(key: &str, value: &str) -> Result<f64, EditorError> {
    let v = number(key, value)?;
    if v < 0.0 {
        return Err(invalid(key, "expected a non-negative number"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text() -> Widget {
        Widget::with_defaults(bm_core::WidgetId::intern("inspector_text"), WidgetKind::Text)
    }

    #[test]
    fn text_props_expose_font() {
        let props = widget_props(&text());
        assert_eq!(props["kind"], "text");
        assert_eq!(props["fontFamily"], "Arial");
        assert_eq!(props["fontSize"], 16.0);
        assert_eq!(props["fill"], "#000000");
    }

    #[test]
    fn font_size_patch() {
        let patch = patch_for_prop(&text(), "fontSize", "40").unwrap();
        assert_eq!(patch.style.font_size, Some(40.0));
    }

    #[test]
    fn text_props_refused_on_lines() {
        let line = Widget::with_defaults(bm_core::WidgetId::intern("inspector_line"), WidgetKind::Line);
        assert!(matches!(
            patch_for_prop(&line, "fontSize", "12"),
            Err(EditorError::InvalidProp { .. })
        ));
        let patch = patch_for_prop(&line, "strokeDash", "5,5").unwrap();
        assert_eq!(patch.style.stroke_dash.unwrap().as_slice(), &[5.0, 5.0]);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(patch_for_prop(&text(), "x", "abc").is_err());
        assert!(patch_for_prop(&text(), "opacity", "1.5").is_err());
        assert!(matches!(
            patch_for_prop(&text(), "fill", "#zzz"),
            Err(EditorError::Core(_))
        ));
        assert!(patch_for_prop(&text(), "bogus", "1").is_err());
    }

    #[test]
    fn page_margin_edit_respects_link() {
        let mut session = EditorSession::default();
        set_page_prop(&mut session, "linkVertical", "true").unwrap();
        assert!(set_page_prop(&mut session, "marginTop", "35").unwrap());
        let page = session.document().active_page().unwrap();
        assert_eq!((page.margins.top, page.margins.bottom), (35.0, 35.0));
    }

    #[test]
    fn stroke_dash_edit_on_selected_line() {
        let mut session = EditorSession::default();
        let id = session.add_widget(WidgetKind::Line).unwrap();
        assert!(set_widget_prop(&mut session, "strokeDash", "[4 2]").unwrap());
        let line = session.document().widget(id).unwrap();
        assert_eq!(line.style.stroke_dash.as_deref(), Some(&[4.0, 2.0][..]));
        assert_eq!(widget_props(line)["strokeDash"], "4,2");

        assert!(set_widget_prop(&mut session, "strokeDash", "").unwrap());
        let line = session.document().widget(id).unwrap();
        assert_eq!(line.style.stroke_dash.as_deref(), Some(&[][..]));
    }

    #[test]
    fn widget_prop_needs_selection() {
        let mut session = EditorSession::default();
        assert!(matches!(
            set_widget_prop(&mut session, "x", "10"),
            Err(EditorError::NoSelection)
        ));
    }
}
