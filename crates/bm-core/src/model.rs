//! Core document model.
//!
//! A document is an ordered list of pages. Each page owns an ordered list
//! of widgets whose order is the paint (z) order: the last widget is drawn
//! on top. Everything here is plain data: `Clone`, structurally comparable
//! with `PartialEq`, and serializable to the persisted project JSON.

use crate::error::CoreError;
use crate::id::{PageId, WidgetId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0]; serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parse any notation accepted by [`crate::parse::parse_color`].
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        crate::parse::parse_color(s)
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// CSS `rgba()` form, as consumed by Canvas2D fill/stroke styles.
    pub fn to_css(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("rgba({r}, {g}, {b}, {})", self.a)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Widgets ─────────────────────────────────────────────────────────────

/// Stroke dash lengths in pixels; empty means solid.
pub type DashPattern = SmallVec<[f32; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Text,
    Image,
    /// A straight line. Stored as a `shape` whose content is `line`.
    #[serde(rename = "shape", alias = "line")]
    Line,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Text => "text",
            WidgetKind::Image => "image",
            WidgetKind::Line => "line",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(WidgetKind::Text),
            "image" => Some(WidgetKind::Image),
            "line" | "shape" => Some(WidgetKind::Line),
            _ => None,
        }
    }
}

/// Placement of a widget on its page, in canvas pixels.
///
/// The origin is the top-left corner of the unrotated box; `angle` rotates
/// around that corner, in degrees, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
}

fn one() -> f64 {
    1.0
}

impl Transform {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// On-canvas size after scaling.
    pub fn scaled_size(&self) -> (f64, f64) {
        (self.width * self.scale_x, self.height * self.scale_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    Bold,
}

impl FontWeight {
    /// Accepts CSS keywords and numeric weights (600 and up is bold).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" | "lighter" => Some(FontWeight::Normal),
            "bold" | "bolder" => Some(FontWeight::Bold),
            n => n.parse::<u32>().ok().map(Self::from_numeric),
        }
    }

    fn from_numeric(weight: u32) -> Self {
        if weight >= 600 {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        }
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Numeric(u32),
            Name(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Numeric(w) => Ok(FontWeight::from_numeric(w)),
            Raw::Name(name) => FontWeight::from_name(&name)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown font weight `{name}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSlant {
    Normal,
    #[serde(alias = "oblique")]
    Italic,
}

impl FontSlant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" | "" => Some(FontSlant::Normal),
            "italic" | "oblique" => Some(FontSlant::Italic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

/// Kind-dependent style bag. Fields a kind does not use stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontSlant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
    #[serde(
        rename = "strokeDashArray",
        alias = "strokeDash",
        skip_serializing_if = "Option::is_none"
    )]
    pub stroke_dash: Option<DashPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
}

pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_FONT_SIZE: f32 = 16.0;
pub const DEFAULT_TEXT: &str = "Clique para editar";

/// Content marker carried by line shapes.
pub const LINE_CONTENT: &str = "line";

/// Line height multiplier used when laying out text.
pub const LINE_HEIGHT: f64 = 1.16;

/// A placed, styled content element on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: WidgetId,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    #[serde(rename = "position")]
    pub transform: Transform,
    /// Text string for text widgets, image reference (URL or `data:` URL)
    /// for images, [`LINE_CONTENT`] for lines.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub style: WidgetStyle,
}

impl Widget {
    /// Create a widget of `kind` with the defaults used on insertion.
    pub fn with_defaults(id: WidgetId, kind: WidgetKind) -> Self {
        match kind {
            // Centered on the page.
            WidgetKind::Text => Self {
                id,
                kind,
                transform: Transform::new(
                    PAGE_WIDTH_PX / 2.0 - 75.0,
                    PAGE_HEIGHT_PX / 2.0 - 10.0,
                    150.0,
                    40.0,
                ),
                content: Some(DEFAULT_TEXT.to_string()),
                style: WidgetStyle {
                    font_family: Some(DEFAULT_FONT_FAMILY.to_string()),
                    font_size: Some(DEFAULT_FONT_SIZE),
                    font_weight: Some(FontWeight::Normal),
                    font_style: Some(FontSlant::Normal),
                    fill: Some(Color::BLACK),
                    text_align: Some(TextAlign::Center),
                    ..WidgetStyle::default()
                },
            },
            WidgetKind::Image => Self {
                id,
                kind,
                transform: Transform::new(50.0, 50.0, 200.0, 200.0),
                content: None,
                style: WidgetStyle {
                    opacity: Some(1.0),
                    ..WidgetStyle::default()
                },
            },
            WidgetKind::Line => Self {
                id,
                kind,
                transform: Transform::new(50.0, 100.0, 300.0, 0.0),
                content: Some(LINE_CONTENT.to_string()),
                style: WidgetStyle {
                    stroke: Some(Color::BLACK),
                    stroke_width: Some(2.0),
                    ..WidgetStyle::default()
                },
            },
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == WidgetKind::Text
    }

    pub fn opacity(&self) -> f32 {
        self.style.opacity.unwrap_or(1.0).clamp(0.0, 1.0)
    }
}

// ─── Margins ─────────────────────────────────────────────────────────────

/// Placement boundary offsets from the canvas edges, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

pub const DEFAULT_MARGIN: f64 = 30.0;

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarginSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl MarginSide {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "top" => Some(MarginSide::Top),
            "right" => Some(MarginSide::Right),
            "bottom" => Some(MarginSide::Bottom),
            "left" => Some(MarginSide::Left),
            _ => None,
        }
    }
}

/// Linked margin editing toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginLink {
    /// Editing top or bottom sets both.
    pub vertical: bool,
    /// Editing left or right sets both.
    pub horizontal: bool,
}

/// Partial margin update; `None` sides are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarginsPatch {
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

impl MarginsPatch {
    /// The patch produced by editing one side under the given link state.
    pub fn edit(side: MarginSide, value: f64, link: MarginLink) -> Self {
        let mut patch = Self::default();
        match side {
            MarginSide::Top | MarginSide::Bottom if link.vertical => {
                patch.top = Some(value);
                patch.bottom = Some(value);
            }
            MarginSide::Left | MarginSide::Right if link.horizontal => {
                patch.left = Some(value);
                patch.right = Some(value);
            }
            MarginSide::Top => patch.top = Some(value),
            MarginSide::Right => patch.right = Some(value),
            MarginSide::Bottom => patch.bottom = Some(value),
            MarginSide::Left => patch.left = Some(value),
        }
        patch
    }
}

impl Margins {
    pub const fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Merge a partial update. Negative values clamp to zero.
    pub fn merged(&self, patch: &MarginsPatch) -> Self {
        let pick = |new: Option<f64>, old: f64| new.map(|v| v.max(0.0)).unwrap_or(old);
        Self {
            top: pick(patch.top, self.top),
            right: pick(patch.right, self.right),
            bottom: pick(patch.bottom, self.bottom),
            left: pick(patch.left, self.left),
        }
    }

    pub fn get(&self, side: MarginSide) -> f64 {
        match side {
            MarginSide::Top => self.top,
            MarginSide::Right => self.right,
            MarginSide::Bottom => self.bottom,
            MarginSide::Left => self.left,
        }
    }
}

// ─── Pages ───────────────────────────────────────────────────────────────

/// A single A5 canvas worth of widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    #[serde(default)]
    pub title: String,
    /// Paint order: index 0 is the bottom-most widget.
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub margins: Margins,
    #[serde(rename = "backgroundColor", default = "white")]
    pub background: Color,
}

fn white() -> Color {
    Color::WHITE
}

impl Page {
    pub fn new(id: PageId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            widgets: Vec::new(),
            margins: Margins::default(),
            background: Color::WHITE,
        }
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    pub fn widget_index(&self, id: WidgetId) -> Option<usize> {
        self.widgets.iter().position(|w| w.id == id)
    }
}

/// Title given to the n-th page (1-based).
pub fn page_title(n: usize) -> String {
    format!("Página {n}")
}

// ─── Canvas ──────────────────────────────────────────────────────────────

/// Current persisted schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Page canvas size in pixels; A5 proportions (148 × 210 mm).
pub const PAGE_WIDTH_PX: f64 = 400.0;
pub const PAGE_HEIGHT_PX: f64 = 565.0;

/// Persisted canvas configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    #[serde(default = "white")]
    pub background_color: Color,
    #[serde(default = "legacy_version")]
    pub version: u32,
}

/// Projects saved before versioning carry no tag.
fn legacy_version() -> u32 {
    1
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: PAGE_WIDTH_PX,
            height: PAGE_HEIGHT_PX,
            background_color: Color::WHITE,
            version: SCHEMA_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::parse("#3366CC").unwrap();
        assert_eq!(c.to_hex(), "#3366CC");
        assert_eq!(Color::TRANSPARENT.to_hex(), "#00000000");
    }

    #[test]
    fn vertical_link_sets_both_sides() {
        let link = MarginLink {
            vertical: true,
            horizontal: false,
        };
        let patch = MarginsPatch::edit(MarginSide::Bottom, 33.0, link);
        let m = Margins::default().merged(&patch);
        assert_eq!(m.top, 33.0);
        assert_eq!(m.bottom, 33.0);
        assert_eq!(m.left, DEFAULT_MARGIN);
    }

    #[test]
    fn unlinked_edit_touches_one_side() {
        let patch = MarginsPatch::edit(MarginSide::Left, 5.0, MarginLink::default());
        let m = Margins::default().merged(&patch);
        assert_eq!(m.left, 5.0);
        assert_eq!(m.right, DEFAULT_MARGIN);
    }

    #[test]
    fn negative_margins_clamp() {
        let patch = MarginsPatch {
            top: Some(-4.0),
            ..MarginsPatch::default()
        };
        assert_eq!(Margins::default().merged(&patch).top, 0.0);
    }

    #[test]
    fn widget_json_shape() {
        let w = Widget::with_defaults(WidgetId::intern("t1"), WidgetKind::Text);
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["position"]["x"], 125.0);
        assert_eq!(json["position"]["scaleX"], 1.0);
        assert_eq!(json["style"]["fontSize"], 16.0);
        assert_eq!(json["style"]["fill"], "#000000");
        assert!(json["style"].get("stroke").is_none());

        let back: Widget = serde_json::from_value(json).unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn line_defaults_have_stroke() {
        let w = Widget::with_defaults(WidgetId::intern("l1"), WidgetKind::Line);
        assert_eq!(w.style.stroke, Some(Color::BLACK));
        assert_eq!(w.content.as_deref(), Some(LINE_CONTENT));
        assert_eq!(w.transform.height, 0.0);

        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["type"], "shape");
    }

    #[test]
    fn numeric_font_weights_decode() {
        let style: WidgetStyle =
            serde_json::from_str(r#"{"fontWeight": 700, "fontStyle": "oblique"}"#).unwrap();
        assert_eq!(style.font_weight, Some(FontWeight::Bold));
        assert_eq!(style.font_style, Some(FontSlant::Italic));
        assert_eq!(FontWeight::from_name("400"), Some(FontWeight::Normal));
    }
}
