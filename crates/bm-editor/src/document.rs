//! The persisted half of editor state and its mutation API.
//!
//! `Document` owns pages, the active page id and the canvas config. It is
//! deliberately free of anything volatile (selection, zoom, canvas handle):
//! those live in [`crate::view::ViewState`] and the canvas backend, so that
//! history snapshots and serialization see plain data only.
//!
//! Every mutation reports whether it changed anything. Callers (the
//! session) use that to decide whether history needs to look at the new
//! state at all.

use crate::error::EditorError;
use crate::history::Snapshot;
use bm_core::model::*;
use bm_core::{PageId, ProjectDocument, WidgetId};

/// Offset applied to duplicated widgets.
const DUPLICATE_OFFSET: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pages: Vec<Page>,
    active_page_id: Option<PageId>,
    config: CanvasConfig,
}

impl Default for Document {
    fn default() -> Self {
        Self::from_project(ProjectDocument::default())
    }
}

impl Document {
    /// A fresh document with a single blank page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a loaded project. The first page becomes active.
    pub fn from_project(project: ProjectDocument) -> Self {
        let mut pages = project.pages;
        if pages.is_empty() {
            pages.push(Page::new(PageId::generate(), page_title(1)));
        }
        let active_page_id = pages.first().map(|p| p.id);
        Self {
            pages,
            active_page_id,
            config: project.config,
        }
    }

    pub fn to_project(&self) -> ProjectDocument {
        ProjectDocument {
            pages: self.pages.clone(),
            config: self.config,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn active_page_id(&self) -> Option<PageId> {
        self.active_page_id
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.active_page_id.and_then(|id| self.page(id))
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_index(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    /// Look up a widget on the active page.
    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.active_page().and_then(|p| p.widget(id))
    }

    fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    fn active_page_mut(&mut self) -> Option<&mut Page> {
        let id = self.active_page_id?;
        self.page_mut(id)
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    /// The undo-relevant slice of state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pages: self.pages.clone(),
            active_page_id: self.active_page_id,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.pages = snapshot.pages;
        self.active_page_id = snapshot.active_page_id;
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    /// Append a blank page and make it active.
    pub fn add_page(&mut self) -> PageId {
        let id = PageId::generate();
        self.pages.push(Page::new(id, page_title(self.pages.len() + 1)));
        self.active_page_id = Some(id);
        log::debug!("added page {id}");
        id
    }

    /// Remove a page. The last remaining page cannot be removed. When the
    /// active page goes, the first remaining page becomes active.
    pub fn remove_page(&mut self, id: PageId) -> Result<(), EditorError> {
        let index = self.page_index(id).ok_or(EditorError::UnknownPage(id))?;
        if self.pages.len() <= 1 {
            return Err(EditorError::LastPage);
        }
        self.pages.remove(index);
        if self.active_page_id == Some(id) {
            self.active_page_id = self.pages.first().map(|p| p.id);
        }
        log::debug!("removed page {id}");
        Ok(())
    }

    pub fn set_active_page(&mut self, id: PageId) -> bool {
        if self.active_page_id == Some(id) || self.page(id).is_none() {
            return false;
        }
        self.active_page_id = Some(id);
        true
    }

    pub fn rename_page(&mut self, id: PageId, title: &str) -> bool {
        match self.page_mut(id) {
            Some(page) if page.title != title => {
                page.title = title.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn set_page_background(&mut self, id: PageId, color: Color) -> bool {
        match self.page_mut(id) {
            Some(page) if page.background != color => {
                page.background = color;
                true
            }
            _ => false,
        }
    }

    /// Partially merge new margins into a page.
    pub fn update_margins(&mut self, id: PageId, patch: &MarginsPatch) -> bool {
        let Some(page) = self.page_mut(id) else {
            return false;
        };
        let merged = page.margins.merged(patch);
        if merged == page.margins {
            return false;
        }
        page.margins = merged;
        true
    }

    // ─── Widgets ─────────────────────────────────────────────────────────

    /// Insert a default widget of `kind` on top of the active page.
    /// Returns `None` when there is no active page.
    pub fn add_widget(&mut self, kind: WidgetKind) -> Option<WidgetId> {
        self.insert_widget(Widget::with_defaults(WidgetId::generate(), kind))
    }

    /// Insert an image widget showing `src`.
    pub fn add_image(&mut self, src: impl Into<String>) -> Option<WidgetId> {
        let mut widget = Widget::with_defaults(WidgetId::generate(), WidgetKind::Image);
        widget.content = Some(src.into());
        self.insert_widget(widget)
    }

    fn insert_widget(&mut self, widget: Widget) -> Option<WidgetId> {
        let page = self.active_page_mut()?;
        let id = widget.id;
        log::debug!("adding {} widget {id} to page {}", widget.kind.as_str(), page.id);
        page.widgets.push(widget);
        Some(id)
    }

    /// Apply a partial update to a widget on the active page.
    ///
    /// Returns `false` without touching anything when the patched widget is
    /// structurally identical to the current one.
    pub fn update_widget(&mut self, id: WidgetId, patch: &WidgetPatch) -> bool {
        let Some(widget) = self.active_page_mut().and_then(|p| p.widget_mut(id)) else {
            return false;
        };
        let updated = patch.applied_to(widget);
        if updated == *widget {
            return false;
        }
        *widget = updated;
        true
    }

    pub fn remove_widget(&mut self, id: WidgetId) -> bool {
        let Some(page) = self.active_page_mut() else {
            return false;
        };
        let before = page.widgets.len();
        page.widgets.retain(|w| w.id != id);
        page.widgets.len() != before
    }

    /// Clone a widget with an offset and a fresh id, placed on top.
    pub fn duplicate_widget(&mut self, id: WidgetId) -> Option<WidgetId> {
        let mut copy = self.widget(id)?.clone();
        copy.id = WidgetId::generate();
        copy.transform.x += DUPLICATE_OFFSET;
        copy.transform.y += DUPLICATE_OFFSET;
        self.insert_widget(copy)
    }

    /// Move a widget within the paint order of the active page.
    pub fn reorder_widget(&mut self, id: WidgetId, to: ZOrder) -> bool {
        let Some(page) = self.active_page_mut() else {
            return false;
        };
        let Some(from) = page.widget_index(id) else {
            return false;
        };
        let last = page.widgets.len() - 1;
        let target = match to {
            ZOrder::Forward => (from + 1).min(last),
            ZOrder::Backward => from.saturating_sub(1),
            ZOrder::Front => last,
            ZOrder::Back => 0,
        };
        if target == from {
            return false;
        }
        let widget = page.widgets.remove(from);
        page.widgets.insert(target, widget);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Forward,
    Backward,
    Front,
    Back,
}

/// Partial widget update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub angle: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub content: Option<String>,
    pub style: StylePatch,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StylePatch {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontSlant>,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f32>,
    pub stroke_dash: Option<DashPattern>,
    pub opacity: Option<f32>,
    pub text_align: Option<TextAlign>,
}

impl WidgetPatch {
    /// A patch carrying a full placement.
    pub fn transform(t: &Transform) -> Self {
        Self {
            x: Some(t.x),
            y: Some(t.y),
            width: Some(t.width),
            height: Some(t.height),
            angle: Some(t.angle),
            scale_x: Some(t.scale_x),
            scale_y: Some(t.scale_y),
            ..Self::default()
        }
    }

    /// A patch replacing every style field that `style` sets.
    pub fn with_style(mut self, style: &WidgetStyle) -> Self {
        self.style = StylePatch {
            font_family: style.font_family.clone(),
            font_size: style.font_size,
            font_weight: style.font_weight,
            font_style: style.font_style,
            fill: style.fill,
            stroke: style.stroke,
            stroke_width: style.stroke_width,
            stroke_dash: style.stroke_dash.clone(),
            opacity: style.opacity,
            text_align: style.text_align,
        };
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The widget as it would look after this patch.
    pub fn applied_to(&self, widget: &Widget) -> Widget {
        let mut w = widget.clone();
        let t = &mut w.transform;
        set(&mut t.x, self.x);
        set(&mut t.y, self.y);
        set(&mut t.width, self.width.map(|v| v.max(0.0)));
        set(&mut t.height, self.height.map(|v| v.max(0.0)));
        set(&mut t.angle, self.angle);
        set(&mut t.scale_x, self.scale_x);
        set(&mut t.scale_y, self.scale_y);
        if let Some(content) = &self.content {
            w.content = Some(content.clone());
        }
        let s = &self.style;
        let st = &mut w.style;
        set_some(&mut st.font_family, s.font_family.clone());
        set_some(&mut st.font_size, s.font_size);
        set_some(&mut st.font_weight, s.font_weight);
        set_some(&mut st.font_style, s.font_style);
        set_some(&mut st.fill, s.fill);
        set_some(&mut st.stroke, s.stroke);
        set_some(&mut st.stroke_width, s.stroke_width);
        set_some(&mut st.stroke_dash, s.stroke_dash.clone());
        set_some(&mut st.opacity, s.opacity.map(|o| o.clamp(0.0, 1.0)));
        set_some(&mut st.text_align, s.text_align);
        w
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn set_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_document_has_one_active_page() {
        let doc = Document::new();
        assert_eq!(doc.pages().len(), 1);
        assert_eq!(doc.active_page_id(), Some(doc.pages()[0].id));
        assert_eq!(doc.pages()[0].title, "Página 1");
    }

    #[test]
    fn add_page_activates_it() {
        let mut doc = Document::new();
        let id = doc.add_page();
        assert_eq!(doc.active_page_id(), Some(id));
        assert_eq!(doc.page(id).unwrap().title, "Página 2");
    }

    #[test]
    fn removing_active_page_falls_back_to_first() {
        let mut doc = Document::new();
        let first = doc.pages()[0].id;
        let second = doc.add_page();
        doc.remove_page(second).unwrap();
        assert_eq!(doc.active_page_id(), Some(first));
    }

    #[test]
    fn removing_inactive_page_keeps_active() {
        let mut doc = Document::new();
        let first = doc.pages()[0].id;
        let second = doc.add_page();
        doc.remove_page(first).unwrap();
        assert_eq!(doc.active_page_id(), Some(second));
    }

    #[test]
    fn last_page_cannot_be_removed() {
        let mut doc = Document::new();
        let only = doc.pages()[0].id;
        assert!(matches!(doc.remove_page(only), Err(EditorError::LastPage)));
        assert_eq!(doc.pages().len(), 1);
    }

    #[test]
    fn identical_update_is_a_noop() {
        let mut doc = Document::new();
        let id = doc.add_widget(WidgetKind::Text).unwrap();
        let current = doc.widget(id).unwrap().clone();
        let patch = WidgetPatch::transform(&current.transform).with_style(&current.style);
        assert!(!doc.update_widget(id, &patch));

        let patch = WidgetPatch {
            x: Some(80.0),
            ..WidgetPatch::default()
        };
        assert!(doc.update_widget(id, &patch));
        assert_eq!(doc.widget(id).unwrap().transform.x, 80.0);
    }

    #[test]
    fn widget_ops_need_an_active_page() {
        let mut doc = Document::new();
        doc.active_page_id = None;
        assert_eq!(doc.add_widget(WidgetKind::Line), None);
    }

    #[test]
    fn z_order_moves() {
        let mut doc = Document::new();
        let a = doc.add_widget(WidgetKind::Text).unwrap();
        let b = doc.add_widget(WidgetKind::Line).unwrap();
        let c = doc.add_widget(WidgetKind::Line).unwrap();
        assert!(doc.reorder_widget(a, ZOrder::Front));
        let order: Vec<_> = doc.active_page().unwrap().widgets.iter().map(|w| w.id).collect();
        assert_eq!(order, vec![b, c, a]);
        assert!(!doc.reorder_widget(a, ZOrder::Forward));
        assert!(doc.reorder_widget(c, ZOrder::Back));
        assert_eq!(doc.active_page().unwrap().widgets[0].id, c);
    }

    #[test]
    fn duplicate_offsets_copy() {
        let mut doc = Document::new();
        let a = doc.add_widget(WidgetKind::Text).unwrap();
        let b = doc.duplicate_widget(a).unwrap();
        assert_ne!(a, b);
        let (wa, wb) = (doc.widget(a).unwrap(), doc.widget(b).unwrap());
        assert_eq!(wb.transform.x, wa.transform.x + 20.0);
        assert_eq!(wb.content, wa.content);
    }
}
