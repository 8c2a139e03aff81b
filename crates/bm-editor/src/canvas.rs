//! The imperative canvas seam.
//!
//! A canvas backend holds drawable objects tagged with the widget id they
//! mirror. In the browser it is a JS object-canvas; headless builds and
//! tests use [`HeadlessCanvas`]. Backends never call back into the editor:
//! user gestures are queued as [`CanvasEvent`]s and pulled with
//! [`CanvasBackend::drain_events`].

use bm_core::model::*;
use bm_core::{WidgetId, margin_boundary};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRole {
    Widget(WidgetKind),
    /// Dashed, non-interactive rectangle showing the page margins.
    MarginGuide,
}

/// One drawable object on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasObject {
    /// Widget id this object mirrors. `None` for helper objects.
    pub tag: Option<WidgetId>,
    pub role: ObjectRole,
    pub transform: Transform,
    pub content: Option<String>,
    pub style: WidgetStyle,
    pub selectable: bool,
    pub evented: bool,
}

/// Guide stroke color, `#3b82f6` at half opacity.
pub const GUIDE_COLOR: Color = Color::rgba(0.231, 0.510, 0.965, 0.5);

impl CanvasObject {
    pub fn from_widget(widget: &Widget) -> Self {
        Self {
            tag: Some(widget.id),
            role: ObjectRole::Widget(widget.kind),
            transform: widget.transform,
            content: widget.content.clone(),
            style: widget.style.clone(),
            selectable: true,
            evented: true,
        }
    }

    pub fn margin_guide(config: &CanvasConfig, margins: &Margins) -> Self {
        let r = margin_boundary(config, margins);
        Self {
            tag: None,
            role: ObjectRole::MarginGuide,
            transform: Transform::new(r.x0, r.y0, r.width(), r.height()),
            content: None,
            style: WidgetStyle {
                stroke: Some(GUIDE_COLOR),
                stroke_width: Some(1.0),
                stroke_dash: Some([5.0, 5.0].into_iter().collect()),
                ..WidgetStyle::default()
            },
            selectable: false,
            evented: false,
        }
    }
}

/// User gestures reported by a canvas backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// Live drag in progress.
    Moving {
        target: WidgetId,
        transform: Transform,
    },
    /// Live resize in progress.
    Scaling {
        target: WidgetId,
        transform: Transform,
    },
    /// A gesture or text edit finished; the object's final state.
    Modified {
        target: WidgetId,
        transform: Transform,
        /// Text content, for text objects.
        content: Option<String>,
        /// Text formatting as the canvas holds it, for text objects.
        style: Option<WidgetStyle>,
    },
    SelectionCreated {
        target: WidgetId,
    },
    SelectionUpdated {
        target: WidgetId,
    },
    SelectionCleared,
    /// Delete/Backspace pressed with the canvas focused.
    DeleteKey,
}

pub trait CanvasBackend {
    /// Remove every object. Clearing an active selection is reported as
    /// [`CanvasEvent::SelectionCleared`] like any other deselection.
    fn clear(&mut self);

    fn add_object(&mut self, object: CanvasObject);

    /// Reposition the object tagged `id`. Returns `false` when no such
    /// object exists.
    fn update_object(&mut self, id: WidgetId, transform: Transform) -> bool;

    fn remove_object(&mut self, id: WidgetId) -> bool;

    fn active_object(&self) -> Option<WidgetId>;

    /// Programmatically (de)select an object. Does not report an event.
    fn set_active_object(&mut self, id: Option<WidgetId>);

    /// Whether an in-place text editor currently has focus.
    fn is_editing_text(&self) -> bool;

    fn set_zoom(&mut self, zoom: f64);

    fn render(&mut self);

    /// Pull queued user events.
    fn drain_events(&mut self) -> Vec<CanvasEvent> {
        Vec::new()
    }
}

// ─── Headless ────────────────────────────────────────────────────────────

/// In-memory canvas used by tests and the CLI.
#[derive(Debug, Default)]
pub struct HeadlessCanvas {
    objects: Vec<CanvasObject>,
    active: Option<WidgetId>,
    editing_text: bool,
    zoom: f64,
    events: VecDeque<CanvasEvent>,
    renders: usize,
    clears: usize,
}

impl HeadlessCanvas {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            ..Self::default()
        }
    }

    pub fn objects(&self) -> &[CanvasObject] {
        &self.objects
    }

    pub fn object(&self, id: WidgetId) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.tag == Some(id))
    }

    /// Widget ids in paint order, helpers excluded.
    pub fn tags(&self) -> Vec<WidgetId> {
        self.objects.iter().filter_map(|o| o.tag).collect()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// How many times the canvas was wiped for a rebuild.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn set_editing_text(&mut self, editing: bool) {
        self.editing_text = editing;
    }

    /// Simulate a user gesture.
    pub fn push_event(&mut self, event: CanvasEvent) {
        match &event {
            CanvasEvent::SelectionCreated { target } | CanvasEvent::SelectionUpdated { target } => {
                self.active = Some(*target);
            }
            CanvasEvent::SelectionCleared => self.active = None,
            CanvasEvent::Moving { target, transform }
            | CanvasEvent::Scaling { target, transform }
            | CanvasEvent::Modified {
                target, transform, ..
            } => {
                if let Some(obj) = self.objects.iter_mut().find(|o| o.tag == Some(*target)) {
                    obj.transform = *transform;
                }
            }
            CanvasEvent::DeleteKey => {}
        }
        self.events.push_back(event);
    }
}

impl CanvasBackend for HeadlessCanvas {
    fn clear(&mut self) {
        self.objects.clear();
        self.clears += 1;
        if self.active.take().is_some() {
            self.events.push_back(CanvasEvent::SelectionCleared);
        }
    }

    fn add_object(&mut self, object: CanvasObject) {
        self.objects.push(object);
    }

    fn update_object(&mut self, id: WidgetId, transform: Transform) -> bool {
        match self.objects.iter_mut().find(|o| o.tag == Some(id)) {
            Some(obj) => {
                obj.transform = transform;
                true
            }
            None => false,
        }
    }

    fn remove_object(&mut self, id: WidgetId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| o.tag != Some(id));
        if self.active == Some(id) {
            self.active = None;
        }
        self.objects.len() != before
    }

    fn active_object(&self) -> Option<WidgetId> {
        self.active
    }

    fn set_active_object(&mut self, id: Option<WidgetId>) {
        self.active = id.filter(|id| self.objects.iter().any(|o| o.tag == Some(*id)));
    }

    fn is_editing_text(&self) -> bool {
        self.editing_text
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    fn render(&mut self) {
        self.renders += 1;
    }

    fn drain_events(&mut self) -> Vec<CanvasEvent> {
        self.events.drain(..).collect()
    }
}
