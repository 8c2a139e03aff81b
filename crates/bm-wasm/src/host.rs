//! [`CanvasBackend`] over a JavaScript object-canvas.
//!
//! The page supplies a `CanvasHost` object wrapping its canvas library.
//! Objects cross the boundary as JSON; user gestures come back through the
//! `on_*` methods of [`crate::BoletimEditor`] and are queued here until the
//! sync layer drains them.
//!
//! Events the host library fires in response to calls made *through* this
//! interface (e.g. a deselection caused by `clear`) must not be forwarded:
//! the bridge is borrowed for the whole call. `clear` reports the implied
//! deselection itself.

use bm_core::model::*;
use bm_core::WidgetId;
use bm_editor::{CanvasBackend, CanvasEvent, CanvasObject, ObjectRole};
use serde_json::{Value, json};
use std::collections::VecDeque;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// The page's canvas adapter.
    pub type CanvasHost;

    #[wasm_bindgen(method)]
    fn clear(this: &CanvasHost);

    #[wasm_bindgen(method, js_name = addObject)]
    fn add_object(this: &CanvasHost, object: &str);

    #[wasm_bindgen(method, js_name = updateObject)]
    fn update_object(this: &CanvasHost, id: &str, position: &str) -> bool;

    #[wasm_bindgen(method, js_name = removeObject)]
    fn remove_object(this: &CanvasHost, id: &str) -> bool;

    #[wasm_bindgen(method, js_name = activeObject)]
    fn active_object(this: &CanvasHost) -> Option<String>;

    #[wasm_bindgen(method, js_name = setActiveObject)]
    fn set_active_object(this: &CanvasHost, id: Option<String>);

    #[wasm_bindgen(method, js_name = isEditingText)]
    fn is_editing_text(this: &CanvasHost) -> bool;

    #[wasm_bindgen(method, js_name = setZoom)]
    fn set_zoom(this: &CanvasHost, zoom: f64);

    #[wasm_bindgen(method, js_name = requestRender)]
    fn request_render(this: &CanvasHost);
}

pub struct JsCanvas {
    host: CanvasHost,
    events: VecDeque<CanvasEvent>,
}

impl JsCanvas {
    pub fn new(host: CanvasHost) -> Self {
        Self {
            host,
            events: VecDeque::new(),
        }
    }

    /// Queue a gesture reported by the page.
    pub fn push_event(&mut self, event: CanvasEvent) {
        self.events.push_back(event);
    }
}

impl CanvasBackend for JsCanvas {
    fn clear(&mut self) {
        let had_selection = self.host.active_object().is_some();
        self.host.clear();
        if had_selection {
            self.events.push_back(CanvasEvent::SelectionCleared);
        }
    }

    fn add_object(&mut self, object: CanvasObject) {
        self.host.add_object(&object_json(&object).to_string());
    }

    fn update_object(&mut self, id: WidgetId, transform: Transform) -> bool {
        self.host
            .update_object(id.as_str(), &json!(transform).to_string())
    }

    fn remove_object(&mut self, id: WidgetId) -> bool {
        self.host.remove_object(id.as_str())
    }

    fn active_object(&self) -> Option<WidgetId> {
        self.host.active_object().map(|id| WidgetId::intern(&id))
    }

    fn set_active_object(&mut self, id: Option<WidgetId>) {
        self.host
            .set_active_object(id.map(|id| id.as_str().to_string()));
    }

    fn is_editing_text(&self) -> bool {
        self.host.is_editing_text()
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.host.set_zoom(zoom);
    }

    fn render(&mut self) {
        self.host.request_render();
    }

    fn drain_events(&mut self) -> Vec<CanvasEvent> {
        self.events.drain(..).collect()
    }
}

/// Wire form of a canvas object, in the persisted widget shape plus the
/// interaction flags.
pub fn object_json(object: &CanvasObject) -> Value {
    let kind = match object.role {
        ObjectRole::Widget(kind) => kind.as_str(),
        ObjectRole::MarginGuide => "marginGuide",
    };
    json!({
        "id": object.tag.map(|id| id.as_str()),
        "type": kind,
        "position": object.transform,
        "content": object.content,
        "style": object.style,
        "selectable": object.selectable,
        "evented": object.evented,
    })
}
