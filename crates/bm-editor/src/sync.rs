//! Bidirectional sync between the editor session and a canvas backend.
//!
//! Model → canvas: [`CanvasSync::refresh`] rebuilds the canvas whenever the
//! active page differs from what was last rendered.
//! Canvas → model: [`CanvasSync::handle_event`] maps user gestures back to
//! session operations, then refreshes.
//!
//! Rebuilding clears the canvas, which a real backend reports as a
//! deselection. Events drained while `rebuilding` is set are dispatched with
//! `SelectionCleared` swallowed, so programmatic teardown never erases the
//! logical selection.

use crate::canvas::{CanvasBackend, CanvasEvent, CanvasObject};
use crate::document::WidgetPatch;
use crate::session::EditorSession;
use bm_core::model::*;
use bm_core::{WidgetId, clamp_into, margin_boundary};

#[derive(Debug, Default)]
pub struct CanvasSync {
    /// Set while the canvas is being rebuilt from the model.
    rebuilding: bool,
    /// The active page as of the last rebuild.
    rendered_page: Option<Page>,
    rendered_zoom: Option<f64>,
}

impl CanvasSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding
    }

    /// Force the next refresh to rebuild.
    pub fn invalidate(&mut self) {
        self.rendered_page = None;
    }

    /// Bring the canvas up to date with the session. Returns `true` when
    /// the canvas was rebuilt.
    pub fn refresh(&mut self, session: &mut EditorSession, canvas: &mut dyn CanvasBackend) -> bool {
        let zoom = session.view().zoom();
        if self.rendered_zoom != Some(zoom) {
            canvas.set_zoom(zoom);
            self.rendered_zoom = Some(zoom);
        }

        let page = session.document().active_page().cloned();
        let rebuilt = page != self.rendered_page;
        if rebuilt {
            self.rebuild(session, canvas, page);
        }

        let selected = session.selected_widget();
        if canvas.active_object() != selected {
            canvas.set_active_object(selected);
        }
        canvas.render();
        rebuilt
    }

    fn rebuild(
        &mut self,
        session: &mut EditorSession,
        canvas: &mut dyn CanvasBackend,
        page: Option<Page>,
    ) {
        self.rebuilding = true;
        canvas.clear();
        if let Some(page) = &page {
            log::debug!("rebuilding canvas for page {} ({} widgets)", page.id, page.widgets.len());
            canvas.add_object(CanvasObject::margin_guide(
                session.document().config(),
                &page.margins,
            ));
            for widget in &page.widgets {
                log::trace!("canvas object {} ({})", widget.id, widget.kind.as_str());
                canvas.add_object(CanvasObject::from_widget(widget));
            }
        }
        for event in canvas.drain_events() {
            self.dispatch(session, canvas, event);
        }
        self.rebuilding = false;
        self.rendered_page = page;
    }

    /// Apply one canvas event, then everything it queued, then refresh.
    pub fn handle_event(
        &mut self,
        session: &mut EditorSession,
        canvas: &mut dyn CanvasBackend,
        event: CanvasEvent,
    ) {
        self.dispatch(session, canvas, event);
        self.pump(session, canvas);
    }

    /// Drain and apply every queued canvas event, then refresh.
    pub fn pump(&mut self, session: &mut EditorSession, canvas: &mut dyn CanvasBackend) {
        loop {
            let events = canvas.drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.dispatch(session, canvas, event);
            }
        }
        self.refresh(session, canvas);
    }

    fn dispatch(
        &mut self,
        session: &mut EditorSession,
        canvas: &mut dyn CanvasBackend,
        event: CanvasEvent,
    ) {
        match event {
            CanvasEvent::Moving { target, transform } => {
                let Some(boundary) = active_boundary(session) else {
                    return;
                };
                if session.document().widget(target).is_none() {
                    return;
                }
                let clamped = clamp_into(&transform, boundary);
                if clamped != transform {
                    canvas.update_object(target, clamped);
                }
            }
            CanvasEvent::Scaling { target, transform } => {
                if is_text(session, target) {
                    canvas.update_object(target, fold_text_scale(transform));
                }
            }
            CanvasEvent::Modified {
                target,
                transform,
                content,
                style,
            } => {
                let Some(widget) = session.document().widget(target) else {
                    return;
                };
                let text = widget.is_text();
                let transform = if text {
                    fold_text_scale(transform)
                } else {
                    transform
                };
                let mut patch = WidgetPatch::transform(&transform);
                if text {
                    patch.content = content;
                    if let Some(style) = &style {
                        patch = patch.with_style(style);
                    }
                }
                session.update_widget(target, &patch);
            }
            CanvasEvent::SelectionCreated { target } | CanvasEvent::SelectionUpdated { target } => {
                session.select(target);
            }
            CanvasEvent::SelectionCleared => {
                if self.rebuilding {
                    log::trace!("selection cleared by rebuild; ignored");
                } else {
                    session.deselect();
                }
            }
            CanvasEvent::DeleteKey => {
                if canvas.is_editing_text() {
                    return;
                }
                session.remove_selected();
            }
        }
    }
}

fn active_boundary(session: &EditorSession) -> Option<bm_core::Rect> {
    let doc = session.document();
    let page = doc.active_page()?;
    Some(margin_boundary(doc.config(), &page.margins))
}

fn is_text(session: &EditorSession, id: WidgetId) -> bool {
    session.document().widget(id).is_some_and(|w| w.is_text())
}

/// Text boxes reflow instead of stretching: horizontal scale becomes box
/// width and both scale factors return to 1.
fn fold_text_scale(t: Transform) -> Transform {
    Transform {
        width: t.width * t.scale_x,
        scale_x: 1.0,
        scale_y: 1.0,
        ..t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_scale_folds_into_width() {
        let t = Transform {
            scale_x: 1.5,
            scale_y: 2.0,
            ..Transform::new(0.0, 0.0, 200.0, 19.0)
        };
        let folded = fold_text_scale(t);
        assert_eq!(folded.width, 300.0);
        assert_eq!((folded.scale_x, folded.scale_y), (1.0, 1.0));
        assert_eq!(folded.height, 19.0);
    }
}
