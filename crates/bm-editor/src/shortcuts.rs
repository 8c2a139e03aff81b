//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s and applies
//! them to a session. The map lives in Rust so the browser host and native
//! tests share it.

use crate::canvas::CanvasBackend;
use crate::document::ZOrder;
use crate::session::EditorSession;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Duplicate,
    Deselect,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomReset,

    // ── Pages ──
    NextPage,
    PrevPage,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            "PageDown" => Some(ShortcutAction::NextPage),
            "PageUp" => Some(ShortcutAction::PrevPage),
            _ => None,
        }
    }
}

/// Apply `action` to the session. Returns `true` if anything changed.
///
/// While the canvas has an inline text editor focused, keys belong to the
/// editor: only `Deselect` (Escape) gets through.
pub fn apply(
    action: ShortcutAction,
    session: &mut EditorSession,
    canvas: &dyn CanvasBackend,
) -> bool {
    if canvas.is_editing_text() && action != ShortcutAction::Deselect {
        return false;
    }
    match action {
        ShortcutAction::Undo => session.undo(),
        ShortcutAction::Redo => session.redo(),
        ShortcutAction::Delete => session.remove_selected(),
        ShortcutAction::Duplicate => session.duplicate_selected().is_some(),
        ShortcutAction::Deselect => session.deselect(),
        ShortcutAction::ZoomIn => {
            let before = session.view().zoom();
            session.zoom_in() != before
        }
        ShortcutAction::ZoomOut => {
            let before = session.view().zoom();
            session.zoom_out() != before
        }
        ShortcutAction::ZoomReset => {
            let before = session.view().zoom();
            session.set_zoom(1.0) != before
        }
        ShortcutAction::NextPage => step_page(session, 1),
        ShortcutAction::PrevPage => step_page(session, -1),
        ShortcutAction::SendBackward => session.reorder_selected(ZOrder::Backward),
        ShortcutAction::BringForward => session.reorder_selected(ZOrder::Forward),
        ShortcutAction::SendToBack => session.reorder_selected(ZOrder::Back),
        ShortcutAction::BringToFront => session.reorder_selected(ZOrder::Front),
    }
}

fn step_page(session: &mut EditorSession, delta: isize) -> bool {
    let doc = session.document();
    let Some(current) = doc.active_page_id().and_then(|id| doc.page_index(id)) else {
        return false;
    };
    let Some(next) = current.checked_add_signed(delta) else {
        return false;
    };
    match doc.pages().get(next).map(|p| p.id) {
        Some(id) => session.set_active_page(id),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::HeadlessCanvas;
    use bm_core::WidgetKind;

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("Z", false, true, false, true),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false, false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_plain_keys() {
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Deselect)
        );
        assert_eq!(ShortcutMap::resolve("z", false, false, false, false), None);
    }

    #[test]
    fn text_editing_swallows_delete() {
        let mut session = EditorSession::default();
        session.add_widget(WidgetKind::Text).unwrap();
        let mut canvas = HeadlessCanvas::new();
        canvas.set_editing_text(true);
        assert!(!apply(ShortcutAction::Delete, &mut session, &canvas));
        assert!(session.selected_widget().is_some());

        canvas.set_editing_text(false);
        assert!(apply(ShortcutAction::Delete, &mut session, &canvas));
        assert!(session.document().active_page().unwrap().widgets.is_empty());
    }

    #[test]
    fn page_stepping_stops_at_ends() {
        let mut session = EditorSession::default();
        let canvas = HeadlessCanvas::new();
        session.add_page();
        assert!(!apply(ShortcutAction::NextPage, &mut session, &canvas));
        assert!(apply(ShortcutAction::PrevPage, &mut session, &canvas));
        assert!(!apply(ShortcutAction::PrevPage, &mut session, &canvas));
    }
}
