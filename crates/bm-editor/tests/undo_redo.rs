//! Integration tests: editor session history (bm-editor).
//!
//! Drives the public session API the way the editor shell does and checks
//! what ends up on the undo/redo stacks.

use bm_core::model::*;
use bm_editor::inspector::set_widget_prop;
use bm_editor::{EditorError, EditorSession, WidgetPatch};
use pretty_assertions::assert_eq;

fn move_to(session: &mut EditorSession, id: bm_core::WidgetId, x: f64) -> bool {
    session.update_widget(
        id,
        &WidgetPatch {
            x: Some(x),
            ..WidgetPatch::default()
        },
    )
}

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn undo_then_redo_restores_identical_snapshot() {
    let mut session = EditorSession::default();
    let id = session.add_widget(WidgetKind::Text).unwrap();
    move_to(&mut session, id, 120.0);
    let after = session.document().snapshot();

    assert!(session.undo());
    let default_x = Widget::with_defaults(id, WidgetKind::Text).transform.x;
    assert_eq!(session.document().widget(id).unwrap().transform.x, default_x);
    assert!(session.redo());
    assert_eq!(session.document().snapshot(), after);
}

#[test]
fn undo_and_redo_are_noops_at_the_ends() {
    let mut session = EditorSession::default();
    assert!(!session.undo());
    assert!(!session.redo());
    session.add_page();
    assert!(session.undo());
    assert!(!session.undo());
    assert!(session.redo());
    assert!(!session.redo());
}

#[test]
fn identical_update_creates_no_entry() {
    let mut session = EditorSession::default();
    let id = session.add_widget(WidgetKind::Line).unwrap();
    let count = session.history().snapshot_count();

    let widget = session.document().widget(id).unwrap().clone();
    let patch = WidgetPatch::transform(&widget.transform).with_style(&widget.style);
    assert!(!session.update_widget(id, &patch));
    assert_eq!(session.history().snapshot_count(), count);
}

#[test]
fn page_switch_is_undoable() {
    let mut session = EditorSession::default();
    let first = session.document().pages()[0].id;
    let second = session.add_page();
    session.set_active_page(first);
    session.undo();
    assert_eq!(session.document().active_page_id(), Some(second));
}

// ─── Bounded depth ──────────────────────────────────────────────────────

#[test]
fn fifty_undos_reach_the_fiftieth_from_last_state() {
    let mut session = EditorSession::default();
    let id = session.add_widget(WidgetKind::Text).unwrap();
    for x in 1..=60 {
        assert!(move_to(&mut session, id, x as f64));
    }
    assert_eq!(session.history().snapshot_count(), 50);

    let mut undone = 0;
    while session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 50);
    // 61 tracked states; the oldest 11 fell off.
    let widget = session.document().widget(id).expect("widget insertion is not reachable");
    assert_eq!(widget.transform.x, 10.0);
}

// ─── Batched gestures ───────────────────────────────────────────────────

#[test]
fn font_size_slider_drag_is_one_entry() {
    let mut session = EditorSession::default();
    session.add_widget(WidgetKind::Text).unwrap();
    let count = session.history().snapshot_count();

    session.begin_edit();
    for size in 17..=40 {
        set_widget_prop(&mut session, "fontSize", &size.to_string()).unwrap();
    }
    assert!(session.end_edit());
    assert_eq!(session.history().snapshot_count(), count + 1);

    let id = session.selected_widget().unwrap();
    assert_eq!(session.document().widget(id).unwrap().style.font_size, Some(40.0));
    session.undo();
    assert_eq!(session.document().widget(id).unwrap().style.font_size, Some(16.0));
}

#[test]
fn blur_without_change_adds_nothing() {
    let mut session = EditorSession::default();
    session.add_widget(WidgetKind::Text).unwrap();
    let count = session.history().snapshot_count();
    session.begin_edit();
    set_widget_prop(&mut session, "fontSize", "16").unwrap();
    assert!(!session.end_edit());
    assert_eq!(session.history().snapshot_count(), count);
}

// ─── Pages ──────────────────────────────────────────────────────────────

#[test]
fn removing_active_page_keeps_one_active_page() {
    let mut session = EditorSession::default();
    session.add_page();
    let third = session.add_page();
    session.remove_page(third).unwrap();

    let doc = session.document();
    assert_eq!(doc.pages().len(), 2);
    let active = doc.active_page_id().unwrap();
    assert_eq!(active, doc.pages()[0].id);
    assert!(doc.page(active).is_some());
}

#[test]
fn removing_the_last_page_is_refused() {
    let mut session = EditorSession::default();
    let only = session.document().pages()[0].id;
    let count = session.history().snapshot_count();
    assert!(matches!(session.remove_page(only), Err(EditorError::LastPage)));
    assert_eq!(session.document().pages().len(), 1);
    assert_eq!(session.history().snapshot_count(), count);
}

#[test]
fn removing_unknown_page_is_an_error() {
    let mut session = EditorSession::default();
    let ghost = bm_core::PageId::intern("never_created");
    assert!(matches!(
        session.remove_page(ghost),
        Err(EditorError::UnknownPage(id)) if id == ghost
    ));
}

// ─── Margins ────────────────────────────────────────────────────────────

#[test]
fn linked_margins_stay_equal() {
    let mut session = EditorSession::default();
    session.set_margin_link(MarginLink {
        vertical: true,
        horizontal: true,
    });
    session.edit_margin(MarginSide::Bottom, 30.0);
    session.edit_margin(MarginSide::Left, 12.0);
    let m = session.document().active_page().unwrap().margins;
    assert_eq!(m.top, m.bottom);
    assert_eq!(m.left, m.right);
    assert_eq!((m.top, m.left), (30.0, 12.0));
}

#[test]
fn negative_margins_clamp_to_zero() {
    let mut session = EditorSession::default();
    session.edit_margin(MarginSide::Top, -8.0);
    assert_eq!(session.document().active_page().unwrap().margins.top, 0.0);
}

#[test]
fn loading_a_project_resets_history() {
    let mut session = EditorSession::default();
    session.add_widget(WidgetKind::Text);
    session.replace_document(bm_core::ProjectDocument::default());
    assert!(!session.history().can_undo());
    assert_eq!(session.selected_widget(), None);
}
