//! Undo/Redo history.
//!
//! History tracks a narrowed slice of state: the pages and the active page
//! id. Selection and zoom are excluded, so selecting or zooming never costs
//! an undo step.
//!
//! After every state transition the session calls [`HistoryStore::track`].
//! If the document's snapshot differs structurally from the present one,
//! the present is pushed onto the undo stack and the new state becomes the
//! present. Identical states are dropped, which is what keeps redundant
//! inspector events and selection churn out of the history.
//!
//! Continuous gestures (slider drags, live text edits) use **batching**:
//! tracking is suspended between `begin_batch` and `end_batch`, and the
//! cumulative change is recorded as a single step when the outermost batch
//! closes.

use crate::document::Document;
use bm_core::{Page, PageId};

/// An immutable copy of the undo-relevant state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub pages: Vec<Page>,
    pub active_page_id: Option<PageId>,
}

/// Bounded undo/redo stacks of document snapshots.
pub struct HistoryStore {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// The state the document was in at the last accepted transition.
    present: Snapshot,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
}

impl HistoryStore {
    pub fn new(document: &Document, max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            present: document.snapshot(),
            max_depth,
            batch_depth: 0,
        }
    }

    /// Record the document's state if it differs from the present one.
    /// Returns `true` when a new undo step was created.
    pub fn track(&mut self, document: &Document) -> bool {
        if self.batch_depth > 0 {
            return false;
        }
        let snapshot = document.snapshot();
        if snapshot == self.present {
            return false;
        }
        let previous = std::mem::replace(&mut self.present, snapshot);
        self.undo_stack.push(previous);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
        true
    }

    /// Start a batch group. Changes until the matching `end_batch()` are
    /// applied live but recorded as one undo step.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes, the cumulative
    /// change (if any) is recorded.
    pub fn end_batch(&mut self, document: &Document) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.track(document)
        } else {
            false
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Step back one snapshot. No-op at the oldest retained state.
    pub fn undo(&mut self, document: &mut Document) -> bool {
        if self.is_batching() {
            log::debug!("undo ignored while a batch is open");
            return false;
        }
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, snapshot.clone());
        self.redo_stack.push(current);
        document.restore(snapshot);
        true
    }

    /// Step forward one snapshot. No-op when nothing was undone.
    pub fn redo(&mut self, document: &mut Document) -> bool {
        if self.is_batching() {
            log::debug!("redo ignored while a batch is open");
            return false;
        }
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, snapshot.clone());
        self.undo_stack.push(current);
        document.restore(snapshot);
        true
    }

    /// Forget everything and start over from the document's state.
    pub fn reset(&mut self, document: &Document) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.present = document.snapshot();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of retained undo steps.
    pub fn snapshot_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn present(&self) -> &Snapshot {
        &self.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::WidgetPatch;
    use bm_core::WidgetKind;

    fn nudge(doc: &mut Document, id: bm_core::WidgetId, x: f64) {
        doc.update_widget(
            id,
            &WidgetPatch {
                x: Some(x),
                ..WidgetPatch::default()
            },
        );
    }

    #[test]
    fn undo_redo_roundtrip() {
        let mut doc = Document::new();
        let mut history = HistoryStore::new(&doc, 50);
        doc.add_widget(WidgetKind::Text);
        assert!(history.track(&doc));

        let after = doc.snapshot();
        assert!(history.undo(&mut doc));
        assert!(doc.active_page().unwrap().widgets.is_empty());
        assert!(history.redo(&mut doc));
        assert_eq!(doc.snapshot(), after);
    }

    #[test]
    fn identical_state_is_not_tracked() {
        let doc = Document::new();
        let mut history = HistoryStore::new(&doc, 50);
        assert!(!history.track(&doc));
        assert_eq!(history.snapshot_count(), 0);
    }

    #[test]
    fn new_change_clears_redo() {
        let mut doc = Document::new();
        let mut history = HistoryStore::new(&doc, 50);
        let id = doc.add_widget(WidgetKind::Text).unwrap();
        history.track(&doc);
        nudge(&mut doc, id, 10.0);
        history.track(&doc);
        history.undo(&mut doc);
        assert!(history.can_redo());
        nudge(&mut doc, id, 99.0);
        history.track(&doc);
        assert!(!history.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut doc = Document::new();
        let mut history = HistoryStore::new(&doc, 3);
        let id = doc.add_widget(WidgetKind::Line).unwrap();
        history.track(&doc);
        for i in 0..5 {
            nudge(&mut doc, id, i as f64);
            history.track(&doc);
        }
        let mut undo_count = 0;
        while history.undo(&mut doc) {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
        // The widget still exists: the insertion step was trimmed away.
        assert!(doc.widget(id).is_some());
    }

    #[test]
    fn batch_is_single_step() {
        let mut doc = Document::new();
        let mut history = HistoryStore::new(&doc, 50);
        let id = doc.add_widget(WidgetKind::Text).unwrap();
        history.track(&doc);

        history.begin_batch();
        for x in 0..5 {
            nudge(&mut doc, id, x as f64 * 10.0);
            assert!(!history.track(&doc));
        }
        assert!(history.end_batch(&doc));
        assert_eq!(history.snapshot_count(), 2);

        history.undo(&mut doc);
        let default_x = bm_core::Widget::with_defaults(id, WidgetKind::Text).transform.x;
        assert_eq!(doc.widget(id).unwrap().transform.x, default_x);
    }

    #[test]
    fn empty_batch_no_undo_entry() {
        let doc = Document::new();
        let mut history = HistoryStore::new(&doc, 50);
        history.begin_batch();
        assert!(!history.end_batch(&doc));
        assert!(!history.can_undo());
    }

    #[test]
    fn undo_refused_inside_batch() {
        let mut doc = Document::new();
        let mut history = HistoryStore::new(&doc, 50);
        doc.add_widget(WidgetKind::Text);
        history.track(&doc);
        history.begin_batch();
        assert!(!history.undo(&mut doc));
        history.end_batch(&doc);
        assert!(history.undo(&mut doc));
    }
}
