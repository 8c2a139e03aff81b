//! Volatile view state: selection, zoom and margin link toggles.
//!
//! None of this is persisted or tracked by history.

use bm_core::{MarginLink, WidgetId};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub(crate) zoom: f64,
    pub(crate) selected: Option<WidgetId>,
    pub(crate) margin_link: MarginLink,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            selected: None,
            margin_link: MarginLink::default(),
        }
    }
}

impl ViewState {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// The raw selection; may be stale. Prefer
    /// [`crate::session::EditorSession::selected_widget`].
    pub fn raw_selection(&self) -> Option<WidgetId> {
        self.selected
    }

    pub fn margin_link(&self) -> MarginLink {
        self.margin_link
    }
}
