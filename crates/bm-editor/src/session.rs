//! The editor session: document + history + view state.
//!
//! Every operation the editor shell exposes goes through here. Mutations
//! are applied to the [`Document`], then history is given the chance to
//! record the new state; view-only operations (selection, zoom) never
//! reach history.

use crate::config::EditorConfig;
use crate::document::{Document, WidgetPatch, ZOrder};
use crate::error::EditorError;
use crate::history::HistoryStore;
use crate::upload::{UPLOAD_FIT, fitted_size, validate_image};
use crate::view::ViewState;
use bm_core::model::*;
use bm_core::{PageId, ProjectDocument, WidgetId};

pub struct EditorSession {
    document: Document,
    history: HistoryStore,
    view: ViewState,
    config: EditorConfig,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::new(), config)
    }

    pub fn from_project(project: ProjectDocument, config: EditorConfig) -> Self {
        Self::with_document(Document::from_project(project), config)
    }

    fn with_document(document: Document, config: EditorConfig) -> Self {
        let history = HistoryStore::new(&document, config.history_limit);
        Self {
            document,
            history,
            view: ViewState::default(),
            config,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The selected widget, if it still exists on the active page.
    pub fn selected_widget(&self) -> Option<WidgetId> {
        self.view
            .selected
            .filter(|id| self.document.widget(*id).is_some())
    }

    pub fn to_project(&self) -> ProjectDocument {
        self.document.to_project()
    }

    /// Replace the whole document with a loaded project. History restarts
    /// from the loaded state; the selection is dropped.
    pub fn replace_document(&mut self, project: ProjectDocument) {
        self.document = Document::from_project(project);
        self.history.reset(&self.document);
        self.view.selected = None;
        log::info!("document replaced ({} pages)", self.document.pages().len());
    }

    /// Let history look at the document after a change. Returns `changed`
    /// so mutations can report what happened to the document even while a
    /// batch holds tracking back.
    fn commit(&mut self, changed: bool) -> bool {
        if changed {
            self.history.track(&self.document);
        }
        changed
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    pub fn add_page(&mut self) -> PageId {
        let id = self.document.add_page();
        self.view.selected = None;
        self.commit(true);
        id
    }

    pub fn remove_page(&mut self, id: PageId) -> Result<(), EditorError> {
        if let Err(e) = self.document.remove_page(id) {
            log::warn!("remove page refused: {e}");
            return Err(e);
        }
        if self.selected_widget().is_none() {
            self.view.selected = None;
        }
        self.commit(true);
        Ok(())
    }

    pub fn set_active_page(&mut self, id: PageId) -> bool {
        if !self.document.set_active_page(id) {
            return false;
        }
        self.view.selected = None;
        self.commit(true);
        true
    }

    pub fn rename_page(&mut self, id: PageId, title: &str) -> bool {
        let changed = self.document.rename_page(id, title);
        self.commit(changed)
    }

    pub fn set_page_background(&mut self, id: PageId, color: Color) -> bool {
        let changed = self.document.set_page_background(id, color);
        self.commit(changed)
    }

    pub fn update_margins(&mut self, id: PageId, patch: &MarginsPatch) -> bool {
        let changed = self.document.update_margins(id, patch);
        self.commit(changed)
    }

    /// Edit one side of the active page's margins, honoring the link
    /// toggles.
    pub fn edit_margin(&mut self, side: MarginSide, value: f64) -> bool {
        let Some(id) = self.document.active_page_id() else {
            return false;
        };
        let patch = MarginsPatch::edit(side, value, self.view.margin_link);
        self.update_margins(id, &patch)
    }

    pub fn set_margin_link(&mut self, link: MarginLink) {
        self.view.margin_link = link;
    }

    // ─── Widgets ─────────────────────────────────────────────────────────

    /// Add a default widget to the active page and select it.
    pub fn add_widget(&mut self, kind: WidgetKind) -> Option<WidgetId> {
        let id = self.document.add_widget(kind)?;
        self.view.selected = Some(id);
        self.commit(true);
        Some(id)
    }

    pub fn add_image(&mut self, src: impl Into<String>) -> Option<WidgetId> {
        let id = self.document.add_image(src)?;
        self.view.selected = Some(id);
        self.commit(true);
        Some(id)
    }

    /// Validate an uploaded file and place it as an image widget, scaled to
    /// fit the upload box.
    pub fn add_uploaded_image(
        &mut self,
        bytes: &[u8],
        declared_mime: Option<&str>,
    ) -> Result<Option<WidgetId>, EditorError> {
        let src = validate_image(bytes, declared_mime, self.config.max_upload_bytes)?;
        let Some(id) = self.document.add_image(src) else {
            return Ok(None);
        };
        if let Some((width, height)) = fitted_size(bytes, UPLOAD_FIT) {
            self.document.update_widget(
                id,
                &WidgetPatch {
                    width: Some(width),
                    height: Some(height),
                    ..WidgetPatch::default()
                },
            );
        }
        self.view.selected = Some(id);
        self.commit(true);
        Ok(Some(id))
    }

    /// Partially update a widget on the active page. Identical payloads
    /// change nothing and create no history entry.
    pub fn update_widget(&mut self, id: WidgetId, patch: &WidgetPatch) -> bool {
        let changed = self.document.update_widget(id, patch);
        self.commit(changed)
    }

    pub fn remove_widget(&mut self, id: WidgetId) -> bool {
        if !self.document.remove_widget(id) {
            return false;
        }
        if self.view.selected == Some(id) {
            self.view.selected = None;
        }
        self.commit(true);
        true
    }

    pub fn remove_selected(&mut self) -> bool {
        match self.selected_widget() {
            Some(id) => self.remove_widget(id),
            None => false,
        }
    }

    pub fn duplicate_selected(&mut self) -> Option<WidgetId> {
        let id = self.selected_widget()?;
        let copy = self.document.duplicate_widget(id)?;
        self.view.selected = Some(copy);
        self.commit(true);
        Some(copy)
    }

    pub fn reorder_selected(&mut self, to: ZOrder) -> bool {
        match self.selected_widget() {
            Some(id) => {
                let changed = self.document.reorder_widget(id, to);
                self.commit(changed)
            }
            None => false,
        }
    }

    // ─── Selection & zoom ────────────────────────────────────────────────

    /// Select a widget on the active page. Unknown ids are ignored.
    pub fn select(&mut self, id: WidgetId) -> bool {
        if self.document.widget(id).is_none() || self.view.selected == Some(id) {
            return false;
        }
        self.view.selected = Some(id);
        true
    }

    pub fn deselect(&mut self) -> bool {
        self.view.selected.take().is_some()
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.view.zoom = self.config.clamp_zoom(zoom);
        self.view.zoom
    }

    /// Step zoom up, snapping to one decimal place.
    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(round_tenth(self.view.zoom + self.config.zoom_step))
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(round_tenth(self.view.zoom - self.config.zoom_step))
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.document);
        if changed && self.selected_widget().is_none() {
            self.view.selected = None;
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.document);
        if changed && self.selected_widget().is_none() {
            self.view.selected = None;
        }
        changed
    }

    /// Start a continuous edit (slider drag, live typing). Changes made
    /// until [`Self::end_edit`] collapse into one undo step.
    pub fn begin_edit(&mut self) {
        self.history.begin_batch();
    }

    /// Finish a continuous edit (control blurred / gesture ended).
    pub fn end_edit(&mut self) -> bool {
        self.history.end_batch(&self.document)
    }
}

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
