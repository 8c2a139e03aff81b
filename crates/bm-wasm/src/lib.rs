//! WASM bridge for Boletim Maker: exposes the editor session, canvas sync,
//! booklet export and per-user project storage to the browser page.
//!
//! Compiled via `wasm-pack build --target web`.

mod host;
mod render2d;
mod store;

pub use host::CanvasHost;
pub use store::StoreHost;

use bm_core::model::*;
use bm_core::{PageId, ProjectDocument, WidgetId};
use bm_editor::inspector::{page_props, widget_props};
use bm_editor::shortcuts::{self, ShortcutAction, ShortcutMap};
use bm_editor::{CanvasEvent, CanvasSync, EditorConfig, EditorSession, ZOrder};
use bm_export::{
    BookletExporter, BookletPreview, BookletRole, DataUrlLoader, ExportConfig, PDF_FILE_NAME,
    RoleAssignment, SoftwareRasterizer,
};
use bm_store::{AuthProvider, AuthSession, Credentials, PersistenceAdapter};
use futures::executor::block_on;
use host::JsCanvas;
use js_sys::Promise;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::rc::Rc;
use store::JsBackend;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::CanvasRenderingContext2d;

type Exporter = BookletExporter<SoftwareRasterizer<DataUrlLoader>>;
type Persistence = PersistenceAdapter<JsBackend, JsBackend>;

/// The browser-facing editor.
///
/// Owns the session, the sync layer and the canvas adapter. Every call
/// from the page goes through this struct; mutating calls leave the canvas
/// in step with the model before returning.
#[wasm_bindgen]
pub struct BoletimEditor {
    session: EditorSession,
    sync: CanvasSync,
    canvas: JsCanvas,
    exporter: Exporter,
    persistence: Option<Rc<Persistence>>,
}

/// Final state of an object after a gesture or text edit.
#[derive(Debug, Deserialize)]
struct ModifiedPayload {
    position: Transform,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    style: Option<WidgetStyle>,
}

#[wasm_bindgen]
impl BoletimEditor {
    /// Create an editor with one blank page, drawing through `host`.
    #[wasm_bindgen(constructor)]
    pub fn new(host: CanvasHost) -> Self {
        console_error_panic_hook_setup();

        let config = ExportConfig::default();
        let mut editor = Self {
            session: EditorSession::new(EditorConfig::default()),
            sync: CanvasSync::new(),
            canvas: JsCanvas::new(host),
            exporter: BookletExporter::new(rasterizer(&config), config),
            persistence: None,
        };
        editor.settle();
        editor
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Replace the project with a stored one. Returns `false` on a decode
    /// error, leaving the current project untouched.
    pub fn load_json(&mut self, json: &str) -> bool {
        match ProjectDocument::from_json_str(json) {
            Ok(project) => {
                self.session.replace_document(project);
                self.sync.invalidate();
                self.settle();
                true
            }
            Err(e) => {
                log::warn!("project not loaded: {e}");
                false
            }
        }
    }

    /// The project in its persisted JSON shape.
    pub fn to_json(&self) -> Result<String, JsError> {
        Ok(self.session.to_project().to_json_string()?)
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    /// `[{id, title, active}]` in page order.
    pub fn get_pages(&self) -> String {
        let doc = self.session.document();
        let active = doc.active_page_id();
        let pages: Vec<Value> = doc
            .pages()
            .iter()
            .map(|p| {
                json!({
                    "id": p.id.as_str(),
                    "title": p.title,
                    "active": Some(p.id) == active,
                })
            })
            .collect();
        Value::Array(pages).to_string()
    }

    pub fn add_page(&mut self) -> String {
        let id = self.session.add_page();
        self.settle();
        id.as_str().to_string()
    }

    /// Remove a page. Fails on the last remaining page.
    pub fn remove_page(&mut self, id: &str) -> Result<(), JsError> {
        self.session.remove_page(PageId::intern(id))?;
        self.settle();
        Ok(())
    }

    pub fn set_active_page(&mut self, id: &str) -> bool {
        let changed = self.session.set_active_page(PageId::intern(id));
        self.settle();
        changed
    }

    /// Edit one margin of the active page (`top`, `right`, `bottom`,
    /// `left`), honoring the link toggles.
    pub fn edit_margin(&mut self, side: &str, value: f64) -> bool {
        let Some(side) = MarginSide::from_name(side) else {
            return false;
        };
        let changed = self.session.edit_margin(side, value);
        self.settle();
        changed
    }

    pub fn get_page_props(&self) -> String {
        match self.session.document().active_page() {
            Some(page) => {
                let mut props = page_props(page);
                let link = self.session.view().margin_link();
                props["linkVertical"] = link.vertical.into();
                props["linkHorizontal"] = link.horizontal.into();
                props.to_string()
            }
            None => "null".to_string(),
        }
    }

    pub fn set_page_prop(&mut self, key: &str, value: &str) -> Result<bool, JsError> {
        let changed = bm_editor::inspector::set_page_prop(&mut self.session, key, value)?;
        self.settle();
        Ok(changed)
    }

    // ─── Widgets ─────────────────────────────────────────────────────────

    /// Add a default text box; returns its id, or an empty string when no
    /// page is active.
    pub fn add_text(&mut self) -> String {
        let id = self.session.add_widget(WidgetKind::Text);
        self.settle();
        id_string(id)
    }

    pub fn add_line(&mut self) -> String {
        let id = self.session.add_widget(WidgetKind::Line);
        self.settle();
        id_string(id)
    }

    /// Add an uploaded image file. `mime` is the type the file picker
    /// reported, if any.
    pub fn add_image(&mut self, bytes: &[u8], mime: Option<String>) -> Result<String, JsError> {
        let id = self.session.add_uploaded_image(bytes, mime.as_deref())?;
        self.settle();
        Ok(id_string(id))
    }

    pub fn delete_selected(&mut self) -> bool {
        let changed = self.session.remove_selected();
        self.settle();
        changed
    }

    pub fn duplicate_selected(&mut self) -> String {
        let id = self.session.duplicate_selected();
        self.settle();
        id_string(id)
    }

    /// Restack the selection: `front`, `back`, `forward` or `backward`.
    pub fn reorder_selected(&mut self, to: &str) -> bool {
        let to = match to {
            "front" => ZOrder::Front,
            "back" => ZOrder::Back,
            "forward" => ZOrder::Forward,
            "backward" => ZOrder::Backward,
            _ => return false,
        };
        let changed = self.session.reorder_selected(to);
        self.settle();
        changed
    }

    /// Selected widget id, or empty string if nothing is selected.
    pub fn get_selected_id(&self) -> String {
        id_string(self.session.selected_widget())
    }

    /// Inspector properties of the selected widget, or `null`.
    pub fn get_selected_props(&self) -> String {
        self.session
            .selected_widget()
            .and_then(|id| self.session.document().widget(id))
            .map(widget_props)
            .unwrap_or(Value::Null)
            .to_string()
    }

    pub fn set_widget_prop(&mut self, key: &str, value: &str) -> Result<bool, JsError> {
        let changed = bm_editor::inspector::set_widget_prop(&mut self.session, key, value)?;
        self.settle();
        Ok(changed)
    }

    /// Bracket a continuous edit (slider drag, typing) into one undo step.
    pub fn begin_edit(&mut self) {
        self.session.begin_edit();
    }

    pub fn end_edit(&mut self) -> bool {
        self.session.end_edit()
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let changed = self.session.undo();
        self.settle();
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.session.redo();
        self.settle();
        changed
    }

    pub fn can_undo(&self) -> bool {
        self.session.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.history().can_redo()
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> f64 {
        let zoom = self.session.zoom_in();
        self.settle();
        zoom
    }

    pub fn zoom_out(&mut self) -> f64 {
        let zoom = self.session.zoom_out();
        self.settle();
        zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        let zoom = self.session.set_zoom(zoom);
        self.settle();
        zoom
    }

    pub fn get_zoom(&self) -> f64 {
        self.session.view().zoom()
    }

    /// Paint a thumbnail of a page into a Canvas2D context.
    pub fn render_thumbnail(&self, ctx: &CanvasRenderingContext2d, page_id: &str, scale: f64) -> bool {
        let doc = self.session.document();
        let Some(page) = doc.page(PageId::intern(page_id)) else {
            return false;
        };
        match render2d::render_page(ctx, page, doc.config(), scale) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("thumbnail for {page_id} failed: {e:?}");
                false
            }
        }
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Handle a keyboard event. Returns JSON: `{"changed":bool,"action":"..."}`.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return r#"{"changed":false,"action":"none"}"#.to_string();
        };
        let changed = shortcuts::apply(action, &mut self.session, &self.canvas);
        self.settle();
        format!(
            r#"{{"changed":{changed},"action":"{}"}}"#,
            action_to_name(action)
        )
    }

    // ─── Canvas events ───────────────────────────────────────────────────

    /// Live drag. `position` is the object's transform as JSON.
    pub fn on_moving(&mut self, id: &str, position: &str) -> Result<(), JsError> {
        let transform: Transform = serde_json::from_str(position)?;
        self.dispatch(CanvasEvent::Moving {
            target: WidgetId::intern(id),
            transform,
        });
        Ok(())
    }

    pub fn on_scaling(&mut self, id: &str, position: &str) -> Result<(), JsError> {
        let transform: Transform = serde_json::from_str(position)?;
        self.dispatch(CanvasEvent::Scaling {
            target: WidgetId::intern(id),
            transform,
        });
        Ok(())
    }

    /// A gesture or text edit finished. `payload` is
    /// `{position, content?, style?}`.
    pub fn on_modified(&mut self, id: &str, payload: &str) -> Result<(), JsError> {
        let payload: ModifiedPayload = serde_json::from_str(payload)?;
        self.dispatch(CanvasEvent::Modified {
            target: WidgetId::intern(id),
            transform: payload.position,
            content: payload.content,
            style: payload.style,
        });
        Ok(())
    }

    /// Selection created or updated on the canvas.
    pub fn on_selection(&mut self, id: &str) {
        let target = WidgetId::intern(id);
        let event = match self.session.selected_widget() {
            Some(_) => CanvasEvent::SelectionUpdated { target },
            None => CanvasEvent::SelectionCreated { target },
        };
        self.dispatch(event);
    }

    pub fn on_selection_cleared(&mut self) {
        self.dispatch(CanvasEvent::SelectionCleared);
    }

    pub fn on_delete_key(&mut self) {
        self.dispatch(CanvasEvent::DeleteKey);
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Default role assignment (`{cover, backCover, innerLeft, innerRight}`
    /// page ids). Fails unless the project has exactly four pages.
    pub fn default_roles(&self) -> Result<String, JsError> {
        let roles = RoleAssignment::from_pages(self.session.document().pages())?;
        Ok(serde_json::to_string(&roles)?)
    }

    /// Portuguese labels for the export dialog, keyed by role.
    pub fn role_labels() -> String {
        let labels: Map<String, Value> = BookletRole::ALL
            .iter()
            .map(|r| (r.as_str().to_string(), r.label().into()))
            .collect();
        Value::Object(labels).to_string()
    }

    /// Render the low-resolution preview. Returns
    /// `{pages: {role: dataUrl}, sheets: [dataUrl, dataUrl]}`.
    pub fn export_preview(&self, roles: &str) -> Result<String, JsError> {
        let roles: RoleAssignment = serde_json::from_str(roles)?;
        let project = self.session.to_project();
        let preview = block_on(self.exporter.preview(&project, &roles))?;
        Ok(preview_json(&preview).to_string())
    }

    /// Render the booklet PDF.
    pub fn export_pdf(&self, roles: &str) -> Result<Vec<u8>, JsError> {
        let roles: RoleAssignment = serde_json::from_str(roles)?;
        let project = self.session.to_project();
        Ok(block_on(self.exporter.export_pdf(&project, &roles))?)
    }

    pub fn is_exporting(&self) -> bool {
        self.exporter.is_busy()
    }

    pub fn pdf_file_name() -> String {
        PDF_FILE_NAME.to_string()
    }

    /// Quiet period, in milliseconds, the page should wait after a role
    /// change before requesting a new preview.
    pub fn preview_debounce_ms(&self) -> u32 {
        self.exporter.config().debounce_ms as u32
    }

    /// Supply the font used for text in exports. Without one, text is left
    /// out of previews and PDFs.
    pub fn set_export_font(&mut self, bytes: Vec<u8>) -> Result<(), JsError> {
        let config = self.exporter.config().clone();
        let rasterizer = rasterizer(&config).with_font_bytes(bytes)?;
        self.exporter = BookletExporter::new(rasterizer, config);
        Ok(())
    }

    // ─── Accounts & persistence ─────────────────────────────────────────

    /// Connect the account and project storage client.
    pub fn attach_store(&mut self, host: StoreHost) {
        let backend = JsBackend::new(host);
        self.persistence = Some(Rc::new(PersistenceAdapter::from_backend(backend)));
    }

    /// Resolves to the session JSON (`{userId, email}`).
    pub fn sign_up(&self, email: &str, password: &str) -> Result<Promise, JsError> {
        let persistence = self.persistence()?;
        let credentials = Credentials::new(email, password);
        Ok(future_to_promise(async move {
            let session = persistence.auth().sign_up(&credentials).await.map_err(js_error)?;
            session_value(&session)
        }))
    }

    /// Resolves to the session JSON (`{userId, email}`).
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Promise, JsError> {
        let persistence = self.persistence()?;
        let credentials = Credentials::new(email, password);
        Ok(future_to_promise(async move {
            let session = persistence.auth().sign_in(&credentials).await.map_err(js_error)?;
            session_value(&session)
        }))
    }

    pub fn sign_out(&self) -> Result<Promise, JsError> {
        let persistence = self.persistence()?;
        Ok(future_to_promise(async move {
            persistence.auth().sign_out().await.map_err(js_error)?;
            Ok(JsValue::UNDEFINED)
        }))
    }

    /// Session change observed by the host itself; `null` when signed out.
    pub fn on_auth_change(&self, session: Option<String>) -> Result<(), JsError> {
        let persistence = self.persistence()?;
        let session = session
            .map(|s| serde_json::from_str::<AuthSession>(&s))
            .transpose()?;
        persistence.auth().set_session(session);
        Ok(())
    }

    /// Email of the signed-in user, if any.
    pub fn current_user(&self) -> Option<String> {
        let persistence = self.persistence.as_ref()?;
        persistence.auth().session().map(|s| s.email)
    }

    /// Save the current project for the signed-in user. Rejects when no
    /// one is signed in or the host fails.
    pub fn save(&self) -> Result<Promise, JsError> {
        let persistence = self.persistence()?;
        let project = self.session.to_project();
        Ok(future_to_promise(async move {
            persistence.save(&project).await.map_err(js_error)?;
            Ok(JsValue::UNDEFINED)
        }))
    }

    /// Resolves to the signed-in user's stored project JSON, or `null`
    /// when they have none. Hand the result to [`Self::load_json`].
    pub fn load(&self) -> Result<Promise, JsError> {
        let persistence = self.persistence()?;
        Ok(future_to_promise(async move {
            let project = persistence.load().await.map_err(js_error)?;
            match project {
                Some(project) => {
                    let json = project.to_json_string().map_err(js_error)?;
                    Ok(JsValue::from_str(&json))
                }
                None => Ok(JsValue::NULL),
            }
        }))
    }
}

// ─── Internals ───────────────────────────────────────────────────────────

impl BoletimEditor {
    /// Drain queued canvas events and bring the canvas up to date.
    fn settle(&mut self) {
        self.sync.pump(&mut self.session, &mut self.canvas);
    }

    fn dispatch(&mut self, event: CanvasEvent) {
        self.canvas.push_event(event);
        self.settle();
    }

    fn persistence(&self) -> Result<Rc<Persistence>, JsError> {
        self.persistence
            .clone()
            .ok_or_else(|| JsError::new("no storage host attached"))
    }
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsError::new(&e.to_string()).into()
}

fn session_value(session: &AuthSession) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(session).map_err(js_error)?;
    Ok(JsValue::from_str(&json))
}

fn rasterizer(config: &ExportConfig) -> SoftwareRasterizer<DataUrlLoader> {
    SoftwareRasterizer::new(DataUrlLoader).with_jpeg_quality(config.jpeg_quality())
}

fn id_string(id: Option<WidgetId>) -> String {
    id.map(|id| id.as_str().to_string()).unwrap_or_default()
}

fn preview_json(preview: &BookletPreview) -> Value {
    let pages: Map<String, Value> = BookletRole::ALL
        .iter()
        .map(|&role| {
            (
                role.as_str().to_string(),
                preview.pages.get(role).to_data_url().into(),
            )
        })
        .collect();
    let sheets: Vec<Value> = preview
        .sheets
        .sheets
        .iter()
        .map(|s| s.to_data_url().into())
        .collect();
    json!({ "pages": pages, "sheets": sheets })
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::Delete => "delete",
        ShortcutAction::Duplicate => "duplicate",
        ShortcutAction::Deselect => "deselect",
        ShortcutAction::ZoomIn => "zoomIn",
        ShortcutAction::ZoomOut => "zoomOut",
        ShortcutAction::ZoomReset => "zoomReset",
        ShortcutAction::NextPage => "nextPage",
        ShortcutAction::PrevPage => "prevPage",
        ShortcutAction::SendBackward => "sendBackward",
        ShortcutAction::BringForward => "bringForward",
        ShortcutAction::SendToBack => "sendToBack",
        ShortcutAction::BringToFront => "bringToFront",
    }
}

/// Set up a panic hook that logs to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Boletim WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::{Page, page_title};
    use pretty_assertions::assert_eq;

    fn four_pages() -> ProjectDocument {
        ProjectDocument {
            pages: (1..=4)
                .map(|i| Page::new(PageId::intern(&format!("wasm_p{i}")), page_title(i)))
                .collect(),
            ..ProjectDocument::default()
        }
    }

    #[test]
    fn preview_json_carries_every_role_and_both_sheets() {
        let project = four_pages();
        let roles = RoleAssignment::from_pages(&project.pages).unwrap();
        let exporter = BookletExporter::new(
            SoftwareRasterizer::new(DataUrlLoader),
            ExportConfig {
                preview_multiplier: 0.1,
                ..ExportConfig::default()
            },
        );
        let preview = block_on(exporter.preview(&project, &roles)).unwrap();
        let v = preview_json(&preview);

        for role in BookletRole::ALL {
            let url = v["pages"][role.as_str()].as_str().unwrap();
            assert!(url.starts_with("data:image/jpeg;base64,"), "{role}");
        }
        assert_eq!(v["sheets"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn roles_travel_as_camel_case_page_ids() {
        let project = four_pages();
        let roles = RoleAssignment::from_pages(&project.pages).unwrap();
        let v: Value = serde_json::to_value(roles).unwrap();
        assert_eq!(
            v,
            json!({
                "cover": "wasm_p1",
                "backCover": "wasm_p2",
                "innerLeft": "wasm_p3",
                "innerRight": "wasm_p4",
            })
        );
        let back: RoleAssignment = serde_json::from_value(v).unwrap();
        assert_eq!(back, roles);
    }

    #[test]
    fn modified_payload_content_and_style_are_optional() {
        let p: ModifiedPayload =
            serde_json::from_str(r#"{"position":{"x":10,"y":20,"width":50,"height":5}}"#).unwrap();
        assert_eq!((p.position.x, p.position.y), (10.0, 20.0));
        assert!(p.content.is_none() && p.style.is_none());
    }

    #[test]
    fn role_labels_are_portuguese() {
        let v: Value = serde_json::from_str(&BoletimEditor::role_labels()).unwrap();
        assert_eq!(v["cover"], "Capa");
        assert_eq!(v["innerRight"], "Miolo 2");
    }
}
