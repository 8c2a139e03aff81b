//! Integration tests: per-user project persistence (bm-store).

use bm_core::{PageId, ProjectDocument};
use bm_editor::{EditorConfig, EditorSession};
use bm_store::{
    AuthProvider, Credentials, MemoryBackend, PersistenceAdapter, ProjectRecord, ProjectStore,
    StoreError, UserId,
};
use futures::executor::block_on;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const FIXTURE: &str = include_str!("../../bm-core/tests/fixtures/boletim.json");

type Adapter = PersistenceAdapter<Arc<MemoryBackend>, Arc<MemoryBackend>>;

fn adapter() -> Adapter {
    PersistenceAdapter::from_backend(Arc::new(MemoryBackend::new()))
}

fn signed_in(email: &str) -> Adapter {
    let adapter = adapter();
    block_on(adapter.auth().sign_up(&Credentials::new(email, "segredo1"))).unwrap();
    adapter
}

fn fixture() -> ProjectDocument {
    ProjectDocument::from_json_str(FIXTURE).unwrap()
}

// ─── Save / load ────────────────────────────────────────────────────────

#[test]
fn save_requires_a_session() {
    let adapter = adapter();
    assert!(matches!(
        block_on(adapter.save(&fixture())),
        Err(StoreError::NotAuthenticated)
    ));
    assert!(matches!(block_on(adapter.load()), Err(StoreError::NotAuthenticated)));
    assert_eq!(adapter.store().project_count(), 0);
}

#[test]
fn saved_project_loads_back_identical() {
    let adapter = signed_in("ana@paroquia.org");
    let project = fixture();
    block_on(adapter.save(&project)).unwrap();
    assert_eq!(block_on(adapter.load()).unwrap(), Some(project));
}

#[test]
fn record_carries_the_fixed_title_and_shape() {
    let adapter = signed_in("ana@paroquia.org");
    block_on(adapter.save(&fixture())).unwrap();
    let user = adapter.auth().current_user().unwrap();
    let record = block_on(adapter.store().fetch(&user)).unwrap().unwrap();
    assert_eq!(record.title, "Meu Projeto");
    assert!(record.content["pages"].is_array());
    assert_eq!(record.content["config"]["width"], 400.0);
}

#[test]
fn last_save_wins() {
    let adapter = signed_in("ana@paroquia.org");
    let mut project = fixture();
    block_on(adapter.save(&project)).unwrap();
    project.pages[0].title = "Capa nova".into();
    block_on(adapter.save(&project)).unwrap();

    assert_eq!(adapter.store().project_count(), 1);
    let loaded = block_on(adapter.load()).unwrap().unwrap();
    assert_eq!(loaded.pages[0].title, "Capa nova");
}

#[test]
fn nothing_stored_loads_as_none() {
    let adapter = signed_in("novo@paroquia.org");
    assert_eq!(block_on(adapter.load()).unwrap(), None);
}

#[test]
fn users_only_see_their_own_project() {
    let backend = Arc::new(MemoryBackend::new());
    let adapter = PersistenceAdapter::from_backend(Arc::clone(&backend));
    block_on(backend.sign_up(&Credentials::new("ana@paroquia.org", "segredo1"))).unwrap();
    block_on(adapter.save(&fixture())).unwrap();

    block_on(backend.sign_up(&Credentials::new("joao@paroquia.org", "segredo2"))).unwrap();
    assert_eq!(block_on(adapter.load()).unwrap(), None);
}

#[test]
fn failed_save_keeps_the_previous_record() {
    let adapter = signed_in("ana@paroquia.org");
    let project = fixture();
    block_on(adapter.save(&project)).unwrap();

    adapter.store().set_offline(true);
    let mut changed = project.clone();
    changed.pages.pop();
    assert!(matches!(
        block_on(adapter.save(&changed)),
        Err(StoreError::Backend(_))
    ));
    adapter.store().set_offline(false);
    assert_eq!(block_on(adapter.load()).unwrap(), Some(project));
}

#[test]
fn record_without_schema_version_loads() {
    let adapter = signed_in("ana@paroquia.org");
    let user = adapter.auth().current_user().unwrap();
    let content = serde_json::json!({
        "pages": [{
            "id": "antiga",
            "title": "Página 1",
            "widgets": [],
            "margins": {"top": 20, "right": 20, "bottom": 20, "left": 20}
        }],
        "config": {"width": 400, "height": 565}
    });
    block_on(adapter.store().upsert(ProjectRecord {
        user_id: user,
        title: "Meu Projeto".into(),
        content,
    }))
    .unwrap();

    let loaded = block_on(adapter.load()).unwrap().unwrap();
    assert_eq!(loaded.pages[0].id, PageId::intern("antiga"));
    assert_eq!(loaded.pages[0].margins.top, 20.0);
}

#[test]
fn garbage_content_is_an_error() {
    let adapter = signed_in("ana@paroquia.org");
    block_on(adapter.store().upsert(ProjectRecord {
        user_id: UserId::new("user-1"),
        title: "Meu Projeto".into(),
        content: serde_json::json!({"pagina": 3}),
    }))
    .unwrap();
    assert!(matches!(block_on(adapter.load()), Err(StoreError::Core(_))));
}

// ─── Editor round trip ──────────────────────────────────────────────────

#[test]
fn loading_replaces_the_editor_document() {
    let adapter = signed_in("ana@paroquia.org");
    block_on(adapter.save(&fixture())).unwrap();

    let mut session = EditorSession::new(EditorConfig::default());
    session.add_page();
    assert!(session.history().can_undo());

    let loaded = block_on(adapter.load()).unwrap().unwrap();
    session.replace_document(loaded);
    assert_eq!(session.document().pages().len(), 4);
    assert_eq!(
        session.document().active_page_id(),
        Some(PageId::intern("capa"))
    );
    assert!(!session.history().can_undo());
    assert_eq!(session.to_project(), fixture());
}
