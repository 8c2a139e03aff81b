//! Save and load the signed-in user's project.

use crate::auth::AuthProvider;
use crate::error::StoreError;
use crate::store::{DEFAULT_PROJECT_TITLE, ProjectRecord, ProjectStore};
use bm_core::ProjectDocument;

pub struct PersistenceAdapter<A, S> {
    auth: A,
    store: S,
    title: String,
}

impl<A: AuthProvider, S: ProjectStore> PersistenceAdapter<A, S> {
    pub fn new(auth: A, store: S) -> Self {
        Self {
            auth,
            store,
            title: DEFAULT_PROJECT_TITLE.to_string(),
        }
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upsert the project for the current user. The last save wins.
    pub async fn save(&self, project: &ProjectDocument) -> Result<(), StoreError> {
        let user_id = self.auth.current_user().ok_or(StoreError::NotAuthenticated)?;
        let record = ProjectRecord {
            user_id: user_id.clone(),
            title: self.title.clone(),
            content: project.to_json()?,
        };
        self.store.upsert(record).await?;
        log::info!("project saved for {user_id} ({} pages)", project.pages.len());
        Ok(())
    }

    /// The current user's stored project, if they have one.
    pub async fn load(&self) -> Result<Option<ProjectDocument>, StoreError> {
        let user_id = self.auth.current_user().ok_or(StoreError::NotAuthenticated)?;
        let Some(record) = self.store.fetch(&user_id).await? else {
            log::debug!("no stored project for {user_id}");
            return Ok(None);
        };
        let project = ProjectDocument::from_json(record.content)?;
        if project.pages.is_empty() {
            log::warn!("stored project for {user_id} has no pages, ignoring it");
            return Ok(None);
        }
        Ok(Some(project))
    }
}

impl<B: AuthProvider + ProjectStore + Clone> PersistenceAdapter<B, B> {
    /// One backend serving both boundaries.
    pub fn from_backend(backend: B) -> Self {
        Self::new(backend.clone(), backend)
    }
}
