//! The project storage boundary: one record per user.

use crate::auth::UserId;
use crate::error::StoreError;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Title written with every saved project.
pub const DEFAULT_PROJECT_TITLE: &str = "Meu Projeto";

/// A stored project row. `content` is the `{pages, config}` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub user_id: UserId,
    pub title: String,
    pub content: serde_json::Value,
}

pub trait ProjectStore {
    /// Insert, or replace the record with the same `user_id`.
    fn upsert(&self, record: ProjectRecord) -> LocalBoxFuture<'_, Result<(), StoreError>>;

    fn fetch<'a>(
        &'a self,
        user: &'a UserId,
    ) -> LocalBoxFuture<'a, Result<Option<ProjectRecord>, StoreError>>;
}

impl<T: ProjectStore + ?Sized> ProjectStore for Arc<T> {
    fn upsert(&self, record: ProjectRecord) -> LocalBoxFuture<'_, Result<(), StoreError>> {
        (**self).upsert(record)
    }

    fn fetch<'a>(
        &'a self,
        user: &'a UserId,
    ) -> LocalBoxFuture<'a, Result<Option<ProjectRecord>, StoreError>> {
        (**self).fetch(user)
    }
}
