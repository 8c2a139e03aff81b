//! [`AuthProvider`] and [`ProjectStore`] over a JavaScript storage host.
//!
//! The page supplies a `StoreHost` object wrapping its hosted auth and
//! database client. Every host method returns a `Promise`; sessions and
//! project records cross the boundary as JSON strings. Session changes the
//! host learns about on its own (token refresh, another tab signing out)
//! come back through [`crate::BoletimEditor::on_auth_change`].

use bm_store::{
    AuthProvider, AuthSession, Credentials, ProjectRecord, ProjectStore, StoreError, UserId,
};
use futures::future::LocalBoxFuture;
use js_sys::Promise;
use std::rc::Rc;
use tokio::sync::watch;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    /// The page's account and project storage client.
    #[derive(Clone)]
    pub type StoreHost;

    /// Resolves to a session JSON string.
    #[wasm_bindgen(method, js_name = signUp)]
    fn sign_up(this: &StoreHost, email: &str, password: &str) -> Promise;

    /// Resolves to a session JSON string.
    #[wasm_bindgen(method, js_name = signIn)]
    fn sign_in(this: &StoreHost, email: &str, password: &str) -> Promise;

    #[wasm_bindgen(method, js_name = signOut)]
    fn sign_out(this: &StoreHost) -> Promise;

    /// Insert or replace the row keyed by the record's `user_id`.
    #[wasm_bindgen(method, js_name = upsertProject)]
    fn upsert_project(this: &StoreHost, record: &str) -> Promise;

    /// Resolves to the user's record JSON string, or `null`.
    #[wasm_bindgen(method, js_name = fetchProject)]
    fn fetch_project(this: &StoreHost, user_id: &str) -> Promise;
}

#[derive(Clone)]
pub struct JsBackend {
    host: StoreHost,
    session: Rc<watch::Sender<Option<AuthSession>>>,
}

impl JsBackend {
    pub fn new(host: StoreHost) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            host,
            session: Rc::new(session),
        }
    }

    /// Record a session change reported by the host.
    pub fn set_session(&self, session: Option<AuthSession>) {
        match &session {
            Some(s) => log::info!("signed in as {}", s.email),
            None => log::info!("signed out"),
        }
        self.session.send_replace(session);
    }

    fn start_session(&self, value: JsValue) -> Result<AuthSession, StoreError> {
        let session = session_from(value.as_string())?;
        self.set_session(Some(session.clone()));
        Ok(session)
    }
}

impl AuthProvider for JsBackend {
    fn session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }

    fn sign_up<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> LocalBoxFuture<'a, Result<AuthSession, StoreError>> {
        Box::pin(async move {
            credentials.validate()?;
            let promise = self.host.sign_up(&credentials.email, &credentials.password);
            let value = resolve(promise).await?;
            self.start_session(value)
        })
    }

    fn sign_in<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> LocalBoxFuture<'a, Result<AuthSession, StoreError>> {
        Box::pin(async move {
            let promise = self.host.sign_in(&credentials.email, &credentials.password);
            let value = resolve(promise).await?;
            self.start_session(value)
        })
    }

    fn sign_out(&self) -> LocalBoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            resolve(self.host.sign_out()).await?;
            self.set_session(None);
            Ok(())
        })
    }
}

impl ProjectStore for JsBackend {
    fn upsert(&self, record: ProjectRecord) -> LocalBoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let json = serde_json::to_string(&record)?;
            resolve(self.host.upsert_project(&json)).await?;
            Ok(())
        })
    }

    fn fetch<'a>(
        &'a self,
        user: &'a UserId,
    ) -> LocalBoxFuture<'a, Result<Option<ProjectRecord>, StoreError>> {
        Box::pin(async move {
            let value = resolve(self.host.fetch_project(user.as_str())).await?;
            record_from(value.as_string())
        })
    }
}

async fn resolve(promise: Promise) -> Result<JsValue, StoreError> {
    JsFuture::from(promise).await.map_err(backend_error)
}

fn backend_error(err: JsValue) -> StoreError {
    let message = match err.dyn_ref::<js_sys::Error>() {
        Some(e) => String::from(e.message()),
        None => err.as_string().unwrap_or_else(|| format!("{err:?}")),
    };
    StoreError::Backend(message)
}

/// Decode the session a sign-in or sign-up resolved to.
pub fn session_from(text: Option<String>) -> Result<AuthSession, StoreError> {
    let text =
        text.ok_or_else(|| StoreError::Backend("storage host returned no session".into()))?;
    Ok(serde_json::from_str(&text)?)
}

/// Decode a fetched record. A missing row resolves to `null`.
pub fn record_from(text: Option<String>) -> Result<Option<ProjectRecord>, StoreError> {
    text.map(|t| serde_json::from_str(&t))
        .transpose()
        .map_err(StoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_row_is_none() {
        assert_eq!(record_from(None).unwrap(), None);
    }

    #[test]
    fn record_uses_column_names() {
        let text = r#"{"user_id":"u-7","title":"Meu Projeto","content":{"pages":[]}}"#;
        let record = record_from(Some(text.to_string())).unwrap().unwrap();
        assert_eq!(record.user_id, UserId::new("u-7"));
        assert_eq!(record.title, "Meu Projeto");
        assert!(record.content["pages"].is_array());
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(matches!(
            record_from(Some("{".into())),
            Err(StoreError::Json(_))
        ));
        assert!(matches!(session_from(None), Err(StoreError::Backend(_))));
        assert!(matches!(
            session_from(Some(r#"{"email":"a@b.org"}"#.into())),
            Err(StoreError::Json(_))
        ));
    }
}
