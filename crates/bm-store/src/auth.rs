//! The account boundary.
//!
//! Providers keep the current session and broadcast changes on a watch
//! channel, so a host can swap between the sign-in form and the editor.

use crate::error::StoreError;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Minimum password length accepted on sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Opaque account identifier assigned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Crosses host boundaries as `{ "userId", "email" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: UserId,
    pub email: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_lowercase(),
            password: password.into(),
        }
    }

    /// Shape checks done before contacting the provider.
    pub fn validate(&self) -> Result<(), StoreError> {
        let valid_email = self
            .email
            .split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(StoreError::InvalidEmail(self.email.clone()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StoreError::WeakPassword(MIN_PASSWORD_LEN));
        }
        Ok(())
    }
}

/// The returned futures need not be `Send`.
pub trait AuthProvider {
    /// The signed-in session, if any.
    fn session(&self) -> Option<AuthSession>;

    /// Session changes, starting with the current one.
    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>>;

    /// Create an account and sign it in.
    fn sign_up<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> LocalBoxFuture<'a, Result<AuthSession, StoreError>>;

    fn sign_in<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> LocalBoxFuture<'a, Result<AuthSession, StoreError>>;

    fn sign_out(&self) -> LocalBoxFuture<'_, Result<(), StoreError>>;

    fn current_user(&self) -> Option<UserId> {
        self.session().map(|s| s.user_id)
    }
}

impl<T: AuthProvider + ?Sized> AuthProvider for Arc<T> {
    fn session(&self) -> Option<AuthSession> {
        (**self).session()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        (**self).subscribe()
    }

    fn sign_up<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> LocalBoxFuture<'a, Result<AuthSession, StoreError>> {
        (**self).sign_up(credentials)
    }

    fn sign_in<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> LocalBoxFuture<'a, Result<AuthSession, StoreError>> {
        (**self).sign_in(credentials)
    }

    fn sign_out(&self) -> LocalBoxFuture<'_, Result<(), StoreError>> {
        (**self).sign_out()
    }
}
