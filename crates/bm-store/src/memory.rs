//! In-process backend implementing both boundaries.
//!
//! Backs the integration tests and native callers without a hosted
//! service. Passwords are kept in memory as given.

use crate::auth::{AuthProvider, AuthSession, Credentials, UserId};
use crate::error::StoreError;
use crate::store::{ProjectRecord, ProjectStore};
use futures::future::LocalBoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

struct Account {
    user_id: UserId,
    password: String,
}

pub struct MemoryBackend {
    accounts: Mutex<HashMap<String, Account>>,
    projects: Mutex<HashMap<UserId, ProjectRecord>>,
    session: watch::Sender<Option<AuthSession>>,
    next_user: AtomicU64,
    offline: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            projects: Mutex::new(HashMap::new()),
            session,
            next_user: AtomicU64::new(1),
            offline: AtomicBool::new(false),
        }
    }

    /// Make every call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    pub fn project_count(&self) -> usize {
        lock(&self.projects).len()
    }

    fn reachable(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::Acquire) {
            return Err(StoreError::Backend("network unreachable".into()));
        }
        Ok(())
    }

    fn start_session(&self, user_id: UserId, email: &str) -> AuthSession {
        let session = AuthSession {
            user_id,
            email: email.to_string(),
        };
        self.session.send_replace(Some(session.clone()));
        log::info!("signed in as {}", session.email);
        session
    }

    fn do_sign_up(&self, credentials: &Credentials) -> Result<AuthSession, StoreError> {
        self.reachable()?;
        credentials.validate()?;
        let user_id = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(&credentials.email) {
                return Err(StoreError::UserExists(credentials.email.clone()));
            }
            let n = self.next_user.fetch_add(1, Ordering::Relaxed);
            let user_id = UserId::new(format!("user-{n}"));
            accounts.insert(
                credentials.email.clone(),
                Account {
                    user_id: user_id.clone(),
                    password: credentials.password.clone(),
                },
            );
            user_id
        };
        Ok(self.start_session(user_id, &credentials.email))
    }

    fn do_sign_in(&self, credentials: &Credentials) -> Result<AuthSession, StoreError> {
        self.reachable()?;
        let user_id = {
            let accounts = lock(&self.accounts);
            match accounts.get(&credentials.email) {
                Some(account) if account.password == credentials.password => account.user_id.clone(),
                _ => return Err(StoreError::InvalidCredentials),
            }
        };
        Ok(self.start_session(user_id, &credentials.email))
    }
}

impl AuthProvider for MemoryBackend {
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
        Box::pin(async move { self.do_sign_up(credentials) })
    }

    fn sign_in<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> LocalBoxFuture<'a, Result<AuthSession, StoreError>> {
        Box::pin(async move { self.do_sign_in(credentials) })
    }

    fn sign_out(&self) -> LocalBoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            if self.session.send_replace(None).is_some() {
                log::info!("signed out");
            }
            Ok(())
        })
    }
}

impl ProjectStore for MemoryBackend {
    fn upsert(&self, record: ProjectRecord) -> LocalBoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.reachable()?;
            lock(&self.projects).insert(record.user_id.clone(), record);
            Ok(())
        })
    }

    fn fetch<'a>(
        &'a self,
        user: &'a UserId,
    ) -> LocalBoxFuture<'a, Result<Option<ProjectRecord>, StoreError>> {
        Box::pin(async move {
            self.reachable()?;
            Ok(lock(&self.projects).get(user).cloned())
        })
    }
}
