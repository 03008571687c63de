//! Auth session provider
//!
//! One explicit [`AuthSession`] object owns the signed-in user, the token
//! and the persisted copy of both. Views hold a reference to it instead of
//! reaching for a global.
//!
//! ```text
//! init()   store ──restore──▶ memory ──me()──▶ refresh | clear | keep (offline)
//! login()  backend ──{user, token}──▶ memory + store + http token
//! logout() memory, store and http token cleared
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use shared::client::{LoginRequest, SignupRequest};
use shared::models::{Location, Role, User};
use shared::{AppError, AuthPayload, ErrorCode};

use crate::auth::AuthBackend;
use crate::routing::dashboard_path;
use crate::{ClientError, ClientResult};

/// What survives a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
}

/// Persistence for [`StoredSession`]
pub trait SessionStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ClientResult<Option<StoredSession>> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, session: &StoredSession) -> ClientResult<()> {
        *self.inner.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.inner.lock() = None;
        Ok(())
    }
}

/// JSON file store
///
/// A corrupt file is treated as no session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_err(path: &Path, e: std::io::Error) -> ClientError {
    ClientError::Storage(format!("{}: {e}", path.display()))
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ClientResult<Option<StoredSession>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_err(&self.path, e)),
        };
        match serde_json::from_str(&text) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &StoredSession) -> ClientResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| storage_err(parent, e))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        // write-then-rename so a crash never leaves half a file
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| storage_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| storage_err(&self.path, e))
    }

    fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(&self.path, e)),
        }
    }
}

/// Signup form as entered, before the confirmation check
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub location: Option<Location>,
}

impl SignupForm {
    fn into_request(self) -> SignupRequest {
        SignupRequest {
            name: self.name,
            email: self.email,
            phone: self.phone,
            password: self.password,
            role: Some(self.role),
            location: self.location,
        }
    }
}

#[derive(Debug)]
struct SessionState {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
        }
    }
}

pub struct AuthSession<B, S> {
    backend: B,
    store: S,
    state: RwLock<SessionState>,
}

impl<B: AuthBackend, S: SessionStore> AuthSession<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self {
            backend,
            store,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Restore the persisted session and confirm it with the server
    ///
    /// A rejected token clears the session; an unreachable server keeps the
    /// restored one so the app still works offline.
    pub async fn init(&self) {
        let restored = self.store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load stored session");
            None
        });

        if let Some(session) = restored {
            self.backend.set_token(Some(session.token.clone()));
            {
                let mut state = self.state.write();
                state.user = Some(session.user.clone());
                state.token = Some(session.token.clone());
            }

            match self.backend.me().await {
                Ok(payload) => {
                    self.state.write().user = Some(payload.user.clone());
                    let refreshed = StoredSession {
                        token: session.token,
                        user: payload.user,
                    };
                    if let Err(e) = self.store.save(&refreshed) {
                        tracing::warn!(error = %e, "Failed to persist refreshed user");
                    }
                }
                Err(e) if e.is_network() => {
                    tracing::warn!(error = %e, "Server unreachable, keeping restored session");
                }
                Err(e) => {
                    tracing::info!(error = %e, "Stored session rejected, signing out");
                    self.clear_all();
                }
            }
        }

        self.state.write().loading = false;
    }

    /// Sign in and return the dashboard route for the user's role
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<&'static str> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let payload = self.backend.login(&request).await?;
        Ok(self.establish(payload))
    }

    /// Register and return the dashboard route for the new user's role
    ///
    /// A confirmation mismatch fails locally without contacting the server.
    pub async fn signup(&self, form: SignupForm) -> ClientResult<&'static str> {
        if form.password != form.confirm_password {
            return Err(AppError::new(ErrorCode::PasswordMismatch).into());
        }
        let payload = self.backend.signup(&form.into_request()).await?;
        Ok(self.establish(payload))
    }

    pub fn logout(&self) -> ClientResult<()> {
        self.clear_memory();
        self.backend.set_token(None);
        self.store.clear()
    }

    /// Drop in-memory state only; the persisted session stays for next time
    pub fn teardown(&self) {
        self.clear_memory();
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().user.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn establish(&self, payload: AuthPayload) -> &'static str {
        let route = dashboard_path(payload.user.role);
        if let Some(token) = &payload.token {
            self.backend.set_token(Some(token.clone()));
            let stored = StoredSession {
                token: token.clone(),
                user: payload.user.clone(),
            };
            if let Err(e) = self.store.save(&stored) {
                tracing::warn!(error = %e, "Failed to persist session");
            }
        }

        let mut state = self.state.write();
        if payload.token.is_some() {
            state.token = payload.token;
        }
        state.user = Some(payload.user);
        route
    }

    fn clear_memory(&self) {
        let mut state = self.state.write();
        state.user = None;
        state.token = None;
        state.loading = false;
    }

    fn clear_all(&self) {
        self.clear_memory();
        self.backend.set_token(None);
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{CITIZEN_DASHBOARD, OFFICER_DASHBOARD};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user(role: Role) -> User {
        User {
            id: "u1".into(),
            name: "Meera".into(),
            email: "meera@example.com".into(),
            phone: None,
            role,
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[derive(Clone, Copy)]
    enum MeOutcome {
        Ok,
        Rejected,
        Offline,
    }

    struct MockBackend {
        role: Role,
        me_outcome: MeOutcome,
        signup_calls: AtomicUsize,
        token: Mutex<Option<String>>,
    }

    impl MockBackend {
        fn new(role: Role, me_outcome: MeOutcome) -> Self {
            Self {
                role,
                me_outcome,
                signup_calls: AtomicUsize::new(0),
                token: Mutex::new(None),
            }
        }
    }

    /// A real transport error: connect to a port nobody listens on
    async fn network_error() -> ClientError {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        reqwest::Client::new()
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .unwrap_err()
            .into()
    }

    #[async_trait]
    impl AuthBackend for MockBackend {
        async fn signup(&self, _request: &SignupRequest) -> ClientResult<AuthPayload> {
            self.signup_calls.fetch_add(1, Ordering::SeqCst);
            Ok(AuthPayload {
                user: user(self.role),
                token: Some("signup-token".into()),
            })
        }

        async fn login(&self, request: &LoginRequest) -> ClientResult<AuthPayload> {
            if request.password != "secret123" {
                return Err(ClientError::Unauthorized("Invalid email or password".into()));
            }
            Ok(AuthPayload {
                user: user(self.role),
                token: Some("login-token".into()),
            })
        }

        async fn me(&self) -> ClientResult<AuthPayload> {
            match self.me_outcome {
                MeOutcome::Ok => {
                    let mut fresh = user(self.role);
                    fresh.name = "Meera K".into();
                    Ok(AuthPayload {
                        user: fresh,
                        token: None,
                    })
                }
                MeOutcome::Rejected => Err(ClientError::Unauthorized("Token expired".into())),
                MeOutcome::Offline => Err(network_error().await),
            }
        }

        fn set_token(&self, token: Option<String>) {
            *self.token.lock() = token;
        }
    }

    fn form(password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            name: "Meera".into(),
            email: "meera@example.com".into(),
            phone: None,
            password: password.into(),
            confirm_password: confirm.into(),
            role: Role::Citizen,
            location: None,
        }
    }

    fn stored(role: Role) -> StoredSession {
        StoredSession {
            token: "stored-token".into(),
            user: user(role),
        }
    }

    #[tokio::test]
    async fn test_signup_mismatch_never_calls_backend() {
        let session = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Ok),
            MemorySessionStore::new(),
        );

        let err = session.signup(form("secret123", "secret124")).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::PasswordMismatch));
        assert_eq!(session.backend().signup_calls.load(Ordering::SeqCst), 0);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_signup_persists_session() {
        let session = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Ok),
            MemorySessionStore::new(),
        );

        let route = session.signup(form("secret123", "secret123")).await.unwrap();
        assert_eq!(route, CITIZEN_DASHBOARD);
        assert_eq!(session.backend().signup_calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.token().as_deref(), Some("signup-token"));
        assert_eq!(session.store.load().unwrap().unwrap().token, "signup-token");
    }

    #[tokio::test]
    async fn test_login_redirects_by_role() {
        let officer = AuthSession::new(
            MockBackend::new(Role::GovernmentOfficer, MeOutcome::Ok),
            MemorySessionStore::new(),
        );
        assert_eq!(
            officer.login("o@example.com", "secret123").await.unwrap(),
            OFFICER_DASHBOARD
        );
        assert_eq!(
            officer.backend().token.lock().as_deref(),
            Some("login-token")
        );

        let citizen = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Ok),
            MemorySessionStore::new(),
        );
        assert_eq!(
            citizen.login("c@example.com", "secret123").await.unwrap(),
            CITIZEN_DASHBOARD
        );
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_empty() {
        let session = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Ok),
            MemorySessionStore::new(),
        );
        assert!(session.login("c@example.com", "wrong").await.is_err());
        assert!(session.current_user().is_none());
        assert!(session.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_init_refreshes_restored_user() {
        let session = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Ok),
            MemorySessionStore::with_session(stored(Role::Citizen)),
        );
        assert!(session.is_loading());

        session.init().await;
        assert!(!session.is_loading());
        assert_eq!(session.current_user().unwrap().name, "Meera K");
        assert_eq!(session.store.load().unwrap().unwrap().user.name, "Meera K");
        assert_eq!(
            session.backend().token.lock().as_deref(),
            Some("stored-token")
        );
    }

    #[tokio::test]
    async fn test_init_clears_rejected_session() {
        let session = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Rejected),
            MemorySessionStore::with_session(stored(Role::Citizen)),
        );
        session.init().await;
        assert!(session.current_user().is_none());
        assert!(session.store.load().unwrap().is_none());
        assert!(session.backend().token.lock().is_none());
    }

    #[tokio::test]
    async fn test_init_keeps_session_when_offline() {
        let session = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Offline),
            MemorySessionStore::with_session(stored(Role::Citizen)),
        );
        session.init().await;
        assert_eq!(session.current_user().unwrap().name, "Meera");
        assert!(session.store.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_init_without_stored_session() {
        let session = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Ok),
            MemorySessionStore::new(),
        );
        session.init().await;
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_and_teardown() {
        let session = AuthSession::new(
            MockBackend::new(Role::Citizen, MeOutcome::Ok),
            MemorySessionStore::new(),
        );
        session.login("c@example.com", "secret123").await.unwrap();

        session.teardown();
        assert!(session.current_user().is_none());
        assert!(session.store.load().unwrap().is_some());

        session.login("c@example.com", "secret123").await.unwrap();
        session.logout().unwrap();
        assert!(session.current_user().is_none());
        assert!(session.store.load().unwrap().is_none());
        assert!(session.backend().token.lock().is_none());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&stored(Role::GovernmentOfficer)).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.user.role, Role::GovernmentOfficer);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(FileSessionStore::new(path).load().unwrap().is_none());
    }
}
