//! Session lifecycle: restore, log in, log out.
//!
//! ```text
//! Unauthenticated --login--> Authenticating --ok--> Authenticated
//!        ^                          |                   |
//!        +---------fail-------------+                   |
//!        +-----------------logout-----------------------+
//! Authenticated --401/403 while restoring--> Expired --logout/login--> ...
//! ```
//!
//! The executor's bearer token always mirrors the token of an authenticated
//! session and is cleared on every other state.

use crate::app::services::AuthService;
use crate::core::credentials::{SecureCredentialStore, StoredCredentials};
use crate::core::envelope::ResponseEnvelope;
use crate::domain::model::{Credentials, LoginResult, Session, SessionState, Subject};
use crate::domain::ports::SecretStorage;
use crate::utils::error::AccessError;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct SessionContext<S: SecretStorage> {
    auth: AuthService,
    store: SecureCredentialStore<S>,
    session: RwLock<Session>,
}

impl<S: SecretStorage> SessionContext<S> {
    pub fn new(auth: AuthService, storage: S) -> Self {
        Self {
            auth,
            store: SecureCredentialStore::new(storage),
            session: RwLock::new(Session::unauthenticated()),
        }
    }

    pub fn session(&self) -> Session {
        self.read_session().clone()
    }

    pub fn state(&self) -> SessionState {
        self.read_session().state
    }

    pub fn subject(&self) -> Option<Subject> {
        self.read_session().subject.clone()
    }

    pub fn store(&self) -> &SecureCredentialStore<S> {
        &self.store
    }

    /// Restores a persisted session and checks it against the backend.
    ///
    /// Only an explicit rejection of the token expires the session. When the
    /// backend cannot be asked, the stored session is kept.
    pub async fn hydrate(&self) -> SessionState {
        let stored = match self.store.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                self.transition(Session::unauthenticated());
                return SessionState::Unauthenticated;
            }
            Err(e) => {
                tracing::warn!("🔐 Could not read stored credentials: {}", e);
                self.transition(Session::unauthenticated());
                return SessionState::Unauthenticated;
            }
        };

        self.transition(Session {
            token: Some(stored.token.clone()),
            subject: Some(stored.subject.clone()),
            state: SessionState::Authenticated,
        });

        match self.auth.validate_session().await {
            Ok(_) => {
                tracing::info!("🔐 Session restored for {}", stored.subject.display_name);
                SessionState::Authenticated
            }
            Err(AccessError::SessionExpired) => {
                tracing::info!("🔐 Stored session was rejected, marking it expired");
                if let Err(e) = self.store.clear().await {
                    tracing::warn!("🔐 Could not clear expired credentials: {}", e);
                }
                self.transition(Session {
                    token: None,
                    subject: None,
                    state: SessionState::Expired,
                });
                SessionState::Expired
            }
            Err(e) => {
                tracing::warn!("🔐 Session could not be verified ({}), keeping it", e);
                SessionState::Authenticated
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> ResponseEnvelope<LoginResult> {
        {
            let mut session = self.write_session();
            match session.state {
                SessionState::Authenticating => {
                    return ResponseEnvelope::fail("Ya hay un inicio de sesión en curso");
                }
                SessionState::Authenticated => {
                    return ResponseEnvelope::fail(
                        "Ya hay una sesión activa, cierra sesión primero",
                    );
                }
                SessionState::Unauthenticated | SessionState::Expired => {
                    *session = Session {
                        token: None,
                        subject: None,
                        state: SessionState::Authenticating,
                    };
                }
            }
        }

        let result = match self.auth.login_result(credentials).await {
            Ok(result) => result,
            Err(e) => {
                tracing::info!("🔐 Login rejected: {}", e);
                self.transition(Session::unauthenticated());
                return ResponseEnvelope::from_error(&e);
            }
        };

        let stored = StoredCredentials {
            token: result.token.clone(),
            subject: result.user.clone(),
        };
        if let Err(e) = self.store.save(&stored).await {
            tracing::warn!("🔐 Could not persist credentials: {}", e);
            self.transition(Session::unauthenticated());
            return ResponseEnvelope::from_error(&e);
        }

        self.transition(Session {
            token: Some(result.token.clone()),
            subject: Some(result.user.clone()),
            state: SessionState::Authenticated,
        });
        tracing::info!("🔐 Logged in as {}", result.user.display_name);

        ResponseEnvelope::ok_with_message(result, "Inicio de sesión exitoso")
    }

    /// Always ends unauthenticated locally, whatever the server answers.
    pub async fn logout(&self) -> ResponseEnvelope<()> {
        match self.state() {
            SessionState::Authenticated | SessionState::Expired => {}
            SessionState::Unauthenticated | SessionState::Authenticating => {
                return ResponseEnvelope::fail("No hay una sesión activa");
            }
        }

        self.auth.logout_remote().await;
        if let Err(e) = self.store.clear().await {
            tracing::warn!("🔐 Could not clear stored credentials: {}", e);
        }
        self.transition(Session::unauthenticated());
        tracing::info!("🔐 Logged out");

        ResponseEnvelope::ok_with_message((), "Sesión cerrada")
    }

    fn transition(&self, next: Session) {
        let bearer = match next.state {
            SessionState::Authenticated => next.token.clone(),
            _ => None,
        };
        self.auth.context().executor().set_bearer_token(bearer);
        *self.write_session() = next;
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemorySecretStorage;
    use crate::config::ClientConfig;
    use crate::core::credentials::TOKEN_KEY;
    use crate::core::policy::ServiceContext;
    use std::sync::Arc;

    fn demo_session() -> SessionContext<MemorySecretStorage> {
        let ctx = Arc::new(ServiceContext::new(ClientConfig::demo()).unwrap());
        SessionContext::new(AuthService::new(ctx), MemorySecretStorage::new())
    }

    #[tokio::test]
    async fn test_login_persists_and_sets_bearer() {
        let session = demo_session();
        let envelope = session
            .login(&Credentials::new("juan.perez@alumno.edu", "demo123"))
            .await;

        assert!(envelope.success);
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.subject().unwrap().display_name, "juan.perez");
        assert_eq!(session.store().storage().len().await, 2);
        assert_eq!(
            session.auth.context().executor().bearer_token().as_deref(),
            Some("demo-token-12345")
        );
    }

    #[tokio::test]
    async fn test_login_twice_is_rejected() {
        let session = demo_session();
        let credentials = Credentials::new("juan.perez", "demo123");
        assert!(session.login(&credentials).await.success);

        let second = session.login(&credentials).await;
        assert!(!second.success);
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_wrong_password_stays_unauthenticated() {
        let session = demo_session();
        let envelope = session
            .login(&Credentials::new("juan.perez@alumno.edu", "nope"))
            .await;

        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Credenciales inválidas"));
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.store().storage().is_empty().await);
    }

    #[tokio::test]
    async fn test_logout_requires_session() {
        let session = demo_session();
        assert!(!session.logout().await.success);

        session
            .login(&Credentials::new("juan.perez", "demo123"))
            .await;
        assert!(session.logout().await.success);
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.store().storage().is_empty().await);
        assert!(session.auth.context().executor().bearer_token().is_none());
    }

    #[tokio::test]
    async fn test_hydrate_with_unknown_demo_token_expires() {
        let session = demo_session();
        session
            .store()
            .save(&StoredCredentials {
                token: "revoked".to_string(),
                subject: Subject {
                    id: 1,
                    display_name: "juan.perez".to_string(),
                    email: "juan.perez@alumno.edu".to_string(),
                    roles: vec![],
                },
            })
            .await
            .unwrap();

        assert_eq!(session.hydrate().await, SessionState::Expired);
        assert!(session.store().storage().read_entry(TOKEN_KEY).await.unwrap().is_none());
        assert!(session.subject().is_none());
    }
}
