use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::error::{DeskError, DeskResult};
use crate::roles::Role;
use crate::storage::{get_json, put_json, KeyValueStore, KEY_PRINCIPAL};

pub const MIN_PASSWORD_LEN: usize = 8;

/// The signed-in user as held by the desk. Never carries a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub avatar_ref: Option<String>,
    #[serde(default)]
    pub must_change_password: bool,
}

impl Principal {
    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is empty".into());
        }
        if !self.email.contains('@') {
            return Err(format!("email {:?} is not an address", self.email));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_ascii_lowercase()
    }
}

/// Ticket handed out when a login starts; see [`SessionStore::finish_login`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTicket(u64);

/// What the guard and the UI shell observe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub principal: Option<Principal>,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct SessionStore {
    principal: Option<Principal>,
    is_loading: bool,
    error: Option<String>,
    epoch: u64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A fresh store is loading until [`restore`](Self::restore) runs.
    pub fn new() -> Self {
        Self {
            principal: None,
            is_loading: true,
            error: None,
            epoch: 0,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            principal: self.principal.clone(),
            is_loading: self.is_loading,
            is_authenticated: self.principal.is_some(),
            error: self.error.clone(),
        }
    }

    /// Hydrates the session from durable storage. Anything unreadable leaves
    /// the session signed out.
    pub fn restore(&mut self, store: &dyn KeyValueStore) -> Option<Principal> {
        self.principal = match get_json::<Principal>(store, KEY_PRINCIPAL) {
            Ok(None) => None,
            Ok(Some(Ok(p))) => match p.validate() {
                Ok(()) => Some(p),
                Err(message) => {
                    discard_malformed(store, message);
                    None
                }
            },
            Ok(Some(Err(e))) => {
                discard_malformed(store, e.to_string());
                None
            }
            Err(e) => {
                warn!(error = %e, "could not read persisted session");
                None
            }
        };
        self.is_loading = false;
        if let Some(p) = &self.principal {
            info!(email = %p.email, role = %p.role, "session restored");
        }
        self.principal.clone()
    }

    pub fn begin_login(&mut self) -> LoginTicket {
        self.epoch += 1;
        LoginTicket(self.epoch)
    }

    /// Applies a login outcome unless the session moved on (logout or a newer
    /// login) after `ticket` was issued.
    pub fn finish_login(
        &mut self,
        ticket: LoginTicket,
        store: &dyn KeyValueStore,
        outcome: DeskResult<Principal>,
    ) -> DeskResult<Principal> {
        if ticket.0 != self.epoch {
            debug!(ticket = ticket.0, epoch = self.epoch, "dropping stale login result");
            return Err(DeskError::NotAuthenticated);
        }
        match outcome {
            Ok(principal) => {
                put_json(store, KEY_PRINCIPAL, &principal)?;
                info!(email = %principal.email, role = %principal.role, "signed in");
                self.principal = Some(principal.clone());
                self.error = None;
                Ok(principal)
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn login(
        &mut self,
        store: &dyn KeyValueStore,
        auth: &dyn Authenticator,
        credentials: &Credentials,
    ) -> DeskResult<Principal> {
        let ticket = self.begin_login();
        let outcome = if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            Err(DeskError::InvalidCredentials)
        } else {
            auth.authenticate(credentials)
        };
        self.finish_login(ticket, store, outcome)
    }

    /// Signs out. Safe to call when already signed out.
    pub fn logout(&mut self, store: &dyn KeyValueStore) -> DeskResult<()> {
        self.epoch += 1;
        if let Some(p) = self.principal.take() {
            info!(email = %p.email, "signed out");
        }
        self.error = None;
        store.remove(KEY_PRINCIPAL)?;
        Ok(())
    }

    pub fn change_password(
        &mut self,
        store: &dyn KeyValueStore,
        auth: &dyn Authenticator,
        current: &str,
        new_password: &str,
    ) -> DeskResult<Principal> {
        let Some(principal) = self.principal.clone() else {
            return Err(DeskError::NotAuthenticated);
        };
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DeskError::invalid_input(
                "newPassword",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if new_password == current {
            return Err(DeskError::invalid_input(
                "newPassword",
                "must differ from the current password",
            ));
        }
        auth.change_password(&principal, current, new_password)?;

        let updated = Principal {
            must_change_password: false,
            ..principal
        };
        put_json(store, KEY_PRINCIPAL, &updated)?;
        info!(email = %updated.email, "password changed");
        self.principal = Some(updated.clone());
        Ok(updated)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

fn discard_malformed(store: &dyn KeyValueStore, message: String) {
    let e = DeskError::MalformedPersistedState {
        key: KEY_PRINCIPAL.to_string(),
        message,
    };
    warn!(error = %e, "discarding persisted session");
    if let Err(e) = store.remove(KEY_PRINCIPAL) {
        warn!(error = %e, "could not clear persisted session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthenticator;
    use crate::storage::MemoryStore;

    fn signed_in(store: &MemoryStore) -> SessionStore {
        let mut s = SessionStore::new();
        s.restore(store);
        s.login(
            store,
            &MockAuthenticator::new(store),
            &Credentials::new("teacher@school.edu", "teacher123"),
        )
        .expect("login");
        s
    }

    #[test]
    fn new_store_is_loading_until_restored() {
        let store = MemoryStore::new();
        let mut s = SessionStore::new();
        assert!(s.is_loading());
        assert!(s.principal().is_none());
        assert_eq!(s.restore(&store), None);
        assert!(!s.is_loading());
    }

    #[test]
    fn login_persists_principal_without_password() {
        let store = MemoryStore::new();
        let s = signed_in(&store);
        let p = s.principal().expect("principal");
        assert_eq!(p.role, Role::Teacher);
        let raw = store.get(KEY_PRINCIPAL).expect("get").expect("persisted");
        assert!(!raw.contains("teacher123"));
        let doc: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert!(doc.get("password").is_none());
    }

    #[test]
    fn restore_after_restart_yields_same_principal() {
        let store = MemoryStore::new();
        let before = signed_in(&store).principal().cloned().expect("principal");

        let mut restarted = SessionStore::new();
        let after = restarted.restore(&store).expect("restored");
        assert_eq!(after, before);
        assert_eq!(restarted.principal(), Some(&before));
    }

    #[test]
    fn bad_credentials_leave_session_signed_out_with_error() {
        let store = MemoryStore::new();
        let mut s = SessionStore::new();
        s.restore(&store);
        let e = s
            .login(
                &store,
                &MockAuthenticator::new(&store),
                &Credentials::new("admin@school.edu", "nope"),
            )
            .err()
            .expect("rejected");
        assert!(matches!(e, DeskError::InvalidCredentials));
        assert!(s.principal().is_none());
        assert!(s.error().is_some());
        assert!(store.get(KEY_PRINCIPAL).expect("get").is_none());
        s.dismiss_error();
        assert!(s.error().is_none());
    }

    #[test]
    fn logout_twice_is_same_as_once() {
        let store = MemoryStore::new();
        let mut s = signed_in(&store);
        s.logout(&store).expect("logout");
        let once = format!("{:?}", s.state());
        s.logout(&store).expect("logout again");
        assert_eq!(format!("{:?}", s.state()), once);
        assert!(s.principal().is_none());
        assert!(store.get(KEY_PRINCIPAL).expect("get").is_none());
    }

    #[test]
    fn malformed_persisted_session_is_discarded() {
        let store = MemoryStore::new();
        store.set(KEY_PRINCIPAL, "{\"id\":7").expect("set");
        let mut s = SessionStore::new();
        assert_eq!(s.restore(&store), None);
        assert!(!s.is_loading());
        assert!(store.get(KEY_PRINCIPAL).expect("get").is_none());

        store
            .set(
                KEY_PRINCIPAL,
                r#"{"id":"","displayName":"x","email":"nobody","role":"admin"}"#,
            )
            .expect("set");
        assert_eq!(SessionStore::new().restore(&store), None);
    }

    #[test]
    fn login_finished_after_logout_is_dropped() {
        let store = MemoryStore::new();
        let mut s = SessionStore::new();
        s.restore(&store);
        let ticket = s.begin_login();
        s.logout(&store).expect("logout");
        let late = MockAuthenticator::new(&store)
            .authenticate(&Credentials::new("admin@school.edu", "admin123"));
        assert!(s.finish_login(ticket, &store, late).is_err());
        assert!(s.principal().is_none());
        assert!(store.get(KEY_PRINCIPAL).expect("get").is_none());
    }

    #[test]
    fn change_password_validates_and_clears_flag() {
        let store = MemoryStore::new();
        let auth = MockAuthenticator::new(&store);
        let mut s = SessionStore::new();
        s.restore(&store);
        let p = s
            .login(&store, &auth, &Credentials::new("newteacher@school.edu", "welcome123"))
            .expect("login");
        assert!(p.must_change_password);

        let short = s.change_password(&store, &auth, "welcome123", "short");
        assert!(matches!(short, Err(DeskError::InvalidInput { .. })));
        let wrong = s.change_password(&store, &auth, "bad", "a-better-secret");
        assert!(matches!(wrong, Err(DeskError::InvalidCredentials)));

        let updated = s
            .change_password(&store, &auth, "welcome123", "a-better-secret")
            .expect("change");
        assert!(!updated.must_change_password);

        s.logout(&store).expect("logout");
        assert!(s
            .login(&store, &auth, &Credentials::new("newteacher@school.edu", "welcome123"))
            .is_err());
        let again = s
            .login(
                &store,
                &auth,
                &Credentials::new("newteacher@school.edu", "a-better-secret"),
            )
            .expect("login with new password");
        assert!(!again.must_change_password);
    }

    #[test]
    fn change_password_requires_session() {
        let store = MemoryStore::new();
        let mut s = SessionStore::new();
        s.restore(&store);
        let e = s
            .change_password(&store, &MockAuthenticator::new(&store), "a", "bbbbbbbbbb")
            .err()
            .expect("error");
        assert!(matches!(e, DeskError::NotAuthenticated));
    }
}
