//! User session handling over an opaque credential store.

use tracing::info;

use crate::errors::AppError;
use crate::models::User;

/// Credential persistence capability. The core never inspects how the
/// record is stored.
pub trait CredentialStore: Send + Sync {
    fn set(&self, user: &User);
    fn get(&self) -> Option<User>;
    fn clear(&self);
}

/// Validates credentials and persists the session.
///
/// Empty username or password is rejected; anything else is accepted and
/// stored (the upstream service performs no further validation).
pub fn login(store: &dyn CredentialStore, username: &str, password: &str) -> Result<User, AppError> {
    if username.is_empty() || password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let user = User {
        username: username.to_string(),
    };
    store.set(&user);
    info!("User '{}' logged in", user.username);
    Ok(user)
}

pub fn logout(store: &dyn CredentialStore) {
    store.clear();
}

pub fn current_user(store: &dyn CredentialStore) -> Option<User> {
    store.get()
}

/// In-memory credential store for the binary and tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    user: std::sync::Mutex<Option<User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set(&self, user: &User) {
        if let Ok(mut slot) = self.user.lock() {
            *slot = Some(user.clone());
        }
    }

    fn get(&self) -> Option<User> {
        self.user.lock().ok().and_then(|slot| slot.clone())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.user.lock() {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_persists_user() {
        let store = MemoryCredentialStore::new();
        let user = login(&store, "mario", "secret").unwrap();
        assert_eq!(user.username, "mario");
        assert_eq!(current_user(&store), Some(user));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let store = MemoryCredentialStore::new();
        assert!(matches!(
            login(&store, "", "secret"),
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, "mario", ""),
            Err(AppError::InvalidCredentials)
        ));
        assert!(current_user(&store).is_none());
    }

    #[test]
    fn logout_clears_session() {
        let store = MemoryCredentialStore::new();
        login(&store, "mario", "secret").unwrap();
        logout(&store);
        assert!(current_user(&store).is_none());
    }
}
