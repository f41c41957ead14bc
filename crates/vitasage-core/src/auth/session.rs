use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::CredentialStore;
use crate::models::TokenResponse;

/// Storage key of the session token
pub const TOKEN_KEY: &str = "vs_token";

/// Storage key of the cached user record
pub const USER_KEY: &str = "vs_user";

/// User record cached next to the token after a login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub hospital_id: String,
    pub logged_in_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn from_login(username: &str, response: &TokenResponse) -> Self {
        Self {
            username: username.to_string(),
            role: response.role.clone(),
            full_name: response.full_name.clone(),
            hospital_id: response.hospital_id.clone(),
            logged_in_at: Utc::now(),
        }
    }

    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Typed view over the `vs_token` / `vs_user` entries of a credential store.
/// Clone is cheap, clones share the same store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// The stored token, if any.
    ///
    /// Read failures and the empty string count as "no token": the request goes
    /// out unauthenticated and the server answers 401.
    pub fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    /// The raw cached user record, exactly as stored.
    pub fn raw_user(&self) -> Result<Option<String>> {
        self.store.get(USER_KEY)
    }

    /// The cached user record, if present and written by [`Session::save`].
    pub fn user(&self) -> Option<StoredUser> {
        let raw = self.raw_user().ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "Cached user record is not a StoredUser");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Persist a token and its user record.
    pub fn save(&self, token: &str, user: &StoredUser) -> Result<()> {
        let user_json = serde_json::to_string(user).context("Failed to serialize user record")?;
        self.store
            .set(TOKEN_KEY, token)
            .context("Failed to store session token")?;
        self.store
            .set(USER_KEY, &user_json)
            .context("Failed to store user record")?;
        Ok(())
    }

    /// Remove both the token and the user record.
    pub fn clear(&self) -> Result<()> {
        self.store
            .remove(TOKEN_KEY)
            .context("Failed to remove session token")?;
        self.store
            .remove(USER_KEY)
            .context("Failed to remove user record")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;

    fn user() -> StoredUser {
        StoredUser {
            username: "asha".to_string(),
            role: "doctor".to_string(),
            full_name: Some("Asha Rao".to_string()),
            hospital_id: "H001".to_string(),
            logged_in_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_then_clear() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        assert!(!session.is_authenticated());

        session.save("tok", &user()).unwrap();
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.user().map(|u| u.username), Some("asha".to_string()));

        session.clear().unwrap();
        assert!(!store.contains(TOKEN_KEY));
        assert!(!store.contains(USER_KEY));
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "").unwrap();
        assert!(Session::new(store.clone()).token().is_none());

        // Only the empty string is skipped; anything else is sent as-is
        store.set(TOKEN_KEY, " ").unwrap();
        assert_eq!(Session::new(store).token().as_deref(), Some(" "));
    }

    #[test]
    fn test_opaque_user_record_is_kept_but_not_parsed() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{\"name\":\"someone\"}").unwrap();
        let session = Session::new(store);
        assert!(session.user().is_none());
        assert!(session.raw_user().unwrap().is_some());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut u = user();
        assert_eq!(u.display_name(), "Asha Rao");
        u.full_name = None;
        assert_eq!(u.display_name(), "asha");
    }
}
