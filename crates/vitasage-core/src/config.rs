//! Client configuration.
//!
//! The API base URL is resolved once, when the client is built, from the
//! `VITE_API_URL` environment variable. What happens when the variable is
//! missing depends on the [`BaseUrlPolicy`].

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

/// Application name used for the storage directory path
pub const APP_NAME: &str = "vitasage";

/// Environment variable that overrides the API base URL
pub const API_URL_ENV: &str = "VITE_API_URL";

/// Deployed backend used when `VITE_API_URL` is unset under [`BaseUrlPolicy::Fallback`]
pub const FALLBACK_API_URL: &str = "https://health-final.onrender.com";

/// Route the host is sent to after an authentication failure
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// How to resolve the base URL when `VITE_API_URL` is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseUrlPolicy {
    /// Use [`FALLBACK_API_URL`].
    Fallback,
    /// Leave the base URL undefined; every request fails with `MissingBaseUrl`.
    #[default]
    Strict,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    /// Skip the login redirect when the current path already contains the login path.
    pub skip_redirect_on_auth_paths: bool,
    pub login_path: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            skip_redirect_on_auth_paths: false,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env(policy: BaseUrlPolicy) -> Self {
        Self::from_lookup(policy, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration using an arbitrary variable lookup.
    pub fn from_lookup<F>(policy: BaseUrlPolicy, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = lookup(API_URL_ENV)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let base_url = match (from_env, policy) {
            (Some(url), _) => Some(url),
            (None, BaseUrlPolicy::Fallback) => Some(FALLBACK_API_URL.to_string()),
            (None, BaseUrlPolicy::Strict) => None,
        };

        Self {
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn skip_redirect_on_auth_paths(mut self, skip: bool) -> Self {
        self.skip_redirect_on_auth_paths = skip;
        self
    }

    /// Directory holding the file-backed credential store.
    pub fn storage_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_with(value: Option<&'static str>) -> impl Fn(&str) -> Option<String> {
        move |key| {
            assert_eq!(key, API_URL_ENV);
            value.map(str::to_string)
        }
    }

    #[test]
    fn test_env_value_wins_for_both_policies() {
        let fallback = ClientConfig::from_lookup(BaseUrlPolicy::Fallback, lookup_with(Some("https://example.com")));
        let strict = ClientConfig::from_lookup(BaseUrlPolicy::Strict, lookup_with(Some("https://example.com")));
        assert_eq!(fallback.base_url.as_deref(), Some("https://example.com"));
        assert_eq!(strict.base_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_unset_uses_fallback_url() {
        let config = ClientConfig::from_lookup(BaseUrlPolicy::Fallback, lookup_with(None));
        assert_eq!(config.base_url.as_deref(), Some(FALLBACK_API_URL));
    }

    #[test]
    fn test_unset_strict_leaves_base_url_undefined() {
        let config = ClientConfig::from_lookup(BaseUrlPolicy::Strict, lookup_with(None));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let config = ClientConfig::from_lookup(BaseUrlPolicy::Strict, lookup_with(Some("  ")));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::from_lookup(BaseUrlPolicy::Strict, lookup_with(Some("http://localhost:8000/")));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.login_path, "/login");
        assert!(!config.skip_redirect_on_auth_paths);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
