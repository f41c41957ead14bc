//! API client for the VitaSage backend.
//!
//! `ApiClient` wraps a shared `reqwest::Client` and runs two steps around
//! every call:
//!
//! - before sending, the session token (if any) is attached as
//!   `Authorization: Bearer <token>`
//! - after receiving, a 401 clears the stored credentials, asks the
//!   [`Navigator`] to go to the login route and publishes an [`AuthEvent`]
//!
//! The original error is always returned to the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::{CredentialStore, Navigator, Session, StoredUser};
use crate::config::ClientConfig;
use crate::models::{
    password_fits, HospitalCreate, LoginRequest, RegisterResponse, TokenResponse, UserCreate,
    UserOut, MAX_PASSWORD_BYTES,
};

use super::ApiError;

/// Capacity of the auth event channel.
/// Events are rare (one per 401) so a small buffer is plenty.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Credential lifecycle events published by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A login stored a new session.
    LoggedIn { username: String },
    /// The session was cleared on request.
    LoggedOut,
    /// A request came back 401 and the session was cleared.
    /// `redirected` is false when the login-page guard suppressed navigation.
    Unauthorized { redirected: bool },
}

/// API client for the VitaSage backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// and clones share the credential store, navigator and event channel.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Option<String>,
    session: Session,
    navigator: Arc<dyn Navigator>,
    events: broadcast::Sender<AuthEvent>,
    skip_redirect_on_auth_paths: bool,
    login_path: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .context("Failed to build HTTP client")?;

        if config.base_url.is_none() {
            warn!("No API base URL configured; requests will fail until VITE_API_URL is set");
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base_url: config.base_url,
            session: Session::new(store),
            navigator,
            events,
            skip_redirect_on_auth_paths: config.skip_redirect_on_auth_paths,
            login_path: config.login_path,
        })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Subscribe to credential lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn url(&self, path: &str) -> Result<String, ApiError> {
        let base = self.base_url.as_deref().ok_or(ApiError::MissingBaseUrl)?;
        Ok(format!("{}/{}", base, path.trim_start_matches('/')))
    }

    /// Headers carrying the session token, empty when there is none.
    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.session.token() {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value, sending without it"),
            }
        }
        headers
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &body);

        if matches!(error, ApiError::Unauthorized(_)) {
            self.handle_unauthorized();
        } else {
            debug!(status = status.as_u16(), "Request failed");
        }

        Err(error.into())
    }

    /// Clear credentials and send the host to its login route.
    fn handle_unauthorized(&self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear credentials after 401");
        }

        let on_login_page = self.skip_redirect_on_auth_paths
            && self
                .navigator
                .current_path()
                .is_some_and(|path| path.contains(&self.login_path));

        let redirected = if on_login_page {
            debug!("Already on the login page, not redirecting");
            false
        } else {
            info!(to = %self.login_path, "Session rejected, redirecting to login");
            self.navigator.navigate(&self.login_path);
            true
        };

        // No subscribers is fine
        let _ = self.events.send(AuthEvent::Unauthorized { redirected });
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = self.url(path)?;

        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        self.check_response(response).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.send(method, path, body).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(Method::GET, path, None::<&()>).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(Method::POST, path, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(Method::PATCH, path, Some(body)).await
    }

    /// DELETE a resource, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    // ===== Authentication =====

    /// Log in and store the session token and user record.
    pub async fn login(&self, hospital_id: &str, username: &str, password: &str) -> Result<StoredUser> {
        let request = LoginRequest::new(hospital_id, username, password);
        let response: TokenResponse = self
            .post("/auth/login", &request)
            .await
            .context("Login failed")?;

        let user = StoredUser::from_login(&request.username, &response);
        self.session.save(&response.access_token, &user)?;

        info!(username = %user.username, hospital = %user.hospital_id, role = %user.role, "Logged in");
        let _ = self.events.send(AuthEvent::LoggedIn {
            username: user.username.clone(),
        });
        Ok(user)
    }

    /// Forget the stored session. The backend keeps no session state.
    pub fn logout(&self) -> Result<()> {
        self.session.clear()?;
        info!("Logged out");
        let _ = self.events.send(AuthEvent::LoggedOut);
        Ok(())
    }

    /// Register a hospital together with its first admin account.
    pub async fn register_hospital(&self, payload: &HospitalCreate) -> Result<RegisterResponse> {
        check_password(&payload.admin_password)?;
        self.post("/auth/register-hospital", payload).await
    }

    // ===== Users =====

    pub async fn me(&self) -> Result<UserOut> {
        self.get("/users/me").await
    }

    /// List the users of the current user's hospital (admin only).
    pub async fn list_users(&self) -> Result<Vec<UserOut>> {
        self.get("/users/").await
    }

    pub async fn create_user(&self, payload: &UserCreate) -> Result<UserOut> {
        check_password(&payload.password)?;
        self.post("/users/", payload).await
    }

    /// Flip a user between active and disabled.
    pub async fn toggle_user_status(&self, user_id: i64) -> Result<UserOut> {
        self.send_json(Method::PATCH, &format!("/users/{}/toggle", user_id), None::<&()>)
            .await
    }
}

fn check_password(password: &str) -> Result<(), ApiError> {
    if !password_fits(password) {
        return Err(ApiError::InvalidInput(format!(
            "Password too long. Maximum length is {} bytes.",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStore, NoopNavigator};

    fn client(base: Option<&str>) -> ApiClient {
        let mut config = ClientConfig::default();
        config.base_url = base.map(str::to_string);
        ApiClient::new(config, Arc::new(MemoryStore::new()), Arc::new(NoopNavigator)).unwrap()
    }

    #[test]
    fn test_url_joins_paths() {
        let c = client(Some("https://example.com"));
        assert_eq!(c.url("/users/me").unwrap(), "https://example.com/users/me");
        assert_eq!(c.url("users/").unwrap(), "https://example.com/users/");
    }

    #[test]
    fn test_url_without_base_fails() {
        let c = client(None);
        assert!(c.base_url().is_none());
        assert!(matches!(c.url("/users/me"), Err(ApiError::MissingBaseUrl)));
    }

    #[test]
    fn test_auth_headers_follow_store() {
        let c = client(Some("https://example.com"));
        assert!(c.auth_headers().get(header::AUTHORIZATION).is_none());

        let user = StoredUser {
            username: "asha".to_string(),
            role: "admin".to_string(),
            full_name: None,
            hospital_id: "H001".to_string(),
            logged_in_at: chrono::Utc::now(),
        };
        c.session().save("abc", &user).unwrap();
        assert_eq!(
            c.auth_headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn test_auth_headers_skip_unencodable_token() {
        let c = client(Some("https://example.com"));
        let store = MemoryStore::new();
        store.set(crate::auth::TOKEN_KEY, "bad\ntoken").unwrap();
        let c = ApiClient {
            session: Session::new(Arc::new(store)),
            ..c
        };
        assert!(c.auth_headers().is_empty());
    }

    #[test]
    fn test_check_password() {
        assert!(check_password("secret").is_ok());
        // The backend accepts empty passwords, only the byte limit is enforced
        assert!(check_password("").is_ok());
        assert!(check_password(&"x".repeat(72)).is_ok());
        assert!(matches!(check_password(&"x".repeat(73)), Err(ApiError::InvalidInput(_))));
    }
}
