use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub hospital_id: String,
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    /// Build a request with inputs normalized the way the backend stores them.
    pub fn new(hospital_id: &str, username: &str, password: &str) -> Self {
        Self {
            hospital_id: hospital_id.trim().to_string(),
            username: username.trim().to_lowercase(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub role: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub hospital_id: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Bootstrap registration of a hospital and its first admin account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalCreate {
    pub hospital_id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_full_name: Option<String>,
    pub register_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub hospital_id: String,
}
