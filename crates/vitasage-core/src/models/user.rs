use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Longest password the backend accepts, in UTF-8 bytes (bcrypt limit).
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Staff,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Staff => "staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOut {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub last_login: Option<NaiveDateTime>,
}

fn default_status() -> bool {
    true
}

impl UserOut {
    pub fn display_status(&self) -> &'static str {
        if self.status {
            "active"
        } else {
            "disabled"
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Whether a password fits the backend's byte limit.
pub fn password_fits(password: &str) -> bool {
    password.len() <= MAX_PASSWORD_BYTES
}
