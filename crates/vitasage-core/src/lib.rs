//! Core library for VitaSage.
//!
//! Provides the authenticated API client, credential storage backends,
//! client configuration, and the wire models shared by the binaries.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthEvent};
pub use auth::{
    CredentialStore, FileStore, KeyringStore, Location, MemoryStore, Navigator, NoopNavigator,
    Session, StoredUser,
};
pub use config::{BaseUrlPolicy, ClientConfig};
