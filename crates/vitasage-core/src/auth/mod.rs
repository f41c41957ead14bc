//! Authentication module for credential storage and session state.
//!
//! This module provides:
//! - `CredentialStore`: key/value storage for the session token and user record
//!   (`MemoryStore`, `FileStore`, `KeyringStore`)
//! - `Session`: typed access to the `vs_token` / `vs_user` entries
//! - `Navigator`: the hook used to send the host back to its login route

pub mod keychain;
pub mod navigator;
pub mod session;
pub mod store;

pub use keychain::KeyringStore;
pub use navigator::{Location, Navigator, NoopNavigator};
pub use session::{Session, StoredUser, TOKEN_KEY, USER_KEY};
pub use store::{CredentialStore, FileStore, MemoryStore};
