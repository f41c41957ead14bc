//! REST API client module for the VitaSage backend.
//!
//! This module provides the `ApiClient` for talking to the hospital API.
//! Every request picks up the bearer token from the credential store, and
//! every 401 response clears it and sends the host back to its login route.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthEvent};
pub use error::ApiError;
