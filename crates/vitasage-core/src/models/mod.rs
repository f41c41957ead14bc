//! Wire models for the VitaSage backend.
//!
//! - `LoginRequest`, `TokenResponse`: the `/auth/login` exchange
//! - `HospitalCreate`, `RegisterResponse`: hospital bootstrap registration
//! - `UserOut`, `UserCreate`, `Role`: hospital staff accounts

pub mod auth;
pub mod user;

pub use auth::{HospitalCreate, LoginRequest, RegisterResponse, TokenResponse};
pub use user::{password_fits, Role, UserCreate, UserOut, MAX_PASSWORD_BYTES};
