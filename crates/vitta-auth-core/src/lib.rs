//! Vitta Auth Core - Authentication business logic
//!
//! Credential hashing and verification, access-token issuance/validation,
//! refresh-token rotation and revocation, and Google identity linking.

pub mod config;
pub mod crypto;
pub mod error;
pub mod google;
pub mod password;
pub mod refresh;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use crypto::{constant_time_eq, digest_secret};
pub use error::AuthError;
pub use google::{GoogleClaims, GoogleVerifier};
pub use password::{hash_password, verify_password};
pub use refresh::RefreshTokenStore;
pub use service::{AuthOutcome, AuthService, NewUser};
pub use token::AccessTokenKeys;
