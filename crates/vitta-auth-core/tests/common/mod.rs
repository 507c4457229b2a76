//! Common test utilities for vitta-auth-core integration tests
#![allow(dead_code)]

pub mod jwks_mock;
pub mod mock_repos;

#[allow(unused_imports)]
pub use jwks_mock::{JwksMockServer, TestGoogleClaims, TestKeyPair};
#[allow(unused_imports)]
pub use mock_repos::{MockRefreshTokenRepository, MockUserRepository};
