//! Vitta Types - Shared domain types
//!
//! Domain types used across the vitta identity services:
//! - User identity and the resolved per-request `Identity`
//! - Token pairs and access-token claims
//! - Authentication providers and client audit metadata

pub mod auth;
pub mod token;
pub mod user;

pub use auth::*;
pub use token::*;
pub use user::*;
