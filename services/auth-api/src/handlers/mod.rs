//! HTTP handlers

mod auth;
mod health;

pub use auth::{change_password, google, login, logout, me, refresh, register, update_me};
pub use health::{health, ready};
