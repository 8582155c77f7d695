//! API handlers for the Detectus backend

pub mod admin;
pub mod analysis;
pub mod health;
pub mod user;
pub mod wallet;

pub use crate::middleware::auth::AdminUser;
