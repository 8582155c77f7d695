//! Detectus Backend Library
//!
//! Wallet trust scoring, risk classification and analysis behind an axum API.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod signals;
pub mod state;
pub mod store;
