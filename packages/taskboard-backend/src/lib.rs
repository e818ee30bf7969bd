//! Taskboard server: config loading, store init, HTTP API.
pub mod api;
pub mod auth;
pub mod config;
pub mod server;
pub mod state;
