//! Authentication and session lifecycle for EduQuest.
//!
//! Password and Google accounts, HS256 bearer tokens backed by revocable
//! server-side sessions, and an access guard for protected routes.

pub mod app;
pub mod auth;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod migrations;
pub mod models;
pub mod openapi;
pub mod response;
pub mod testing;

pub use app::App;
pub use config::Config;
pub use error::AuthError;
pub use response::ApiResponse;
pub use testing::{TestApp, TestClient, TestResponse};
