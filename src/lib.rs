//! Inventra Inventory & Lending Management System
//!
//! A Rust implementation of the Inventra institutional inventory server,
//! providing a REST JSON API for lending transactions, overdue tracking,
//! and SLA-driven maintenance workflows.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
