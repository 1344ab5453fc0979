//! Payment Service
//!
//! A REST API for recording payments between contacts. Creating a payment
//! resolves both parties by name inside one transaction: known contacts get
//! their address refreshed, unknown ones are created.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: [`store::Database`], backed by PostgreSQL via sqlx or by
//!   an in-memory store
//! - **Format**: JSON requests/responses

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod validation;

use store::Database;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
}

impl AppState {
    pub fn new(db: impl Database) -> Self {
        Self { db: Arc::new(db) }
    }
}
