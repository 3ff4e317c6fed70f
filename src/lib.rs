//! # Shopdesk
//!
//! A small back office for a trading business: supplier companies, stock
//! lots kept at the cheapest known price per JAN code, CSV bulk import,
//! dashboard, catalog and invoice PDFs. Usable as a standalone binary and as
//! a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! shopdesk = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopdesk::config::ServerConfig;
//! use shopdesk::server::{AppState, create_router};
//! use shopdesk::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod inventory;
pub mod invoice;
pub mod reports;
pub mod server;
pub mod store;
pub mod types;
