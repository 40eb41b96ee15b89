//! # Novella
//!
//! Data store and HTTP API for a serialized-fiction platform, usable both as
//! a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! novella = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use novella::config::StoreConfig;
//! use novella::server::{AppState, create_router};
//! use novella::store::MemoryStore;
//!
//! let store = MemoryStore::open(StoreConfig::with_snapshot("./data/novella.json")).unwrap();
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `novella` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
