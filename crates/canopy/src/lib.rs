//! Canopy is a small content-management core.
//!
//! # Features
//!
//! - Request normalisation into a command stack with typed, filtered variables
//! - Groups of groups, per-module permission grants, deity accounts
//! - Control-panel tabs with a persisted, always dense order
//! - File cabinet with validated uploads into typed folders

// Re-export shared types from canopy-types
pub use canopy_types::error;
pub use canopy_types::meta_adapter;
pub use canopy_types::types;
pub use canopy_types::utils;

// Feature crate re-exports
pub use canopy_controlpanel as controlpanel;
pub use canopy_core::request;
pub use canopy_core::settings;
pub use canopy_filecabinet as filecabinet;
pub use canopy_users as users;

// Local modules
pub mod app;
pub mod bootstrap;
pub mod prelude;
pub mod routes;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
