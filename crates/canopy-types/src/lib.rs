//! Shared types, the metadata adapter trait, and core utilities for Canopy.
//!
//! Everything that both the feature crates and the storage adapters need lives here,
//! so adapters compile without pulling in the HTTP layer.

pub mod error;
pub mod hasher;
pub mod meta_adapter;
pub mod prelude;
pub mod types;
pub mod utils;

// vim: ts=4
