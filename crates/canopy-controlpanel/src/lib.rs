//! Control-panel module. Navigation tabs kept in a dense, persisted order.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod order;
pub mod tab;

mod prelude;

pub use handler::ControlPanelModule;

// vim: ts=4
