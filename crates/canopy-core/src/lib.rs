//! Core infrastructure for Canopy: request normalisation, permission resolution, the
//! settings subsystem, session handling and module dispatch.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod dispatch;
pub mod extract;
pub mod filter;
pub mod middleware;
pub mod password;
pub mod perm;
pub mod prelude;
pub mod request;
pub mod session;
pub mod settings;

pub use app::{App, AppBuilderOpts, AppState};
pub use dispatch::{Module, ModuleRegistry};
pub use extract::{Auth, OptionalAuth};
pub use perm::{Identity, Permission};
pub use request::Request;

// vim: ts=4
