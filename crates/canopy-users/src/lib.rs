//! Users module. Groups, memberships, permission grants, deity management.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod deity;
pub mod group;
pub mod handler;
pub mod settings;
pub mod user;

mod prelude;

use prelude::*;

pub use handler::UsersModule;

pub fn register_settings(registry: &mut canopy_core::settings::SettingsRegistry) -> ClResult<()> {
	settings::register_settings(registry)
}

/// Group and user names: non-empty word characters (`[A-Za-z0-9_]`) only
pub(crate) fn is_word(name: &str) -> bool {
	!name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

// vim: ts=4
