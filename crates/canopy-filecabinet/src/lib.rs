//! File-cabinet module. Folders of a fixed kind and the validated upload path into them.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod folder;
pub mod handler;
pub mod mime;
pub mod settings;
pub mod upload;

mod prelude;

use prelude::*;

pub use handler::{FileCabinetModule, post_upload};

pub fn register_settings(registry: &mut canopy_core::settings::SettingsRegistry) -> ClResult<()> {
	settings::register_settings(registry)
}

// vim: ts=4
