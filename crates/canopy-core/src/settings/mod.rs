//! Runtime settings.
//!
//! Feature crates register their definitions into a [`SettingsRegistry`] while the app
//! is assembled; the registry is then frozen and served by [`SettingsService`], which
//! prefers a stored value over the registered default.

pub mod handler;
pub mod service;
pub mod types;

pub use service::SettingsService;
pub use types::{
	FrozenSettingsRegistry, SettingAccess, SettingDefinition, SettingDefinitionBuilder,
	SettingValue, SettingsRegistry,
};

// vim: ts=4
