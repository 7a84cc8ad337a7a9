//! Users module settings registration

use crate::prelude::*;
use canopy_core::settings::{SettingDefinition, SettingValue, SettingsRegistry};

fn positive(value: &SettingValue) -> ClResult<()> {
	match value {
		SettingValue::Int(n) if *n >= 1 => Ok(()),
		_ => Err(Error::ValidationError("Minimum length must be at least 1".into())),
	}
}

pub fn register_settings(registry: &mut SettingsRegistry) -> ClResult<()> {
	registry.register(
		SettingDefinition::builder("users.groupname_min_length")
			.description("Minimum length of a group name")
			.default(SettingValue::Int(3))
			.validator(positive)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("users.username_min_length")
			.description("Minimum length of a username")
			.default(SettingValue::Int(3))
			.validator(positive)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("users.password_min_length")
			.description("Minimum length of a login password")
			.default(SettingValue::Int(5))
			.validator(positive)
			.build()?,
	)?;

	// Anonymous sign-up
	registry.register(
		SettingDefinition::builder("users.allow_new_users")
			.description("Allow visitors to create their own account")
			.default(SettingValue::Bool(false))
			.build()?,
	)?;

	Ok(())
}

pub(crate) async fn min_length(app: &App, key: &str) -> ClResult<usize> {
	let value = app.settings.get_int(key).await?;
	Ok(usize::try_from(value).unwrap_or(1).max(1))
}

// vim: ts=4
