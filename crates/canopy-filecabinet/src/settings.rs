//! File-cabinet settings registration

use crate::prelude::*;
use canopy_core::settings::{SettingAccess, SettingDefinition, SettingValue, SettingsRegistry};

const MIB: i64 = 1024 * 1024;

fn extension_list(value: &SettingValue) -> ClResult<()> {
	match value {
		SettingValue::String(s)
			if s.chars().all(|c| c.is_ascii_alphanumeric() || c == ',' || c == ' ') =>
		{
			Ok(())
		}
		_ => Err(Error::ValidationError(
			"Extension list must be comma separated letters and digits".into(),
		)),
	}
}

fn positive_size(value: &SettingValue) -> ClResult<()> {
	match value {
		SettingValue::Int(n) if *n > 0 => Ok(()),
		_ => Err(Error::ValidationError("Size must be a positive number of bytes".into())),
	}
}

fn register_size(
	registry: &mut SettingsRegistry,
	key: &str,
	description: &str,
	default: i64,
	access: SettingAccess,
) -> ClResult<()> {
	registry.register(
		SettingDefinition::builder(key)
			.description(description)
			.default(SettingValue::Int(default))
			.access(access)
			.validator(positive_size)
			.build()?,
	)
}

pub fn register_settings(registry: &mut SettingsRegistry) -> ClResult<()> {
	// Allowed extensions per folder kind
	registry.register(
		SettingDefinition::builder("filecabinet.document_files")
			.description("Extensions allowed in document folders")
			.default(SettingValue::String(
				"csv,doc,docx,odp,ods,odt,pdf,ppt,pptx,rtf,txt,xls,xlsx,zip".into(),
			))
			.validator(extension_list)
			.build()?,
	)?;
	registry.register(
		SettingDefinition::builder("filecabinet.image_files")
			.description("Extensions allowed in image folders")
			.default(SettingValue::String("gif,jpeg,jpg,png,webp".into()))
			.validator(extension_list)
			.build()?,
	)?;
	registry.register(
		SettingDefinition::builder("filecabinet.media_files")
			.description("Extensions allowed in multimedia folders")
			.default(SettingValue::String("flac,mkv,mov,mp3,mp4,ogg,wav,webm".into()))
			.validator(extension_list)
			.build()?,
	)?;

	// Size ceilings, all in bytes
	register_size(
		registry,
		"filecabinet.max_system_size",
		"Largest upload the server accepts",
		64 * MIB,
		SettingAccess::System,
	)?;
	register_size(
		registry,
		"filecabinet.max_form_size",
		"Largest file a single upload form may carry",
		32 * MIB,
		SettingAccess::Admin,
	)?;
	register_size(
		registry,
		"filecabinet.max_absolute_size",
		"Hard ceiling for any stored file",
		64 * MIB,
		SettingAccess::Admin,
	)?;
	register_size(
		registry,
		"filecabinet.max_document_size",
		"Largest document",
		8 * MIB,
		SettingAccess::Admin,
	)?;
	register_size(
		registry,
		"filecabinet.max_image_size",
		"Largest image",
		4 * MIB,
		SettingAccess::Admin,
	)?;
	register_size(
		registry,
		"filecabinet.max_media_size",
		"Largest multimedia file",
		32 * MIB,
		SettingAccess::Admin,
	)?;

	Ok(())
}


// vim: ts=4
