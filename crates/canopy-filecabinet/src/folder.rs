//! Folders and what their kind allows

use std::path::PathBuf;

use canopy_core::filter::strip_tags;
use canopy_types::meta_adapter::{Folder, FolderKind};
use canopy_types::types::FolderId;
use canopy_types::utils::parse_str_list;

use crate::prelude::*;
use crate::upload::UploadLimits;

/// Per-kind upload rules
pub trait FolderKindExt {
	/// Setting holding the comma separated extension allow-list
	fn extension_setting(self) -> &'static str;
	/// Directory prefix new folders of this kind are created under
	fn base_dir(self) -> &'static str;
	fn size_limit(self, limits: &UploadLimits) -> u64;
}

impl FolderKindExt for FolderKind {
	fn extension_setting(self) -> &'static str {
		match self {
			FolderKind::Image => "filecabinet.image_files",
			FolderKind::Document => "filecabinet.document_files",
			FolderKind::Multimedia => "filecabinet.media_files",
		}
	}

	fn base_dir(self) -> &'static str {
		match self {
			FolderKind::Image => "images",
			FolderKind::Document => "documents",
			FolderKind::Multimedia => "multimedia",
		}
	}

	fn size_limit(self, limits: &UploadLimits) -> u64 {
		match self {
			FolderKind::Image => limits.image,
			FolderKind::Document => limits.document,
			FolderKind::Multimedia => limits.media,
		}
	}
}

/// `image`, `document`, `multimedia` or their numeric codes
pub fn parse_kind(value: &str) -> ClResult<FolderKind> {
	match value.trim().to_ascii_lowercase().as_str() {
		"image" | "1" => Ok(FolderKind::Image),
		"document" | "2" => Ok(FolderKind::Document),
		"multimedia" | "media" | "3" => Ok(FolderKind::Multimedia),
		_ => Err(Error::ValidationError(format!("Unknown folder kind: {}", value))),
	}
}

pub async fn allowed_extensions(app: &App, kind: FolderKind) -> ClResult<Vec<String>> {
	let list = app.settings.get_string(kind.extension_setting()).await?;
	Ok(parse_str_list(&list).into_iter().map(|e| e.to_ascii_lowercase()).collect())
}

/// Lowercase word characters of the title joined by `_`
fn slug(title: &str) -> String {
	title
		.split(|c: char| !c.is_ascii_alphanumeric())
		.filter(|s| !s.is_empty())
		.map(str::to_ascii_lowercase)
		.collect::<Vec<_>>()
		.join("_")
}

pub async fn create_folder(app: &App, title: &str, kind: FolderKind) -> ClResult<Folder> {
	let title = strip_tags(title).trim().to_string();
	let slug = slug(&title);
	if slug.is_empty() {
		return Err(Error::ValidationError("Folder title is required".into()));
	}
	let directory = format!("{}/{}/", kind.base_dir(), slug);
	let existing = app.meta_adapter.list_folders(None).await?;
	if existing.iter().any(|f| *f.directory == directory) {
		return Err(Error::ValidationError("A folder with this name already exists".into()));
	}

	let folder_id = app.meta_adapter.create_folder(&title, kind, &directory).await?;
	tokio::fs::create_dir_all(app.opts.files_dir.join(&directory)).await?;
	info!(folder_id = %folder_id, directory, "folder created");
	app.meta_adapter.read_folder(folder_id).await
}

/// Absolute directory of a folder below the file-cabinet root
pub fn folder_path(app: &App, folder: &Folder) -> PathBuf {
	app.opts.files_dir.join(&*folder.directory)
}

pub async fn read_folder(app: &App, folder_id: FolderId) -> ClResult<Folder> {
	app.meta_adapter.read_folder(folder_id).await
}


// vim: ts=4
