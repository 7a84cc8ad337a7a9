//! Upload validation.
//!
//! Every file goes through the same chain before anything is written: destination
//! collision, extension allow-list of the folder kind, content type, size. The first
//! failing check decides the error.

use axum::{
	http::{StatusCode, header},
	response::{IntoResponse, Response},
};
use std::path::{Path, PathBuf};

use canopy_types::meta_adapter::FolderKind;

use crate::folder::FolderKindExt;
use crate::mime;
use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
	DuplicateFile,
	DisallowedType,
	UnknownType,
	SizeExceeded,
}

impl UploadError {
	pub fn message(self) -> &'static str {
		match self {
			UploadError::DuplicateFile => "Duplicate file found",
			UploadError::DisallowedType => "File type not allowed in folder",
			UploadError::UnknownType => "Unknown file type",
			UploadError::SizeExceeded => "File size too large",
		}
	}
}

impl std::fmt::Display for UploadError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str(self.message())
	}
}

impl std::error::Error for UploadError {}

/// Upload failures end the request with a plain-text 500
impl IntoResponse for UploadError {
	fn into_response(self) -> Response {
		(
			StatusCode::INTERNAL_SERVER_ERROR,
			[(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
			self.message(),
		)
			.into_response()
	}
}

/// Size ceilings in bytes. A file must fit all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
	pub system: u64,
	pub form: u64,
	pub absolute: u64,
	pub document: u64,
	pub image: u64,
	pub media: u64,
}

async fn size_setting(app: &App, key: &str) -> ClResult<u64> {
	let value = app.settings.get_int(key).await?;
	u64::try_from(value).map_err(|_| Error::ConfigError(format!("Setting '{}' is negative", key)))
}

impl UploadLimits {
	/// Limits from the settings; the system ceiling never exceeds the request body limit
	pub async fn load(app: &App) -> ClResult<Self> {
		let body_limit = u64::try_from(app.opts.max_body_size).unwrap_or(u64::MAX);
		Ok(Self {
			system: size_setting(app, "filecabinet.max_system_size").await?.min(body_limit),
			form: size_setting(app, "filecabinet.max_form_size").await?,
			absolute: size_setting(app, "filecabinet.max_absolute_size").await?,
			document: size_setting(app, "filecabinet.max_document_size").await?,
			image: size_setting(app, "filecabinet.max_image_size").await?,
			media: size_setting(app, "filecabinet.max_media_size").await?,
		})
	}

	/// A `MAX_FILE_SIZE` form field can only lower the form ceiling
	pub fn with_form_limit(mut self, form_limit: Option<u64>) -> Self {
		if let Some(limit) = form_limit {
			self.form = self.form.min(limit);
		}
		self
	}

	/// Effective ceiling for a folder kind
	pub fn limit_for(&self, kind: FolderKind) -> u64 {
		self.system.min(self.form).min(self.absolute).min(kind.size_limit(self))
	}
}

/// One uploaded file as received
#[derive(Debug, Clone, Copy)]
pub struct UploadFile<'a> {
	pub file_name: &'a str,
	pub declared_type: Option<&'a str>,
	pub data: &'a [u8],
}

/// Folder the file is going to, with the rules of its kind already loaded
#[derive(Debug, Clone)]
pub struct UploadTarget<'a> {
	pub kind: FolderKind,
	pub directory: &'a Path,
	pub allowed_extensions: &'a [String],
	pub limits: UploadLimits,
}

/// Base name with everything outside `[A-Za-z0-9._-]` replaced by `_`. Leading dots are
/// dropped so no hidden or relative names come out.
pub fn sanitize_file_name(file_name: &str) -> Option<String> {
	let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
	let clean: String = base
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
		.collect();
	let clean = clean.trim_start_matches('.');
	(!clean.is_empty()).then(|| clean.to_string())
}

/// Title derived from the stored name: `annual_report.pdf` → `Annual report`
pub fn document_title(file_name: &str) -> String {
	let spaced = file_name.replace('_', " ");
	let stem = match spaced.rsplit_once('.') {
		Some((stem, ext)) if !stem.is_empty() && ext.chars().all(|c| c.is_alphanumeric()) => stem,
		_ => spaced.as_str(),
	};
	let mut chars = stem.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Destination path of a file that passed every check
pub fn validate_upload(file: &UploadFile<'_>, target: &UploadTarget<'_>) -> Result<PathBuf, UploadError> {
	let name = sanitize_file_name(file.file_name).ok_or(UploadError::DisallowedType)?;
	let destination = target.directory.join(&name);
	if destination.exists() {
		return Err(UploadError::DuplicateFile);
	}

	let ext = mime::extension(&name).ok_or(UploadError::DisallowedType)?;
	if !target.allowed_extensions.iter().any(|allowed| *allowed == ext) {
		return Err(UploadError::DisallowedType);
	}

	if !mime::check_mime(&ext, file.declared_type, file.data) {
		return Err(UploadError::UnknownType);
	}

	let size = u64::try_from(file.data.len()).unwrap_or(u64::MAX);
	if size > target.limits.limit_for(target.kind) {
		return Err(UploadError::SizeExceeded);
	}

	Ok(destination)
}

#[cfg(test)]
mod tests {
	use super::*;

	const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< >>\nendobj\n";

	fn limits() -> UploadLimits {
		UploadLimits { system: 1000, form: 1000, absolute: 1000, document: 100, image: 50, media: 500 }
	}

	fn extensions() -> Vec<String> {
		vec!["pdf".into(), "doc".into(), "docx".into()]
	}

	fn target<'a>(dir: &'a Path, exts: &'a [String]) -> UploadTarget<'a> {
		UploadTarget { kind: FolderKind::Document, directory: dir, allowed_extensions: exts, limits: limits() }
	}

	#[test]
	fn test_valid_upload() {
		let dir = tempfile::tempdir().expect("tempdir");
		let exts = extensions();
		let file = UploadFile { file_name: "report.pdf", declared_type: Some("application/pdf"), data: PDF };
		let path = validate_upload(&file, &target(dir.path(), &exts)).expect("valid");
		assert_eq!(path, dir.path().join("report.pdf"));
	}

	#[test]
	fn test_exe_is_disallowed_in_document_folder() {
		let dir = tempfile::tempdir().expect("tempdir");
		let exts = extensions();
		let file = UploadFile { file_name: "setup.exe", declared_type: None, data: b"MZ\x90\0" };
		assert_eq!(validate_upload(&file, &target(dir.path(), &exts)), Err(UploadError::DisallowedType));
	}

	#[test]
	fn test_duplicate_is_checked_first() {
		let dir = tempfile::tempdir().expect("tempdir");
		std::fs::write(dir.path().join("setup.exe"), b"x").expect("write");
		let exts = extensions();
		let file = UploadFile { file_name: "setup.exe", declared_type: None, data: b"MZ\x90\0" };
		assert_eq!(validate_upload(&file, &target(dir.path(), &exts)), Err(UploadError::DuplicateFile));
	}

	#[test]
	fn test_content_must_match_extension() {
		let dir = tempfile::tempdir().expect("tempdir");
		let exts = extensions();
		let file = UploadFile { file_name: "fake.pdf", declared_type: None, data: b"MZ\x90\0\x03" };
		assert_eq!(validate_upload(&file, &target(dir.path(), &exts)), Err(UploadError::UnknownType));
	}

	#[test]
	fn test_size_caps() {
		let dir = tempfile::tempdir().expect("tempdir");
		let exts = extensions();
		let mut big = PDF.to_vec();
		big.resize(101, b' ');
		let file = UploadFile { file_name: "big.pdf", declared_type: None, data: &big };
		assert_eq!(validate_upload(&file, &target(dir.path(), &exts)), Err(UploadError::SizeExceeded));

		let mut t = target(dir.path(), &exts);
		t.limits.document = 1000;
		assert!(validate_upload(&file, &t).is_ok());
		t.limits = t.limits.with_form_limit(Some(100));
		assert_eq!(validate_upload(&file, &t), Err(UploadError::SizeExceeded));
	}

	#[test]
	fn test_limit_for_takes_smallest() {
		let l = limits();
		assert_eq!(l.limit_for(FolderKind::Document), 100);
		assert_eq!(l.limit_for(FolderKind::Multimedia), 500);
		assert_eq!(l.with_form_limit(Some(20)).limit_for(FolderKind::Image), 20);
		assert_eq!(l.with_form_limit(Some(5000)).form, 1000);
	}

	#[test]
	fn test_sanitize_file_name() {
		assert_eq!(sanitize_file_name("../../etc/passwd").as_deref(), Some("passwd"));
		assert_eq!(sanitize_file_name("C:\\docs\\my report.pdf").as_deref(), Some("my_report.pdf"));
		assert_eq!(sanitize_file_name(".htaccess").as_deref(), Some("htaccess"));
		assert_eq!(sanitize_file_name("..."), None);
	}

	#[test]
	fn test_document_title() {
		assert_eq!(document_title("annual_report.pdf"), "Annual report");
		assert_eq!(document_title("notes"), "Notes");
		assert_eq!(document_title("v1.2_final.docx"), "V1.2 final");
	}

	#[test]
	fn test_error_response() {
		let res = UploadError::SizeExceeded.into_response();
		assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(
			res.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
			Some("text/plain; charset=utf-8")
		);
	}
}

// vim: ts=4
