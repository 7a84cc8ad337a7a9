//! File-cabinet commands and the multipart upload endpoint

use async_trait::async_trait;
use axum::{
	Json,
	extract::{Multipart, State},
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use canopy_core::dispatch::Module;
use canopy_core::extract::Auth;
use canopy_core::filter::filter_integer;
use canopy_core::middleware::require_auth_key;
use canopy_core::perm::{self, Identity};
use canopy_core::request::{Method, Request, VarSource, VarValue, Vars};
use canopy_types::meta_adapter::NewDocument;
use canopy_types::types::{ApiResponse, FolderId};

use crate::folder;
use crate::mime;
use crate::prelude::*;
use crate::upload::{self, UploadError, UploadFile, UploadLimits, UploadTarget};

const MODULE: &str = "filecabinet";

#[derive(Debug, Default)]
pub struct FileCabinetModule;

fn respond<T: Serialize>(status: StatusCode, data: T) -> ClResult<Response> {
	Ok((status, Json(ApiResponse::new(data))).into_response())
}

fn var<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
	req.vars().get(name).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn folder_id(req: &Request) -> ClResult<FolderId> {
	var(req, "folder_id")
		.and_then(filter_integer)
		.and_then(|n| u32::try_from(n).ok())
		.map(FolderId)
		.ok_or_else(|| Error::ValidationError("\"folder_id\" must be a positive integer".into()))
}

#[async_trait]
impl Module for FileCabinetModule {
	fn name(&self) -> &'static str {
		MODULE
	}

	async fn handle(
		&self,
		app: &App,
		auth: Option<&Identity>,
		req: &mut Request,
	) -> ClResult<Response> {
		let identity = auth.ok_or(Error::Unauthorized)?;
		let command = match req.shift_command() {
			Some(command) => command,
			None => var(req, "command").unwrap_or("list_folders").to_string(),
		};
		debug!(command = %command, "filecabinet command");

		match command.as_str() {
			"list_folders" => {
				perm::check(app, identity, MODULE, None, None).await?;
				let kind = var(req, "kind").map(folder::parse_kind).transpose()?;
				respond(StatusCode::OK, app.meta_adapter.list_folders(kind).await?)
			}
			"list_folder_files" => {
				let folder_id = folder_id(req)?;
				perm::check(app, identity, MODULE, None, Some(folder_id.0)).await?;
				folder::read_folder(app, folder_id).await?;
				respond(StatusCode::OK, app.meta_adapter.list_documents(folder_id).await?)
			}
			"post_folder" => {
				perm::check(app, identity, MODULE, Some("edit_folders"), None).await?;
				require_auth_key(identity, req)?;
				let kind = folder::parse_kind(var(req, "kind").unwrap_or_default())?;
				let title = var(req, "title").unwrap_or_default();
				respond(StatusCode::CREATED, folder::create_folder(app, title, kind).await?)
			}
			_ => Err(Error::NotFound),
		}
	}
}

/// A file part of the upload form
struct Part {
	file_name: String,
	content_type: Option<String>,
	data: Vec<u8>,
}

async fn read_multipart(mut multipart: Multipart) -> ClResult<(Vars, Vec<Part>)> {
	let mut vars = Vars::new();
	let mut parts = Vec::new();

	while let Some(field) = multipart.next_field().await.map_err(|err| {
		debug!("multipart: {}", err);
		Error::Parse
	})? {
		let name = field.name().unwrap_or_default().to_string();
		if name == "file" || name == "file[]" {
			let file_name = field.file_name().unwrap_or_default().to_string();
			let content_type = field.content_type().map(str::to_string);
			let data = field.bytes().await.map_err(|_| Error::Parse)?;
			if file_name.is_empty() && data.is_empty() {
				// empty file input
				continue;
			}
			parts.push(Part { file_name, content_type, data: data.to_vec() });
		} else {
			let value = field.text().await.map_err(|_| Error::Parse)?;
			vars.insert(name, VarValue::Str(value));
		}
	}
	Ok((vars, parts))
}

/// POST /filecabinet/upload
///
/// Every file is validated before the first one is written, so a failing file leaves
/// the folder untouched.
pub async fn post_upload(
	State(app): State<App>,
	Auth(identity): Auth,
	multipart: Multipart,
) -> ClResult<Response> {
	let (vars, parts) = read_multipart(multipart).await?;
	let mut req = Request::new("/filecabinet/upload", Method::Post);
	req.set_source_vars(VarSource::Post, vars.clone());
	req.set_vars(vars);

	require_auth_key(&identity, &req)?;
	let folder_id = folder_id(&req)?;
	perm::check(&app, &identity, MODULE, None, Some(folder_id.0)).await?;

	let folder = folder::read_folder(&app, folder_id).await?;
	if parts.is_empty() {
		return Err(Error::ValidationError("File upload could not be found".into()));
	}

	let form_limit = req
		.pull_integer(VarSource::Post, "MAX_FILE_SIZE", true)?
		.and_then(|n| u64::try_from(n).ok());
	let limits = UploadLimits::load(&app).await?.with_form_limit(form_limit);
	let allowed = folder::allowed_extensions(&app, folder.kind).await?;
	let directory = folder::folder_path(&app, &folder);
	let target = UploadTarget {
		kind: folder.kind,
		directory: &directory,
		allowed_extensions: &allowed,
		limits,
	};

	let mut planned = Vec::with_capacity(parts.len());
	for part in &parts {
		let file = UploadFile {
			file_name: &part.file_name,
			declared_type: part.content_type.as_deref(),
			data: &part.data,
		};
		let destination = match upload::validate_upload(&file, &target) {
			// two parts of the same request landing on one name
			Ok(path) if planned.iter().any(|(p, _)| *p == path) => Err(UploadError::DuplicateFile),
			res => res,
		};
		match destination {
			Ok(path) => planned.push((path, part)),
			Err(err) => {
				info!(folder_id = %folder_id, file = %part.file_name, "upload rejected: {}", err);
				return Ok(err.into_response());
			}
		}
	}

	tokio::fs::create_dir_all(&directory).await?;
	let mut stored = Vec::with_capacity(planned.len());
	for (destination, part) in planned {
		tokio::fs::write(&destination, &part.data).await?;

		let file_name =
			destination.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
		let ext = mime::extension(&file_name).unwrap_or_default();
		let file_type = mime::content_type(&ext, part.content_type.as_deref());
		let title = upload::document_title(&file_name);
		let document_id = app
			.meta_adapter
			.create_document(&NewDocument {
				folder_id,
				file_name: &file_name,
				title: &title,
				file_type: &file_type,
				size: u64::try_from(part.data.len()).unwrap_or(u64::MAX),
			})
			.await?;
		info!(folder_id = %folder_id, document_id = %document_id, file = %file_name, "file stored");
		stored.push(document_id);
	}

	let mut documents = app.meta_adapter.list_documents(folder_id).await?;
	documents.retain(|doc| stored.contains(&doc.id));
	respond(StatusCode::CREATED, json!({ "documents": documents }))
}

// vim: ts=4
