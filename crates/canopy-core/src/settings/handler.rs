//! Settings management handlers. Reading and writing are deity-only; `System`
//! settings are listed but never writable.

use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};
use serde::{Deserialize, Serialize};

use canopy_types::types::ApiResponse;

use super::types::{SettingAccess, SettingDefinition, SettingValue};
use crate::extract::Auth;
use crate::middleware::check_auth_key;
use crate::perm::Identity;
use crate::prelude::*;

/// A setting with its metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingResponse {
	pub key: String,
	pub value: SettingValue,
	pub access: SettingAccess,
	pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
	pub value: SettingValue,
	pub authkey: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetSettingQuery {
	pub authkey: Option<String>,
}

fn require_deity(identity: &Identity) -> ClResult<()> {
	if identity.deity {
		Ok(())
	} else {
		warn!(subject = %identity.username, "settings access refused");
		Err(Error::PermissionDenied)
	}
}

async fn describe(app: &App, def: &SettingDefinition) -> ClResult<SettingResponse> {
	Ok(SettingResponse {
		key: def.key.clone(),
		value: app.settings.get(&def.key).await?,
		access: def.access,
		description: def.description.clone(),
	})
}

/// GET /settings
pub async fn list_settings(
	State(app): State<App>,
	Auth(identity): Auth,
) -> ClResult<(StatusCode, Json<ApiResponse<Vec<SettingResponse>>>)> {
	require_deity(&identity)?;

	let mut settings = Vec::new();
	for def in app.settings_registry.list() {
		settings.push(describe(&app, def).await?);
	}
	settings.sort_by(|a, b| a.key.cmp(&b.key));
	Ok((StatusCode::OK, Json(ApiResponse::new(settings))))
}

/// GET /settings/{key}
pub async fn get_setting(
	State(app): State<App>,
	Auth(identity): Auth,
	Path(key): Path<String>,
) -> ClResult<(StatusCode, Json<ApiResponse<SettingResponse>>)> {
	require_deity(&identity)?;
	let def = app.settings_registry.get(&key).ok_or(Error::NotFound)?;
	Ok((StatusCode::OK, Json(ApiResponse::new(describe(&app, def).await?))))
}

/// PUT /settings/{key}
pub async fn update_setting(
	State(app): State<App>,
	Auth(identity): Auth,
	Path(key): Path<String>,
	Json(req): Json<UpdateSettingRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<SettingResponse>>)> {
	require_deity(&identity)?;
	check_auth_key(&identity, req.authkey.as_deref())?;
	let def = app.settings_registry.get(&key).ok_or(Error::NotFound)?;

	app.settings.set(&key, req.value, identity.deity).await?;
	info!(subject = %identity.username, key, "setting updated");
	Ok((StatusCode::OK, Json(ApiResponse::new(describe(&app, def).await?))))
}

/// DELETE /settings/{key}?authkey=..
pub async fn reset_setting(
	State(app): State<App>,
	Auth(identity): Auth,
	Path(key): Path<String>,
	Query(query): Query<ResetSettingQuery>,
) -> ClResult<(StatusCode, Json<ApiResponse<SettingResponse>>)> {
	require_deity(&identity)?;
	check_auth_key(&identity, query.authkey.as_deref())?;
	let def = app.settings_registry.get(&key).ok_or(Error::NotFound)?;

	app.settings.reset(&key, identity.deity).await?;
	info!(subject = %identity.username, key, "setting reset");
	Ok((StatusCode::OK, Json(ApiResponse::new(describe(&app, def).await?))))
}

// vim: ts=4
