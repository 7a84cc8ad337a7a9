//! Command handler of the users module.
//!
//! The command is the first token after the module name (`/users/groups`) or the
//! `command` variable. Everything except sign-up and login needs a session; changes
//! also need the session auth key.

use async_trait::async_trait;
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use canopy_core::dispatch::Module;
use canopy_core::filter::filter_integer;
use canopy_core::middleware::require_auth_key;
use canopy_core::perm::{self, Identity};
use canopy_core::request::{Request, VarValue};
use canopy_core::session;
use canopy_types::meta_adapter::PermissionLevel;
use canopy_types::types::{ApiResponse, GroupId, UserId};

use crate::prelude::*;
use crate::{deity, group, user};

const MODULE: &str = "users";

#[derive(Debug, Default)]
pub struct UsersModule;

fn respond<T: Serialize>(status: StatusCode, data: T) -> ClResult<Response> {
	Ok((status, Json(ApiResponse::new(data))).into_response())
}

fn str_var<'a>(req: &'a Request, name: &str) -> ClResult<&'a str> {
	req.var(name)?.as_str().ok_or_else(|| Error::ValidationError(format!("\"{}\" must be a single value", name)))
}

fn opt_str_var<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
	req.vars().get(name).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn id_var(req: &Request, name: &str) -> ClResult<u32> {
	filter_integer(str_var(req, name)?)
		.and_then(|n| u32::try_from(n).ok())
		.ok_or_else(|| Error::ValidationError(format!("\"{}\" must be a positive integer", name)))
}

fn opt_id_var(req: &Request, name: &str) -> ClResult<Option<u32>> {
	if opt_str_var(req, name).is_some() { id_var(req, name).map(Some) } else { Ok(None) }
}

fn opt_bool_var(req: &Request, name: &str) -> Option<bool> {
	opt_str_var(req, name).and_then(canopy_core::filter::filter_boolean)
}

/// Changes need the subpermission and the auth key
async fn check_edit(app: &App, identity: &Identity, req: &Request, sub: &str) -> ClResult<()> {
	perm::check(app, identity, MODULE, Some(sub), None).await?;
	require_auth_key(identity, req)
}

async fn post_user(app: &App, auth: Option<&Identity>, req: &Request) -> ClResult<Response> {
	if let Some(identity) = auth {
		require_auth_key(identity, req)?;
	}
	let username = str_var(req, "username")?;
	let password = str_var(req, "password")?;
	let deity = opt_bool_var(req, "deity").unwrap_or(false);
	let user_id = user::create_user(app, auth, username, password, deity).await?;
	respond(StatusCode::CREATED, json!({ "id": user_id }))
}

async fn login(app: &App, req: &Request) -> ClResult<Response> {
	let username = str_var(req, "username").map_err(|_| Error::Unauthorized)?;
	let password = str_var(req, "password").map_err(|_| Error::Unauthorized)?;
	let session = session::login(app, username, password).await?;
	respond(
		StatusCode::OK,
		json!({
			"token": session.token,
			"authKey": session.auth_key,
			"expiresAt": session.expires_at,
		}),
	)
}

async fn set_password(app: &App, identity: &Identity, req: &Request) -> ClResult<Response> {
	require_auth_key(identity, req)?;
	let target = opt_id_var(req, "user_id")?.map_or(identity.user_id, UserId);
	user::set_password(
		app,
		identity,
		target,
		opt_str_var(req, "current_password"),
		str_var(req, "password")?,
	)
	.await?;
	respond(StatusCode::OK, json!({}))
}

async fn post_group(app: &App, req: &Request) -> ClResult<Response> {
	match opt_id_var(req, "group_id")? {
		Some(group_id) => {
			let group = group::update_group(
				app,
				GroupId(group_id),
				opt_str_var(req, "name"),
				opt_bool_var(req, "active"),
			)
			.await?;
			// `members[]` replaces the whole membership list
			if let Some(VarValue::List(ids)) = req.vars().get("members") {
				let members = ids
					.iter()
					.map(|id| id.parse::<GroupId>())
					.collect::<ClResult<Vec<_>>>()?;
				group::save_group(app, &group, &members).await?;
			}
			respond(StatusCode::OK, group)
		}
		None => {
			let group_id = group::create_group(app, str_var(req, "name")?).await?;
			respond(StatusCode::CREATED, json!({ "id": group_id }))
		}
	}
}

async fn set_permission(app: &App, req: &Request) -> ClResult<Response> {
	let group_id = GroupId(id_var(req, "group_id")?);
	// `module` itself selects the handler, so the target module travels as `perm_module`
	let module = str_var(req, "perm_module")?;
	let level: PermissionLevel = str_var(req, "level")?.parse()?;
	group::set_group_permission(
		app,
		group_id,
		module,
		opt_str_var(req, "subpermission"),
		opt_id_var(req, "item_id")?,
		level,
	)
	.await?;
	respond(StatusCode::OK, json!({ "groupId": group_id, "module": module, "level": level }))
}

/// Effective permissions of the caller
async fn my_permissions(app: &App, identity: &Identity) -> ClResult<Response> {
	let perm = perm::load_permission(app, identity).await;
	respond(
		StatusCode::OK,
		json!({
			"deity": identity.deity,
			"groups": perm.groups(),
			"grants": perm.grants(),
		}),
	)
}

#[async_trait]
impl Module for UsersModule {
	fn name(&self) -> &'static str {
		MODULE
	}

	async fn handle(
		&self,
		app: &App,
		auth: Option<&Identity>,
		req: &mut Request,
	) -> ClResult<Response> {
		let command = match req.shift_command() {
			Some(command) => command,
			None => opt_str_var(req, "command").unwrap_or("users").to_string(),
		};
		debug!(command = %command, "users command");

		match command.as_str() {
			"post_user" => return post_user(app, auth, req).await,
			"login" => return login(app, req).await,
			_ => {}
		}
		let identity = auth.ok_or(Error::Unauthorized)?;

		match command.as_str() {
			"users" => {
				perm::check(app, identity, MODULE, None, None).await?;
				respond(StatusCode::OK, user::list_users(app).await?)
			}
			"groups" => {
				perm::check(app, identity, MODULE, None, None).await?;
				respond(StatusCode::OK, app.meta_adapter.list_groups().await?)
			}
			"members" => {
				perm::check(app, identity, MODULE, None, None).await?;
				let group_id = GroupId(id_var(req, "group_id")?);
				respond(StatusCode::OK, group::list_members(app, group_id).await?)
			}
			"permissions" => my_permissions(app, identity).await,
			"set_password" => set_password(app, identity, req).await,
			"post_group" => {
				check_edit(app, identity, req, "edit_groups").await?;
				post_group(app, req).await
			}
			"delete_group" => {
				check_edit(app, identity, req, "edit_groups").await?;
				group::delete_group(app, GroupId(id_var(req, "group_id")?)).await?;
				respond(StatusCode::OK, json!({}))
			}
			"add_member" | "drop_member" => {
				check_edit(app, identity, req, "edit_groups").await?;
				let group_id = GroupId(id_var(req, "group_id")?);
				let member_id = GroupId(id_var(req, "member_id")?);
				if command == "add_member" {
					group::add_member(app, group_id, member_id).await?;
				} else {
					group::drop_member(app, group_id, member_id).await?;
				}
				respond(StatusCode::OK, group::list_members(app, group_id).await?)
			}
			"set_permission" => {
				check_edit(app, identity, req, "edit_permissions").await?;
				set_permission(app, req).await
			}
			"deify" | "mortalize" => {
				require_auth_key(identity, req)?;
				let target = UserId(id_var(req, "user_id")?);
				deity::set_deity(app, identity, target, command == "deify").await?;
				respond(StatusCode::OK, app.meta_adapter.read_user(target).await?)
			}
			_ => {
				debug!(command = %command, "unknown users command");
				Err(Error::NotFound)
			}
		}
	}
}

// vim: ts=4
