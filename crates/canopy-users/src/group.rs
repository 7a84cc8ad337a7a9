//! Group management.
//!
//! Members of a group are themselves groups; a user takes part through its personal
//! group. Entities are loaded whole and saved whole, membership list included.

use canopy_types::meta_adapter::{Group, PermissionGrant, PermissionLevel};
use canopy_types::types::GroupId;

use crate::prelude::*;
use crate::settings::min_length;

pub fn validate_group_name(name: &str, min_len: usize) -> ClResult<()> {
	if !crate::is_word(name) {
		return Err(Error::ValidationError(
			"Group name may only contain letters, digits and underscores".into(),
		));
	}
	if name.chars().count() < min_len {
		return Err(Error::ValidationError(format!(
			"Group name must be at least {} characters long",
			min_len
		)));
	}
	Ok(())
}

/// Name rules plus uniqueness against every group, personal groups included
async fn check_new_name(app: &App, name: &str) -> ClResult<()> {
	validate_group_name(name, min_length(app, "users.groupname_min_length").await?)?;
	match app.meta_adapter.read_group_by_name(name).await {
		Ok(_) => Err(Error::ValidationError("Group name already in use".into())),
		Err(Error::NotFound) => Ok(()),
		Err(err) => Err(err),
	}
}

fn already_in_use(err: Error) -> Error {
	match err {
		Error::Conflict(_) => Error::ValidationError("Group name already in use".into()),
		err => err,
	}
}

pub async fn create_group(app: &App, name: &str) -> ClResult<GroupId> {
	check_new_name(app, name).await?;
	let group_id = app.meta_adapter.create_group(name, None, true).await.map_err(already_in_use)?;
	info!(group_id = %group_id, name, "group created");
	Ok(group_id)
}

/// Rename and/or (de)activate. Personal groups follow their user and keep its name.
pub async fn update_group(
	app: &App,
	group_id: GroupId,
	name: Option<&str>,
	active: Option<bool>,
) -> ClResult<Group> {
	let mut group = app.meta_adapter.read_group(group_id).await?;
	if let Some(name) = name.filter(|n| *n != &*group.name) {
		if group.is_personal() {
			return Err(Error::ValidationError("A personal group can not be renamed".into()));
		}
		check_new_name(app, name).await?;
		group.name = name.into();
	}
	if let Some(active) = active {
		group.active = active;
	}
	app.meta_adapter.save_group(&group, None).await.map_err(already_in_use)?;
	Ok(group)
}

pub async fn delete_group(app: &App, group_id: GroupId) -> ClResult<()> {
	let group = app.meta_adapter.read_group(group_id).await?;
	if group.is_personal() {
		return Err(Error::ValidationError("A personal group is removed with its user".into()));
	}
	app.meta_adapter.delete_group(group_id).await?;
	info!(group_id = %group_id, "group deleted");
	Ok(())
}

async fn check_member(app: &App, group_id: GroupId, member_id: GroupId) -> ClResult<()> {
	if member_id == group_id {
		return Err(Error::ValidationError("A group can not be a member of itself".into()));
	}
	match app.meta_adapter.read_group(member_id).await {
		Ok(_) => Ok(()),
		Err(Error::NotFound) => {
			Err(Error::ValidationError("Member group does not exist".into()))
		}
		Err(err) => Err(err),
	}
}

/// Persist the group row and replace its membership list
pub async fn save_group(app: &App, group: &Group, members: &[GroupId]) -> ClResult<()> {
	for member in members {
		check_member(app, group.id, *member).await?;
	}
	app.meta_adapter.save_group(group, Some(members)).await.map_err(already_in_use)
}

pub async fn add_member(app: &App, group_id: GroupId, member_id: GroupId) -> ClResult<()> {
	let group = app.meta_adapter.read_group(group_id).await?;
	check_member(app, group_id, member_id).await?;

	let mut members = app.meta_adapter.list_members(group_id).await?;
	if members.contains(&member_id) {
		return Ok(());
	}
	members.push(member_id);
	app.meta_adapter.save_group(&group, Some(members.as_slice())).await?;
	debug!(group_id = %group_id, member_id = %member_id, "member added");
	Ok(())
}

pub async fn drop_member(app: &App, group_id: GroupId, member_id: GroupId) -> ClResult<()> {
	let group = app.meta_adapter.read_group(group_id).await?;
	let mut members = app.meta_adapter.list_members(group_id).await?;
	members.retain(|m| *m != member_id);
	app.meta_adapter.save_group(&group, Some(members.as_slice())).await
}

pub async fn list_members(app: &App, group_id: GroupId) -> ClResult<Vec<Group>> {
	app.meta_adapter.read_group(group_id).await?;
	let mut groups = Vec::new();
	for member_id in app.meta_adapter.list_members(group_id).await? {
		match app.meta_adapter.read_group(member_id).await {
			Ok(group) => groups.push(group),
			Err(Error::NotFound) => warn!(member_id = %member_id, "dangling group membership"),
			Err(err) => return Err(err),
		}
	}
	Ok(groups)
}

/// Set the level a group holds; `None` revokes the grant
pub async fn set_group_permission(
	app: &App,
	group_id: GroupId,
	module: &str,
	subpermission: Option<&str>,
	item_id: Option<u32>,
	level: PermissionLevel,
) -> ClResult<()> {
	if !crate::is_word(module) {
		return Err(Error::ValidationError("Invalid module name".into()));
	}
	if subpermission.is_some_and(|s| !crate::is_word(s)) {
		return Err(Error::ValidationError("Invalid subpermission name".into()));
	}
	app.meta_adapter.read_group(group_id).await?;

	let grant = PermissionGrant {
		group_id,
		module: module.into(),
		subpermission: subpermission.map(Into::into),
		item_id,
		level,
	};
	app.meta_adapter.set_permission_grant(&grant).await?;
	info!(group_id = %group_id, module, ?subpermission, ?item_id, ?level, "permission set");
	Ok(())
}


// vim: ts=4
