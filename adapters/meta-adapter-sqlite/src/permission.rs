//! Permission grants per group

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use canopy_types::meta_adapter::{PermissionGrant, PermissionLevel};
use canopy_types::prelude::*;
use canopy_types::types::GroupId;

use crate::utils::{collect_res, db_err, to_u32};

fn map_grant(row: SqliteRow) -> Result<PermissionGrant, sqlx::Error> {
	let subpermission: String = row.try_get("subpermission")?;
	let item_id = to_u32(row.try_get("item_id")?)?;
	let level = PermissionLevel::from_i64(row.try_get("level")?)
		.map_err(|_| sqlx::Error::Decode("invalid permission level".into()))?;
	Ok(PermissionGrant {
		group_id: GroupId(to_u32(row.try_get("group_id")?)?),
		module: row.try_get::<String, _>("module")?.into(),
		subpermission: (!subpermission.is_empty()).then(|| subpermission.into()),
		item_id: (item_id != 0).then_some(item_id),
		level,
	})
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<PermissionGrant>> {
	let rows = sqlx::query(
		"SELECT group_id, module, subpermission, item_id, level FROM permissions WHERE level > 0",
	)
	.fetch_all(db)
	.await
	.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_grant))
}

pub(crate) async fn list_for_group(db: &SqlitePool, group_id: GroupId) -> ClResult<Vec<PermissionGrant>> {
	let rows = sqlx::query(
		"SELECT group_id, module, subpermission, item_id, level FROM permissions
		WHERE group_id = ? AND level > 0 ORDER BY module, subpermission, item_id",
	)
	.bind(group_id.0)
	.fetch_all(db)
	.await
	.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_grant))
}

pub(crate) async fn set(db: &SqlitePool, grant: &PermissionGrant) -> ClResult<()> {
	let sub = grant.subpermission.as_deref().unwrap_or_default();
	let item = grant.item_id.unwrap_or(0);

	if grant.level == PermissionLevel::None {
		sqlx::query(
			"DELETE FROM permissions WHERE group_id = ? AND module = ? AND subpermission = ? AND item_id = ?",
		)
		.bind(grant.group_id.0)
		.bind(&*grant.module)
		.bind(sub)
		.bind(item)
		.execute(db)
		.await
		.map_err(db_err)?;
	} else {
		sqlx::query(
			"INSERT OR REPLACE INTO permissions (group_id, module, subpermission, item_id, level)
			VALUES (?, ?, ?, ?, ?)",
		)
		.bind(grant.group_id.0)
		.bind(&*grant.module)
		.bind(sub)
		.bind(item)
		.bind(grant.level.as_i64())
		.execute(db)
		.await
		.map_err(db_err)?;
	}
	Ok(())
}

// vim: ts=4
