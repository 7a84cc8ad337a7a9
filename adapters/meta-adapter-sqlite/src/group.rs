//! Groups, personal groups and group-in-group memberships

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use canopy_types::meta_adapter::{Group, Membership};
use canopy_types::prelude::*;
use canopy_types::types::{GroupId, UserId};

use crate::user::unique_err;
use crate::utils::{collect_res, db_err, map_res, to_u32, to_u32_id};

fn map_group(row: SqliteRow) -> Result<Group, sqlx::Error> {
	let user_id: Option<i64> = row.try_get("user_id")?;
	Ok(Group {
		id: GroupId(to_u32(row.try_get("group_id")?)?),
		name: row.try_get::<String, _>("name")?.into(),
		user_id: user_id.map(to_u32).transpose()?.map(UserId),
		active: row.try_get("active")?,
	})
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<Group>> {
	let rows = sqlx::query("SELECT group_id, name, user_id, active FROM groups ORDER BY name")
		.fetch_all(db)
		.await
		.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_group))
}

pub(crate) async fn read(db: &SqlitePool, group_id: GroupId) -> ClResult<Group> {
	let res = sqlx::query("SELECT group_id, name, user_id, active FROM groups WHERE group_id = ?")
		.bind(group_id.0)
		.fetch_one(db)
		.await;
	map_res(res, map_group)
}

pub(crate) async fn read_by_name(db: &SqlitePool, name: &str) -> ClResult<Group> {
	let res = sqlx::query("SELECT group_id, name, user_id, active FROM groups WHERE name = ?")
		.bind(name)
		.fetch_one(db)
		.await;
	map_res(res, map_group)
}

pub(crate) async fn read_by_user(db: &SqlitePool, user_id: UserId) -> ClResult<Group> {
	let res = sqlx::query("SELECT group_id, name, user_id, active FROM groups WHERE user_id = ?")
		.bind(user_id.0)
		.fetch_one(db)
		.await;
	map_res(res, map_group)
}

pub(crate) async fn create(
	db: &SqlitePool,
	name: &str,
	user_id: Option<UserId>,
	active: bool,
) -> ClResult<GroupId> {
	let res = sqlx::query("INSERT INTO groups (name, user_id, active) VALUES (?, ?, ?)")
		.bind(name)
		.bind(user_id.map(|u| u.0))
		.bind(active)
		.execute(db)
		.await
		.map_err(|err| unique_err(err, "Group name"))?;
	Ok(GroupId(to_u32_id(res.last_insert_rowid())?))
}

/// Update the row and, when `members` is given, replace the member list
pub(crate) async fn save(db: &SqlitePool, group: &Group, members: Option<&[GroupId]>) -> ClResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;

	let res = sqlx::query("UPDATE groups SET name = ?, active = ? WHERE group_id = ?")
		.bind(&*group.name)
		.bind(group.active)
		.bind(group.id.0)
		.execute(&mut *tx)
		.await
		.map_err(|err| unique_err(err, "Group name"))?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	if let Some(members) = members {
		sqlx::query("DELETE FROM group_members WHERE group_id = ?")
			.bind(group.id.0)
			.execute(&mut *tx)
			.await
			.map_err(db_err)?;
		for member in members {
			sqlx::query("INSERT OR IGNORE INTO group_members (group_id, member_id) VALUES (?, ?)")
				.bind(group.id.0)
				.bind(member.0)
				.execute(&mut *tx)
				.await
				.map_err(db_err)?;
		}
	}

	tx.commit().await.map_err(db_err)?;
	Ok(())
}

pub(crate) async fn delete(db: &SqlitePool, group_id: GroupId) -> ClResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;

	sqlx::query("DELETE FROM group_members WHERE group_id = ? OR member_id = ?")
		.bind(group_id.0)
		.bind(group_id.0)
		.execute(&mut *tx)
		.await
		.map_err(db_err)?;
	sqlx::query("DELETE FROM permissions WHERE group_id = ?")
		.bind(group_id.0)
		.execute(&mut *tx)
		.await
		.map_err(db_err)?;
	let res = sqlx::query("DELETE FROM groups WHERE group_id = ?")
		.bind(group_id.0)
		.execute(&mut *tx)
		.await
		.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	tx.commit().await.map_err(db_err)?;
	Ok(())
}

pub(crate) async fn list_memberships(db: &SqlitePool) -> ClResult<Vec<Membership>> {
	let rows = sqlx::query("SELECT group_id, member_id FROM group_members")
		.fetch_all(db)
		.await
		.map_err(db_err)?;
	collect_res(rows.into_iter().map(|row| {
		Ok(Membership {
			group_id: GroupId(to_u32(row.try_get("group_id")?)?),
			member_id: GroupId(to_u32(row.try_get("member_id")?)?),
		})
	}))
}

pub(crate) async fn list_members(db: &SqlitePool, group_id: GroupId) -> ClResult<Vec<GroupId>> {
	let rows = sqlx::query("SELECT member_id FROM group_members WHERE group_id = ? ORDER BY member_id")
		.bind(group_id.0)
		.fetch_all(db)
		.await
		.map_err(db_err)?;
	collect_res(rows.into_iter().map(|row| Ok(GroupId(to_u32(row.try_get("member_id")?)?))))
}

// vim: ts=4
