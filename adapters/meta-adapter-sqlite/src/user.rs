//! Users and their login sessions

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use canopy_types::meta_adapter::{Session, User};
use canopy_types::prelude::*;
use canopy_types::types::UserId;

use crate::utils::{collect_res, db_err, inspect, map_res, to_u32, to_u32_id};

fn map_user(row: SqliteRow) -> Result<User, sqlx::Error> {
	Ok(User {
		id: UserId(to_u32(row.try_get("user_id")?)?),
		username: row.try_get::<String, _>("username")?.into(),
		deity: row.try_get("deity")?,
		active: row.try_get("active")?,
		created_at: Timestamp(row.try_get("created_at")?),
	})
}

/// Unique index violations surface as a conflict instead of a bare DB error
pub(crate) fn unique_err(err: sqlx::Error, what: &str) -> Error {
	match &err {
		sqlx::Error::Database(db) if db.is_unique_violation() => {
			Error::Conflict(format!("{} already in use", what))
		}
		_ => db_err(err),
	}
}

/// Insert the user and its personal group in one transaction
pub(crate) async fn create(db: &SqlitePool, username: &str, deity: bool) -> ClResult<UserId> {
	let mut tx = db.begin().await.map_err(db_err)?;

	let res = sqlx::query("INSERT INTO users (username, deity, active) VALUES (?, ?, 1)")
		.bind(username)
		.bind(deity)
		.execute(&mut *tx)
		.await
		.map_err(|err| unique_err(err, "Username"))?;
	let user_id = to_u32_id(res.last_insert_rowid())?;

	sqlx::query("INSERT INTO groups (name, user_id, active) VALUES (?, ?, 1)")
		.bind(username)
		.bind(user_id)
		.execute(&mut *tx)
		.await
		.map_err(|err| unique_err(err, "Group name"))?;

	tx.commit().await.map_err(db_err)?;
	Ok(UserId(user_id))
}

pub(crate) async fn read(db: &SqlitePool, user_id: UserId) -> ClResult<User> {
	let res = sqlx::query(
		"SELECT user_id, username, deity, active, created_at FROM users WHERE user_id = ?",
	)
	.bind(user_id.0)
	.fetch_one(db)
	.await;
	map_res(res, map_user)
}

pub(crate) async fn read_by_name(db: &SqlitePool, username: &str) -> ClResult<User> {
	let res = sqlx::query(
		"SELECT user_id, username, deity, active, created_at FROM users WHERE username = ?",
	)
	.bind(username)
	.fetch_one(db)
	.await;
	map_res(res, map_user)
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<User>> {
	let rows = sqlx::query(
		"SELECT user_id, username, deity, active, created_at FROM users ORDER BY username",
	)
	.fetch_all(db)
	.await
	.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_user))
}

pub(crate) async fn count(db: &SqlitePool) -> ClResult<u32> {
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
		.fetch_one(db)
		.await
		.map_err(db_err)?;
	to_u32_id(count)
}

pub(crate) async fn update_deity(db: &SqlitePool, user_id: UserId, deity: bool) -> ClResult<()> {
	let res = sqlx::query("UPDATE users SET deity = ? WHERE user_id = ?")
		.bind(deity)
		.bind(user_id.0)
		.execute(db)
		.await
		.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

/// bcrypt hash of the login password, `None` while no password is set
pub(crate) async fn read_password(db: &SqlitePool, user_id: UserId) -> ClResult<Option<Box<str>>> {
	let res = sqlx::query("SELECT password FROM users WHERE user_id = ?")
		.bind(user_id.0)
		.fetch_one(db)
		.await;
	map_res(res, |row| Ok(row.try_get::<Option<String>, _>("password")?.map(Into::into)))
}

pub(crate) async fn update_password(
	db: &SqlitePool,
	user_id: UserId,
	password_hash: &str,
) -> ClResult<()> {
	let res = sqlx::query("UPDATE users SET password = ? WHERE user_id = ?")
		.bind(password_hash)
		.bind(user_id.0)
		.execute(db)
		.await
		.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

// Sessions
//**********
pub(crate) async fn create_session(
	db: &SqlitePool,
	token_hash: &str,
	user_id: UserId,
	auth_key: &str,
	expires_at: Timestamp,
) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO sessions (token_hash, user_id, auth_key, expires_at) VALUES (?, ?, ?, ?)",
	)
	.bind(token_hash)
	.bind(user_id.0)
	.bind(auth_key)
	.bind(expires_at.0)
	.execute(db)
	.await
	.map_err(db_err)?;
	Ok(())
}

pub(crate) async fn read_session(db: &SqlitePool, token_hash: &str) -> ClResult<Session> {
	let res = sqlx::query(
		"SELECT user_id, auth_key, expires_at FROM sessions WHERE token_hash = ? AND expires_at > ?",
	)
	.bind(token_hash)
	.bind(Timestamp::now().0)
	.fetch_one(db)
	.await;
	map_res(res, |row| {
		Ok(Session {
			user_id: UserId(to_u32(row.try_get("user_id")?)?),
			auth_key: row.try_get::<String, _>("auth_key")?.into(),
			expires_at: Timestamp(row.try_get("expires_at")?),
		})
	})
}

pub(crate) async fn delete_session(db: &SqlitePool, token_hash: &str) -> ClResult<()> {
	sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
		.bind(token_hash)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	Ok(())
}

// vim: ts=4
