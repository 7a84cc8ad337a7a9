//! Database schema initialization

use sqlx::SqlitePool;

/// Create all tables and indexes. Runs in one transaction and is safe to repeat.
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Users and sessions
	//********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS users (
		user_id integer PRIMARY KEY AUTOINCREMENT,
		username text NOT NULL,
		deity integer NOT NULL DEFAULT 0,
		active integer NOT NULL DEFAULT 1,
		password text,
		created_at datetime DEFAULT (unixepoch())
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users(username)")
		.execute(&mut *tx)
		.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS sessions (
		token_hash text NOT NULL,
		user_id integer NOT NULL,
		auth_key text NOT NULL,
		expires_at datetime NOT NULL,
		PRIMARY KEY(token_hash)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)")
		.execute(&mut *tx)
		.await?;

	// Groups
	//********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS groups (
		group_id integer PRIMARY KEY AUTOINCREMENT,
		name text NOT NULL,
		user_id integer,
		active integer NOT NULL DEFAULT 1
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_groups_name ON groups(name)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_groups_user ON groups(user_id)")
		.execute(&mut *tx)
		.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS group_members (
		group_id integer NOT NULL,
		member_id integer NOT NULL,
		PRIMARY KEY(group_id, member_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_group_members_member ON group_members(member_id)")
		.execute(&mut *tx)
		.await?;

	// Permissions ('' and 0 stand for "no subpermission" and "no item")
	//*************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS permissions (
		group_id integer NOT NULL,
		module text NOT NULL,
		subpermission text NOT NULL DEFAULT '',
		item_id integer NOT NULL DEFAULT 0,
		level integer NOT NULL,
		PRIMARY KEY(group_id, module, subpermission, item_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Control panel
	//***************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS tabs (
		tab_id integer PRIMARY KEY AUTOINCREMENT,
		title text NOT NULL,
		link text NOT NULL,
		tab_order integer,
		itemname text NOT NULL,
		link_title text,
		secure integer NOT NULL DEFAULT 1,
		strict integer NOT NULL DEFAULT 0
	)",
	)
	.execute(&mut *tx)
	.await?;

	// File cabinet
	//**************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS folders (
		folder_id integer PRIMARY KEY AUTOINCREMENT,
		title text NOT NULL,
		ftype integer NOT NULL,
		directory text NOT NULL,
		created_at datetime DEFAULT (unixepoch())
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS documents (
		document_id integer PRIMARY KEY AUTOINCREMENT,
		folder_id integer NOT NULL,
		file_name text NOT NULL,
		title text NOT NULL,
		file_type text NOT NULL,
		size integer NOT NULL,
		created_at datetime DEFAULT (unixepoch())
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_folder ON documents(folder_id)")
		.execute(&mut *tx)
		.await?;

	// Settings
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS settings (
		name text NOT NULL,
		value text,
		PRIMARY KEY(name)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
