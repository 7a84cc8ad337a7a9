//! SQLite implementation of the Canopy metadata adapter.
//!
//! One module per table family; each exposes `pub(crate)` functions over the pool and
//! maps rows to records explicitly.

#![forbid(unsafe_code)]

mod folder;
mod group;
mod permission;
mod schema;
mod setting;
mod tab;
mod user;
mod utils;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use canopy_types::meta_adapter::{
	Document, Folder, FolderKind, Group, MetaAdapter, Membership, NewDocument, NewTab,
	PermissionGrant, Session, Tab, User,
};
use canopy_types::prelude::*;
use canopy_types::types::{DocumentId, FolderId, GroupId, TabId, UserId};

use crate::schema::init_db;

#[derive(Debug)]
pub struct MetaAdapterSqlite {
	db: SqlitePool,
}

impl MetaAdapterSqlite {
	/// Open (or create) `meta.db` inside `dir`
	pub async fn new(dir: impl AsRef<Path>) -> ClResult<Self> {
		let db_path = dir.as_ref().join("meta.db");
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(&db_path)
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("DbError: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		init_db(&db)
			.await
			.inspect_err(|err| error!("DbError: {:#?}", err))
			.map_err(|_| Error::DbError)?;
		info!("Opened metadata database at {}", db_path.display());

		Ok(Self { db })
	}
}

#[async_trait]
impl MetaAdapter for MetaAdapterSqlite {
	// Users
	//*******
	async fn create_user(&self, username: &str, deity: bool) -> ClResult<UserId> {
		user::create(&self.db, username, deity).await
	}

	async fn read_user(&self, user_id: UserId) -> ClResult<User> {
		user::read(&self.db, user_id).await
	}

	async fn read_user_by_name(&self, username: &str) -> ClResult<User> {
		user::read_by_name(&self.db, username).await
	}

	async fn list_users(&self) -> ClResult<Vec<User>> {
		user::list(&self.db).await
	}

	async fn count_users(&self) -> ClResult<u32> {
		user::count(&self.db).await
	}

	async fn update_user_deity(&self, user_id: UserId, deity: bool) -> ClResult<()> {
		user::update_deity(&self.db, user_id, deity).await
	}

	async fn read_user_password(&self, user_id: UserId) -> ClResult<Option<Box<str>>> {
		user::read_password(&self.db, user_id).await
	}

	async fn update_user_password(&self, user_id: UserId, password_hash: &str) -> ClResult<()> {
		user::update_password(&self.db, user_id, password_hash).await
	}

	// Sessions
	//**********
	async fn create_session(
		&self,
		token_hash: &str,
		user_id: UserId,
		auth_key: &str,
		expires_at: Timestamp,
	) -> ClResult<()> {
		user::create_session(&self.db, token_hash, user_id, auth_key, expires_at).await
	}

	async fn read_session(&self, token_hash: &str) -> ClResult<Session> {
		user::read_session(&self.db, token_hash).await
	}

	async fn delete_session(&self, token_hash: &str) -> ClResult<()> {
		user::delete_session(&self.db, token_hash).await
	}

	// Groups
	//********
	async fn list_groups(&self) -> ClResult<Vec<Group>> {
		group::list(&self.db).await
	}

	async fn read_group(&self, group_id: GroupId) -> ClResult<Group> {
		group::read(&self.db, group_id).await
	}

	async fn read_group_by_name(&self, name: &str) -> ClResult<Group> {
		group::read_by_name(&self.db, name).await
	}

	async fn read_user_group(&self, user_id: UserId) -> ClResult<Group> {
		group::read_by_user(&self.db, user_id).await
	}

	async fn create_group(
		&self,
		name: &str,
		user_id: Option<UserId>,
		active: bool,
	) -> ClResult<GroupId> {
		group::create(&self.db, name, user_id, active).await
	}

	async fn save_group(&self, group: &Group, members: Option<&[GroupId]>) -> ClResult<()> {
		group::save(&self.db, group, members).await
	}

	async fn delete_group(&self, group_id: GroupId) -> ClResult<()> {
		group::delete(&self.db, group_id).await
	}

	async fn list_memberships(&self) -> ClResult<Vec<Membership>> {
		group::list_memberships(&self.db).await
	}

	async fn list_members(&self, group_id: GroupId) -> ClResult<Vec<GroupId>> {
		group::list_members(&self.db, group_id).await
	}

	// Permissions
	//*************
	async fn list_permission_grants(&self) -> ClResult<Vec<PermissionGrant>> {
		permission::list(&self.db).await
	}

	async fn list_group_permission_grants(
		&self,
		group_id: GroupId,
	) -> ClResult<Vec<PermissionGrant>> {
		permission::list_for_group(&self.db, group_id).await
	}

	async fn set_permission_grant(&self, grant: &PermissionGrant) -> ClResult<()> {
		permission::set(&self.db, grant).await
	}

	// Control panel tabs
	//********************
	async fn list_tabs(&self) -> ClResult<Vec<Tab>> {
		tab::list(&self.db).await
	}

	async fn read_tab(&self, tab_id: TabId) -> ClResult<Tab> {
		tab::read(&self.db, tab_id).await
	}

	async fn create_tab(&self, tab: &NewTab) -> ClResult<Tab> {
		tab::create(&self.db, tab).await
	}

	async fn update_tab_orders(
		&self,
		expected: &[(TabId, u32)],
		orders: &[(TabId, u32)],
	) -> ClResult<()> {
		tab::update_orders(&self.db, expected, orders).await
	}

	async fn delete_tab(&self, tab_id: TabId) -> ClResult<()> {
		tab::delete(&self.db, tab_id).await
	}

	// File cabinet
	//**************
	async fn list_folders(&self, kind: Option<FolderKind>) -> ClResult<Vec<Folder>> {
		folder::list(&self.db, kind).await
	}

	async fn read_folder(&self, folder_id: FolderId) -> ClResult<Folder> {
		folder::read(&self.db, folder_id).await
	}

	async fn create_folder(
		&self,
		title: &str,
		kind: FolderKind,
		directory: &str,
	) -> ClResult<FolderId> {
		folder::create(&self.db, title, kind, directory).await
	}

	async fn list_documents(&self, folder_id: FolderId) -> ClResult<Vec<Document>> {
		folder::list_documents(&self.db, folder_id).await
	}

	async fn create_document(&self, doc: &NewDocument<'_>) -> ClResult<DocumentId> {
		folder::create_document(&self.db, doc).await
	}

	// Settings
	//**********
	async fn read_setting(&self, name: &str) -> ClResult<Option<serde_json::Value>> {
		setting::read(&self.db, name).await
	}

	async fn update_setting(&self, name: &str, value: Option<serde_json::Value>) -> ClResult<()> {
		setting::update(&self.db, name, value).await
	}
}

// vim: ts=4
