//! Adapter that stores the relational state of the site: users, groups and their
//! memberships, permission grants, control-panel tabs, file-cabinet folders and
//! documents, and runtime settings.
//!
//! Records here are plain data. Implementations map rows to these records explicitly;
//! entities are loaded whole and saved whole.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;
use crate::types::{DocumentId, FolderId, GroupId, TabId, UserId};

// Users and sessions //
//********************//
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: UserId,
	pub username: Box<str>,
	pub deity: bool,
	pub active: bool,
	pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct Session {
	pub user_id: UserId,
	pub auth_key: Box<str>,
	pub expires_at: Timestamp,
}

// Groups //
//********//
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
	pub id: GroupId,
	pub name: Box<str>,
	/// Owning user of a personal pseudo-group; `None` for a true group
	pub user_id: Option<UserId>,
	pub active: bool,
}

impl Group {
	pub fn is_personal(&self) -> bool {
		self.user_id.is_some()
	}
}

/// `member_id` is itself a group, so groups can contain groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
	pub group_id: GroupId,
	pub member_id: GroupId,
}

// Permissions //
//*************//
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
	#[default]
	None,
	Restricted,
	Full,
}

impl PermissionLevel {
	/// `Full` satisfies a `Restricted` requirement; `None` is always satisfied
	pub fn satisfies(self, required: PermissionLevel) -> bool {
		self >= required
	}

	pub fn as_i64(self) -> i64 {
		match self {
			PermissionLevel::None => 0,
			PermissionLevel::Restricted => 1,
			PermissionLevel::Full => 2,
		}
	}

	pub fn from_i64(value: i64) -> ClResult<Self> {
		match value {
			0 => Ok(PermissionLevel::None),
			1 => Ok(PermissionLevel::Restricted),
			2 => Ok(PermissionLevel::Full),
			_ => Err(Error::Parse),
		}
	}
}

impl std::str::FromStr for PermissionLevel {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"none" | "0" => Ok(PermissionLevel::None),
			"restricted" | "1" => Ok(PermissionLevel::Restricted),
			"full" | "unrestricted" | "2" => Ok(PermissionLevel::Full),
			_ => Err(Error::ValidationError(format!("Unknown permission level: {}", s))),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
	pub group_id: GroupId,
	pub module: Box<str>,
	pub subpermission: Option<Box<str>>,
	pub item_id: Option<u32>,
	pub level: PermissionLevel,
}

// Control panel tabs //
//********************//
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
	pub id: TabId,
	pub title: Box<str>,
	pub link: Box<str>,
	/// Unset until the tab has been saved once
	pub tab_order: Option<u32>,
	pub itemname: Box<str>,
	pub link_title: Option<Box<str>>,
	/// Secure tab links carry the session auth key
	pub secure: bool,
	/// Strict tab links are used verbatim
	pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct NewTab {
	pub title: Box<str>,
	pub tab_order: u32,
	pub link: Box<str>,
	pub itemname: Box<str>,
	pub link_title: Option<Box<str>>,
	pub secure: bool,
	pub strict: bool,
}

// File cabinet //
//**************//
/// Closed set of folder kinds. The integer codes are the persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
	Image,
	Document,
	Multimedia,
}

impl FolderKind {
	pub fn code(self) -> i64 {
		match self {
			FolderKind::Image => 1,
			FolderKind::Document => 2,
			FolderKind::Multimedia => 3,
		}
	}

	pub fn from_code(code: i64) -> ClResult<Self> {
		match code {
			1 => Ok(FolderKind::Image),
			2 => Ok(FolderKind::Document),
			3 => Ok(FolderKind::Multimedia),
			_ => Err(Error::Parse),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
	pub id: FolderId,
	pub title: Box<str>,
	pub kind: FolderKind,
	/// Directory relative to the file-cabinet root, always ending in `/`
	pub directory: Box<str>,
	pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
	pub id: DocumentId,
	pub folder_id: FolderId,
	pub file_name: Box<str>,
	pub title: Box<str>,
	pub file_type: Box<str>,
	pub size: u64,
	pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
	pub folder_id: FolderId,
	pub file_name: &'a str,
	pub title: &'a str,
	pub file_type: &'a str,
	pub size: u64,
}

#[async_trait]
pub trait MetaAdapter: Debug + Send + Sync {
	// Users
	//*******
	/// Creates the user together with its personal group
	async fn create_user(&self, username: &str, deity: bool) -> ClResult<UserId>;
	async fn read_user(&self, user_id: UserId) -> ClResult<User>;
	async fn read_user_by_name(&self, username: &str) -> ClResult<User>;
	async fn list_users(&self) -> ClResult<Vec<User>>;
	async fn count_users(&self) -> ClResult<u32>;
	async fn update_user_deity(&self, user_id: UserId, deity: bool) -> ClResult<()>;
	/// bcrypt hash of the login password; `None` when the account has none
	async fn read_user_password(&self, user_id: UserId) -> ClResult<Option<Box<str>>>;
	async fn update_user_password(&self, user_id: UserId, password_hash: &str) -> ClResult<()>;

	// Sessions
	//**********
	async fn create_session(
		&self,
		token_hash: &str,
		user_id: UserId,
		auth_key: &str,
		expires_at: Timestamp,
	) -> ClResult<()>;
	/// Expired sessions are reported as `NotFound`
	async fn read_session(&self, token_hash: &str) -> ClResult<Session>;
	async fn delete_session(&self, token_hash: &str) -> ClResult<()>;

	// Groups
	//********
	async fn list_groups(&self) -> ClResult<Vec<Group>>;
	async fn read_group(&self, group_id: GroupId) -> ClResult<Group>;
	async fn read_group_by_name(&self, name: &str) -> ClResult<Group>;
	async fn read_user_group(&self, user_id: UserId) -> ClResult<Group>;
	async fn create_group(&self, name: &str, user_id: Option<UserId>, active: bool)
	-> ClResult<GroupId>;
	/// Persists the group row; when `members` is given the membership list is replaced
	async fn save_group(&self, group: &Group, members: Option<&[GroupId]>) -> ClResult<()>;
	/// Removes the group, its memberships in both directions and its grants
	async fn delete_group(&self, group_id: GroupId) -> ClResult<()>;
	async fn list_memberships(&self) -> ClResult<Vec<Membership>>;
	async fn list_members(&self, group_id: GroupId) -> ClResult<Vec<GroupId>>;

	// Permissions
	//*************
	async fn list_permission_grants(&self) -> ClResult<Vec<PermissionGrant>>;
	async fn list_group_permission_grants(&self, group_id: GroupId)
	-> ClResult<Vec<PermissionGrant>>;
	/// Upserts a grant; a `None` level removes it
	async fn set_permission_grant(&self, grant: &PermissionGrant) -> ClResult<()>;

	// Control panel tabs
	//********************
	/// All tabs ordered by `tab_order`
	async fn list_tabs(&self) -> ClResult<Vec<Tab>>;
	async fn read_tab(&self, tab_id: TabId) -> ClResult<Tab>;
	/// Inserts the tab at `tab.tab_order`, which must still be one past the highest
	/// stored order. Otherwise fails with `Error::Conflict` and writes nothing.
	async fn create_tab(&self, tab: &NewTab) -> ClResult<Tab>;
	/// Rewrites the order of every listed tab atomically, provided the stored orders
	/// still equal `expected`. Otherwise fails with `Error::Conflict` and writes nothing.
	async fn update_tab_orders(
		&self,
		expected: &[(TabId, u32)],
		orders: &[(TabId, u32)],
	) -> ClResult<()>;
	async fn delete_tab(&self, tab_id: TabId) -> ClResult<()>;

	// File cabinet
	//**************
	async fn list_folders(&self, kind: Option<FolderKind>) -> ClResult<Vec<Folder>>;
	async fn read_folder(&self, folder_id: FolderId) -> ClResult<Folder>;
	async fn create_folder(&self, title: &str, kind: FolderKind, directory: &str)
	-> ClResult<FolderId>;
	async fn list_documents(&self, folder_id: FolderId) -> ClResult<Vec<Document>>;
	async fn create_document(&self, doc: &NewDocument<'_>) -> ClResult<DocumentId>;

	// Settings
	//**********
	async fn read_setting(&self, name: &str) -> ClResult<Option<serde_json::Value>>;
	/// `None` deletes the stored value
	async fn update_setting(&self, name: &str, value: Option<serde_json::Value>) -> ClResult<()>;
}


// vim: ts=4
