//! Meta adapter CRUD operation tests
//!
//! Users, sessions, groups, permission grants and settings

use canopy_meta_adapter_sqlite::MetaAdapterSqlite;
use canopy_types::error::Error;
use canopy_types::meta_adapter::{MetaAdapter, PermissionGrant, PermissionLevel};
use canopy_types::types::{GroupId, Timestamp, UserId};
use tempfile::TempDir;

async fn create_test_adapter() -> (MetaAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

#[tokio::test]
async fn test_create_user_creates_personal_group() {
	let (adapter, _temp) = create_test_adapter().await;

	let user_id = adapter.create_user("alice", false).await.expect("Should create user");
	let user = adapter.read_user(user_id).await.expect("Should read user");
	assert_eq!(&*user.username, "alice");
	assert!(!user.deity);
	assert!(user.active);

	let group = adapter.read_user_group(user_id).await.expect("Should have a personal group");
	assert_eq!(&*group.name, "alice");
	assert_eq!(group.user_id, Some(user_id));
	assert!(group.is_personal());

	assert_eq!(adapter.count_users().await.ok(), Some(1));
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.create_user("bob", false).await.expect("Should create user");

	let res = adapter.create_user("bob", true).await;
	assert!(matches!(res, Err(Error::Conflict(_))));
	assert_eq!(adapter.count_users().await.ok(), Some(1));
}

#[tokio::test]
async fn test_password_roundtrip() {
	let (adapter, _temp) = create_test_adapter().await;
	let user_id = adapter.create_user("carol", false).await.expect("Should create user");

	assert_eq!(adapter.read_user_password(user_id).await.expect("Should read"), None);
	adapter.update_user_password(user_id, "$2b$10$hash").await.expect("Should update");
	assert_eq!(adapter.read_user_password(user_id).await.expect("Should read").as_deref(), Some("$2b$10$hash"));

	assert!(matches!(adapter.update_user_password(UserId(999), "x").await, Err(Error::NotFound)));
	assert!(matches!(adapter.read_user_password(UserId(999)).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_update_deity() {
	let (adapter, _temp) = create_test_adapter().await;
	let user_id = adapter.create_user("carol", false).await.expect("Should create user");

	adapter.update_user_deity(user_id, true).await.expect("Should update");
	assert!(adapter.read_user(user_id).await.map(|u| u.deity).unwrap_or(false));

	assert!(matches!(adapter.update_user_deity(UserId(999), true).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_session_lifecycle() {
	let (adapter, _temp) = create_test_adapter().await;
	let user_id = adapter.create_user("dave", false).await.expect("Should create user");

	let expires = Timestamp::now().add_seconds(3600);
	adapter.create_session("hash1", user_id, "key1", expires).await.expect("Should create session");
	let session = adapter.read_session("hash1").await.expect("Should read session");
	assert_eq!(session.user_id, user_id);
	assert_eq!(&*session.auth_key, "key1");

	adapter
		.create_session("hash2", user_id, "key2", Timestamp::now().add_seconds(-10))
		.await
		.expect("Should create session");
	assert!(matches!(adapter.read_session("hash2").await, Err(Error::NotFound)));

	adapter.delete_session("hash1").await.expect("Should delete session");
	assert!(matches!(adapter.read_session("hash1").await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_group_save_replaces_members() {
	let (adapter, _temp) = create_test_adapter().await;
	let editors = adapter.create_group("editors", None, true).await.expect("Should create group");
	let writers = adapter.create_group("writers", None, true).await.expect("Should create group");
	let alice = adapter.create_user("alice", false).await.expect("Should create user");
	let alice_group = adapter.read_user_group(alice).await.expect("Should read group").id;

	let mut group = adapter.read_group(editors).await.expect("Should read group");
	adapter.save_group(&group, Some(&[writers, alice_group])).await.expect("Should save");
	assert_eq!(adapter.list_members(editors).await.ok(), Some(vec![writers, alice_group]));

	group.name = "Editors".into();
	group.active = false;
	adapter.save_group(&group, None).await.expect("Should save");
	let group = adapter.read_group(editors).await.expect("Should read group");
	assert_eq!(&*group.name, "Editors");
	assert!(!group.active);
	assert_eq!(adapter.list_members(editors).await.map(|m| m.len()).ok(), Some(2));

	adapter.save_group(&group, Some(&[])).await.expect("Should save");
	assert_eq!(adapter.list_members(editors).await.ok(), Some(vec![]));
}

#[tokio::test]
async fn test_group_name_is_unique() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.create_group("staff", None, true).await.expect("Should create group");
	assert!(matches!(adapter.create_group("staff", None, true).await, Err(Error::Conflict(_))));
	assert!(matches!(adapter.create_user("staff", false).await, Err(Error::Conflict(_))));
	// the failed user insert must not leave a user row behind
	assert_eq!(adapter.count_users().await.ok(), Some(0));
}

#[tokio::test]
async fn test_delete_group_cascades() {
	let (adapter, _temp) = create_test_adapter().await;
	let a = adapter.create_group("a", None, true).await.expect("Should create group");
	let b = adapter.create_group("b", None, true).await.expect("Should create group");
	let group_a = adapter.read_group(a).await.expect("Should read group");
	adapter.save_group(&group_a, Some(&[b])).await.expect("Should save");
	adapter
		.set_permission_grant(&PermissionGrant {
			group_id: b,
			module: "blog".into(),
			subpermission: None,
			item_id: None,
			level: PermissionLevel::Full,
		})
		.await
		.expect("Should grant");

	adapter.delete_group(b).await.expect("Should delete");
	assert!(matches!(adapter.read_group(b).await, Err(Error::NotFound)));
	assert_eq!(adapter.list_members(a).await.ok(), Some(vec![]));
	assert_eq!(adapter.list_group_permission_grants(b).await.map(|g| g.len()).ok(), Some(0));
	assert!(matches!(adapter.delete_group(GroupId(b.0)).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_permission_grants_upsert_and_remove() {
	let (adapter, _temp) = create_test_adapter().await;
	let g = adapter.create_group("staff", None, true).await.expect("Should create group");
	let mut grant = PermissionGrant {
		group_id: g,
		module: "filecabinet".into(),
		subpermission: Some("edit_folders".into()),
		item_id: Some(4),
		level: PermissionLevel::Restricted,
	};

	adapter.set_permission_grant(&grant).await.expect("Should grant");
	grant.level = PermissionLevel::Full;
	adapter.set_permission_grant(&grant).await.expect("Should upgrade");

	let grants = adapter.list_group_permission_grants(g).await.expect("Should list");
	assert_eq!(grants, vec![grant.clone()]);

	grant.level = PermissionLevel::None;
	adapter.set_permission_grant(&grant).await.expect("Should revoke");
	assert!(adapter.list_permission_grants().await.map(|g| g.is_empty()).unwrap_or(false));
}

#[tokio::test]
async fn test_settings_roundtrip() {
	let (adapter, _temp) = create_test_adapter().await;
	assert_eq!(adapter.read_setting("users.allow_new_users").await.ok(), Some(None));

	adapter
		.update_setting("users.allow_new_users", Some(serde_json::json!(true)))
		.await
		.expect("Should store");
	assert_eq!(
		adapter.read_setting("users.allow_new_users").await.ok(),
		Some(Some(serde_json::json!(true)))
	);

	adapter.update_setting("users.allow_new_users", None).await.expect("Should delete");
	assert_eq!(adapter.read_setting("users.allow_new_users").await.ok(), Some(None));
}

// vim: ts=4
