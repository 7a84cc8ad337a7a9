//! Routing, authentication and the users module over HTTP

mod common;

use axum::http::StatusCode;

use common::*;

#[tokio::test]
async fn test_unknown_module_is_not_found() {
	let t = setup().await;
	let res = t.send(get("/nosuchmodule/list", Some(&t.admin))).await;
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_request_needs_session() {
	let t = setup().await;
	let res = t.send(get("/users/permissions", None)).await;
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_token_is_rejected() {
	let t = setup().await;
	let req = axum::http::Request::builder()
		.uri("/users/permissions")
		.header("authorization", "Bearer not-a-token")
		.body(axum::body::Body::empty())
		.expect("request");
	assert_eq!(t.send(req).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_module_var_selects_module() {
	let t = setup().await;
	let res = t.send(get("/?module=users&command=permissions", Some(&t.admin))).await;
	assert_eq!(res.status(), StatusCode::OK);
	let body = body_json(res).await;
	assert_eq!(body["data"]["deity"], true);
}

#[tokio::test]
async fn test_create_group_and_duplicate() {
	let t = setup().await;
	let res = t.send(post("/users/post_group", &t.admin, "name=editors")).await;
	assert_eq!(res.status(), StatusCode::CREATED);

	let res = t.send(post("/users/post_group", &t.admin, "name=editors")).await;
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	let body = body_json(res).await;
	assert_eq!(body["error"]["message"], "Group name already in use");

	// personal groups share the name space
	let res = t.send(post("/users/post_group", &t.admin, "name=admin")).await;
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);

	let res = t.send(post("/users/post_group", &t.admin, "name=ab")).await;
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_members_list_replaces_membership() {
	let t = setup().await;
	let (bob_id, _) = t.user("bob").await;
	let (carol_id, _) = t.user("carol").await;
	let bob = t.app.meta_adapter.read_user_group(bob_id).await.expect("bob group");
	let carol = t.app.meta_adapter.read_user_group(carol_id).await.expect("carol group");

	let res = t.send(post("/users/post_group", &t.admin, "name=editors")).await;
	let group_id = body_json(res).await["data"]["id"].as_u64().expect("group id");

	let form = format!("group_id={}&members[]={}&members[]={}", group_id, bob.id, carol.id);
	let res = t.send(post("/users/post_group", &t.admin, &form)).await;
	assert_eq!(res.status(), StatusCode::OK);
	let res = t.send(get(&format!("/users/members?group_id={}", group_id), Some(&t.admin))).await;
	assert_eq!(body_json(res).await["data"].as_array().map(Vec::len), Some(2));

	let form = format!("group_id={}&members[]={}", group_id, carol.id);
	let res = t.send(post("/users/post_group", &t.admin, &form)).await;
	assert_eq!(res.status(), StatusCode::OK);
	let res = t.send(get(&format!("/users/members?group_id={}", group_id), Some(&t.admin))).await;
	let body = body_json(res).await;
	assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
	assert_eq!(body["data"][0]["name"], "carol");
}

#[tokio::test]
async fn test_change_without_authkey_is_denied() {
	let t = setup().await;
	let res = t.send(post_raw("/users/post_group", Some(&t.admin), "name=editors".into())).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);

	let res = t.send(post_raw("/users/post_group", Some(&t.admin), "name=editors&authkey=wrong".into())).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_permission_through_nested_groups() {
	let t = setup().await;
	let (alice_id, alice) = t.user("alice").await;
	let alice_group = t.app.meta_adapter.read_user_group(alice_id).await.expect("personal group");

	// no grants yet
	let res = t.send(post("/users/post_group", &alice, "name=writers")).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);

	// staff > editors > alice
	let staff = t.app.meta_adapter.create_group("staff", None, true).await.expect("group");
	let editors = t.app.meta_adapter.create_group("editors", None, true).await.expect("group");
	let form = format!("group_id={}&member_id={}", staff, editors);
	assert_eq!(t.send(post("/users/add_member", &t.admin, &form)).await.status(), StatusCode::OK);
	let form = format!("group_id={}&member_id={}", editors, alice_group.id);
	assert_eq!(t.send(post("/users/add_member", &t.admin, &form)).await.status(), StatusCode::OK);

	for form in [
		format!("group_id={}&perm_module=users&level=restricted", staff),
		format!("group_id={}&perm_module=users&subpermission=edit_groups&level=full", staff),
	] {
		let res = t.send(post("/users/set_permission", &t.admin, &form)).await;
		assert_eq!(res.status(), StatusCode::OK);
	}

	let res = t.send(post("/users/post_group", &alice, "name=writers")).await;
	assert_eq!(res.status(), StatusCode::CREATED);

	let res = t.send(get("/users/permissions", Some(&alice))).await;
	let body = body_json(res).await;
	assert_eq!(body["data"]["deity"], false);
	assert_eq!(body["data"]["groups"].as_array().map(Vec::len), Some(3));

	// deactivating the outer group cuts the path
	let form = format!("group_id={}&active=0", staff);
	assert_eq!(t.send(post("/users/post_group", &t.admin, &form)).await.status(), StatusCode::OK);
	let res = t.send(post("/users/post_group", &alice, "name=readers")).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deity_rules() {
	let t = setup().await;
	let (alice_id, alice) = t.user("alice").await;
	let (bob_id, _bob) = t.user("bob").await;

	// a mortal can not promote anyone, themselves included
	let form = format!("user_id={}", bob_id);
	assert_eq!(t.send(post("/users/deify", &alice, &form)).await.status(), StatusCode::FORBIDDEN);
	let form = format!("user_id={}", alice_id);
	assert_eq!(t.send(post("/users/deify", &alice, &form)).await.status(), StatusCode::FORBIDDEN);

	// a deity can not demote themselves
	let admin = t.app.meta_adapter.read_user_by_name("admin").await.expect("admin");
	let form = format!("user_id={}", admin.id);
	assert_eq!(t.send(post("/users/mortalize", &t.admin, &form)).await.status(), StatusCode::BAD_REQUEST);

	let form = format!("user_id={}", bob_id);
	let res = t.send(post("/users/deify", &t.admin, &form)).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_json(res).await["data"]["deity"], true);
	assert!(t.app.meta_adapter.read_user(bob_id).await.expect("bob").deity);
}

#[tokio::test]
async fn test_sign_up_follows_setting() {
	let t = setup().await;
	let res = t.send(post_raw("/users/post_user", None, "username=carol&password=carol-pw".into())).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);

	set_setting(&t, "users.allow_new_users", serde_json::json!(true)).await;
	let res = t.send(post_raw("/users/post_user", None, "username=carol&password=carol-pw".into())).await;
	assert_eq!(res.status(), StatusCode::CREATED);

	// only a deity creates deities
	let res = t.send(post_raw("/users/post_user", None, "username=dave&password=dave-pw&deity=1".into())).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);
	let res = t.send(post("/users/post_user", &t.admin, "username=dave&password=dave-pw&deity=1")).await;
	assert_eq!(res.status(), StatusCode::CREATED);

	let res = t.send(post("/users/post_user", &t.admin, "username=carol&password=carol-pw")).await;
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);

	// too short
	let res = t.send(post("/users/post_user", &t.admin, "username=erin&password=abc")).await;
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signed_up_user_can_log_in() {
	let t = setup().await;
	set_setting(&t, "users.allow_new_users", serde_json::json!(true)).await;
	let res = t.send(post_raw("/users/post_user", None, "username=alice&password=alice-pw".into())).await;
	assert_eq!(res.status(), StatusCode::CREATED);

	let res = t.send(post_raw("/users/login", None, "username=alice&password=alice-pw".into())).await;
	assert_eq!(res.status(), StatusCode::OK);
	let body = body_json(res).await;
	let token = body["data"]["token"].as_str().expect("token");
	assert!(body["data"]["authKey"].as_str().is_some_and(|k| !k.is_empty()));

	let req = axum::http::Request::builder()
		.uri("/users/permissions")
		.header("authorization", format!("Bearer {}", token))
		.body(axum::body::Body::empty())
		.expect("request");
	let res = t.send(req).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_json(res).await["data"]["deity"], false);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
	let t = setup().await;
	let res = t.send(post_raw("/users/login", None, "username=admin&password=wrong".into())).await;
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

	let res = t.send(post_raw("/users/login", None, "username=nobody&password=wrong".into())).await;
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

	// accounts without a stored password cannot log in
	t.user("bob").await;
	let res = t.send(post_raw("/users/login", None, "username=bob&password=".into())).await;
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_admin_logs_in_again() {
	let t = setup_with(|builder| {
		builder.session_ttl(-1);
	})
	.await;
	assert_eq!(t.send(get("/users/permissions", Some(&t.admin))).await.status(), StatusCode::UNAUTHORIZED);
	assert!(canopy::bootstrap::bootstrap(&t.app).await.expect("bootstrap").is_none());

	let form = format!("username=admin&password={}", ADMIN_PASSWORD);
	let res = t.send(post_raw("/users/login", None, form)).await;
	assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_change() {
	let t = setup().await;
	let res = t.send(post("/users/post_user", &t.admin, "username=alice&password=alice-pw")).await;
	assert_eq!(res.status(), StatusCode::CREATED);
	let res = t.send(post_raw("/users/login", None, "username=alice&password=alice-pw".into())).await;
	let body = body_json(res).await;
	let alice = canopy_core::session::NewSession {
		token: body["data"]["token"].as_str().expect("token").to_string(),
		auth_key: body["data"]["authKey"].as_str().expect("auth key").into(),
		expires_at: canopy_types::types::Timestamp(0),
	};

	// the current password is checked
	let res = t.send(post("/users/set_password", &alice, "current_password=nope&password=new-alice-pw")).await;
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	let res = t.send(post("/users/set_password", &alice, "current_password=alice-pw&password=new-alice-pw")).await;
	assert_eq!(res.status(), StatusCode::OK);

	let res = t.send(post_raw("/users/login", None, "username=alice&password=alice-pw".into())).await;
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
	let res = t.send(post_raw("/users/login", None, "username=alice&password=new-alice-pw".into())).await;
	assert_eq!(res.status(), StatusCode::OK);

	// mortals cannot reset others, deities can
	let (bob_id, _) = t.user("bob").await;
	let form = format!("user_id={}&password=bob-pw-1", bob_id);
	assert_eq!(t.send(post("/users/set_password", &alice, &form)).await.status(), StatusCode::FORBIDDEN);
	assert_eq!(t.send(post("/users/set_password", &t.admin, &form)).await.status(), StatusCode::OK);
	let res = t.send(post_raw("/users/login", None, "username=bob&password=bob-pw-1".into())).await;
	assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_settings_are_deity_only() {
	let t = setup().await;
	let (_, alice) = t.user("alice").await;
	assert_eq!(t.send(get("/settings", Some(&alice))).await.status(), StatusCode::FORBIDDEN);
	let body = serde_json::json!({ "value": true, "authkey": &*alice.auth_key });
	let res = t.send(put_json("/settings/users.allow_new_users", &alice, &body)).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);

	let res = t.send(get("/settings", Some(&t.admin))).await;
	assert_eq!(res.status(), StatusCode::OK);
	let body = body_json(res).await;
	assert!(body["data"].as_array().is_some_and(|list| list.iter().any(|s| s["key"] == "filecabinet.image_files")));

	// the authkey is required for writes
	let body = serde_json::json!({ "value": true });
	let res = t.send(put_json("/settings/users.allow_new_users", &t.admin, &body)).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);

	let res = t.send(get("/settings/nosuch.key", Some(&t.admin))).await;
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_setting_values_are_validated() {
	let t = setup().await;
	let key = "/settings/filecabinet.image_files";

	let body = serde_json::json!({ "value": "png,../etc", "authkey": &*t.admin.auth_key });
	let res = t.send(put_json(key, &t.admin, &body)).await;
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);

	// wrong type
	let body = serde_json::json!({ "value": 5, "authkey": &*t.admin.auth_key });
	assert_eq!(t.send(put_json(key, &t.admin, &body)).await.status(), StatusCode::BAD_REQUEST);

	// system settings are fixed
	let body = serde_json::json!({ "value": 1, "authkey": &*t.admin.auth_key });
	let res = t.send(put_json("/settings/filecabinet.max_system_size", &t.admin, &body)).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);

	set_setting(&t, "filecabinet.image_files", serde_json::json!("png")).await;
	let res = t.send(get(key, Some(&t.admin))).await;
	assert_eq!(body_json(res).await["data"]["value"], "png");

	let res = t.send(delete(&format!("{}?authkey={}", key, t.admin.auth_key), &t.admin)).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_json(res).await["data"]["value"], "gif,jpeg,jpg,png,webp");
}

#[tokio::test]
async fn test_missing_personal_group_is_unauthorized() {
	let t = setup().await;
	let (alice_id, alice) = t.user("alice").await;
	let personal = t.app.meta_adapter.read_user_group(alice_id).await.expect("personal group");
	t.app.meta_adapter.delete_group(personal.id).await.expect("delete group");

	let res = t.send(get("/users/permissions", Some(&alice))).await;
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
	let t = setup().await;
	let (_, alice) = t.user("alice").await;
	let req = post_raw("/logout", Some(&alice), String::new());
	assert_eq!(t.send(req).await.status(), StatusCode::NO_CONTENT);
	assert_eq!(t.send(get("/users/permissions", Some(&alice))).await.status(), StatusCode::UNAUTHORIZED);
}

// vim: ts=4
