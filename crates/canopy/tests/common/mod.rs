//! Shared setup for the HTTP tests

#![allow(dead_code)]

use axum::{
	Router,
	body::Body,
	http::{Request, Response, header},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use canopy::AppBuilder;
use canopy::bootstrap::bootstrap;
use canopy_core::session::{NewSession, create_session};
use canopy_meta_adapter_sqlite::MetaAdapterSqlite;
use canopy_types::types::UserId;

pub use canopy::App;

pub const ADMIN_PASSWORD: &str = "admin-secret";

pub struct TestApp {
	pub dir: tempfile::TempDir,
	pub app: App,
	pub router: Router,
	pub admin: NewSession,
}

pub async fn setup() -> TestApp {
	setup_with(|_| {}).await
}

/// Like [`setup`], with extra builder options applied before the app is built
pub async fn setup_with(configure: impl FnOnce(&mut AppBuilder)) -> TestApp {
	let dir = tempfile::tempdir().expect("tempdir");
	let meta = MetaAdapterSqlite::new(dir.path()).await.expect("meta adapter");

	let mut builder = AppBuilder::new();
	builder
		.meta_adapter(Arc::new(meta))
		.files_dir(dir.path().join("files"))
		.tmp_dir(dir.path().join("tmp"))
		.admin_password(ADMIN_PASSWORD);
	configure(&mut builder);
	let (app, router) = builder.build().await.expect("build app");
	let admin = bootstrap(&app).await.expect("bootstrap").expect("admin session");

	TestApp { dir, app, router, admin }
}

impl TestApp {
	pub async fn send(&self, req: Request<Body>) -> Response<Body> {
		self.router.clone().oneshot(req).await.expect("response")
	}

	/// Create a mortal account with a session
	pub async fn user(&self, username: &str) -> (UserId, NewSession) {
		let user_id = self.app.meta_adapter.create_user(username, false).await.expect("user");
		let session = create_session(&self.app, user_id).await.expect("session");
		(user_id, session)
	}
}

pub fn get(uri: &str, session: Option<&NewSession>) -> Request<Body> {
	let mut req = Request::builder().method("GET").uri(uri);
	if let Some(session) = session {
		req = req.header(header::AUTHORIZATION, format!("Bearer {}", session.token));
	}
	req.body(Body::empty()).expect("request")
}

/// Form post carrying the session's authkey
pub fn post(uri: &str, session: &NewSession, form: &str) -> Request<Body> {
	let body = if form.is_empty() {
		format!("authkey={}", session.auth_key)
	} else {
		format!("{}&authkey={}", form, session.auth_key)
	};
	post_raw(uri, Some(session), body)
}

pub fn post_raw(uri: &str, session: Option<&NewSession>, body: String) -> Request<Body> {
	let mut req = Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
	if let Some(session) = session {
		req = req.header(header::AUTHORIZATION, format!("Bearer {}", session.token));
	}
	req.body(Body::from(body)).expect("request")
}

pub fn put_json(uri: &str, session: &NewSession, body: &serde_json::Value) -> Request<Body> {
	Request::builder()
		.method("PUT")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.header(header::AUTHORIZATION, format!("Bearer {}", session.token))
		.body(Body::from(body.to_string()))
		.expect("request")
}

pub fn delete(uri: &str, session: &NewSession) -> Request<Body> {
	Request::builder()
		.method("DELETE")
		.uri(uri)
		.header(header::AUTHORIZATION, format!("Bearer {}", session.token))
		.body(Body::empty())
		.expect("request")
}

/// Change a runtime setting through the settings endpoint as the admin
pub async fn set_setting(t: &TestApp, key: &str, value: serde_json::Value) {
	let body = serde_json::json!({ "value": value, "authkey": &*t.admin.auth_key });
	let res = t.send(put_json(&format!("/settings/{}", key), &t.admin, &body)).await;
	assert_eq!(res.status(), axum::http::StatusCode::OK, "setting {}", key);
}

pub async fn body_text(res: Response<Body>) -> String {
	let bytes = res.into_body().collect().await.expect("body").to_bytes();
	String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
	serde_json::from_str(&body_text(res).await).expect("json body")
}

// vim: ts=4
