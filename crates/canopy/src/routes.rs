use axum::{
	Router,
	extract::{DefaultBodyLimit, State},
	http::{HeaderMap, StatusCode, header},
	middleware,
	routing::{get, post},
};
use tower_http::trace::TraceLayer;

use canopy_core::dispatch::dispatch;
use canopy_core::extract::Auth;
use canopy_core::middleware::optional_auth;
use canopy_core::session;
use canopy_core::settings::handler as settings;

use crate::prelude::*;

/// POST /logout
async fn post_logout(
	State(app): State<App>,
	Auth(identity): Auth,
	headers: HeaderMap,
) -> ClResult<StatusCode> {
	let token = headers
		.get(header::AUTHORIZATION)
		.and_then(|h| h.to_str().ok())
		.and_then(|h| h.strip_prefix("Bearer "))
		.ok_or(Error::Unauthorized)?;
	session::end_session(&app, token.trim()).await?;
	info!(subject = %identity.username, "logged out");
	Ok(StatusCode::NO_CONTENT)
}

/// Dedicated routes first; everything else goes through module dispatch
pub fn init(app: App) -> Router {
	Router::new()
		.route("/filecabinet/upload", post(canopy_filecabinet::post_upload))
		.route("/logout", post(post_logout))
		.route("/settings", get(settings::list_settings))
		.route(
			"/settings/{key}",
			get(settings::get_setting).put(settings::update_setting).delete(settings::reset_setting),
		)
		.fallback(dispatch)
		.layer(DefaultBodyLimit::max(app.opts.max_body_size))
		.layer(middleware::from_fn_with_state(app.clone(), optional_auth))
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
