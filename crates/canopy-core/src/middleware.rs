//! Request middlewares and guards

use axum::{
	body::Body,
	extract::State,
	http::{Request as HttpRequest, header},
	middleware::Next,
	response::Response,
};

use canopy_types::utils::secret_eq;

use crate::extract::Auth;
use crate::perm::Identity;
use crate::prelude::*;
use crate::request::Request;
use crate::session;

/// Attach the session identity when a bearer token is sent. A token that does not
/// resolve is rejected rather than silently downgraded to anonymous.
pub async fn optional_auth(
	State(app): State<App>,
	mut req: HttpRequest<Body>,
	next: Next,
) -> ClResult<Response> {
	let token = req
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|h| h.to_str().ok())
		.and_then(|h| h.strip_prefix("Bearer "))
		.map(|t| t.trim().to_string());

	if let Some(token) = token {
		let identity = session::resolve_session(&app, &token).await?;
		debug!(subject = %identity.username, deity = identity.deity, "authenticated");
		req.extensions_mut().insert(Auth(identity));
	}

	Ok(next.run(req).await)
}

/// Secure commands must carry the session's auth key as `authkey`
pub fn require_auth_key(identity: &Identity, req: &Request) -> ClResult<()> {
	check_auth_key(identity, req.vars().get("authkey").and_then(|v| v.as_str()))
}

/// Same check for handlers that take the key from a typed body
pub fn check_auth_key(identity: &Identity, sent: Option<&str>) -> ClResult<()> {
	let sent = sent.unwrap_or_default();
	if !sent.is_empty() && secret_eq(sent, &identity.auth_key) {
		Ok(())
	} else {
		warn!(subject = %identity.username, "missing or wrong authkey");
		Err(Error::PermissionDenied)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::request::{Method, VarValue};
	use canopy_types::types::{GroupId, UserId};

	fn identity() -> Identity {
		Identity {
			user_id: UserId(1),
			username: "admin".into(),
			deity: true,
			auth_key: "k3y".into(),
			groups: vec![GroupId(1)],
		}
	}

	#[test]
	fn test_require_auth_key() {
		let mut req = Request::new("/controlpanel/move_up", Method::Post);
		assert!(require_auth_key(&identity(), &req).is_err());

		req.set_var("authkey", VarValue::from("wrong"));
		assert!(matches!(require_auth_key(&identity(), &req), Err(Error::PermissionDenied)));

		req.set_var("authkey", VarValue::from("k3y"));
		assert!(require_auth_key(&identity(), &req).is_ok());
	}
}

// vim: ts=4
