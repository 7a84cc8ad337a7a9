//! Login sessions.
//!
//! The bearer token handed to the client is stored only as a hash. Every session also
//! carries an auth key which secure commands must echo back as `authkey`.

use canopy_types::hasher;
use canopy_types::types::UserId;
use canopy_types::utils::random_id_len;

use crate::password;
use crate::perm::Identity;
use crate::prelude::*;

const TOKEN_LENGTH: usize = 40;
const AUTH_KEY_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct NewSession {
	pub token: String,
	pub auth_key: Box<str>,
	pub expires_at: Timestamp,
}

fn token_hash(token: &str) -> Box<str> {
	hasher::hash("s", token.as_bytes())
}

pub async fn create_session(app: &App, user_id: UserId) -> ClResult<NewSession> {
	let token = random_id_len(TOKEN_LENGTH);
	let auth_key: Box<str> = random_id_len(AUTH_KEY_LENGTH).into();
	let expires_at = Timestamp::now().add_seconds(app.opts.session_ttl);

	app.meta_adapter.create_session(&token_hash(&token), user_id, &auth_key, expires_at).await?;
	info!(user_id = %user_id, "session created");
	Ok(NewSession { token, auth_key, expires_at })
}

/// Identity behind a bearer token. Unknown, expired or inactive → `Unauthorized`.
pub async fn resolve_session(app: &App, token: &str) -> ClResult<Identity> {
	let session = app.meta_adapter.read_session(&token_hash(token)).await.map_err(|err| match err {
		Error::NotFound => Error::Unauthorized,
		err => err,
	})?;
	let user = app.meta_adapter.read_user(session.user_id).await.map_err(|err| match err {
		Error::NotFound => Error::Unauthorized,
		err => err,
	})?;
	if !user.active {
		return Err(Error::Unauthorized);
	}
	let personal = app.meta_adapter.read_user_group(user.id).await.map_err(|err| match err {
		Error::NotFound => Error::Unauthorized,
		err => err,
	})?;

	Ok(Identity {
		user_id: user.id,
		username: user.username,
		deity: user.deity,
		auth_key: session.auth_key,
		groups: vec![personal.id],
	})
}

/// Open a session for `username` after checking its password. Unknown users, inactive
/// accounts, accounts without a password and wrong passwords are all `Unauthorized`.
pub async fn login(app: &App, username: &str, password: &str) -> ClResult<NewSession> {
	let user = app.meta_adapter.read_user_by_name(username).await.map_err(|err| match err {
		Error::NotFound => Error::Unauthorized,
		err => err,
	})?;
	if !user.active {
		return Err(Error::Unauthorized);
	}
	let Some(password_hash) = app.meta_adapter.read_user_password(user.id).await? else {
		debug!(user_id = %user.id, "login without a stored password");
		return Err(Error::Unauthorized);
	};
	password::check_password(password, &password_hash).await.inspect_err(|_| {
		info!(username = %user.username, "login failed");
	})?;
	create_session(app, user.id).await
}

pub async fn end_session(app: &App, token: &str) -> ClResult<()> {
	app.meta_adapter.delete_session(&token_hash(token)).await
}

// vim: ts=4
