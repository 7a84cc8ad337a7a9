//! First start: create the initial deity account

use canopy_core::password;
use canopy_core::session::{self, NewSession};
use canopy_types::utils::random_id_len;

use crate::prelude::*;

pub const ADMIN_USERNAME: &str = "admin";
const GENERATED_PASSWORD_LENGTH: usize = 16;

/// On an empty user table, create `admin` as deity and open a session for it. The
/// password comes from the app options; a generated one is logged once, together with
/// the first session token.
pub async fn bootstrap(app: &App) -> ClResult<Option<NewSession>> {
	let count = app.meta_adapter.count_users().await?;
	if count > 0 {
		debug!("Bootstrap skipped, {} users exist", count);
		return Ok(None);
	}

	info!("Creating initial deity account '{}'", ADMIN_USERNAME);
	let user_id = app.meta_adapter.create_user(ADMIN_USERNAME, true).await?;
	let admin_password = match &app.opts.admin_password {
		Some(password) => password.to_string(),
		None => {
			let generated = random_id_len(GENERATED_PASSWORD_LENGTH);
			info!("Initial deity password: {}", generated);
			generated
		}
	};
	let password_hash = password::hash_password(&admin_password).await?;
	app.meta_adapter.update_user_password(user_id, &password_hash).await?;

	let session = session::create_session(app, user_id).await?;
	info!("Initial session token: {}", session.token);
	info!("Initial session authkey: {}", session.auth_key);
	Ok(Some(session))
}

// vim: ts=4
