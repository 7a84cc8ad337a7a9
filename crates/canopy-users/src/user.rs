//! User accounts

use canopy_core::password;
use canopy_core::perm::Identity;
use canopy_types::meta_adapter::User;
use canopy_types::types::UserId;

use crate::prelude::*;
use crate::settings::min_length;

pub fn validate_username(name: &str, min_len: usize) -> ClResult<()> {
	if !crate::is_word(name) {
		return Err(Error::ValidationError(
			"Username may only contain letters, digits and underscores".into(),
		));
	}
	if name.chars().count() < min_len {
		return Err(Error::ValidationError(format!(
			"Username must be at least {} characters long",
			min_len
		)));
	}
	Ok(())
}

pub fn validate_password(password: &str, min_len: usize) -> ClResult<()> {
	if password.chars().count() < min_len {
		return Err(Error::ValidationError(format!(
			"Password must be at least {} characters long",
			min_len
		)));
	}
	if password.trim() != password {
		return Err(Error::ValidationError("Password may not start or end with spaces".into()));
	}
	Ok(())
}

/// Create an account together with its personal group. Visitors may only sign up when
/// `users.allow_new_users` is on, and only a deity may create another deity.
pub async fn create_user(
	app: &App,
	actor: Option<&Identity>,
	username: &str,
	password: &str,
	deity: bool,
) -> ClResult<UserId> {
	let actor_is_deity = actor.is_some_and(|a| a.deity);
	if deity && !actor_is_deity {
		return Err(Error::PermissionDenied);
	}
	if !actor_is_deity && !app.settings.get_bool("users.allow_new_users").await? {
		return Err(Error::PermissionDenied);
	}

	validate_username(username, min_length(app, "users.username_min_length").await?)?;
	match app.meta_adapter.read_user_by_name(username).await {
		Ok(_) => return Err(Error::ValidationError("Username already in use".into())),
		Err(Error::NotFound) => {}
		Err(err) => return Err(err),
	}
	// the personal group shares the name space with true groups
	match app.meta_adapter.read_group_by_name(username).await {
		Ok(_) => return Err(Error::ValidationError("Username already in use".into())),
		Err(Error::NotFound) => {}
		Err(err) => return Err(err),
	}
	validate_password(password, min_length(app, "users.password_min_length").await?)?;
	let password_hash = password::hash_password(password).await?;

	let user_id = app.meta_adapter.create_user(username, deity).await.map_err(|err| match err {
		Error::Conflict(_) => Error::ValidationError("Username already in use".into()),
		err => err,
	})?;
	app.meta_adapter.update_user_password(user_id, &password_hash).await?;
	info!(user_id = %user_id, username, deity, "user created");
	Ok(user_id)
}

/// Change a login password. Users change their own by giving the current one; a deity
/// may reset anybody else's without it.
pub async fn set_password(
	app: &App,
	actor: &Identity,
	target: UserId,
	current: Option<&str>,
	new_password: &str,
) -> ClResult<()> {
	if actor.user_id == target {
		let stored = app.meta_adapter.read_user_password(target).await?;
		match (stored, current) {
			(Some(hash), Some(current)) => password::check_password(current, &hash)
				.await
				.map_err(|_| Error::ValidationError("Current password is incorrect".into()))?,
			(Some(_), None) => {
				return Err(Error::ValidationError("Current password is required".into()));
			}
			// first password of an account created without one
			(None, _) => {}
		}
	} else if !actor.deity {
		warn!(subject = %actor.username, target = %target, "password change of another user refused");
		return Err(Error::PermissionDenied);
	}

	validate_password(new_password, min_length(app, "users.password_min_length").await?)?;
	let password_hash = password::hash_password(new_password).await?;
	app.meta_adapter.update_user_password(target, &password_hash).await?;
	info!(user_id = %target, by = %actor.user_id, "password changed");
	Ok(())
}

pub async fn list_users(app: &App) -> ClResult<Vec<User>> {
	app.meta_adapter.list_users().await
}


// vim: ts=4
