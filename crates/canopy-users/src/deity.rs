//! Deity (super-administrator) status changes

use canopy_core::perm::Identity;
use canopy_types::types::UserId;

use crate::prelude::*;

/// Only a deity may change another user's status, and nobody may change their own
pub fn check_deity_change(actor: &Identity, target: UserId) -> ClResult<()> {
	if !actor.deity {
		warn!(subject = %actor.username, target = %target, "mortal tried to change deity status");
		return Err(Error::PermissionDenied);
	}
	if actor.user_id == target {
		return Err(Error::ValidationError("A deity can not change their own deity status".into()));
	}
	Ok(())
}

pub async fn set_deity(app: &App, actor: &Identity, target: UserId, deity: bool) -> ClResult<()> {
	check_deity_change(actor, target)?;
	let user = app.meta_adapter.read_user(target).await?;
	if user.deity == deity {
		return Ok(());
	}
	app.meta_adapter.update_user_deity(target, deity).await?;
	info!(subject = %actor.username, target = %user.username, deity, "deity status changed");
	Ok(())
}


// vim: ts=4
