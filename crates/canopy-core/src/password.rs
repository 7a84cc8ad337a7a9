//! Login passwords, stored as bcrypt hashes.
//!
//! Hashing is CPU bound, so both directions run on the blocking pool.

use crate::prelude::*;

const BCRYPT_COST: u32 = 10;

fn hash_password_sync(password: &str) -> ClResult<Box<str>> {
	let hash = bcrypt::hash(password, BCRYPT_COST).map_err(|err| {
		warn!("bcrypt hash failed: {}", err);
		Error::Internal("Password hashing failed".into())
	})?;
	Ok(hash.into())
}

fn check_password_sync(password: &str, password_hash: &str) -> ClResult<()> {
	match bcrypt::verify(password, password_hash) {
		Ok(true) => Ok(()),
		Ok(false) => Err(Error::Unauthorized),
		Err(err) => {
			debug!("bcrypt verify failed: {}", err);
			Err(Error::Unauthorized)
		}
	}
}

pub async fn hash_password(password: &str) -> ClResult<Box<str>> {
	let password = password.to_string();
	tokio::task::spawn_blocking(move || hash_password_sync(&password))
		.await
		.map_err(|err| Error::Internal(format!("Password worker failed: {}", err)))?
}

/// `Unauthorized` unless `password` matches the stored hash
pub async fn check_password(password: &str, password_hash: &str) -> ClResult<()> {
	let password = password.to_string();
	let password_hash = password_hash.to_string();
	tokio::task::spawn_blocking(move || check_password_sync(&password, &password_hash))
		.await
		.map_err(|_| Error::Unauthorized)?
}


// vim: ts=4
