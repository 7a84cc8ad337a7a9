//! Extractors for the authenticated subject

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::perm::Identity;
use crate::prelude::*;

// Auth //
//******//
#[derive(Debug, Clone)]
pub struct Auth(pub Identity);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts.extensions.get::<Auth>().cloned().ok_or(Error::Unauthorized)
	}
}

// OptionalAuth //
//**************//
/// Never rejects; `None` for anonymous requests
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(OptionalAuth(parts.extensions.get::<Auth>().cloned().map(|a| a.0)))
	}
}

// vim: ts=4
