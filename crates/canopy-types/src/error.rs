//! Error type shared by every Canopy crate.
//!
//! Validation errors are recoverable and rendered back to the caller; lookup errors
//! (`ValueNotSet`) terminate the current request; everything storage-related collapses
//! into `DbError` so no SQL detail leaks into a response.

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	Unauthorized,
	DbError,
	Parse,
	ValidationError(String),
	/// A request variable was read without checking for its existence first
	ValueNotSet(String),
	UnknownMethod(String),
	Conflict(String),
	ConfigError(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "E-NOT-FOUND",
			Error::PermissionDenied => "E-PERMISSION",
			Error::Unauthorized => "E-AUTH",
			Error::Parse => "E-PARSE",
			Error::ValidationError(_) => "E-VALIDATION",
			Error::ValueNotSet(_) => "E-VALUE-NOT-SET",
			Error::UnknownMethod(_) => "E-METHOD",
			Error::Conflict(_) => "E-CONFLICT",
			Error::DbError
			| Error::ConfigError(_)
			| Error::Internal(_)
			| Error::Io(_) => "E-INTERNAL",
		}
	}

	fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::Parse | Error::ValidationError(_) | Error::ValueNotSet(_) => {
				StatusCode::BAD_REQUEST
			}
			Error::UnknownMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
			Error::Conflict(_) => StatusCode::CONFLICT,
			Error::DbError | Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	/// Message safe to show to the client
	fn public_message(&self) -> String {
		match self {
			Error::NotFound => "not found".into(),
			Error::PermissionDenied => "permission denied".into(),
			Error::Unauthorized => "authentication required".into(),
			Error::Parse => "malformed request".into(),
			Error::ValidationError(msg) | Error::Conflict(msg) => msg.clone(),
			Error::ValueNotSet(name) => format!("Variable \"{}\" not set", name),
			Error::UnknownMethod(method) => format!("Unknown method: {}", method),
			Error::DbError | Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				"internal error".into()
			}
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ValueNotSet(name) => write!(f, "value not set: {}", name),
			Error::UnknownMethod(method) => write!(f, "unknown method: {}", method),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::ConfigError(msg) => write!(f, "config error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
			_ => write!(f, "{:?}", self),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<axum::http::Error> for Error {
	fn from(err: axum::http::Error) -> Self {
		Self::Internal(format!("http: {}", err))
	}
}

impl From<serde_json::Error> for Error {
	fn from(_err: serde_json::Error) -> Self {
		Self::Parse
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();
		if status == StatusCode::INTERNAL_SERVER_ERROR {
			tracing::error!("request failed: {}", self);
		}
		let body = json!({ "error": { "code": self.code(), "message": self.public_message() } });
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
		assert_eq!(Error::PermissionDenied.status(), StatusCode::FORBIDDEN);
		assert_eq!(Error::ValueNotSet("x".into()).status(), StatusCode::BAD_REQUEST);
		assert_eq!(Error::UnknownMethod("BREW".into()).status(), StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(Error::Conflict("race".into()).status(), StatusCode::CONFLICT);
		assert_eq!(Error::DbError.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_internal_detail_is_hidden() {
		let err = Error::Internal("secret path /var/db".into());
		assert_eq!(err.public_message(), "internal error");

		let err = Error::ValidationError("Group name already in use".into());
		assert_eq!(err.public_message(), "Group name already in use");
	}
}

// vim: ts=4
