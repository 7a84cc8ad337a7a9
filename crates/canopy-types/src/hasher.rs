//! Versioned hash format used for session tokens. Tokens are never stored in clear;
//! the database only sees `<prefix>1~<base64url(sha256)>`.

use base64::Engine;
use sha2::{Digest, Sha256};

pub enum Hasher {
	V1(Sha256),
}

impl Hasher {
	pub fn new() -> Self {
		Self::V1(Sha256::new())
	}

	pub fn update(&mut self, data: &[u8]) {
		match self {
			Self::V1(hasher) => hasher.update(data),
		}
	}

	pub fn finalize(self, prefix: &str) -> String {
		match self {
			Self::V1(hasher) => {
				prefix.to_string()
					+ "1~" + &base64::engine::general_purpose::URL_SAFE_NO_PAD
					.encode(hasher.finalize())
			}
		}
	}
}

impl Default for Hasher {
	fn default() -> Self {
		Self::new()
	}
}

pub fn hash(prefix: &str, data: &[u8]) -> Box<str> {
	let mut hasher = Hasher::new();
	hasher.update(data);
	hasher.finalize(prefix).into()
}


// vim: ts=4
