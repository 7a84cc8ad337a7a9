//! Utility functions

use rand::RngExt;

use crate::prelude::*;

pub const ID_LENGTH: usize = 24;
pub const SAFE: [char; 62] = [
	'0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
	'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
	'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
	'V', 'W', 'X', 'Y', 'Z',
];

/// Random alphanumeric id of `len` characters (session tokens, auth keys)
pub fn random_id_len(len: usize) -> String {
	let mut rng = rand::rng();
	let mut result = String::with_capacity(len);

	for _ in 0..len {
		result.push(SAFE[rng.random_range(0..SAFE.len())]);
	}
	result
}

pub fn random_id() -> ClResult<String> {
	Ok(random_id_len(ID_LENGTH))
}

/// Parse a comma separated list, dropping whitespace and empty entries.
///
/// `"pdf, doc ,,docx"` → `["pdf", "doc", "docx"]`
pub fn parse_str_list(s: &str) -> Vec<String> {
	s.split(',')
		.map(|item| item.chars().filter(|c| !c.is_whitespace()).collect::<String>())
		.filter(|item| !item.is_empty())
		.collect()
}

/// Compare two secrets without short-circuiting on the first differing byte
pub fn secret_eq(a: &str, b: &str) -> bool {
	let (a, b) = (a.as_bytes(), b.as_bytes());
	if a.len() != b.len() {
		return false;
	}
	a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}


// vim: ts=4
