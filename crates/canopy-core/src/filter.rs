//! Input filters applied to request variables before they reach a handler.
//!
//! Every string pulled from a request goes through [`filter_string`]; the numeric and
//! boolean filters return `None` where the input is not a clean literal of that type.

/// Escape markup significant characters (`& < > " '`)
pub fn escape_html(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#039;"),
			c => out.push(c),
		}
	}
	out
}

/// Remove anything that looks like a tag (`<...>`), including an unterminated one
pub fn strip_tags(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	let mut in_tag = false;
	for c in value.chars() {
		match (in_tag, c) {
			(false, '<') => in_tag = true,
			(true, '>') => in_tag = false,
			(false, c) => out.push(c),
			(true, _) => {}
		}
	}
	out
}

fn is_trim_char(c: char) -> bool {
	matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B')
}

/// Escape, strip tags, trim. The output is safe to embed in HTML text.
pub fn filter_string(value: &str) -> String {
	strip_tags(&escape_html(value)).trim_matches(is_trim_char).to_string()
}

/// `1/true/on/yes` → true, `0/false/off/no/""` → false, anything else → `None`
pub fn filter_boolean(value: &str) -> Option<bool> {
	match value.trim_matches(is_trim_char).to_ascii_lowercase().as_str() {
		"1" | "true" | "on" | "yes" => Some(true),
		"0" | "false" | "off" | "no" | "" => Some(false),
		_ => None,
	}
}

/// Optionally signed decimal integer without leading zeros
pub fn filter_integer(value: &str) -> Option<i64> {
	let value = value.trim_matches(is_trim_char);
	let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	if digits.len() > 1 && digits.starts_with('0') {
		return None;
	}
	value.parse::<i64>().ok()
}

/// Finite decimal or exponent literal (`1`, `-1.5`, `.5`, `2e3`)
pub fn filter_float(value: &str) -> Option<f64> {
	let value = value.trim_matches(is_trim_char);
	let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
	let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
		Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
		None => (unsigned, None),
	};

	let mut parts = mantissa.splitn(2, '.');
	let int_part = parts.next().unwrap_or_default();
	let frac_part = parts.next();
	let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
	let mantissa_ok = match frac_part {
		Some(frac) => {
			(!int_part.is_empty() || !frac.is_empty()) && all_digits(int_part) && all_digits(frac)
		}
		None => !int_part.is_empty() && all_digits(int_part),
	};
	if !mantissa_ok {
		return None;
	}
	if let Some(exp) = exponent {
		let exp_digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
		if exp_digits.is_empty() || !all_digits(exp_digits) {
			return None;
		}
	}

	value.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_filter_string_escapes_markup() {
		assert_eq!(filter_string("  <b>bold</b> "), "&lt;b&gt;bold&lt;/b&gt;");
		assert_eq!(filter_string("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
		assert_eq!(filter_string("it's"), "it&#039;s");
		assert_eq!(filter_string("\t\n plain \0"), "plain");
	}

	#[test]
	fn test_filter_string_never_emits_tags() {
		for input in ["<script>alert(1)</script>", "<img src=x onerror=alert(1)>", "a < b > c"] {
			let out = filter_string(input);
			assert!(!out.contains('<'), "{} -> {}", input, out);
			assert!(!out.contains('>'), "{} -> {}", input, out);
		}
	}

	#[test]
	fn test_strip_tags() {
		assert_eq!(strip_tags("a<br/>b"), "ab");
		assert_eq!(strip_tags("<p>text</p>"), "text");
		assert_eq!(strip_tags("open <tag"), "open ");
	}

	#[test]
	fn test_filter_boolean() {
		assert_eq!(filter_boolean("yes"), Some(true));
		assert_eq!(filter_boolean(" ON "), Some(true));
		assert_eq!(filter_boolean("1"), Some(true));
		assert_eq!(filter_boolean("off"), Some(false));
		assert_eq!(filter_boolean(""), Some(false));
		assert_eq!(filter_boolean("maybe"), None);
		assert_eq!(filter_boolean("2"), None);
	}

	#[test]
	fn test_filter_integer() {
		assert_eq!(filter_integer("42"), Some(42));
		assert_eq!(filter_integer(" -7 "), Some(-7));
		assert_eq!(filter_integer("+3"), Some(3));
		assert_eq!(filter_integer("0"), Some(0));
		assert_eq!(filter_integer("007"), None);
		assert_eq!(filter_integer("1.5"), None);
		assert_eq!(filter_integer("12abc"), None);
		assert_eq!(filter_integer(""), None);
		assert_eq!(filter_integer("99999999999999999999"), None);
	}

	#[test]
	fn test_filter_float() {
		assert_eq!(filter_float("1"), Some(1.0));
		assert_eq!(filter_float("-1.5"), Some(-1.5));
		assert_eq!(filter_float(".5"), Some(0.5));
		assert_eq!(filter_float("2e3"), Some(2000.0));
		assert_eq!(filter_float("5."), Some(5.0));
		assert_eq!(filter_float("inf"), None);
		assert_eq!(filter_float("NaN"), None);
		assert_eq!(filter_float("."), None);
		assert_eq!(filter_float("1e"), None);
		assert_eq!(filter_float("abc"), None);
	}
}

// vim: ts=4
