//! Content sniffing.
//!
//! A file passes when its magic bytes belong to a family that covers its extension and
//! the type the client declared (if any) is one `mime_guess` knows for that extension.

/// Bytes inspected when deciding whether a file is text
const TEXT_PROBE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
	Pdf,
	Png,
	Jpeg,
	Gif,
	Webp,
	Wav,
	Zip,
	/// Legacy Office compound documents
	Ole2,
	Mp3,
	/// mp4 / mov / 3gp `ftyp` box
	IsoMedia,
	Ogg,
	Flac,
	/// Matroska and WebM
	Matroska,
	Text,
}

impl Signature {
	pub fn sniff(data: &[u8]) -> Option<Self> {
		let riff = |kind: &[u8]| data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == kind;

		if data.starts_with(b"%PDF-") {
			Some(Signature::Pdf)
		} else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
			Some(Signature::Png)
		} else if data.starts_with(&[0xff, 0xd8, 0xff]) {
			Some(Signature::Jpeg)
		} else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
			Some(Signature::Gif)
		} else if riff(b"WEBP") {
			Some(Signature::Webp)
		} else if riff(b"WAVE") {
			Some(Signature::Wav)
		} else if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
			Some(Signature::Zip)
		} else if data.starts_with(&[0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1]) {
			Some(Signature::Ole2)
		} else if data.len() >= 8 && &data[4..8] == b"ftyp" {
			Some(Signature::IsoMedia)
		} else if data.starts_with(b"OggS") {
			Some(Signature::Ogg)
		} else if data.starts_with(b"fLaC") {
			Some(Signature::Flac)
		} else if data.starts_with(&[0x1a, 0x45, 0xdf, 0xa3]) {
			Some(Signature::Matroska)
		} else if data.starts_with(b"ID3") || is_mpeg_frame(data) {
			Some(Signature::Mp3)
		} else if is_text(data) {
			Some(Signature::Text)
		} else {
			None
		}
	}

	/// Extensions a file of this family may carry
	pub fn extensions(self) -> &'static [&'static str] {
		match self {
			Signature::Pdf => &["pdf"],
			Signature::Png => &["png"],
			Signature::Jpeg => &["jpg", "jpeg", "jpe"],
			Signature::Gif => &["gif"],
			Signature::Webp => &["webp"],
			Signature::Wav => &["wav"],
			Signature::Zip => &["zip", "docx", "xlsx", "pptx", "odt", "ods", "odp", "epub"],
			Signature::Ole2 => &["doc", "xls", "ppt"],
			Signature::Mp3 => &["mp3"],
			Signature::IsoMedia => &["mp4", "m4v", "m4a", "mov", "3gp"],
			Signature::Ogg => &["ogg", "oga", "ogv", "opus"],
			Signature::Flac => &["flac"],
			Signature::Matroska => &["mkv", "mka", "webm"],
			Signature::Text => &["txt", "csv", "rtf", "md", "json", "xml", "htm", "html", "svg"],
		}
	}
}

fn is_mpeg_frame(data: &[u8]) -> bool {
	data.len() >= 2 && data[0] == 0xff && data[1] & 0xe0 == 0xe0
}

fn is_text(data: &[u8]) -> bool {
	if data.is_empty() {
		return false;
	}
	let probe = &data[..data.len().min(TEXT_PROBE)];
	let text = match std::str::from_utf8(probe) {
		Ok(text) => text,
		// a multi-byte character cut by the probe window
		Err(err) if err.error_len().is_none() && probe.len() == TEXT_PROBE => {
			match std::str::from_utf8(&probe[..err.valid_up_to()]) {
				Ok(text) => text,
				Err(_) => return false,
			}
		}
		Err(_) => return false,
	};
	text.chars().all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r' | '\x0c'))
}

/// Lowercase extension after the last dot, if any
pub fn extension(file_name: &str) -> Option<String> {
	let (stem, ext) = file_name.rsplit_once('.')?;
	(!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

fn essence(content_type: &str) -> String {
	content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// The declared type must be known for the extension. Media types only need to agree on
/// the top-level type since clients disagree on subtypes (`audio/mp3`, `audio/mpeg`).
fn declared_matches(ext: &str, declared: &str) -> bool {
	let declared = essence(declared);
	if declared.is_empty() || declared == "application/octet-stream" {
		return true;
	}
	let top = declared.split('/').next().unwrap_or_default();
	mime_guess::from_ext(ext).iter().any(|m| {
		m.essence_str() == declared
			|| (m.type_().as_str() == top && matches!(top, "image" | "audio" | "video" | "text"))
	})
}

pub fn check_mime(ext: &str, declared: Option<&str>, data: &[u8]) -> bool {
	let Some(signature) = Signature::sniff(data) else {
		return false;
	};
	if !signature.extensions().contains(&ext) {
		return false;
	}
	declared.is_none_or(|declared| declared_matches(ext, declared))
}

/// Type recorded for a stored file
pub fn content_type(ext: &str, declared: Option<&str>) -> String {
	match declared.map(essence).filter(|d| !d.is_empty() && d != "application/octet-stream") {
		Some(declared) => declared,
		None => mime_guess::from_ext(ext).first_or_octet_stream().essence_str().to_string(),
	}
}


// vim: ts=4
