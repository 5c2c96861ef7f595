//! Comma-escaping for serializing a list field's matched filenames into one flat string.
//!
//! `MatchStore`'s join keeps list-field values as `Vec<String>` internally, so it never needs to
//! round-trip through this encoding itself, but the convention is part of this crate's
//! contract with anything downstream that persists or logs a list field's raw value as a single
//! string (a match key, a log line, a cache entry), so it's provided and tested here.

/// Concatenate a list of filenames into one comma-delimited string, escaping any literal
/// backslash or comma in a filename so the delimiter stays unambiguous.
pub fn concat_with_escape<I, S>(names: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	names
		.into_iter()
		.map(|name| escape_one(name.as_ref()))
		.collect::<Vec<_>>()
		.join(",")
}

fn escape_one(name: &str) -> String {
	let mut out = String::with_capacity(name.len());
	for ch in name.chars() {
		match ch {
			'\\' => out.push_str("\\\\"),
			',' => out.push_str("\\,"),
			_ => out.push(ch),
		}
	}
	out
}

/// Parse a string produced by [`concat_with_escape`] back into its original filenames.
///
/// Walks the string character by character, splitting on unescaped `,` and un-escaping `\\` and
/// `\,`.
pub fn parse_comma_escape(input: &str) -> Vec<String> {
	let mut out = vec![String::new()];
	let mut last_was_escape = false;

	for ch in input.chars() {
		if ch == ',' && !last_was_escape {
			out.push(String::new());
			last_was_escape = false;
		} else if ch == '\\' && !last_was_escape {
			last_was_escape = true;
		} else {
			out.last_mut().unwrap().push(ch);
			last_was_escape = false;
		}
	}

	out
}
