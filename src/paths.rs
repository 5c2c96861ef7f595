//! Path utilities for driver code.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Yield every file and directory under `base_dir`, skipping any path whose full path starts with
/// any of `ignore_prefixes`.
///
/// Paths are returned relative to `base_dir`, with any leading `./` stripped: callers walking a
/// project root typically want paths in the same shape a build rule's regex was written against,
/// not `base_dir`-qualified ones.
///
/// This is provided for driver code (turning a directory tree into the initial `add_or_update_files`
/// batch); the scheduler core never calls it itself.
pub fn all_paths_in_dir(base_dir: impl AsRef<Path>, ignore_prefixes: &[impl AsRef<str>]) -> Vec<PathBuf> {
	let base_dir = base_dir.as_ref();
	let mut out = Vec::new();

	for entry in WalkDir::new(base_dir).into_iter().filter_map(Result::ok) {
		let relative = entry.path().strip_prefix(base_dir).unwrap_or(entry.path());
		if relative.as_os_str().is_empty() {
			continue;
		}

		let display = relative.to_string_lossy();
		let display = display.strip_prefix("./").unwrap_or(&display);

		if ignore_prefixes
			.iter()
			.any(|prefix| display.starts_with(prefix.as_ref()))
		{
			continue;
		}

		out.push(PathBuf::from(display));
	}

	out
}
