//! Decides whether a creator's outputs are stale relative to its inputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::creator::Creator;

/// Disk-backed staleness decisions: no in-memory state of its own, just a file-time comparison.
#[derive(Debug, Default, Clone, Copy)]
pub struct StalenessOracle;

impl StalenessOracle {
	/// Construct an oracle. Stateless; only exists as a namespace for the comparison.
	pub fn new() -> Self {
		Self
	}

	/// Whether `creator` must be (re-)run: its oldest output is no newer than its newest input.
	///
	/// The tie (`oldest_output == newest_input`) breaks toward rebuilding, not skipping:
	/// freshly-written output that lands in the same mtime tick as its input is still treated as
	/// stale, since filesystem mtime resolution can't be trusted to separate them.
	///
	/// `newest_mtime`/`oldest_mtime` report `None` in place of the `+∞`/`0` sentinels: a
	/// `SystemTime` can't actually represent either (`SystemTime::UNIX_EPOCH + Duration::MAX`
	/// panics, since no platform's internal time representation has that much range), so a
	/// missing input or output short-circuits straight to "must run" here instead.
	pub fn must_run(&self, creator: &Creator) -> bool {
		let newest_input = newest_mtime(&creator.flat_input_paths());
		let oldest_output = oldest_mtime(&creator.flat_output_paths());
		match (oldest_output, newest_input) {
			(None, _) | (_, None) => true,
			(Some(oldest), Some(newest)) => oldest <= newest,
		}
	}
}

/// The newest mtime among `paths` (recursing into directories), or `None` standing in for `+∞`:
/// a missing file, or no timestamps collected at all, always means "a creator with this input
/// must run".
fn newest_mtime(paths: &[PathBuf]) -> Option<SystemTime> {
	let mut worklist: Vec<PathBuf> = paths.to_vec();
	let mut newest: Option<SystemTime> = None;

	while let Some(path) = worklist.pop() {
		match expand(&path, &mut worklist) {
			Expansion::Directory => continue,
			Expansion::Missing => return None,
			Expansion::File(mtime) => {
				newest = Some(newest.map_or(mtime, |n: SystemTime| n.max(mtime)));
			}
		}
	}

	newest
}

/// The oldest mtime among `paths` (recursing into directories), or `None` standing in for `0`: a
/// missing file, or no timestamps collected at all, always means "a creator with this output
/// must run".
fn oldest_mtime(paths: &[PathBuf]) -> Option<SystemTime> {
	let mut worklist: Vec<PathBuf> = paths.to_vec();
	let mut oldest: Option<SystemTime> = None;

	while let Some(path) = worklist.pop() {
		match expand(&path, &mut worklist) {
			Expansion::Directory => continue,
			Expansion::Missing => return None,
			Expansion::File(mtime) => {
				oldest = Some(oldest.map_or(mtime, |o: SystemTime| o.min(mtime)));
			}
		}
	}

	oldest
}

enum Expansion {
	File(SystemTime),
	Directory,
	Missing,
}

/// Classify a path: a plain file yields its mtime, a directory pushes its immediate children onto
/// `worklist` (so the caller's walk makes the expansion transitive across nested directories), a
/// missing path is reported as such.
fn expand(path: &Path, worklist: &mut Vec<PathBuf>) -> Expansion {
	let Ok(meta) = fs::symlink_metadata(path) else {
		return Expansion::Missing;
	};

	if meta.is_dir() {
		if let Ok(entries) = fs::read_dir(path) {
			for entry in entries.flatten() {
				worklist.push(entry.path());
			}
		}
		return Expansion::Directory;
	}

	match meta.modified() {
		Ok(mtime) => Expansion::File(mtime),
		Err(_) => Expansion::Missing,
	}
}
