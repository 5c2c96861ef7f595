//! The bidirectional index between files and the creators that consume or produce them.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::creator::{Creator, CreatorId};
use crate::error::CriticalError;

/// Tracks which creator produces each output file, which creators consume each input file, and
/// owns the live creator set itself.
///
/// Every output file maps to exactly one creator at a time; registering a creator whose outputs
/// collide with an already-registered creator's is a fatal error, never silently resolved.
#[derive(Debug, Default)]
pub struct CreatorGraph {
	creators: HashMap<CreatorId, Creator>,
	output_file_maps: HashMap<PathBuf, CreatorId>,
	input_file_maps: HashMap<PathBuf, HashSet<CreatorId>>,
}

impl CreatorGraph {
	/// Construct an empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Look up a creator by identity.
	pub fn get(&self, id: &CreatorId) -> Option<&Creator> {
		self.creators.get(id)
	}

	/// Whether a creator with this identity is currently registered.
	pub fn contains(&self, id: &CreatorId) -> bool {
		self.creators.contains_key(id)
	}

	/// Every creator identity that consumes `path` as an input, or an empty set if none do.
	pub fn creators_consuming(&self, path: &std::path::Path) -> HashSet<CreatorId> {
		self.input_file_maps.get(path).cloned().unwrap_or_default()
	}

	/// Register a newly built creator.
	///
	/// Every output path must be free of any other live creator's claim; every input path gets
	/// this creator added to its consumer set.
	pub fn register(&mut self, creator: Creator) -> Result<(), CriticalError> {
		for output in creator.flat_output_paths() {
			if let Some(existing) = self.output_file_maps.get(&output) {
				return Err(CriticalError::DuplicateOutput {
					path: output,
					existing: existing.clone(),
					new: creator.id.clone(),
				});
			}
		}

		for output in creator.flat_output_paths() {
			self.output_file_maps.insert(output, creator.id.clone());
		}
		for input in creator.flat_input_paths() {
			self.input_file_maps
				.entry(input)
				.or_default()
				.insert(creator.id.clone());
		}

		self.creators.insert(creator.id.clone(), creator);
		Ok(())
	}

	/// Tear down a registered creator: remove it from every index it appears in.
	///
	/// # Errors
	///
	/// Returns [`CriticalError::SanityMismatch`] if an output path is found mapped to a different
	/// identity than `id`; this indicates the indices have diverged from the creator list and is
	/// always a bug, never a recoverable condition.
	pub fn unregister(&mut self, id: &CreatorId) -> Result<(), CriticalError> {
		let Some(creator) = self.creators.remove(id) else {
			return Ok(());
		};

		for output in creator.flat_output_paths() {
			match self.output_file_maps.get(&output) {
				Some(found) if found == id => {
					self.output_file_maps.remove(&output);
				}
				Some(found) => {
					let found = found.clone();
					// Put the creator back; this call didn't actually tear anything down.
					self.creators.insert(id.clone(), creator);
					return Err(CriticalError::SanityMismatch {
						path: output,
						expected: id.clone(),
						found,
					});
				}
				None => {}
			}
		}

		for input in creator.flat_input_paths() {
			if let Some(consumers) = self.input_file_maps.get_mut(&input) {
				consumers.remove(id);
				if consumers.is_empty() {
					self.input_file_maps.remove(&input);
				}
			}
		}

		Ok(())
	}
}
