use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::creator::CreatorId;

/// Errors which indicate scheduler state has been corrupted, or a producer has violated its
/// contract with the core. These are never recovered from locally: the caller gets the first one
/// and the scheduler's internal indices are left as-is.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
#[diagnostic(url(docsrs))]
pub enum CriticalError {
	/// Two creators claim the same output path.
	///
	/// This is raised at registration time: a creator is never allowed to shadow another live
	/// creator's output, even transiently.
	#[error("duplicate output `{path}`: claimed by both {existing} and {new}")]
	#[diagnostic(code(catena::critical::duplicate_output))]
	DuplicateOutput {
		/// The output path both creators claim.
		path: PathBuf,

		/// The creator already registered for this path.
		existing: CreatorId,

		/// The creator that was being registered when the conflict was found.
		new: CreatorId,
	},

	/// An output path was mapped to a different creator than the one being unregistered.
	///
	/// This should be unreachable in correct operation; it indicates the output-file index and
	/// the creator list have diverged.
	#[error("internal: output `{path}` mapped to {found} while unregistering {expected}")]
	#[diagnostic(code(catena::critical::sanity_mismatch))]
	SanityMismatch {
		/// The output path whose mapping disagreed with the expected identity.
		path: PathBuf,

		/// The identity that was being unregistered.
		expected: CreatorId,

		/// The identity the index actually had recorded.
		found: CreatorId,
	},

	/// A creator was run more times than `max_creator_runs_per_drain` within a single
	/// `process_files` drain.
	///
	/// This guards against a producer whose output recursively satisfies its own input pattern,
	/// which would otherwise loop the fixpoint forever.
	#[error("creator {creator} ran {runs} times in one drain (possible cycle)")]
	#[diagnostic(code(catena::critical::cycle))]
	Cycle {
		/// The creator that exceeded the run cap.
		creator: CreatorId,

		/// How many times it ran before the cap tripped.
		runs: u32,
	},

	/// A generic I/O error, with some context on what was being attempted.
	#[error("io({about}): {err}")]
	#[diagnostic(code(catena::critical::io_error))]
	IoError {
		/// What it was about.
		about: &'static str,

		/// The underlying I/O error.
		#[source]
		err: std::io::Error,
	},
}
