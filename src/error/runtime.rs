use miette::Diagnostic;
use thiserror::Error;

use crate::creator::CreatorId;

use super::CriticalError;

/// Errors surfaced from a single call to [`add_or_update_files`][crate::Scheduler::add_or_update_files]
/// or [`process_files`][crate::Scheduler::process_files].
///
/// A [`CriticalError`] means the scheduler's own invariants were violated and its indices may be
/// left in an inconsistent state; a [`RuntimeError::ProducerActionFailure`] means a single
/// creator's action raised, the scheduler state is otherwise untouched, and partial progress
/// (creators that already ran) is preserved on disk.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
#[diagnostic(url(docsrs))]
pub enum RuntimeError {
	/// A scheduler invariant was violated; see [`CriticalError`].
	#[error(transparent)]
	#[diagnostic(transparent)]
	Critical(#[from] CriticalError),

	/// A creator's action function returned an error.
	///
	/// No automatic retry is attempted. The drain stops at this creator; creators already run in
	/// this call remain on disk.
	#[error("action failed for creator {creator} ({categories}): {err}")]
	#[diagnostic(code(catena::runtime::producer_action_failure))]
	ProducerActionFailure {
		/// The creator whose action failed.
		creator: CreatorId,

		/// The creator's resolved categories label, for diagnostics.
		categories: String,

		/// The underlying error, as returned by the producer's action.
		#[source]
		err: Box<dyn std::error::Error + Send + Sync>,
	},
}
