//! Creators: concrete instantiations of a producer for one joined match.

use std::collections::BTreeMap;
use std::fmt;

use crate::producer::{flatten_paths, FieldMap, Paths};

/// The identity of a creator: the producer that spawned it, and the canonical serialization of
/// its match's capture-group values.
///
/// Ordered lexicographically as `(producer_index, match_key)` first by design: producers listed
/// earlier in the registry get scheduling priority, which gives reproducible build ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CreatorId {
	/// The stable index of the producer that spawned this creator, in the scheduler's producer
	/// list.
	pub producer_index: usize,

	/// The canonical (sorted-key) JSON serialization of the join's capture-group values.
	pub match_key: String,
}

impl fmt::Display for CreatorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "producer#{}({})", self.producer_index, self.match_key)
	}
}

/// Compute the canonical match key for a set of joined capture-group values.
///
/// `groups` is a [`BTreeMap`], so serialization already yields keys in sorted order; this mirrors
/// the reference implementation's `json.dumps(groups, sort_keys=True)`.
pub fn match_key(groups: &BTreeMap<String, String>) -> String {
	serde_json::to_string(groups).expect("BTreeMap<String, String> is always serializable")
}

/// A concrete unit of work: one producer, instantiated for one joined match.
///
/// Creators are immutable once built: any change to their inputs forces the scheduler to tear
/// the old one down and construct a fresh one (`delete-then-rebuild`), rather than mutate it in
/// place.
#[derive(Debug, Clone)]
pub struct Creator {
	/// This creator's identity.
	pub id: CreatorId,

	/// Resolved input fields, as returned by `Producer::paths`.
	pub inputs: FieldMap<Paths>,

	/// Resolved output fields, as returned by `Producer::paths`.
	pub outputs: FieldMap<Paths>,

	/// The categories label, resolved once at construction time.
	pub categories: String,
}

impl Creator {
	/// Construct a new creator from its identity and resolved data.
	pub fn new(
		id: CreatorId,
		inputs: FieldMap<Paths>,
		outputs: FieldMap<Paths>,
		categories: String,
	) -> Self {
		Self {
			id,
			inputs,
			outputs,
			categories,
		}
	}

	/// Every input file, flattened across all input fields.
	pub fn flat_input_paths(&self) -> Vec<std::path::PathBuf> {
		flatten_paths(&self.inputs)
	}

	/// Every output file, flattened across all output fields.
	pub fn flat_output_paths(&self) -> Vec<std::path::PathBuf> {
		flatten_paths(&self.outputs)
	}
}
