//! The producer protocol: the capability set the scheduler needs from a build rule.
//!
//! A [`Producer`] is never constructed by this crate; it's supplied by the caller, one instance
//! per kind of build rule, and referenced internally by its stable position in the producer list
//! (see [`crate::creator::CreatorId`]). The core only ever calls back into it through this trait.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::path::PathBuf;

use regex::Regex;

/// An error returned by a creator's action, type-erased so producers can use whatever error type
/// they like.
pub type ActionError = Box<dyn Error + Send + Sync>;

/// The declared shape of one field of a producer's input pattern.
///
/// This replaces the `"" | [] | str | list` union of the original design with a tagged type, so
/// an unrecognised shape is a compile error rather than a `Field-Shape-Mismatch` raised at
/// runtime.
#[derive(Debug, Clone)]
pub enum FieldPattern {
	/// The field is not present for this producer; it always resolves to [`Paths::Absent`].
	Absent,

	/// The field is not present, but is list-shaped; it always resolves to an empty
	/// [`Paths::List`].
	EmptyList,

	/// The field is matched by this regex and consumes exactly one file.
	Single(Regex),

	/// The field is matched by this regex and consumes a concatenation of zero or more files.
	List(Regex),
}

/// One resolved field value: either absent, a single path, or a list of paths.
///
/// List values are always kept sorted, matching the join's guarantee that list-field input
/// ordering is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paths {
	/// The field is not populated.
	Absent,

	/// The field resolved to exactly one path.
	Single(PathBuf),

	/// The field resolved to a (sorted) list of paths.
	List(Vec<PathBuf>),
}

impl Paths {
	/// Flatten this field's value into zero, one, or more file paths.
	pub fn flatten(&self) -> Vec<PathBuf> {
		match self {
			Paths::Absent => Vec::new(),
			Paths::Single(p) => vec![p.clone()],
			Paths::List(ps) => ps.clone(),
		}
	}
}

/// A producer's field map: field name to resolved (or declared-shape) value.
///
/// Used both for the per-field pattern declarations ([`FieldPattern`]-valued, via
/// [`Producer::input_path_patterns_dict`]) and for resolved input/output data ([`Paths`]-valued).
pub type FieldMap<V> = BTreeMap<String, V>;

/// Flatten every field's value in a [`FieldMap<Paths>`] into one file list.
///
/// Fields are visited in name order, which combined with each list field's internal sort gives a
/// fully deterministic path ordering.
pub fn flatten_paths(fields: &FieldMap<Paths>) -> Vec<PathBuf> {
	fields.values().flat_map(Paths::flatten).collect()
}

/// A creator's categories label: either fixed at producer-definition time, or computed from the
/// resolved input/output data.
///
/// Whichever variant a producer uses, the label is resolved exactly once, at creator
/// construction, into a plain `String` stored on the [`Creator`][crate::creator::Creator];
/// a creator never re-evaluates its categories.
pub enum Categories {
	/// A fixed label, used for every creator this producer spawns.
	Static(String),

	/// A label computed from this creator's resolved inputs and outputs.
	Dynamic(Box<dyn Fn(&FieldMap<Paths>, &FieldMap<Paths>) -> String + Send + Sync>),
}

impl Categories {
	/// Resolve this producer's categories label for one creator's resolved data.
	pub fn resolve(&self, inputs: &FieldMap<Paths>, outputs: &FieldMap<Paths>) -> String {
		match self {
			Categories::Static(label) => label.clone(),
			Categories::Dynamic(f) => f(inputs, outputs),
		}
	}
}

/// A declarative build rule: a family of creators, one per distinct join of matched files.
///
/// Implementations must be pure with respect to the same inputs: the same match must always
/// produce the same `paths()` result, the same categories, and an action that (eventually)
/// produces the same outputs.
pub trait Producer: Send + Sync {
	/// The declared shape of every field this producer's input pattern has.
	///
	/// Fields mapped to [`FieldPattern::Absent`] or [`FieldPattern::EmptyList`] are not part of
	/// the fileset join; all others are.
	fn input_path_patterns_dict(&self) -> FieldMap<FieldPattern>;

	/// The compiled regex for every field that actually matches files.
	///
	/// The default implementation derives this from
	/// [`input_path_patterns_dict`][Self::input_path_patterns_dict], which is the only place the
	/// patterns are declared; override only if a producer needs to expose a different pattern set
	/// than the one it resolves fields with.
	fn regex_field_patterns(&self) -> FieldMap<Regex> {
		self.input_path_patterns_dict()
			.into_iter()
			.filter_map(|(name, pattern)| match pattern {
				FieldPattern::Single(re) | FieldPattern::List(re) => Some((name, re)),
				FieldPattern::Absent | FieldPattern::EmptyList => None,
			})
			.collect()
	}

	/// A stable id for a field name, used as a match-store table identifier.
	///
	/// Defaults to the field name itself; override if a shorter or more stable id is needed (for
	/// example if field names may be renamed without changing semantics).
	fn get_field_id(&self, field_name: &str) -> String {
		field_name.to_owned()
	}

	/// A stable id for a capture group name, used as a match-store column identifier.
	fn get_match_group_id(&self, group_name: &str) -> String {
		group_name.to_owned()
	}

	/// The capture group names appearing in one field's regex.
	fn get_match_groups(&self, field_name: &str) -> BTreeSet<String> {
		match self.regex_field_patterns().get(field_name) {
			Some(re) => re.capture_names().flatten().map(String::from).collect(),
			None => BTreeSet::new(),
		}
	}

	/// The union of capture group names across every field.
	fn get_all_match_groups(&self) -> BTreeSet<String> {
		self.regex_field_patterns()
			.keys()
			.flat_map(|field| self.get_match_groups(field))
			.collect()
	}

	/// Turn one joined match into concrete input data and output paths.
	///
	/// `raw_input` is the join's per-field values (as produced by the match-store); `groups` is
	/// the join's shared capture-group values. Returns the final input data to hand to
	/// [`action`][Self::action], and the output paths the resulting creator will produce.
	fn paths(
		&self,
		raw_input: &FieldMap<Paths>,
		groups: &BTreeMap<String, String>,
	) -> (FieldMap<Paths>, FieldMap<Paths>);

	/// This producer's categories, static or computed per-creator.
	fn categories(&self) -> Categories;

	/// Run the build action for one creator.
	///
	/// Must leave every path in `outputs` existing on disk with an mtime at or after the call, or
	/// the staleness oracle will consider the creator dirty again on the next run.
	fn action(&self, inputs: &FieldMap<Paths>, outputs: &FieldMap<Paths>) -> Result<(), ActionError>;
}
