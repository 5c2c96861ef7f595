//! The relational match-store: per-producer, per-field tables of matched files, and the fileset
//! join that turns them into creator-worthy combinations.
//!
//! The reference implementation backs this with an in-memory SQLite database, one table per
//! `(producer, field)`. Here we use native Rust maps instead; the redesign notes call this out
//! explicitly as an acceptable substitution provided the join semantics and the `is_updated`
//! aggregation are preserved, and it keeps the crate's dependency stack free of an embedded SQL
//! engine it otherwise has no use for.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use itertools::Itertools;

use crate::producer::{FieldMap, FieldPattern, Paths, Producer};

pub mod escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
	Single,
	List,
}

/// One row of a field table: a matched filename, whether it was freshly (re-)inserted since the
/// last materialization pass, and the capture-group values its regex produced.
#[derive(Debug, Clone)]
struct Row {
	is_updated: bool,
	groups: BTreeMap<String, String>,
}

/// The per-`(producer, field)` table store.
#[derive(Debug, Default)]
pub struct MatchStore {
	tables: HashMap<(usize, String), HashMap<String, Row>>,
}

impl MatchStore {
	/// Construct an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an (empty) table for every matchable field of every producer.
	///
	/// Calling this is optional: tables are created lazily on first [`insert`][Self::insert],
	/// but doing it up front means a producer with zero matches so far still participates
	/// correctly in [`query_filesets`][Self::query_filesets]'s emptiness checks.
	pub fn init_tables(&mut self, producers: &[std::sync::Arc<dyn Producer>]) {
		for (producer_index, producer) in producers.iter().enumerate() {
			for field_name in producer.regex_field_patterns().keys() {
				self.tables
					.entry((producer_index, field_name.clone()))
					.or_default();
			}
		}
	}

	/// Insert a freshly matched file into `(producer_index, field)`'s table.
	///
	/// # Panics
	///
	/// Panics if `filename` is already present in the table; callers must
	/// [`remove`][Self::remove] first. This mirrors the reference implementation's insert query,
	/// which has no `ON CONFLICT` clause.
	pub fn insert(
		&mut self,
		producer_index: usize,
		field: &str,
		filename: &str,
		groups: BTreeMap<String, String>,
	) {
		let table = self
			.tables
			.entry((producer_index, field.to_owned()))
			.or_default();
		assert!(
			!table.contains_key(filename),
			"insert on existing filename {filename:?} in table (producer {producer_index}, field {field}); remove first"
		);
		table.insert(
			filename.to_owned(),
			Row {
				is_updated: true,
				groups,
			},
		);
	}

	/// Remove a file from `(producer_index, field)`'s table, if present.
	pub fn remove(&mut self, producer_index: usize, field: &str, filename: &str) {
		if let Some(table) = self.tables.get_mut(&(producer_index, field.to_owned())) {
			table.remove(filename);
		}
	}

	/// Clear the `is_updated` flag on every row, across every table.
	///
	/// Called once at the end of a materialization pass: only files freshly (re-)inserted since
	/// the last call should count as "updated" for the next join.
	pub fn mark_all_updated_false(&mut self) {
		for table in self.tables.values_mut() {
			for row in table.values_mut() {
				row.is_updated = false;
			}
		}
	}

	/// Run the fileset join for one producer, returning every joined combination that contains at
	/// least one updated row.
	///
	/// This is a Cartesian product of the producer's non-empty field tables, constrained by
	/// equality on every capture group shared by two or more fields; groups appearing in only one
	/// field are projected straight through. List-valued fields are aggregated (their matching
	/// filenames collected, then sorted) per distinct combination of single-field filenames and
	/// capture-group values.
	pub fn query_filesets(
		&self,
		producer_index: usize,
		producer: &dyn Producer,
	) -> Vec<(FieldMap<Paths>, BTreeMap<String, String>)> {
		let patterns = producer.input_path_patterns_dict();

		let mut active: Vec<(String, FieldKind)> = Vec::new();
		for (name, pattern) in &patterns {
			match pattern {
				FieldPattern::Single(_) => active.push((name.clone(), FieldKind::Single)),
				FieldPattern::List(_) => active.push((name.clone(), FieldKind::List)),
				FieldPattern::Absent | FieldPattern::EmptyList => {}
			}
		}

		if active.is_empty() {
			return Vec::new();
		}

		let mut field_rows: Vec<(String, FieldKind, Vec<(String, Row)>)> = Vec::new();
		for (name, kind) in &active {
			let mut rows: Vec<(String, Row)> = self
				.tables
				.get(&(producer_index, name.clone()))
				.map(|t| t.iter().map(|(f, r)| (f.clone(), r.clone())).collect())
				.unwrap_or_default();

			// Empty tables empty the whole Cartesian product, same as a SQL cross join.
			if rows.is_empty() {
				return Vec::new();
			}

			rows.sort_by(|a, b| a.0.cmp(&b.0));
			field_rows.push((name.clone(), *kind, rows));
		}

		struct Group {
			singles: BTreeMap<String, String>,
			lists: BTreeMap<String, Vec<String>>,
			groups: BTreeMap<String, String>,
			is_updated: u32,
		}

		let mut groups_acc: BTreeMap<String, Group> = BTreeMap::new();

		let combos = field_rows
			.iter()
			.map(|(_, _, rows)| 0..rows.len())
			.multi_cartesian_product();

		for combo in combos {
			let chosen: Vec<(&str, FieldKind, &str, &Row)> = combo
				.iter()
				.enumerate()
				.map(|(i, &idx)| {
					let (name, kind, rows) = &field_rows[i];
					let (filename, row) = &rows[idx];
					(name.as_str(), *kind, filename.as_str(), row)
				})
				.collect();

			let mut merged_groups: BTreeMap<String, String> = BTreeMap::new();
			let mut consistent = true;
			'check: for (_, _, _, row) in &chosen {
				for (group, value) in &row.groups {
					match merged_groups.get(group) {
						Some(existing) if existing != value => {
							consistent = false;
							break 'check;
						}
						Some(_) => {}
						None => {
							merged_groups.insert(group.clone(), value.clone());
						}
					}
				}
			}
			if !consistent {
				continue;
			}

			let mut singles_for_key: BTreeMap<String, String> = BTreeMap::new();
			let mut is_updated_sum: u32 = 0;
			for (name, kind, filename, row) in &chosen {
				is_updated_sum += u32::from(row.is_updated);
				if *kind == FieldKind::Single {
					singles_for_key.insert((*name).to_owned(), (*filename).to_owned());
				}
			}

			let key = format!("{singles_for_key:?}|{merged_groups:?}");
			let entry = groups_acc.entry(key).or_insert_with(|| Group {
				singles: singles_for_key.clone(),
				lists: BTreeMap::new(),
				groups: merged_groups.clone(),
				is_updated: 0,
			});
			entry.is_updated += is_updated_sum;

			for (name, kind, filename, _) in &chosen {
				if *kind == FieldKind::List {
					entry
						.lists
						.entry((*name).to_owned())
						.or_default()
						.push((*filename).to_owned());
				}
			}
		}

		let mut output = Vec::new();
		for group in groups_acc.into_values() {
			if group.is_updated == 0 {
				continue;
			}

			let mut resolved: FieldMap<Paths> = FieldMap::new();
			for (name, pattern) in &patterns {
				let value = match pattern {
					FieldPattern::Absent => Paths::Absent,
					FieldPattern::EmptyList => Paths::List(Vec::new()),
					FieldPattern::Single(_) => {
						let filename = group
							.singles
							.get(name)
							.expect("single field present in every joined combination");
						Paths::Single(PathBuf::from(filename))
					}
					FieldPattern::List(_) => {
						let mut files = group.lists.get(name).cloned().unwrap_or_default();
						files.sort();
						files.dedup();
						Paths::List(files.into_iter().map(PathBuf::from).collect())
					}
				};
				resolved.insert(name.clone(), value);
			}

			output.push((resolved, group.groups));
		}

		output
	}
}
