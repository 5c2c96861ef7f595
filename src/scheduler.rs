//! The scheduler: orchestrates the match store, creator graph, dirty heap, and staleness oracle
//! into the incremental build fixpoint.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::SchedulerConfig;
use crate::creator::{match_key, Creator, CreatorId};
use crate::error::{CriticalError, RuntimeError};
use crate::graph::CreatorGraph;
use crate::heap::DirtyHeap;
use crate::matchstore::MatchStore;
use crate::producer::Producer;
use crate::staleness::StalenessOracle;

/// Orchestrates an incremental build: materializes creators from a relational join over matched
/// files, then drives a dirty-heap fixpoint that runs every creator whose outputs are stale
/// relative to its inputs, discovering new work as each creator's outputs land on disk.
pub struct Scheduler {
	producers: Vec<Arc<dyn Producer>>,
	matchstore: MatchStore,
	graph: CreatorGraph,
	oracle: StalenessOracle,
	config: SchedulerConfig,
}

impl Scheduler {
	/// Construct a scheduler over a fixed producer list, and run an initial
	/// [`add_or_update_files`][Self::add_or_update_files] pass over `initial_paths`.
	pub fn new(
		producers: Vec<Arc<dyn Producer>>,
		initial_paths: impl IntoIterator<Item = PathBuf>,
	) -> Result<Self, RuntimeError> {
		Self::with_config(producers, initial_paths, SchedulerConfig::default())
	}

	/// Like [`new`][Self::new], with an explicit [`SchedulerConfig`].
	pub fn with_config(
		producers: Vec<Arc<dyn Producer>>,
		initial_paths: impl IntoIterator<Item = PathBuf>,
		config: SchedulerConfig,
	) -> Result<Self, RuntimeError> {
		let mut matchstore = MatchStore::new();
		matchstore.init_tables(&producers);

		let mut scheduler = Self {
			producers,
			matchstore,
			graph: CreatorGraph::new(),
			oracle: StalenessOracle::new(),
			config,
		};

		let initial_paths: Vec<PathBuf> = initial_paths.into_iter().collect();
		scheduler.add_or_update_files(&initial_paths)?;
		Ok(scheduler)
	}

	/// Read-only access to the live creator graph, mostly useful for tests and introspection.
	pub fn graph(&self) -> &CreatorGraph {
		&self.graph
	}

	/// Ingest a batch of created-or-modified files: rebuild the creators that match them, then
	/// drain the dirty heap until every affected creator is up to date.
	pub fn add_or_update_files(&mut self, paths: &[PathBuf]) -> Result<(), RuntimeError> {
		self.materialize(paths)?;
		self.process_files(paths)
	}

	/// Ingest a batch of deleted files: tear down every creator that consumed one of them, and
	/// purge their rows from the match store. No new creators are materialized; deleted files
	/// never synthesize work.
	pub fn delete_files(&mut self, paths: &[PathBuf]) -> Result<(), CriticalError> {
		let mut consumers = HashSet::new();
		for path in paths {
			consumers.extend(self.graph.creators_consuming(path));
		}
		for id in consumers {
			debug!(creator = %id, "tearing down creator, one of its inputs was deleted");
			self.graph.unregister(&id)?;
		}

		for (producer_index, producer) in self.producers.iter().enumerate() {
			for path in paths {
				let Some(text) = path.to_str() else { continue };
				for (field, regex) in producer.regex_field_patterns() {
					if matches_at_start(&regex, text) {
						self.matchstore.remove(producer_index, &field, text);
					}
				}
			}
		}

		Ok(())
	}

	/// Phase 1: rebuild every creator affected by `paths` from the match store's current join
	/// results, without running anything.
	fn materialize(&mut self, paths: &[PathBuf]) -> Result<(), CriticalError> {
		let mut affected = HashSet::new();
		for path in paths {
			affected.extend(self.graph.creators_consuming(path));
		}
		for id in affected {
			trace!(creator = %id, "unregistering stale creator before re-materialization");
			self.graph.unregister(&id)?;
		}

		for (producer_index, producer) in self.producers.iter().enumerate() {
			let patterns = producer.regex_field_patterns();
			for path in paths {
				let Some(text) = path.to_str() else { continue };
				for (field, regex) in &patterns {
					if let Some(groups) = capture_groups(regex, text) {
						self.matchstore.remove(producer_index, field, text);
						self.matchstore.insert(producer_index, field, text, groups);
					}
				}
			}
		}

		for (producer_index, producer) in self.producers.iter().enumerate() {
			let filesets = self.matchstore.query_filesets(producer_index, producer.as_ref());
			for (resolved_input, groups) in filesets {
				let id = CreatorId {
					producer_index,
					match_key: match_key(&groups),
				};

				let (final_input, outputs) = producer.paths(&resolved_input, &groups);
				let categories = producer.categories().resolve(&final_input, &outputs);
				let creator = Creator::new(id.clone(), final_input, outputs, categories);

				if self.graph.contains(&id) {
					self.graph.unregister(&id)?;
				}
				debug!(creator = %id, "materialized creator");
				self.graph.register(creator)?;
			}
		}

		self.matchstore.mark_all_updated_false();
		Ok(())
	}

	/// Phase 2: seed the dirty heap with every creator consuming `paths`, then drain it to a
	/// fixpoint, running every creator whose outputs are stale and cascading into any creators that
	/// newly consume its outputs.
	fn process_files(&mut self, paths: &[PathBuf]) -> Result<(), RuntimeError> {
		let mut heap = DirtyHeap::new();
		for path in paths {
			for id in self.graph.creators_consuming(path) {
				heap.push(id);
			}
		}

		let mut run_counts: HashMap<CreatorId, u32> = HashMap::new();

		while let Some(id) = heap.pop() {
			let Some(creator) = self.graph.get(&id) else {
				trace!(creator = %id, "skipping dirty entry, creator no longer exists");
				continue;
			};

			if !self.oracle.must_run(creator) {
				trace!(creator = %id, "skipping, outputs are up to date");
				continue;
			}

			let runs = run_counts.entry(id.clone()).or_insert(0);
			*runs += 1;
			if *runs > self.config.max_creator_runs_per_drain {
				warn!(creator = %id, runs = *runs, "creator exceeded run cap, aborting drain");
				return Err(CriticalError::Cycle {
					creator: id,
					runs: *runs,
				}
				.into());
			}

			// Snapshot the creator before the cascade: `materialize` may rebuild this same identity
			// (e.g. a producer whose own output re-satisfies its own input pattern), but the run
			// below always uses the pre-cascade inputs/outputs, not whatever the rebuild produced.
			// A rebuilt identity only gets re-run on a later drain iteration, if it's still dirty and
			// gets re-pushed onto the heap.
			let creator = creator.clone();
			let outputs = creator.flat_output_paths();

			self.materialize(&outputs)?;
			for output in &outputs {
				for consumer in self.graph.creators_consuming(output) {
					heap.push(consumer);
				}
			}

			create_output_directories(&outputs)
				.map_err(|err| RuntimeError::from(CriticalError::IoError {
					about: "creating output directory",
					err,
				}))?;

			debug!(creator = %id, categories = %creator.categories, "running creator");
			self.producers[id.producer_index]
				.action(&creator.inputs, &creator.outputs)
				.map_err(|err| RuntimeError::ProducerActionFailure {
					creator: id.clone(),
					categories: creator.categories.clone(),
					err,
				})?;
		}

		Ok(())
	}
}

/// Whether `regex` matches `text` starting at offset 0, mirroring Python's `re.match` (which never
/// considers a match that starts anywhere but the beginning of the string, unlike `re.search`).
/// `regex`'s own search is leftmost-first, so if a position-0 match exists it's always the one
/// `captures`/`find` return; checking `start() == 0` on that result is enough, no `^`-anchored
/// recompile of the caller's pattern needed.
fn matches_at_start(regex: &regex::Regex, text: &str) -> bool {
	match regex.find(text) {
		Some(m) => m.start() == 0,
		None => false,
	}
}

fn capture_groups(regex: &regex::Regex, text: &str) -> Option<BTreeMap<String, String>> {
	let caps = regex.captures(text)?;
	if caps.get(0).map(|m| m.start()) != Some(0) {
		return None;
	}
	let groups = regex
		.capture_names()
		.flatten()
		.filter_map(|name| caps.name(name).map(|m| (name.to_owned(), m.as_str().to_owned())))
		.collect();
	Some(groups)
}

fn create_output_directories(outputs: &[PathBuf]) -> std::io::Result<()> {
	for output in outputs {
		if let Some(parent) = Path::new(output).parent() {
			if !parent.as_os_str().is_empty() {
				std::fs::create_dir_all(parent)?;
			}
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::producer::{Categories, FieldMap, FieldPattern, Paths};
	use regex::Regex;
	use std::fs;
	use std::sync::Mutex;

	/// A producer that turns `<base>/src/<name>.md` into `<base>/out/<name>.html` via a trivial
	/// copy-like action, recording how many times it ran.
	struct MdToHtml {
		base: PathBuf,
		run_count: Arc<Mutex<u32>>,
	}

	impl Producer for MdToHtml {
		fn input_path_patterns_dict(&self) -> FieldMap<FieldPattern> {
			let pattern = format!(
				r"^{}/src/(?P<name>\w+)\.md$",
				regex::escape(&self.base.to_string_lossy())
			);
			let mut m = FieldMap::new();
			m.insert("src".into(), FieldPattern::Single(Regex::new(&pattern).unwrap()));
			m
		}

		fn paths(
			&self,
			raw_input: &FieldMap<Paths>,
			groups: &BTreeMap<String, String>,
		) -> (FieldMap<Paths>, FieldMap<Paths>) {
			let name = &groups["name"];
			let mut outputs = FieldMap::new();
			outputs.insert(
				"html".into(),
				Paths::Single(self.base.join("out").join(format!("{name}.html"))),
			);
			(raw_input.clone(), outputs)
		}

		fn categories(&self) -> Categories {
			Categories::Static("md-to-html".into())
		}

		fn action(
			&self,
			inputs: &FieldMap<Paths>,
			outputs: &FieldMap<Paths>,
		) -> Result<(), crate::producer::ActionError> {
			*self.run_count.lock().unwrap() += 1;
			let Paths::Single(src) = &inputs["src"] else {
				unreachable!()
			};
			let Paths::Single(dst) = &outputs["html"] else {
				unreachable!()
			};
			let contents = fs::read_to_string(src)?;
			fs::write(dst, format!("<html>{contents}</html>"))?;
			Ok(())
		}
	}

	#[test]
	fn end_to_end_builds_then_skips_on_repeat() {
		let dir = tempdir::TempDir::new("scheduler").unwrap();
		let base = dir.path().to_path_buf();
		fs::create_dir(base.join("src")).unwrap();
		let src = base.join("src").join("a.md");
		fs::write(&src, "hello").unwrap();

		let run_count = Arc::new(Mutex::new(0));
		let producer: Arc<dyn Producer> = Arc::new(MdToHtml {
			base: base.clone(),
			run_count: run_count.clone(),
		});
		let mut scheduler = Scheduler::new(vec![producer], vec![src.clone()]).unwrap();

		let out = base.join("out").join("a.html");
		assert!(out.exists());
		assert_eq!(fs::read_to_string(&out).unwrap(), "<html>hello</html>");
		assert_eq!(*run_count.lock().unwrap(), 1);

		scheduler.add_or_update_files(&[src]).unwrap();
		assert_eq!(*run_count.lock().unwrap(), 1);
	}
}
