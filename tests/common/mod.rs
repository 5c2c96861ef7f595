#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use catena::{ActionError, Categories, FieldMap, FieldPattern, Paths, Producer};
use regex::Regex;

/// A fully generic [`Producer`] for integration tests: the pattern set, the `paths()` resolver,
/// and the action are all supplied as closures, and every call to `action` is counted so tests can
/// assert on how many times a creator actually ran.
pub struct TestProducer {
	patterns: FieldMap<FieldPattern>,
	resolve: Box<dyn Fn(&FieldMap<Paths>, &BTreeMap<String, String>) -> (FieldMap<Paths>, FieldMap<Paths>) + Send + Sync>,
	act: Box<dyn Fn(&FieldMap<Paths>, &FieldMap<Paths>) -> Result<(), ActionError> + Send + Sync>,
	pub run_count: Arc<Mutex<u32>>,
}

impl Producer for TestProducer {
	fn input_path_patterns_dict(&self) -> FieldMap<FieldPattern> {
		self.patterns.clone()
	}

	fn paths(
		&self,
		raw_input: &FieldMap<Paths>,
		groups: &BTreeMap<String, String>,
	) -> (FieldMap<Paths>, FieldMap<Paths>) {
		(self.resolve)(raw_input, groups)
	}

	fn categories(&self) -> Categories {
		Categories::Static("test".into())
	}

	fn action(&self, inputs: &FieldMap<Paths>, outputs: &FieldMap<Paths>) -> Result<(), ActionError> {
		*self.run_count.lock().unwrap() += 1;
		(self.act)(inputs, outputs)
	}
}

/// A single-input-field, single-output-field producer: `base/<src_dir>/<name>.<src_ext>` becomes
/// `base/<dst_dir>/<name>.<dst_ext>`, with the action writing the source's contents wrapped in a
/// tag named after the destination extension.
pub fn rename_producer(
	base: &std::path::Path,
	src_dir: &str,
	src_ext: &str,
	dst_dir: &str,
	dst_ext: &str,
) -> (Arc<dyn Producer>, Arc<Mutex<u32>>) {
	let pattern = format!(
		r"^{}/{}/(?P<name>\w+)\.{}$",
		regex::escape(&base.to_string_lossy()),
		src_dir,
		src_ext,
	);
	let mut patterns = FieldMap::new();
	patterns.insert("src".into(), FieldPattern::Single(Regex::new(&pattern).unwrap()));

	let base = base.to_path_buf();
	let dst_dir = dst_dir.to_string();
	let dst_ext = dst_ext.to_string();
	let resolve_base = base.clone();

	let resolve = move |raw: &FieldMap<Paths>, groups: &BTreeMap<String, String>| {
		let name = &groups["name"];
		let mut outputs = FieldMap::new();
		outputs.insert(
			"dst".into(),
			Paths::Single(resolve_base.join(&dst_dir).join(format!("{name}.{dst_ext}"))),
		);
		(raw.clone(), outputs)
	};

	let tag = dst_ext.clone();
	let act = move |inputs: &FieldMap<Paths>, outputs: &FieldMap<Paths>| -> Result<(), ActionError> {
		let Paths::Single(src) = &inputs["src"] else {
			unreachable!()
		};
		let Paths::Single(dst) = &outputs["dst"] else {
			unreachable!()
		};
		let contents = fs::read_to_string(src)?;
		fs::write(dst, format!("<{tag}>{contents}</{tag}>"))?;
		Ok(())
	};

	let run_count = Arc::new(Mutex::new(0));
	let producer = TestProducer {
		patterns,
		resolve: Box::new(resolve),
		act: Box::new(act),
		run_count: run_count.clone(),
	};
	(Arc::new(producer), run_count)
}

pub fn write_file(path: &std::path::Path, contents: &str) {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(path, contents).unwrap();
}

/// Sleep long enough that a subsequent file write gets a strictly later mtime on every
/// filesystem this crate is tested against.
pub fn settle() {
	std::thread::sleep(std::time::Duration::from_millis(20));
}

pub fn new_tempdir() -> tempdir::TempDir {
	tempdir::TempDir::new("catena-test").unwrap()
}

pub fn paths(values: &[PathBuf]) -> Vec<PathBuf> {
	values.to_vec()
}
