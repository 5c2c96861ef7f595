//! `catena`: an incremental, file-driven build scheduler.
//!
//! Given a set of declared [`Producer`]s (rules that take files matching named patterns and emit
//! new files) and a stream of file-existence/modification events, a [`Scheduler`] determines which
//! producer instantiations ("creators") are dirty, orders them by dependency, and executes them,
//! regenerating outputs transitively as cascades of inputs → outputs → inputs appear.
//!
//! ```ignore
//! use std::sync::Arc;
//! use catena::{Producer, Scheduler};
//!
//! let producers: Vec<Arc<dyn Producer>> = vec![Arc::new(MyProducer::new())];
//! let mut scheduler = Scheduler::new(producers, initial_paths)?;
//! scheduler.add_or_update_files(&changed_paths)?;
//! ```
//!
//! The core is single-threaded and synchronous: there is no parallel execution, no distributed
//! scheduling, and no content-hash-based change detection (staleness is mtime-only). The
//! match-store that drives creator materialization lives in memory only and is not persisted
//! across process restarts; the only durable artifacts are the files creators write to disk.
//!
//! This crate does not itself use `unsafe`.

#![forbid(unsafe_code)]

pub mod config;
pub mod creator;
pub mod error;
pub mod graph;
pub mod heap;
pub mod matchstore;
pub mod paths;
pub mod producer;
pub mod staleness;

mod scheduler;

#[doc(inline)]
pub use config::{SchedulerConfig, SchedulerConfigBuilder};
#[doc(inline)]
pub use creator::{Creator, CreatorId};
#[doc(inline)]
pub use error::{CriticalError, RuntimeError};
#[doc(inline)]
pub use graph::CreatorGraph;
#[doc(inline)]
pub use producer::{ActionError, Categories, FieldMap, FieldPattern, Paths, Producer};
#[doc(inline)]
pub use scheduler::Scheduler;
