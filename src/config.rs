//! Scheduler configuration.

use derive_builder::Builder;

/// Tunable limits for a [`crate::Scheduler`][Scheduler].
///
/// [Scheduler]: crate::scheduler::Scheduler
///
/// Use [`SchedulerConfigBuilder`] to build one, or [`SchedulerConfig::default()`] for the stock
/// limits. Marked non-exhaustive so new knobs can be added without a breaking change.
#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
#[non_exhaustive]
pub struct SchedulerConfig {
	/// How many times a single creator may run within one drain of the dirty heap before the
	/// scheduler gives up and reports [`CriticalError::Cycle`][crate::error::CriticalError::Cycle].
	///
	/// A creator that legitimately re-dirties itself (its own output feeds back into its own
	/// input) would otherwise spin the drain loop forever; this cap turns that into a diagnosable
	/// error instead of a hang.
	#[builder(default = "3")]
	pub max_creator_runs_per_drain: u32,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			max_creator_runs_per_drain: 3,
		}
	}
}
