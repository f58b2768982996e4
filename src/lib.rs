//! An in-process profiler for named, nested call spans.
//!
//! Code being measured brackets regions with [`Profiler::begin`] and [`Profiler::end`]. For
//! every span name the profiler aggregates how often the span was closed, the time spent inside
//! it including nested spans (total time) and excluding them (self time). Snapshots are
//! drained with [`Profiler::results`]: each call returns what accumulated since the previous
//! one.
//!
//! The profiler is built for code that does not always balance its calls. A missing `end`, an
//! `end` with an outdated handle, or a span name re-entered without being closed are absorbed:
//! the affected spans are discarded and counted as leaks, and bad calls are recorded as
//! diagnostics. Only a malformed span name is an error.
//!
//! Bookkeeping runs on pooled stacks ([`PooledStack`]) that reuse their storage, so after a
//! warm-up the profiler itself stops allocating.
//!
//! ```rust
//! use spanprof::{MeasureField, Profiler, ProfilerOptions};
//!
//! let mut profiler = Profiler::new(ProfilerOptions::<u64>::default()).unwrap();
//! for _ in 0..3 {
//!     let handle = profiler.begin("step", None).unwrap();
//!     profiler.end(handle, None);
//! }
//! let results = profiler.results(Some(MeasureField::TotalTime), None);
//! assert_eq!(results.measures[0].name, "step");
//! assert_eq!(results.measures[0].count, 3);
//! ```
//!
//! ## Features
//!
//! - `logging` (default): installs a `log4rs` console logger controlled through [`log`].
//! - `strict`: swaps every pooled stack for [`StrictStack`], which panics on contract
//!   violations.
pub mod error;
pub mod hashing;
pub mod interner;
pub mod log;
pub mod options;
pub mod pooled_stack;
pub mod profiler;
pub mod registry;
pub mod time;

pub use error::{Diagnostic, DiagnosticKind, ProfilerError};
pub use interner::{Interner, NameId};
pub use options::{ProfilerOptions, DEFAULT_TIME_SCALE};
pub use pooled_stack::{Payload, PooledStack, RecordStack, Slot, StrictStack};
pub use profiler::{
    sort_measures, EndStatus, Handle, LeakRecord, MeasureField, MeasureRecord, Profiler, Results,
    Status, StatusDetails,
};
pub use registry::ContextId;
pub use time::{Clock, MonotonicClock, TimeValue};
