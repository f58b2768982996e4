//! The profiler controller: opening and closing spans, recovering from unbalanced calls, and
//! handing out drainable snapshots of what was measured.
//!
//! ## Basic usage
//!
//! ```rust
//! use spanprof::{EndStatus, Profiler};
//!
//! let mut profiler: Profiler = Profiler::default();
//!
//! let outer = profiler.begin("load", None).unwrap();
//! let inner = profiler.begin("parse", None).unwrap();
//! // code being measured
//! assert_eq!(profiler.end(inner, None), EndStatus::Closed);
//! assert_eq!(profiler.end(outer, None), EndStatus::Closed);
//!
//! let results = profiler.results(None, None);
//! assert_eq!(results.measures.len(), 2);
//! // Results are drained: the next call only sees what happened since.
//! assert!(profiler.results(None, None).is_empty());
//! ```
//!
//! ## Contexts
//!
//! Spans passed `None` as context belong to the main context. Any other `Some(id)` names an
//! independent logical call stack that is created on first use. Nesting is tracked per context;
//! measures are aggregated across all of them.
//!
//! ## Misuse
//!
//! A span name that is empty or contains whitespace is a hard error. Everything else the caller
//! can get wrong is absorbed:
//! - closing a span while spans nested in it are still open discards the nested spans as
//!   leaks;
//! - beginning a span whose name is already open in the same context discards everything from
//!   that earlier span up as leaks, and the context then refuses new spans until it drains;
//! - closing an unknown handle or an unknown context is recorded as a [`Diagnostic`].
//!
//! Leaks and diagnostics are reported by [`Profiler::results`] and [`Profiler::status`].

mod snapshot;

use std::fmt::{self, Display};

use crate::log::{debug, info, trace, warn};

pub use snapshot::*;

use crate::error::{Diagnostic, DiagnosticKind, ProfilerError};
use crate::hashing::IndexMap;
use crate::interner::{Interner, NameId};
use crate::options::ProfilerOptions;
use crate::pooled_stack::{Payload, RecordStack, Slot, Stack};
use crate::registry::{ContextId, ContextRegistry, OpenSpan, SpanContext};
use crate::time::TimeValue;

/// Returned by [`Profiler::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    /// The span was opened at this position of its context stack.
    Span(usize),
    /// The span was refused: the context is recovering from a leak.
    Suppressed,
    /// The profiler is disabled.
    Inactive,
}

impl Handle {
    pub fn index(self) -> Option<usize> {
        match self {
            Handle::Span(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, Handle::Span(_))
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Handle::Span(index) => write!(f, "{index}"),
            Handle::Suppressed => f.write_str("-1"),
            Handle::Inactive => f.write_str("inactive"),
        }
    }
}

/// Returned by [`Profiler::end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndStatus {
    Closed,
    /// Nothing was closed; a diagnostic was recorded.
    Failed,
    /// The profiler is disabled.
    Inactive,
}

impl EndStatus {
    pub fn is_closed(self) -> bool {
        self == EndStatus::Closed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MeasureRow<T> {
    count: u64,
    self_time: T,
    total_time: T,
}

impl<T: TimeValue> Payload for MeasureRow<T> {
    const FIELDS: usize = 3;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LeakRow {
    occurrences: u64,
}

impl Payload for LeakRow {
    const FIELDS: usize = 1;
}

/// Diagnostics keyed by message; recording the same message twice keeps the first one.
#[derive(Debug, Default)]
struct DiagnosticLog {
    entries: IndexMap<String, Diagnostic>,
}

impl DiagnosticLog {
    fn record(&mut self, diagnostic: Diagnostic) {
        if self.entries.contains_key(&diagnostic.message) {
            return;
        }
        warn!("{diagnostic}");
        self.entries.insert(diagnostic.message.clone(), diagnostic);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.values().cloned().collect()
    }

    fn drain(&mut self) -> Vec<Diagnostic> {
        self.entries.drain(..).map(|(_, diagnostic)| diagnostic).collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// An in-process span profiler. See the [module documentation](self) for an overview.
///
/// `T` is the numeric type of the time source; all accumulation happens in it.
pub struct Profiler<T: TimeValue = u64> {
    options: ProfilerOptions<T>,
    enabled: bool,
    names: Interner,
    measures: Stack<MeasureRow<T>>,
    leaks: Stack<LeakRow>,
    diagnostics: DiagnosticLog,
    contexts: ContextRegistry<T>,
}

impl Default for Profiler<u64> {
    fn default() -> Self {
        Profiler::from_valid_options(ProfilerOptions::default())
    }
}

impl<T: TimeValue> Profiler<T> {
    pub fn new(options: ProfilerOptions<T>) -> Result<Self, ProfilerError> {
        options.validate()?;
        Ok(Self::from_valid_options(options))
    }

    fn from_valid_options(options: ProfilerOptions<T>) -> Self {
        Profiler {
            options,
            enabled: true,
            names: Interner::new(),
            measures: Stack::default(),
            leaks: Stack::default(),
            diagnostics: DiagnosticLog::default(),
            contexts: ContextRegistry::new(),
        }
    }

    /// Opens a span named `name` in `context` (`None` for the main context).
    ///
    /// Returns the handle to pass to [`Profiler::end`]. The only error is
    /// [`ProfilerError::InvalidName`] for a name that is empty or contains whitespace.
    pub fn begin(
        &mut self,
        name: &str,
        context: Option<ContextId>,
    ) -> Result<Handle, ProfilerError> {
        if !self.enabled {
            return Ok(Handle::Inactive);
        }
        let name_id = self.names.intern(name)?;
        let span_context = self.contexts.resolve_or_create(context);
        if span_context.locked {
            return Ok(Handle::Suppressed);
        }
        let measure = self.measures.grant(name_id);

        let earlier = span_context.stack.index_of(name_id);
        if earlier != 0 {
            // The earlier `begin` of this name was never matched.
            recover(span_context, earlier, &mut self.names, &mut self.leaks);
            span_context.locked = span_context.depth() > 0;
            if span_context.depth() == 0 {
                self.contexts.retire(context);
            }
            return Ok(Handle::Suppressed);
        }

        let start = self.options.now();
        let index = span_context.stack.push(
            name_id,
            OpenSpan {
                measure,
                start,
                children: T::ZERO,
            },
        );
        Ok(Handle::Span(index))
    }

    /// Closes the span opened at `handle` in `context`.
    ///
    /// Spans still open above `handle` are discarded as leaks first. Unknown contexts and
    /// handles are recorded as diagnostics and reported as [`EndStatus::Failed`].
    pub fn end(&mut self, handle: Handle, context: Option<ContextId>) -> EndStatus {
        if !self.enabled {
            return EndStatus::Inactive;
        }
        let now = self.options.now();

        let Some(span_context) = self.contexts.get_mut(context) else {
            let subject = context.map_or_else(String::new, |id| id.to_string());
            self.diagnostics.record(Diagnostic::new(
                DiagnosticKind::NoSuchContext,
                subject,
                context,
            ));
            return EndStatus::Failed;
        };

        let index = handle.index().unwrap_or(0);
        if index == 0 || index > span_context.stack.top_index() {
            self.diagnostics.record(Diagnostic::new(
                DiagnosticKind::NoSuchSpan,
                handle,
                context,
            ));
            return EndStatus::Failed;
        }

        recover(span_context, index + 1, &mut self.names, &mut self.leaks);

        let Some(slot) = span_context.stack.top().copied() else {
            return EndStatus::Failed;
        };
        let elapsed = now.elapsed_since(slot.payload.start);
        let measure = locate_measure(&mut self.measures, &slot);
        if let Some(row) = self.measures.payload_mut(measure) {
            row.count += 1;
            row.self_time += elapsed.elapsed_since(slot.payload.children);
            row.total_time += elapsed;
        }

        let depth = span_context.stack.delete();
        if depth > 0 {
            if let Some(parent) = span_context.stack.payload_mut(depth) {
                parent.children += elapsed;
            }
        } else {
            span_context.locked = false;
            self.contexts.retire(context);
        }
        EndStatus::Closed
    }

    /// Runs `f` inside a span named `name`, closing the span when `f` returns.
    pub fn in_span<R>(
        &mut self,
        name: &str,
        context: Option<ContextId>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, ProfilerError> {
        let handle = self.begin(name, context)?;
        let result = f(self);
        if handle.is_open() {
            self.end(handle, context);
        }
        Ok(result)
    }

    /// Queries and optionally changes whether the profiler is enabled; returns the previous
    /// state.
    ///
    /// Disabling is refused, and recorded as a diagnostic, while the main context has open
    /// spans. While disabled, `begin` and `end` do nothing and `results` is empty.
    pub fn enable(&mut self, yes: Option<bool>) -> bool {
        let was = self.enabled;
        match yes {
            Some(false) if self.contexts.main().depth() > 0 => {
                self.diagnostics.record(Diagnostic::new(
                    DiagnosticKind::DisableWhilePending,
                    "",
                    None,
                ));
            }
            Some(yes) => {
                if yes != was {
                    debug!("profiler {}", if yes { "enabled" } else { "disabled" });
                }
                self.enabled = yes;
            }
            None => {}
        }
        was
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of spans open in the main context.
    pub fn pending_count(&self) -> usize {
        self.contexts.main().depth()
    }

    /// Returns everything accumulated since the previous call and clears it.
    ///
    /// `merge_with` is an earlier snapshot whose measures, errors and leaks are appended.
    /// Measures are then sorted by `sort_by`; `None` keeps them in order of first use. Pass
    /// `Some(MeasureField::default())` for the usual report order, average self time
    /// descending.
    ///
    /// While disabled nothing is drained and the result is `merge_with` alone, sorted.
    pub fn results(
        &mut self,
        sort_by: Option<MeasureField>,
        merge_with: Option<Results>,
    ) -> Results {
        if !self.enabled {
            let mut results = merge_with.unwrap_or_default();
            if let Some(field) = sort_by {
                sort_measures(&mut results.measures, field);
            }
            return results;
        }
        let mut results = Results {
            measures: self.measure_records(),
            errors: self.diagnostics.drain(),
            leaks: self.leak_records(),
        };
        self.measures.clear();
        self.leaks.clear();
        trace!(
            "drained {} measure(s), {} error(s), {} leak(s)",
            results.measures.len(),
            results.errors.len(),
            results.leaks.len()
        );

        if let Some(earlier) = merge_with {
            results.merge(earlier);
        }
        if let Some(field) = sort_by {
            sort_measures(&mut results.measures, field);
        }
        results
    }

    /// A non-draining view of the current state. `detailed` adds the diagnostics, leaks, open
    /// span names of the main context, and the depth of every secondary context.
    pub fn status(&self, detailed: bool) -> Status {
        let details = detailed.then(|| StatusDetails {
            errors: self.diagnostics.snapshot(),
            leaks: self.leak_records(),
            open_spans: self
                .contexts
                .main()
                .stack
                .iter()
                .map(|slot| self.name_of(slot.key()))
                .collect(),
            context_sizes: self.contexts.secondary_sizes(),
        });
        Status {
            call_depth: self.contexts.main().depth(),
            enabled: self.enabled,
            error_count: self.diagnostics.len(),
            leak_count: self.leaks.size(),
            measure_count: self.measures.size(),
            context_count: self.contexts.secondary_count(),
            details,
        }
    }

    /// Replaces the time source and scale and resets all state, returning the previous options.
    ///
    /// Refused with [`ProfilerError::Busy`] while any context has open spans.
    pub fn setup(
        &mut self,
        options: ProfilerOptions<T>,
    ) -> Result<ProfilerOptions<T>, ProfilerError> {
        options.validate()?;
        let depth = self.contexts.open_span_count();
        if depth > 0 {
            return Err(ProfilerError::Busy { depth });
        }
        info!("profiler setup: {options:?}");
        let previous = std::mem::replace(&mut self.options, options);
        self.names.clear();
        self.measures.clear();
        self.leaks.clear();
        self.diagnostics.clear();
        self.contexts.clear();
        Ok(previous)
    }

    pub fn time_scale(&self) -> f64 {
        self.options.time_scale()
    }

    fn name_of(&self, id: NameId) -> String {
        self.names.name_of(id).unwrap_or_default().to_string()
    }

    fn measure_records(&self) -> Vec<MeasureRecord> {
        let scale = self.options.time_scale();
        self.measures
            .iter()
            .map(|slot| {
                let row = &slot.payload;
                MeasureRecord::new(
                    self.name_of(slot.key()),
                    row.count,
                    row.self_time.to_f64() * scale,
                    row.total_time.to_f64() * scale,
                )
            })
            .collect()
    }

    fn leak_records(&self) -> Vec<LeakRecord> {
        self.leaks
            .iter()
            .map(|slot| LeakRecord {
                path: self.name_of(slot.key()),
                occurrences: slot.payload.occurrences,
            })
            .collect()
    }
}

impl<T: TimeValue> fmt::Debug for Profiler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profiler")
            .field("enabled", &self.enabled)
            .field("status", &self.status(false))
            .finish_non_exhaustive()
    }
}

/// Discards every span of `context` at or above `from`, one frame at a time, charging one leak
/// occurrence to the full stack path at the moment each frame is discarded.
fn recover<T: TimeValue>(
    context: &mut SpanContext<T>,
    from: usize,
    names: &mut Interner,
    leaks: &mut Stack<LeakRow>,
) {
    while context.stack.top_index() >= from.max(1) {
        let path = names.intern_path(context.stack.iter().map(Slot::key));
        debug!("leaked span: '{}'", names.name_of(path).unwrap_or_default());
        let leak = leaks.grant(path);
        if let Some(row) = leaks.payload_mut(leak) {
            row.occurrences += 1;
        }
        context.stack.delete();
    }
}

/// Index of the measure row of the span in `slot`, re-creating the row when the cached index
/// went stale because results were drained while the span was open.
fn locate_measure<T: TimeValue>(
    measures: &mut Stack<MeasureRow<T>>,
    slot: &Slot<OpenSpan<T>>,
) -> usize {
    let cached = slot.payload.measure;
    let fresh = cached != 0
        && cached <= measures.top_index()
        && measures.at(cached).map(Slot::key) == Some(slot.key());
    if fresh {
        cached
    } else {
        measures.grant(slot.key())
    }
}
