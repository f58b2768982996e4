use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Hard errors returned by the profiler. These indicate a programming error at the
/// profiling call site itself; every other kind of misuse is absorbed and recorded as a
/// [`Diagnostic`].
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub enum ProfilerError {
    /// A span name was empty or contained whitespace.
    InvalidName(String),
    /// `setup` was attempted while spans were still open.
    Busy { depth: usize },
    /// The supplied options cannot be used.
    InvalidOptions(String),
}

impl std::error::Error for ProfilerError {}

impl Display for ProfilerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProfilerError::InvalidName(name) => write!(f, "illegal span name '{name}'"),
            ProfilerError::Busy { depth } => {
                write!(f, "setup refused: {depth} span(s) still open")
            }
            ProfilerError::InvalidOptions(msg) => write!(f, "invalid options: {msg}"),
        }
    }
}

/// The kinds of caller misuse the profiler absorbs instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// `end` named a context that has no open spans.
    NoSuchContext,
    /// `end` was given a handle that does not address an open span.
    NoSuchSpan,
    /// `enable(false)` was refused because the main context has open spans.
    DisableWhilePending,
}

impl DiagnosticKind {
    fn describe(self) -> &'static str {
        match self {
            DiagnosticKind::NoSuchContext => "end: no such context",
            DiagnosticKind::NoSuchSpan => "end: no such span",
            DiagnosticKind::DisableWhilePending => "enable(false): there are calls pending",
        }
    }
}

/// A deduplicated record of absorbed misuse. Two diagnostics with the same `message` are
/// considered the same diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// The offending value rendered as text: a handle, a context id, or empty.
    pub subject: String,
    /// The context the failed call was addressed to, when it was not the main context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<u64>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Display, context: Option<u64>) -> Self {
        let subject = subject.to_string();
        let message = format!("{}: '{}'", kind.describe(), subject);
        Diagnostic {
            kind,
            message,
            subject,
            context,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}
