use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::registry::ContextId;

/// Aggregated measures of one span name, with durations already scaled to output units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureRecord {
    pub name: String,
    /// Number of times the span was closed.
    pub count: u64,
    /// Average self time per call, `0` if the span was never closed.
    pub avg_self: f64,
    /// Time spent in the span excluding its nested spans.
    pub self_time: f64,
    /// Average total time per call, `0` if the span was never closed.
    pub avg_total: f64,
    /// Time spent in the span including its nested spans.
    pub total_time: f64,
}

impl MeasureRecord {
    #[allow(clippy::cast_precision_loss)]
    pub fn new(name: impl Into<String>, count: u64, self_time: f64, total_time: f64) -> Self {
        let average = |sum: f64| if count == 0 { 0.0 } else { sum / count as f64 };
        MeasureRecord {
            name: name.into(),
            count,
            avg_self: average(self_time),
            self_time,
            avg_total: average(total_time),
            total_time,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn numeric(&self, field: MeasureField) -> f64 {
        match field {
            MeasureField::Name => 0.0,
            MeasureField::Count => self.count as f64,
            MeasureField::AvgSelf => self.avg_self,
            MeasureField::SelfTime => self.self_time,
            MeasureField::AvgTotal => self.avg_total,
            MeasureField::TotalTime => self.total_time,
        }
    }
}

/// The fields measures can be sorted by. Numeric fields sort descending, `Name` ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MeasureField {
    Name,
    Count,
    #[default]
    AvgSelf,
    SelfTime,
    AvgTotal,
    TotalTime,
}

/// Sorts `measures` by `field`. The sort is stable, so ties keep their current order.
pub fn sort_measures(measures: &mut [MeasureRecord], field: MeasureField) {
    match field {
        MeasureField::Name => measures.sort_by(|a, b| a.name.cmp(&b.name)),
        MeasureField::Count => measures.sort_by(|a, b| b.count.cmp(&a.count)),
        _ => measures.sort_by(|a, b| b.numeric(field).total_cmp(&a.numeric(field))),
    }
}

/// Spans discarded because they were never closed, counted per full stack path at the moment
/// of discarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakRecord {
    pub path: String,
    pub occurrences: u64,
}

/// What accumulated between two drains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub measures: Vec<MeasureRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leaks: Vec<LeakRecord>,
}

impl Results {
    pub fn is_empty(&self) -> bool {
        self.measures.is_empty() && self.errors.is_empty() && self.leaks.is_empty()
    }

    /// Appends everything from an earlier snapshot.
    pub fn merge(&mut self, earlier: Results) {
        self.measures.extend(earlier.measures);
        self.errors.extend(earlier.errors);
        self.leaks.extend(earlier.leaks);
    }
}

/// A read-only view of the profiler state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// Depth of the main context.
    pub call_depth: usize,
    pub enabled: bool,
    pub error_count: usize,
    pub leak_count: usize,
    pub measure_count: usize,
    /// Number of registered secondary contexts.
    pub context_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDetails {
    pub errors: Vec<Diagnostic>,
    pub leaks: Vec<LeakRecord>,
    /// Names of the spans open in the main context, outermost first.
    pub open_spans: Vec<String>,
    /// `(context id, depth)` of every registered secondary context.
    pub context_sizes: Vec<(ContextId, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;

    fn names(measures: &[MeasureRecord]) -> Vec<&str> {
        measures.iter().map(|m| m.name.as_str()).collect()
    }

    fn dummy() -> Vec<MeasureRecord> {
        vec![
            MeasureRecord::new("c", 3, 30.0, 30.0),
            MeasureRecord::new("a", 4, 20.0, 80.0),
            MeasureRecord::new("b", 5, 25.0, 50.0),
        ]
    }

    #[test]
    fn averages() {
        let record = MeasureRecord::new("x", 4, 10.0, 20.0);
        assert_eq!(record.avg_self, 2.5);
        assert_eq!(record.avg_total, 5.0);

        let never_closed = MeasureRecord::new("y", 0, 0.0, 0.0);
        assert_eq!(never_closed.avg_self, 0.0);
        assert_eq!(never_closed.avg_total, 0.0);
    }

    #[test]
    fn sort_by_name_ascends() {
        let mut measures = dummy();
        sort_measures(&mut measures, MeasureField::Name);
        assert_eq!(names(&measures), ["a", "b", "c"]);
    }

    #[test]
    fn sort_by_numbers_descends() {
        let mut measures = dummy();
        sort_measures(&mut measures, MeasureField::Count);
        assert_eq!(names(&measures), ["b", "a", "c"]);

        sort_measures(&mut measures, MeasureField::TotalTime);
        assert_eq!(names(&measures), ["a", "b", "c"]);

        sort_measures(&mut measures, MeasureField::AvgSelf);
        assert_eq!(names(&measures), ["c", "a", "b"]);
    }

    #[test]
    fn sort_is_stable() {
        let mut measures = vec![
            MeasureRecord::new("first", 1, 1.0, 1.0),
            MeasureRecord::new("second", 1, 1.0, 1.0),
            MeasureRecord::new("third", 2, 1.0, 1.0),
        ];
        sort_measures(&mut measures, MeasureField::SelfTime);
        assert_eq!(names(&measures), ["first", "second", "third"]);
        sort_measures(&mut measures, MeasureField::Count);
        assert_eq!(names(&measures), ["third", "first", "second"]);
    }

    #[test]
    fn empty_parts_are_not_serialized() {
        let results = Results {
            measures: dummy(),
            ..Results::default()
        };
        let json = serde_json::to_value(&results).unwrap();
        assert!(json.get("errors").is_none());
        assert!(json.get("leaks").is_none());

        let back: Results = serde_json::from_value(json).unwrap();
        assert_eq!(back, results);
    }

    #[test]
    fn merge_appends_everything() {
        let mut results = Results::default();
        assert!(results.is_empty());
        results.merge(Results {
            measures: dummy(),
            errors: vec![Diagnostic::new(DiagnosticKind::NoSuchSpan, 3, None)],
            leaks: vec![LeakRecord {
                path: "a b".to_string(),
                occurrences: 2,
            }],
        });
        assert_eq!(results.measures.len(), 3);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.leaks[0].occurrences, 2);
        assert!(!results.is_empty());
    }
}
