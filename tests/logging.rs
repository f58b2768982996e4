use std::cell::Cell;
use std::rc::Rc;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use spanprof::{Handle, Profiler, ProfilerOptions};

/// Keeps every record emitted by the profiler.
struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("spanprof")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

fn take(level: Level) -> Vec<String> {
    let mut records = CAPTURE.records.lock().unwrap();
    let (matching, rest): (Vec<_>, Vec<_>) = records.drain(..).partition(|(l, _)| *l == level);
    *records = rest;
    matching.into_iter().map(|(_, message)| message).collect()
}

// One test function, since the logger is process global.
#[test]
fn profiler_reports_through_the_log_facade() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let time = Rc::new(Cell::new(0u64));
    let clock = Rc::clone(&time);
    let mut profiler = Profiler::new(ProfilerOptions::new(move || clock.get())).unwrap();

    // A new diagnostic is logged once; repeats are deduplicated.
    profiler.end(Handle::Span(4), None);
    profiler.end(Handle::Span(4), None);
    assert_eq!(take(Level::Warn), ["end: no such span: '4'"]);

    // One debug record per discarded frame, naming its full path.
    let outer = profiler.begin("outer", None).unwrap();
    profiler.begin("middle", None).unwrap();
    profiler.begin("inner", None).unwrap();
    profiler.end(outer, None);
    assert_eq!(
        take(Level::Debug),
        [
            "leaked span: 'outer middle inner'",
            "leaked span: 'outer middle'"
        ]
    );

    profiler.results(None, None);
    let drains = take(Level::Trace);
    assert_eq!(drains.len(), 1);
    assert!(drains[0].starts_with("drained 3 measure(s)"));

    profiler.setup(ProfilerOptions::new(|| 0u64)).unwrap();
    assert_eq!(take(Level::Info).len(), 1);
}
