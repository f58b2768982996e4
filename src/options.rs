use std::fmt;

use crate::error::ProfilerError;
use crate::time::{Clock, MonotonicClock};

/// Default number of output units per tick of the default clock: nanosecond ticks reported as
/// microseconds.
pub const DEFAULT_TIME_SCALE: f64 = 0.001;

/// Configuration of a [`Profiler`](crate::Profiler): where time comes from and how raw clock
/// ticks are scaled when durations are reported.
///
/// ```rust
/// use spanprof::ProfilerOptions;
///
/// // A clock counting milliseconds, reported in microseconds.
/// let start = std::time::Instant::now();
/// let options = ProfilerOptions::new(move || start.elapsed().as_millis() as u64)
///     .with_time_scale(1000.0);
/// assert_eq!(options.time_scale(), 1000.0);
/// ```
pub struct ProfilerOptions<T> {
    clock: Box<dyn Clock<T>>,
    time_scale: f64,
}

impl<T> ProfilerOptions<T> {
    /// Options reading time from `clock`, with a time scale of 1.
    pub fn new(clock: impl Clock<T> + 'static) -> Self {
        ProfilerOptions {
            clock: Box::new(clock),
            time_scale: 1.0,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock<T> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sets the number of output units per clock tick. Reported durations are the raw tick
    /// sums multiplied by this value.
    #[must_use]
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub(crate) fn validate(&self) -> Result<(), ProfilerError> {
        if self.time_scale.is_finite() && self.time_scale > 0.0 {
            Ok(())
        } else {
            Err(ProfilerError::InvalidOptions(format!(
                "time scale must be a positive finite number, got {}",
                self.time_scale
            )))
        }
    }

    #[inline]
    pub(crate) fn now(&mut self) -> T {
        self.clock.now()
    }
}

impl Default for ProfilerOptions<u64> {
    fn default() -> Self {
        ProfilerOptions::new(MonotonicClock::new()).with_time_scale(DEFAULT_TIME_SCALE)
    }
}

impl Default for ProfilerOptions<u128> {
    fn default() -> Self {
        ProfilerOptions::new(MonotonicClock::new()).with_time_scale(DEFAULT_TIME_SCALE)
    }
}

impl<T> fmt::Debug for ProfilerOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilerOptions")
            .field("time_scale", &self.time_scale)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reports_microseconds() {
        let options = ProfilerOptions::<u64>::default();
        assert_eq!(options.time_scale(), DEFAULT_TIME_SCALE);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_time_scales() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let options = ProfilerOptions::new(|| 0u64).with_time_scale(scale);
            assert!(matches!(
                options.validate(),
                Err(ProfilerError::InvalidOptions(_))
            ));
        }
    }

    #[test]
    fn clock_can_be_replaced() {
        let mut options = ProfilerOptions::new(|| 1u64).with_clock(|| 2u64);
        assert_eq!(options.now(), 2);
    }
}
