//! Time values and time sources.
//!
//! The profiler is generic over the numeric type its clock returns. All accumulation happens in
//! that type, starting from [`TimeValue::ZERO`], so one profiler never mixes representations.
//! Implementations are provided for `u64`, `u128`, `i64` and `f64`; use `u128` for clocks with
//! very wide raw counters.

use std::fmt::Debug;
use std::ops::{AddAssign, Sub};
use std::time::Instant;

/// A timestamp or duration as produced by a [`Clock`].
pub trait TimeValue:
    Copy + Debug + Default + PartialOrd + AddAssign + Sub<Output = Self> + 'static
{
    const ZERO: Self;

    /// `self - earlier`, clamped at zero for clocks that step backwards.
    fn elapsed_since(self, earlier: Self) -> Self {
        if self > earlier {
            self - earlier
        } else {
            Self::ZERO
        }
    }

    fn to_f64(self) -> f64;
}

macro_rules! impl_time_value {
    ($($ty:ty => $zero:expr),* $(,)?) => {
        $(
            impl TimeValue for $ty {
                const ZERO: Self = $zero;

                #[allow(
                    clippy::cast_precision_loss,
                    clippy::cast_lossless,
                    clippy::unnecessary_cast
                )]
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_time_value!(u64 => 0, u128 => 0, i64 => 0, f64 => 0.0);

/// A source of monotonically non-decreasing timestamps.
pub trait Clock<T> {
    fn now(&mut self) -> T;
}

impl<T, F: FnMut() -> T> Clock<T> for F {
    #[inline]
    fn now(&mut self) -> T {
        self()
    }
}

/// Nanoseconds elapsed since the clock was created, read from [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock<u64> for MonotonicClock {
    #[allow(clippy::cast_possible_truncation)]
    #[inline]
    fn now(&mut self) -> u64 {
        // Truncation needs a run of more than five centuries.
        self.origin.elapsed().as_nanos() as u64
    }
}

impl Clock<u128> for MonotonicClock {
    #[inline]
    fn now(&mut self) -> u128 {
        self.origin.elapsed().as_nanos()
    }
}
