//! Rational media timestamps
//!
//! Presentation times are kept as `value / timescale` integer pairs. Segment
//! durations are resolved by adding and subtracting many of these, so they
//! are never collapsed to floating-point seconds until rendering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A rational timestamp or duration: `value / timescale` seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MediaTime {
    pub value: i64,
    pub timescale: u32,
}

/// Rounding applied when converting between timescales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    TowardPositiveInfinity,
    TowardZero,
    Nearest,
}

impl MediaTime {
    pub const fn new(value: i64, timescale: u32) -> Self {
        Self { value, timescale }
    }

    pub const fn zero() -> Self {
        Self::new(0, 1)
    }

    /// Duration of `count` samples at `rate` Hz.
    pub fn from_samples(count: usize, rate: u32) -> Self {
        Self::new(count as i64, rate)
    }

    pub fn seconds(&self) -> f64 {
        if self.timescale == 0 {
            return 0.0;
        }
        self.value as f64 / self.timescale as f64
    }

    /// Convert to another timescale.
    pub fn rescale(&self, timescale: u32, rounding: Rounding) -> Self {
        if timescale == self.timescale {
            return *self;
        }
        if self.timescale == 0 || timescale == 0 {
            return Self::new(0, timescale.max(1));
        }
        let num = self.value as i128 * timescale as i128;
        let value = div_round(num, self.timescale as i128, rounding);
        Self::new(clamp_i64(value), timescale)
    }

    /// The same instant as a `chrono::Duration` (nanosecond precision).
    pub fn to_chrono(&self) -> chrono::Duration {
        let nanos = self.rescale(1_000_000_000, Rounding::Nearest).value;
        chrono::Duration::nanoseconds(nanos)
    }

    fn cross(&self, other: &Self) -> (i128, i128) {
        (
            self.value as i128 * other.timescale as i128,
            other.value as i128 * self.timescale as i128,
        )
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Least common multiple when it fits, otherwise the finer of the two.
fn common_timescale(a: u32, b: u32) -> u32 {
    if a == b {
        return a;
    }
    if a == 0 || b == 0 {
        return a.max(b).max(1);
    }
    let lcm = a as u64 / gcd(a as u64, b as u64) * b as u64;
    if lcm <= u32::MAX as u64 {
        lcm as u32
    } else {
        a.max(b)
    }
}

fn div_round(num: i128, den: i128, rounding: Rounding) -> i128 {
    let floor = num.div_euclid(den);
    let rem = num.rem_euclid(den);
    if rem == 0 {
        return floor;
    }
    match rounding {
        Rounding::TowardPositiveInfinity => floor + 1,
        Rounding::TowardZero => {
            if num < 0 {
                floor + 1
            } else {
                floor
            }
        }
        Rounding::Nearest => {
            if rem * 2 >= den {
                floor + 1
            } else {
                floor
            }
        }
    }
}

fn clamp_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl Add for MediaTime {
    type Output = MediaTime;

    fn add(self, rhs: MediaTime) -> MediaTime {
        let ts = common_timescale(self.timescale, rhs.timescale);
        let a = self.rescale(ts, Rounding::Nearest);
        let b = rhs.rescale(ts, Rounding::Nearest);
        MediaTime::new(a.value.saturating_add(b.value), ts)
    }
}

impl Sub for MediaTime {
    type Output = MediaTime;

    fn sub(self, rhs: MediaTime) -> MediaTime {
        let ts = common_timescale(self.timescale, rhs.timescale);
        let a = self.rescale(ts, Rounding::Nearest);
        let b = rhs.rescale(ts, Rounding::Nearest);
        MediaTime::new(a.value.saturating_sub(b.value), ts)
    }
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = self.cross(other);
        a == b
    }
}

impl Eq for MediaTime {}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaTime {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = self.cross(other);
        a.cmp(&b)
    }
}

impl Default for MediaTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.timescale)
    }
}
