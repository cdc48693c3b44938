//! Numeric ranges.
//!
//! A [`Range`] stands in for dice-style values: `[1, 6]` is a d6. Ranges
//! combine purely additively; nothing clamps or normalizes them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive `[min, max]` range.
///
/// # Examples
///
/// ```rust
/// use gearcalc::Range;
///
/// let mut damage = Range::new(1, 6);
/// damage.add(&Range::new(1, 4));
/// assert_eq!(damage, Range::new(2, 10));
/// assert_eq!(damage.to_string(), "[2, 10]");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    min: i32,
    max: i32,
}

impl Range {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Component-wise addition. No clamping.
    pub fn add(&mut self, other: &Range) {
        self.min += other.min;
        self.max += other.max;
    }

    /// Component-wise subtraction; the exact inverse of [`add`](Range::add).
    pub fn subtract(&mut self, other: &Range) {
        self.min -= other.min;
        self.max -= other.max;
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
