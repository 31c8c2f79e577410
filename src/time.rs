//! Logical tick time for scheduling progress and ordering.
//!
//! This module provides [`Tick`], the logical clock value attached to every
//! scheduling round. Tick time is not wall-clock time; it is a monotonically
//! increasing round index driven by the scheduler. The default value is the
//! minimum and is the value observed by `on_start` hooks before the first
//! round has run.

/// Logical tick attached to scheduling rounds for ordering and progress.
///
/// Used to correlate deliveries with the round that dispatched them, to
/// timestamp recorded node failures, and to bound control-to-effect latency
/// ("handled no later than tick T+1"). Implements [`Ord`] and [`Default`] (0)
/// so it can be used as a totally ordered logical timestamp.
#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  Eq,
  Hash,
  PartialEq,
  PartialOrd,
  Ord,
  serde::Serialize,
  serde::Deserialize,
)]
pub struct Tick(
  /// Raw round index.
  pub u64,
);

impl Tick {
  /// Creates a new tick from a raw round index.
  #[inline]
  pub const fn new(t: u64) -> Self {
    Self(t)
  }

  /// Returns the raw u64 round index.
  #[inline]
  pub const fn as_u64(self) -> u64 {
    self.0
  }

  /// Returns the minimum tick (same as `Default::default()`).
  #[inline]
  pub const fn minimum() -> Self {
    Self(0)
  }

  /// Returns the tick immediately after this one.
  #[inline]
  pub const fn next(self) -> Self {
    Self(self.0 + 1)
  }
}

impl std::fmt::Display for Tick {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "tick:{}", self.0)
  }
}
