//! Overflow policies applied when an edge is full at put time.
//!
//! Every edge carries one [`OverflowPolicy`] fixed at wiring time. The policy
//! decides what `try_put` does with an arriving message once the queue has
//! reached capacity:
//!
//! - [`Block`](OverflowPolicy::Block): hand the message back as a suspension
//!   signal; the scheduler parks it and retries on later ticks, FIFO by
//!   block time.
//! - [`Drop`](OverflowPolicy::Drop): discard the arriving message, queue
//!   unchanged. A counted event, not an error.
//! - [`Latest`](OverflowPolicy::Latest): evict the oldest queued message to
//!   admit the new one. With capacity 1 this degenerates to overwrite.
//! - [`Coalesce`](OverflowPolicy::Coalesce): merge the arriving message into
//!   the queued tail with a caller-supplied function; queue length does not
//!   grow and a consumer never observes the un-merged pre-image.
//!
//! The merge function must be deterministic and pure, and associative over
//! repeated application within a tick. Violations are a caller bug, not a
//! runtime-detected error: a non-associative merge still yields results that
//! are deterministic for a fixed arrival order, just order-dependent.

use crate::message::Message;
use std::sync::Arc;

/// Caller-supplied merge function for [`OverflowPolicy::Coalesce`].
///
/// Invoked as `merge(old_tail, new)`; the returned message replaces the tail.
/// Stored in the edge configuration at wiring time. Use a pure `fn` or a
/// closure without mutable capture so merges stay deterministic.
pub type MergeFn = Arc<dyn Fn(Message, Message) -> Message + Send + Sync>;

/// The rule applied when an edge is full at put time.
#[derive(Clone)]
pub enum OverflowPolicy {
  /// Suspend the producer until space frees.
  Block,
  /// Discard the arriving message.
  Drop,
  /// Evict the oldest queued message to admit the new one.
  Latest,
  /// Merge the arriving message into the queued tail.
  Coalesce(MergeFn),
}

impl OverflowPolicy {
  /// Builds a `Coalesce` policy from a merge function.
  #[must_use]
  pub fn coalesce<F>(merge: F) -> Self
  where
    F: Fn(Message, Message) -> Message + Send + Sync + 'static,
  {
    OverflowPolicy::Coalesce(Arc::new(merge))
  }
}

impl std::fmt::Debug for OverflowPolicy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      OverflowPolicy::Block => write!(f, "Block"),
      OverflowPolicy::Drop => write!(f, "Drop"),
      OverflowPolicy::Latest => write!(f, "Latest"),
      OverflowPolicy::Coalesce(_) => write!(f, "Coalesce"),
    }
  }
}

/// Outcome of a single `try_put` against an edge.
///
/// `Accepted`, `Coalesced`, and `Replaced` mean the message's information
/// entered the queue; `Dropped` means it was discarded under the `Drop`
/// policy; `Blocked` is a suspension signal handing the message back to the
/// caller for a later retry. Only `Block` edges ever return `Blocked`.
#[derive(Debug)]
pub enum PutOutcome {
  /// The message was appended; the queue had room.
  Accepted,
  /// The message was merged into the queued tail.
  Coalesced,
  /// The oldest queued message was evicted to admit this one.
  Replaced,
  /// The message was discarded; the queue is unchanged.
  Dropped,
  /// The queue is full; the message is handed back for retry.
  Blocked(Message),
}

impl PutOutcome {
  /// Returns true if the message's information entered the queue.
  #[must_use]
  pub fn is_admitted(&self) -> bool {
    matches!(
      self,
      PutOutcome::Accepted | PutOutcome::Coalesced | PutOutcome::Replaced
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_policy_debug_format() {
    assert_eq!(format!("{:?}", OverflowPolicy::Block), "Block");
    assert_eq!(format!("{:?}", OverflowPolicy::Drop), "Drop");
    assert_eq!(format!("{:?}", OverflowPolicy::Latest), "Latest");
    let policy = OverflowPolicy::coalesce(|_, new| new);
    assert_eq!(format!("{policy:?}"), "Coalesce");
  }

  #[test]
  fn test_put_outcome_admitted() {
    assert!(PutOutcome::Accepted.is_admitted());
    assert!(PutOutcome::Coalesced.is_admitted());
    assert!(PutOutcome::Replaced.is_admitted());
    assert!(!PutOutcome::Dropped.is_admitted());
    assert!(!PutOutcome::Blocked(Message::new(0u8)).is_admitted());
  }
}
