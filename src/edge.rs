//! Bounded, policy-governed connections between ports.
//!
//! An [`Edge`] is a bounded FIFO buffer connecting exactly one output port to
//! exactly one input port. The edge owns its queue, its fixed capacity, and
//! its [`OverflowPolicy`]; nodes only ever hold port names, so policy
//! enforcement cannot be bypassed. Capacity is fixed at wiring time and never
//! grows, which bounds total in-flight memory to the sum of edge capacities.
//!
//! # Contract
//!
//! - [`try_put`](Edge::try_put) applies the overflow policy when the queue is
//!   full and returns a [`PutOutcome`]. It never blocks the calling thread;
//!   `Block` edges signal suspension by handing the message back.
//! - [`try_take`](Edge::try_take) drains up to `max_n` messages oldest-first.
//!   It is a poll, not a wait: on an empty queue it returns an empty vec.
//! - `queue length <= capacity` holds at every observable instant.
//!
//! The queue is internally synchronized, so a source node's puts and a sink
//! node's takes may run on different workers without a global lock.

use crate::message::Message;
use crate::policy::{OverflowPolicy, PutOutcome};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of an edge within its subgraph.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EdgeId(
  /// Position of the edge in its subgraph's wiring order.
  pub u64,
);

impl std::fmt::Display for EdgeId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "edge-{}", self.0)
  }
}

/// Delivery plane of an edge.
///
/// Control edges are always drained before data edges within a node's tick
/// slice, bounding control-to-effect latency to one tick period regardless of
/// data load.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EdgePlane {
  /// Ordinary payload traffic.
  Data,
  /// Priority traffic, drained first every tick.
  Control,
}

impl std::fmt::Display for EdgePlane {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      EdgePlane::Data => write!(f, "data"),
      EdgePlane::Control => write!(f, "control"),
    }
  }
}

/// A bounded FIFO buffer from one output port to one input port.
pub struct Edge {
  id: EdgeId,
  source_node: String,
  source_port: String,
  sink_node: String,
  sink_port: String,
  capacity: usize,
  plane: EdgePlane,
  policy: OverflowPolicy,
  queue: Mutex<VecDeque<Message>>,
  dropped: AtomicU64,
  coalesced: AtomicU64,
}

impl Edge {
  pub(crate) fn new(
    id: EdgeId,
    source: (String, String),
    sink: (String, String),
    capacity: usize,
    plane: EdgePlane,
    policy: OverflowPolicy,
  ) -> Self {
    Self {
      id,
      source_node: source.0,
      source_port: source.1,
      sink_node: sink.0,
      sink_port: sink.1,
      capacity,
      plane,
      policy,
      queue: Mutex::new(VecDeque::with_capacity(capacity)),
      dropped: AtomicU64::new(0),
      coalesced: AtomicU64::new(0),
    }
  }

  /// Returns the edge identifier.
  #[must_use]
  pub fn id(&self) -> EdgeId {
    self.id
  }

  /// Returns the source node name.
  #[must_use]
  pub fn source_node(&self) -> &str {
    &self.source_node
  }

  /// Returns the source output port name.
  #[must_use]
  pub fn source_port(&self) -> &str {
    &self.source_port
  }

  /// Returns the sink node name.
  #[must_use]
  pub fn sink_node(&self) -> &str {
    &self.sink_node
  }

  /// Returns the sink input port name.
  #[must_use]
  pub fn sink_port(&self) -> &str {
    &self.sink_port
  }

  /// Returns the fixed capacity.
  #[must_use]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the delivery plane.
  #[must_use]
  pub fn plane(&self) -> EdgePlane {
    self.plane
  }

  /// Returns the current queue depth.
  #[must_use]
  pub fn depth(&self) -> usize {
    self.lock_queue().len()
  }

  /// Returns how many messages the `Drop` policy has discarded.
  #[must_use]
  pub fn dropped(&self) -> u64 {
    self.dropped.load(Ordering::Relaxed)
  }

  /// Returns how many merges the `Coalesce` policy has performed.
  #[must_use]
  pub fn coalesced(&self) -> u64 {
    self.coalesced.load(Ordering::Relaxed)
  }

  /// Offers a message to the edge, applying the overflow policy when full.
  ///
  /// Never blocks. `Block` edges return [`PutOutcome::Blocked`] with the
  /// message handed back; the caller is expected to retry once space frees.
  /// `Coalesce` merges only when the queue is at capacity (merge-on-overflow),
  /// so below capacity every message is queued intact.
  pub fn try_put(&self, msg: Message) -> PutOutcome {
    let mut queue = self.lock_queue();
    if queue.len() < self.capacity {
      queue.push_back(msg);
      return PutOutcome::Accepted;
    }
    match &self.policy {
      OverflowPolicy::Block => PutOutcome::Blocked(msg),
      OverflowPolicy::Drop => {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        PutOutcome::Dropped
      }
      OverflowPolicy::Latest => {
        queue.pop_front();
        queue.push_back(msg);
        PutOutcome::Replaced
      }
      OverflowPolicy::Coalesce(merge) => {
        // capacity > 0 and the queue is full, so a tail exists
        let tail = match queue.pop_back() {
          Some(tail) => tail,
          None => {
            queue.push_back(msg);
            return PutOutcome::Accepted;
          }
        };
        queue.push_back(merge(tail, msg));
        self.coalesced.fetch_add(1, Ordering::Relaxed);
        PutOutcome::Coalesced
      }
    }
  }

  /// Drains up to `max_n` messages, oldest first.
  ///
  /// A poll, not a wait: an empty queue yields an empty vec immediately.
  #[must_use]
  pub fn try_take(&self, max_n: usize) -> Vec<Message> {
    let mut queue = self.lock_queue();
    let n = max_n.min(queue.len());
    queue.drain(..n).collect()
  }

  fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Message>> {
    self
      .queue
      .lock()
      .unwrap_or_else(std::sync::PoisonError::into_inner)
  }
}

impl std::fmt::Debug for Edge {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Edge")
      .field("id", &self.id)
      .field("source", &format_args!("{}.{}", self.source_node, self.source_port))
      .field("sink", &format_args!("{}.{}", self.sink_node, self.sink_port))
      .field("capacity", &self.capacity)
      .field("plane", &self.plane)
      .field("policy", &self.policy)
      .field("depth", &self.depth())
      .finish()
  }
}
