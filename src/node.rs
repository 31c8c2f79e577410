//! Core node trait and the scheduler-mediated execution context.
//!
//! A node is a unit of behavior with zero or more typed ports and lifecycle
//! hooks. Nodes hold no reference to scheduling internals: every hook
//! receives a [`NodeContext`] through which output happens, so overflow
//! policies are always enforced by the owning edge and never bypassed.
//!
//! ## Lifecycle
//!
//! The scheduler drives every state transition; a node never transitions
//! itself:
//!
//! - `Created` → `Started` when `on_start` returns successfully
//! - `Started` → `Running` once the node has processed its first tick
//! - `Running` → `Stopped` when `on_stop` returns
//!
//! ## Hooks
//!
//! All hooks default to no-ops and run to completion before the scheduler
//! proceeds — there is no suspension visible to the scheduler. Within one
//! tick slice a node sees all eligible control messages before any data
//! message, then gets one `on_tick` call to generate work.
//!
//! ## Emitting
//!
//! [`NodeContext::emit`] offers a message to the edge wired to the named
//! output port. On a full `Block` edge the message is parked by the runtime
//! and retried on later ticks in block order — it is never silently dropped.
//! The producer sees [`EmitOutcome::Parked`] and is expected to treat the
//! port as suspended until the backlog clears.

use crate::edge::Edge;
use crate::error::{EmitError, NodeError};
use crate::event::{EventSink, RuntimeEvent};
use crate::message::Message;
use crate::metrics;
use crate::policy::PutOutcome;
use crate::port::Port;
use crate::time::Tick;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};

/// Lifecycle state of a node, driven exclusively by the scheduler.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeState {
  /// Constructed and registered, start hook not yet invoked.
  Created,
  /// Start hook returned successfully.
  Started,
  /// Has processed at least one tick.
  Running,
  /// Stop hook has been invoked; terminal.
  Stopped,
}

/// What the producer observed for a single emit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EmitOutcome {
  /// The message was appended to the edge queue.
  Enqueued,
  /// The message was merged into the queued tail (`Coalesce`).
  Coalesced,
  /// The oldest queued message was evicted to admit this one (`Latest`).
  Replaced,
  /// The message was discarded (`Drop`). Counted, not an error.
  Dropped,
  /// The edge is full under `Block`; the runtime parked the message and will
  /// retry on later ticks in block order. The port is suspended until the
  /// backlog clears.
  Parked,
}

pub(crate) struct PendingSend {
  pub(crate) edge: usize,
  pub(crate) msg: Message,
}

/// Scheduler-mediated handle passed to every node hook.
///
/// Grants access to the current tick, the node's identity, and policy-checked
/// output through [`emit`](Self::emit). Nodes never see edges directly.
pub struct NodeContext<'a> {
  graph: &'a str,
  node: &'a str,
  tick: Tick,
  edges: &'a [Edge],
  routes: &'a HashMap<String, usize>,
  pending: &'a mut VecDeque<PendingSend>,
  events: &'a dyn EventSink,
}

impl<'a> NodeContext<'a> {
  pub(crate) fn new(
    graph: &'a str,
    node: &'a str,
    tick: Tick,
    edges: &'a [Edge],
    routes: &'a HashMap<String, usize>,
    pending: &'a mut VecDeque<PendingSend>,
    events: &'a dyn EventSink,
  ) -> Self {
    Self {
      graph,
      node,
      tick,
      edges,
      routes,
      pending,
      events,
    }
  }

  /// Returns the name of the subgraph this node runs in.
  #[must_use]
  pub fn graph(&self) -> &str {
    self.graph
  }

  /// Returns this node's name.
  #[must_use]
  pub fn node(&self) -> &str {
    self.node
  }

  /// Returns the current logical tick.
  #[must_use]
  pub fn tick(&self) -> Tick {
    self.tick
  }

  /// Offers a message to the edge wired to the named output port.
  ///
  /// The edge applies its overflow policy; the outcome tells the producer
  /// what happened. A full `Block` edge parks the message inside the runtime
  /// for FIFO retry on later ticks — emitting again onto a suspended port
  /// queues behind the parked backlog, preserving order.
  ///
  /// # Errors
  ///
  /// Returns [`EmitError`] if no edge is connected to `port`.
  pub fn emit(&mut self, port: &str, msg: Message) -> Result<EmitOutcome, EmitError> {
    let Some(&idx) = self.routes.get(port) else {
      return Err(EmitError {
        node: self.node.to_string(),
        port: port.to_string(),
      });
    };
    // A parked backlog means the port is suspended: queue behind it so the
    // sink still observes messages in emit order.
    if self.pending.iter().any(|p| p.edge == idx) {
      self.pending.push_back(PendingSend { edge: idx, msg });
      return Ok(EmitOutcome::Parked);
    }
    let edge = &self.edges[idx];
    match edge.try_put(msg) {
      PutOutcome::Accepted => Ok(EmitOutcome::Enqueued),
      PutOutcome::Coalesced => {
        self
          .events
          .on_event(&RuntimeEvent::MessageCoalesced { edge: edge.id() });
        metrics::record_coalesced(self.graph, edge.id());
        Ok(EmitOutcome::Coalesced)
      }
      PutOutcome::Replaced => Ok(EmitOutcome::Replaced),
      PutOutcome::Dropped => {
        self
          .events
          .on_event(&RuntimeEvent::MessageDropped { edge: edge.id() });
        metrics::record_dropped(self.graph, edge.id());
        Ok(EmitOutcome::Dropped)
      }
      PutOutcome::Blocked(msg) => {
        tracing::trace!(
          node = %self.node,
          port = %port,
          "output edge full, parking message for retry"
        );
        self.pending.push_back(PendingSend { edge: idx, msg });
        Ok(EmitOutcome::Parked)
      }
    }
  }
}

/// A unit of behavior with typed ports and scheduler-driven lifecycle hooks.
///
/// Implement one `Node` type per node kind; the scheduler dispatches through
/// this interface (trait polymorphism, flat variant set). Every hook runs to
/// completion before the scheduler proceeds.
#[async_trait]
pub trait Node: Send {
  /// Returns the node's name, unique within its subgraph.
  fn name(&self) -> &str;

  /// Returns the node's declared input ports.
  fn input_ports(&self) -> &[Port];

  /// Returns the node's declared output ports.
  fn output_ports(&self) -> &[Port];

  /// Invoked once, in declared subgraph order, before any tick runs.
  ///
  /// A failure here aborts the whole startup: already-started nodes are
  /// stopped in reverse order and the scheduler run fails.
  async fn on_start(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
    let _ = ctx;
    Ok(())
  }

  /// Invoked for each message drained from a control-plane input edge.
  ///
  /// Within a tick slice, every eligible control message is dispatched
  /// before any data message.
  async fn on_control(
    &mut self,
    ctx: &mut NodeContext<'_>,
    port: &str,
    msg: Message,
  ) -> Result<(), NodeError> {
    let _ = (ctx, port, msg);
    Ok(())
  }

  /// Invoked for each message drained from a data-plane input edge.
  async fn on_data(
    &mut self,
    ctx: &mut NodeContext<'_>,
    port: &str,
    msg: Message,
  ) -> Result<(), NodeError> {
    let _ = (ctx, port, msg);
    Ok(())
  }

  /// Invoked once per tick after message dispatch.
  ///
  /// Source nodes generate work here; most other nodes leave the default.
  async fn on_tick(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
    let _ = ctx;
    Ok(())
  }

  /// Invoked exactly once during shutdown, in reverse start order.
  ///
  /// May flush pending output but must not assume further ticks will run
  /// after it returns.
  async fn on_stop(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
    let _ = ctx;
    Ok(())
  }
}
