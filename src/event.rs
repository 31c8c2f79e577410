//! Discrete runtime events for external observability collaborators.
//!
//! The scheduler and edges emit [`RuntimeEvent`]s through an [`EventSink`]
//! installed on the scheduler. Each event carries enough identifying context
//! (node id, port name, edge id) for a collaborator to reconstruct
//! queue-depth and latency metrics without the core depending on any
//! specific metrics backend.
//!
//! [`TracingSink`] is the default sink and forwards events to structured
//! `tracing` records. [`RecordingSink`] buffers events in memory and is
//! intended for tests and diagnostics.

use crate::edge::{EdgeId, EdgePlane};
use std::sync::Mutex;

/// A discrete event produced by the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeEvent {
  /// A node's start hook completed successfully.
  NodeStarted {
    /// Node that started.
    node: String,
  },
  /// A node's stop hook completed.
  NodeStopped {
    /// Node that stopped.
    node: String,
  },
  /// A message was dispatched to a node handler.
  MessageDelivered {
    /// Plane of the edge the message arrived on.
    plane: EdgePlane,
    /// Receiving node.
    node: String,
    /// Receiving input port.
    port: String,
  },
  /// An edge discarded a message under the `Drop` policy.
  MessageDropped {
    /// Edge that discarded the message.
    edge: EdgeId,
  },
  /// An edge merged a message under the `Coalesce` policy.
  MessageCoalesced {
    /// Edge that merged the message.
    edge: EdgeId,
  },
  /// Sustained inactivity reached the configured idle timeout.
  IdleTimeoutFired,
  /// All stop hooks have returned; the scheduler is terminal.
  ShutdownComplete,
}

/// Receiver for runtime events.
///
/// Implementations must be cheap and non-blocking; the scheduler invokes the
/// sink synchronously on its tick path.
pub trait EventSink: Send + Sync {
  /// Called once per event, in emission order.
  fn on_event(&self, event: &RuntimeEvent);
}

/// Default sink: forwards events to structured `tracing` records.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
  /// Creates a new tracing sink.
  #[must_use]
  pub fn new() -> Self {
    Self
  }
}

impl EventSink for TracingSink {
  fn on_event(&self, event: &RuntimeEvent) {
    match event {
      RuntimeEvent::NodeStarted { node } => {
        tracing::info!(node = %node, "node started");
      }
      RuntimeEvent::NodeStopped { node } => {
        tracing::info!(node = %node, "node stopped");
      }
      RuntimeEvent::MessageDelivered { plane, node, port } => {
        tracing::trace!(plane = %plane, node = %node, port = %port, "message delivered");
      }
      RuntimeEvent::MessageDropped { edge } => {
        tracing::debug!(edge = %edge, "message dropped");
      }
      RuntimeEvent::MessageCoalesced { edge } => {
        tracing::trace!(edge = %edge, "message coalesced");
      }
      RuntimeEvent::IdleTimeoutFired => {
        tracing::info!("idle timeout fired, draining");
      }
      RuntimeEvent::ShutdownComplete => {
        tracing::info!("shutdown complete");
      }
    }
  }
}

/// Sink that buffers every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
  events: Mutex<Vec<RuntimeEvent>>,
}

impl RecordingSink {
  /// Creates an empty recording sink.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns a snapshot of the events recorded so far.
  #[must_use]
  pub fn events(&self) -> Vec<RuntimeEvent> {
    self
      .events
      .lock()
      .unwrap_or_else(std::sync::PoisonError::into_inner)
      .clone()
  }
}

impl EventSink for RecordingSink {
  fn on_event(&self, event: &RuntimeEvent) {
    self
      .events
      .lock()
      .unwrap_or_else(std::sync::PoisonError::into_inner)
      .push(event.clone());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_recording_sink_preserves_order() {
    let sink = RecordingSink::new();
    sink.on_event(&RuntimeEvent::NodeStarted {
      node: "a".to_string(),
    });
    sink.on_event(&RuntimeEvent::IdleTimeoutFired);
    sink.on_event(&RuntimeEvent::ShutdownComplete);

    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert_eq!(
      events[0],
      RuntimeEvent::NodeStarted {
        node: "a".to_string()
      }
    );
    assert_eq!(events[2], RuntimeEvent::ShutdownComplete);
  }
}
