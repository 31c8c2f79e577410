//! Error types for wiring, scheduling, and node execution.
//!
//! The taxonomy separates hard failures from absorbed conditions:
//!
//! - [`ConfigError`]: bad wiring or bad configuration, detected at
//!   construction time and fatal to that call. Never surfaced at runtime.
//! - [`SchedulerError`]: startup failures, fatal to the whole scheduler run
//!   (with rollback of already-started nodes).
//! - [`NodeError`]: a node hook failure. Recorded and reported outward as an
//!   event; does not stop other nodes unless the scheduler's failure policy
//!   says so.
//! - [`EmitError`]: a node emitted on a port that has no edge — a programming
//!   error in the node, surfaced through the hook's own result.
//!
//! Policy-observable events (drops, coalesces) and `Block` suspensions are
//! not errors and never appear here.

use crate::port::PortDirection;
use thiserror::Error;

/// Boxed error returned by node lifecycle hooks.
pub type NodeError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration error raised while building a subgraph or scheduler config.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// A node with the same name is already registered.
  #[error("node '{0}' already exists in subgraph")]
  DuplicateNode(String),

  /// A connect endpoint referenced a node that is not in the subgraph.
  #[error("node '{0}' does not exist in subgraph")]
  UnknownNode(String),

  /// A connect endpoint referenced a port the node does not declare.
  #[error("node '{node}' has no {direction} port '{port}'")]
  UnknownPort {
    /// Node that was addressed.
    node: String,
    /// Port name that was not found.
    port: String,
    /// Direction the endpoint required.
    direction: PortDirection,
  },

  /// Source and sink port payload types differ.
  #[error(
    "type mismatch connecting {source_node}.{source_port} ({source_type}) \
     to {sink_node}.{sink_port} ({sink_type})"
  )]
  TypeMismatch {
    /// Source node name.
    source_node: String,
    /// Source port name.
    source_port: String,
    /// Source payload type name.
    source_type: &'static str,
    /// Sink node name.
    sink_node: String,
    /// Sink port name.
    sink_port: String,
    /// Sink payload type name.
    sink_type: &'static str,
  },

  /// The output port already feeds another edge (fan-out is not allowed).
  #[error("output port '{node}.{port}' is already connected")]
  OutputInUse {
    /// Node owning the port.
    node: String,
    /// Port already in use.
    port: String,
  },

  /// The input port is already fed by another edge (fan-in is not allowed).
  #[error("input port '{node}.{port}' is already connected")]
  InputInUse {
    /// Node owning the port.
    node: String,
    /// Port already in use.
    port: String,
  },

  /// Edge capacity must be at least 1.
  #[error("edge capacity must be greater than zero")]
  ZeroCapacity,

  /// The scheduler tick period must be positive.
  #[error("tick period must be greater than zero")]
  ZeroTickPeriod,

  /// The per-node, per-tick batch limit must be positive.
  #[error("max batch per node must be greater than zero")]
  ZeroMaxBatch,

  /// The idle timeout must be positive.
  #[error("idle timeout must be greater than zero")]
  ZeroIdleTimeout,
}

/// Hard failure surfaced from a scheduler run.
#[derive(Debug, Error)]
pub enum SchedulerError {
  /// A node's `on_start` hook failed; startup was rolled back.
  #[error("node '{node}' failed to start: {reason}")]
  StartupFailed {
    /// Node whose start hook failed.
    node: String,
    /// Error text from the hook.
    reason: String,
  },
}

/// A node emitted on an output port that has no connected edge.
#[derive(Debug, Error)]
#[error("node '{node}' has no edge connected to output port '{port}'")]
pub struct EmitError {
  /// Node that emitted.
  pub node: String,
  /// Port that has no edge.
  pub port: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_config_error_display() {
    let err = ConfigError::UnknownPort {
      node: "agg".to_string(),
      port: "out".to_string(),
      direction: PortDirection::Output,
    };
    assert_eq!(err.to_string(), "node 'agg' has no output port 'out'");

    let err = ConfigError::ZeroCapacity;
    assert_eq!(err.to_string(), "edge capacity must be greater than zero");
  }

  #[test]
  fn test_emit_error_display() {
    let err = EmitError {
      node: "sensor".to_string(),
      port: "out".to_string(),
    };
    assert_eq!(
      err.to_string(),
      "node 'sensor' has no edge connected to output port 'out'"
    );
  }
}
