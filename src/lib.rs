//! # Tickweave
//!
//! Tick-driven, in-process dataflow in pure Rust.
//!
//! Tickweave runs independent processing units ("nodes") that exchange typed
//! messages over bounded, capacity-limited connections ("edges"), driven by
//! a tick-based scheduler. The design goals are fixed: bounded memory (every
//! edge has a capacity chosen at wiring time), bounded latency for
//! control-plane signals (control edges drain before data edges every tick),
//! and deterministic startup/shutdown (declared order up, reverse order
//! down).
//!
//! ## Key Properties
//!
//! - **Bounded queues everywhere**: an edge never holds more messages than
//!   its capacity; total in-flight memory is known at wiring time
//! - **Explicit overflow policy**: full edges Block, Drop, keep Latest, or
//!   Coalesce — chosen per edge, enforced by the edge
//! - **Control-plane priority**: a control message is handled at most one
//!   tick after it is enqueued, regardless of data load
//! - **Deterministic order**: delivery follows declared subgraph order;
//!   identical inputs and cadence give identical interleavings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tickweave::edge::EdgePlane;
//! use tickweave::policy::OverflowPolicy;
//! use tickweave::scheduler::{Scheduler, SchedulerConfig};
//! use tickweave::subgraph::Subgraph;
//!
//! # async fn example(
//! #   sensor: Box<dyn tickweave::node::Node>,
//! #   sink: Box<dyn tickweave::node::Node>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = Subgraph::new("pipeline");
//! graph.add_node(sensor)?;
//! graph.add_node(sink)?;
//! graph.connect(
//!   ("sensor", "out"),
//!   ("sink", "in"),
//!   256,
//!   EdgePlane::Data,
//!   OverflowPolicy::Block,
//! )?;
//!
//! let config = SchedulerConfig::new(
//!   Duration::from_millis(10),
//!   64,
//!   Duration::from_millis(500),
//! )?;
//! let report = Scheduler::new(graph, config).run().await?;
//! # Ok(())
//! # }
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Bounded, policy-governed connections between ports.
pub mod edge;
/// Error types for wiring, scheduling, and node execution.
pub mod error;
/// Discrete runtime events for observability collaborators.
pub mod event;
/// Message envelope moved across edges.
pub mod message;
/// Prometheus-compatible metrics facade for production observability.
pub mod metrics;
/// Core node trait and the scheduler-mediated execution context.
pub mod node;
/// Overflow policies applied when an edge is full.
pub mod policy;
/// Typed attachment points for nodes.
pub mod port;
/// Tick-driven scheduler: priority draining, idle timeout, lifecycle.
pub mod scheduler;
/// Static wiring of nodes and edges.
pub mod subgraph;
/// Logical tick time.
pub mod time;
