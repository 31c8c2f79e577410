//! Tick-driven scheduler: priority draining, idle timeout, ordered lifecycle.
//!
//! The scheduler owns one [`Subgraph`] and drives it in discrete ticks on a
//! single logical clock. Each tick it delivers control-plane messages, then
//! data-plane messages, to every node up to a per-node batch budget, then
//! gives each node an `on_tick` call to generate work. Delivery follows
//! declared subgraph order, so two runs with identical inputs and identical
//! cadence produce identical interleavings.
//!
//! ## State machine
//!
//! `Idle → Running → Draining → Stopped` (terminal). `Idle` is pre-start.
//! `Running` is the steady tick loop. `Draining` begins when the idle
//! timeout fires, when a startup failure forces rollback, or when the
//! failure policy escalates a handler error. `Stopped` is terminal; no
//! further ticks occur.
//!
//! ## Per-tick algorithm
//!
//! 1. Re-attempt parked producer sends, FIFO by block time, before any
//!    dispatch.
//! 2. For every node in declared order: drain each control-plane input edge
//!    up to `max_batch_per_node` and dispatch synchronously to `on_control`;
//!    then drain data-plane input edges up to the remaining budget into
//!    `on_data`; then invoke `on_tick`.
//! 3. If nothing was delivered across the whole tick, accumulate idle time;
//!    once accumulated idle time reaches the configured timeout, transition
//!    to `Draining`.
//!
//! Because a node's control edges are fully drained (bounded by the batch
//! budget) before any data message reaches it, control-to-effect latency is
//! bounded by one tick period regardless of data-plane load.
//!
//! ## Shutdown
//!
//! Stop hooks run in the reverse of start order, exactly once per started
//! node, even for nodes that recorded failures while running. A start-hook
//! failure aborts the whole startup and rolls back the already-started
//! subset in reverse order before the error is returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tickweave::scheduler::{Scheduler, SchedulerConfig};
//! use tickweave::subgraph::Subgraph;
//!
//! # async fn example(graph: Subgraph) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SchedulerConfig::new(
//!   Duration::from_millis(10),
//!   64,
//!   Duration::from_millis(500),
//! )?;
//! let report = Scheduler::new(graph, config).run().await?;
//! println!("delivered {} messages over {} ticks", report.delivered, report.ticks);
//! # Ok(())
//! # }
//! ```

use crate::edge::EdgePlane;
use crate::error::{ConfigError, NodeError, SchedulerError};
use crate::event::{EventSink, RuntimeEvent, TracingSink};
use crate::metrics;
use crate::node::{Node, NodeContext, NodeState, PendingSend};
use crate::policy::PutOutcome;
use crate::subgraph::Subgraph;
use crate::time::Tick;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Scheduler timing and batching configuration.
///
/// All three values are required and must be positive; there are no implicit
/// defaults that could mask misconfiguration. Construct via
/// [`SchedulerConfig::new`].
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct SchedulerConfig {
  tick_period: Duration,
  max_batch_per_node: usize,
  idle_timeout: Duration,
}

impl SchedulerConfig {
  /// Validates and builds a configuration.
  ///
  /// # Errors
  ///
  /// Returns a [`ConfigError`] if any value is zero.
  pub fn new(
    tick_period: Duration,
    max_batch_per_node: usize,
    idle_timeout: Duration,
  ) -> Result<Self, ConfigError> {
    if tick_period.is_zero() {
      return Err(ConfigError::ZeroTickPeriod);
    }
    if max_batch_per_node == 0 {
      return Err(ConfigError::ZeroMaxBatch);
    }
    if idle_timeout.is_zero() {
      return Err(ConfigError::ZeroIdleTimeout);
    }
    Ok(Self {
      tick_period,
      max_batch_per_node,
      idle_timeout,
    })
  }

  /// Returns the interval between ticks.
  #[must_use]
  pub fn tick_period(&self) -> Duration {
    self.tick_period
  }

  /// Returns the per-node, per-tick delivery budget.
  #[must_use]
  pub fn max_batch_per_node(&self) -> usize {
    self.max_batch_per_node
  }

  /// Returns the inactivity duration that triggers graceful shutdown.
  #[must_use]
  pub fn idle_timeout(&self) -> Duration {
    self.idle_timeout
  }
}

/// Lifecycle state of a scheduler instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchedulerState {
  /// Pre-start; no hooks have run.
  Idle,
  /// The steady tick loop.
  Running,
  /// Shutdown in progress; stop hooks are being invoked.
  Draining,
  /// Terminal. No further ticks occur.
  Stopped,
}

/// What to do when a node handler returns a failure while running.
///
/// Handler failures are recorded and reported either way; this knob only
/// decides whether the graph keeps ticking. The default is
/// [`Continue`](FailurePolicy::Continue) — there is deliberately no implicit
/// "fail the whole graph" behavior.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FailurePolicy {
  /// Record the failure and keep ticking (default).
  #[default]
  Continue,
  /// Record the failure and drain the whole graph.
  Drain,
}

/// A recorded node handler failure.
#[derive(Clone, Debug)]
pub struct NodeFailure {
  /// Node whose handler failed.
  pub node: String,
  /// Error text from the handler.
  pub error: String,
  /// Tick during which the failure occurred.
  pub tick: Tick,
  /// Wall-clock time the failure was recorded.
  pub at: DateTime<Utc>,
}

/// Summary returned by a completed scheduler run.
#[derive(Debug)]
pub struct SchedulerReport {
  /// Total ticks executed.
  pub ticks: u64,
  /// Total messages dispatched to handlers.
  pub delivered: u64,
  /// Handler failures recorded during the run, in order.
  pub failures: Vec<NodeFailure>,
}

/// Tick-driven executor owning one subgraph.
pub struct Scheduler {
  subgraph: Subgraph,
  config: SchedulerConfig,
  failure_policy: FailurePolicy,
  events: Arc<dyn EventSink>,
  state: SchedulerState,
  graph_name: String,
  node_names: Vec<String>,
  node_states: Vec<NodeState>,
  /// Per node: output port name -> edge index.
  routes: Vec<HashMap<String, usize>>,
  /// Per node: control-plane input edge indices, in wiring order.
  control_inputs: Vec<Vec<usize>>,
  /// Per node: data-plane input edge indices, in wiring order.
  data_inputs: Vec<Vec<usize>>,
  /// Parked producer sends awaiting space, FIFO by block time.
  pending: VecDeque<PendingSend>,
  tick: Tick,
  delivered_total: u64,
  failures: Vec<NodeFailure>,
}

impl Scheduler {
  /// Creates a scheduler owning the given subgraph.
  ///
  /// Wiring is frozen from this point: the routing tables the tick loop uses
  /// are derived here.
  #[must_use]
  pub fn new(subgraph: Subgraph, config: SchedulerConfig) -> Self {
    let node_count = subgraph.node_count();
    let mut routes = vec![HashMap::new(); node_count];
    let mut control_inputs = vec![Vec::new(); node_count];
    let mut data_inputs = vec![Vec::new(); node_count];

    for (e_idx, edge) in subgraph.edges().iter().enumerate() {
      if let Some(i) = subgraph.node_index(edge.source_node()) {
        routes[i].insert(edge.source_port().to_string(), e_idx);
      }
      if let Some(i) = subgraph.node_index(edge.sink_node()) {
        match edge.plane() {
          EdgePlane::Control => control_inputs[i].push(e_idx),
          EdgePlane::Data => data_inputs[i].push(e_idx),
        }
      }
    }

    let graph_name = subgraph.name().to_string();
    let node_names = subgraph.node_names();
    Self {
      subgraph,
      config,
      failure_policy: FailurePolicy::default(),
      events: Arc::new(TracingSink::new()),
      state: SchedulerState::Idle,
      graph_name,
      node_states: vec![NodeState::Created; node_count],
      node_names,
      routes,
      control_inputs,
      data_inputs,
      pending: VecDeque::new(),
      tick: Tick::minimum(),
      delivered_total: 0,
      failures: Vec::new(),
    }
  }

  /// Sets the escalation policy applied to node handler failures.
  #[must_use]
  pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
    self.failure_policy = policy;
    self
  }

  /// Installs the sink that receives runtime events.
  #[must_use]
  pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
    self.events = sink;
    self
  }

  /// Returns the current scheduler state.
  #[must_use]
  pub fn state(&self) -> SchedulerState {
    self.state
  }

  /// Returns the configuration this scheduler runs with.
  #[must_use]
  pub fn config(&self) -> &SchedulerConfig {
    &self.config
  }

  /// Starts all nodes, runs the tick loop until sustained inactivity, then
  /// stops all nodes and returns a run summary.
  ///
  /// # Errors
  ///
  /// Returns [`SchedulerError::StartupFailed`] if any start hook fails; the
  /// already-started subset is stopped in reverse order before returning.
  pub async fn run(mut self) -> Result<SchedulerReport, SchedulerError> {
    tracing::info!(
      graph = %self.graph_name,
      nodes = self.node_names.len(),
      edges = self.subgraph.edges().len(),
      "scheduler starting"
    );
    self.start_all().await?;
    self.state = SchedulerState::Running;

    let mut interval = tokio::time::interval(self.config.tick_period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut idle = Duration::ZERO;

    while self.state == SchedulerState::Running {
      interval.tick().await;
      let delivered = self.run_tick().await;
      self.delivered_total += delivered;

      if self.state != SchedulerState::Running {
        break;
      }
      if delivered == 0 {
        idle += self.config.tick_period;
        if idle >= self.config.idle_timeout {
          self.events.on_event(&RuntimeEvent::IdleTimeoutFired);
          tracing::info!(graph = %self.graph_name, tick = %self.tick, "idle timeout fired");
          self.state = SchedulerState::Draining;
        }
      } else {
        idle = Duration::ZERO;
      }
    }

    self.stop_all().await;
    self.state = SchedulerState::Stopped;
    self.events.on_event(&RuntimeEvent::ShutdownComplete);
    tracing::info!(
      graph = %self.graph_name,
      ticks = self.tick.as_u64(),
      delivered = self.delivered_total,
      failures = self.failures.len(),
      "scheduler stopped"
    );
    Ok(SchedulerReport {
      ticks: self.tick.as_u64(),
      delivered: self.delivered_total,
      failures: self.failures,
    })
  }

  /// Invokes start hooks in declared order; rolls back on the first failure.
  async fn start_all(&mut self) -> Result<(), SchedulerError> {
    for idx in 0..self.node_names.len() {
      let (nodes, edges) = self.subgraph.split_mut();
      let mut ctx = NodeContext::new(
        &self.graph_name,
        &self.node_names[idx],
        self.tick,
        edges,
        &self.routes[idx],
        &mut self.pending,
        self.events.as_ref(),
      );
      match nodes[idx].on_start(&mut ctx).await {
        Ok(()) => {
          self.node_states[idx] = NodeState::Started;
          self.events.on_event(&RuntimeEvent::NodeStarted {
            node: self.node_names[idx].clone(),
          });
        }
        Err(err) => {
          let reason = err.to_string();
          tracing::error!(
            graph = %self.graph_name,
            node = %self.node_names[idx],
            error = %reason,
            "start hook failed, rolling back startup"
          );
          self.state = SchedulerState::Draining;
          self.stop_all().await;
          self.state = SchedulerState::Stopped;
          return Err(SchedulerError::StartupFailed {
            node: self.node_names[idx].clone(),
            reason,
          });
        }
      }
    }
    Ok(())
  }

  /// Invokes stop hooks in reverse start order, exactly once per started
  /// node. Stop-hook failures are recorded but do not abort the drain.
  async fn stop_all(&mut self) {
    for idx in (0..self.node_names.len()).rev() {
      if !matches!(
        self.node_states[idx],
        NodeState::Started | NodeState::Running
      ) {
        continue;
      }
      let (nodes, edges) = self.subgraph.split_mut();
      let mut ctx = NodeContext::new(
        &self.graph_name,
        &self.node_names[idx],
        self.tick,
        edges,
        &self.routes[idx],
        &mut self.pending,
        self.events.as_ref(),
      );
      if let Err(err) = nodes[idx].on_stop(&mut ctx).await {
        self.record_failure(idx, &err);
      }
      self.node_states[idx] = NodeState::Stopped;
      self.events.on_event(&RuntimeEvent::NodeStopped {
        node: self.node_names[idx].clone(),
      });
    }
  }

  /// Runs one tick; returns the number of messages dispatched to handlers.
  async fn run_tick(&mut self) -> u64 {
    self.tick = self.tick.next();
    self.retry_pending();

    let mut delivered: u64 = 0;
    for idx in 0..self.node_names.len() {
      let mut budget = self.config.max_batch_per_node;

      for pos in 0..self.control_inputs[idx].len() {
        if budget == 0 {
          break;
        }
        let e = self.control_inputs[idx][pos];
        let n = self.drain_edge(idx, e, EdgePlane::Control, budget).await;
        budget -= n as usize;
        delivered += n;
      }
      for pos in 0..self.data_inputs[idx].len() {
        if budget == 0 {
          break;
        }
        let e = self.data_inputs[idx][pos];
        let n = self.drain_edge(idx, e, EdgePlane::Data, budget).await;
        budget -= n as usize;
        delivered += n;
      }

      self.dispatch_tick(idx).await;
      if self.node_states[idx] == NodeState::Started {
        self.node_states[idx] = NodeState::Running;
      }
    }

    for edge in self.subgraph.edges() {
      metrics::record_queue_depth(&self.graph_name, edge.id(), edge.depth());
    }
    delivered
  }

  /// Drains up to `budget` messages from one edge into the owning node's
  /// handler; returns how many were dispatched.
  async fn drain_edge(&mut self, idx: usize, e: usize, plane: EdgePlane, budget: usize) -> u64 {
    let batch = self.subgraph.edges()[e].try_take(budget);
    if batch.is_empty() {
      return 0;
    }
    let port = self.subgraph.edges()[e].sink_port().to_string();
    let mut delivered = 0u64;
    for msg in batch {
      let (nodes, edges) = self.subgraph.split_mut();
      let mut ctx = NodeContext::new(
        &self.graph_name,
        &self.node_names[idx],
        self.tick,
        edges,
        &self.routes[idx],
        &mut self.pending,
        self.events.as_ref(),
      );
      let result = match plane {
        EdgePlane::Control => nodes[idx].on_control(&mut ctx, &port, msg).await,
        EdgePlane::Data => nodes[idx].on_data(&mut ctx, &port, msg).await,
      };
      delivered += 1;
      self.events.on_event(&RuntimeEvent::MessageDelivered {
        plane,
        node: self.node_names[idx].clone(),
        port: port.clone(),
      });
      metrics::record_delivered(
        &self.graph_name,
        &self.node_names[idx],
        &port,
        match plane {
          EdgePlane::Control => "control",
          EdgePlane::Data => "data",
        },
      );
      if let Err(err) = result {
        self.record_failure(idx, &err);
      }
    }
    delivered
  }

  async fn dispatch_tick(&mut self, idx: usize) {
    let (nodes, edges) = self.subgraph.split_mut();
    let mut ctx = NodeContext::new(
      &self.graph_name,
      &self.node_names[idx],
      self.tick,
      edges,
      &self.routes[idx],
      &mut self.pending,
      self.events.as_ref(),
    );
    if let Err(err) = nodes[idx].on_tick(&mut ctx).await {
      self.record_failure(idx, &err);
    }
  }

  /// Re-attempts parked sends at the start of the tick, FIFO by block time.
  ///
  /// Per-edge order is preserved: once an edge refuses a retry, everything
  /// parked behind it on that edge stays parked this tick.
  fn retry_pending(&mut self) {
    if self.pending.is_empty() {
      return;
    }
    let edges = self.subgraph.edges();
    let mut still = VecDeque::with_capacity(self.pending.len());
    let mut stalled: Vec<usize> = Vec::new();
    while let Some(parked) = self.pending.pop_front() {
      if stalled.contains(&parked.edge) {
        still.push_back(parked);
        continue;
      }
      match edges[parked.edge].try_put(parked.msg) {
        PutOutcome::Blocked(msg) => {
          stalled.push(parked.edge);
          still.push_back(PendingSend {
            edge: parked.edge,
            msg,
          });
        }
        _ => {
          tracing::trace!(
            edge = %edges[parked.edge].id(),
            "parked message admitted after retry"
          );
        }
      }
    }
    self.pending = still;
  }

  fn record_failure(&mut self, idx: usize, err: &NodeError) {
    let node = &self.node_names[idx];
    tracing::warn!(
      graph = %self.graph_name,
      node = %node,
      tick = %self.tick,
      error = %err,
      "node handler failed"
    );
    metrics::record_node_error(&self.graph_name, node);
    self.failures.push(NodeFailure {
      node: node.clone(),
      error: err.to_string(),
      tick: self.tick,
      at: Utc::now(),
    });
    if self.failure_policy == FailurePolicy::Drain && self.state == SchedulerState::Running {
      tracing::warn!(graph = %self.graph_name, node = %node, "failure policy drains the graph");
      self.state = SchedulerState::Draining;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_config_rejects_zero_values() {
    assert!(matches!(
      SchedulerConfig::new(Duration::ZERO, 8, Duration::from_secs(1)),
      Err(ConfigError::ZeroTickPeriod)
    ));
    assert!(matches!(
      SchedulerConfig::new(Duration::from_millis(1), 0, Duration::from_secs(1)),
      Err(ConfigError::ZeroMaxBatch)
    ));
    assert!(matches!(
      SchedulerConfig::new(Duration::from_millis(1), 8, Duration::ZERO),
      Err(ConfigError::ZeroIdleTimeout)
    ));
  }

  #[test]
  fn test_config_accessors() {
    let config =
      SchedulerConfig::new(Duration::from_millis(5), 16, Duration::from_millis(100)).unwrap();
    assert_eq!(config.tick_period(), Duration::from_millis(5));
    assert_eq!(config.max_batch_per_node(), 16);
    assert_eq!(config.idle_timeout(), Duration::from_millis(100));
  }

  #[test]
  fn test_new_scheduler_is_idle() {
    let config =
      SchedulerConfig::new(Duration::from_millis(1), 8, Duration::from_millis(10)).unwrap();
    let scheduler = Scheduler::new(Subgraph::new("empty"), config);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
  }

  #[tokio::test(start_paused = true)]
  async fn test_empty_graph_runs_to_idle_shutdown() {
    let config =
      SchedulerConfig::new(Duration::from_millis(1), 8, Duration::from_millis(5)).unwrap();
    let report = Scheduler::new(Subgraph::new("empty"), config)
      .run()
      .await
      .unwrap();
    assert!(report.ticks >= 5);
    assert_eq!(report.delivered, 0);
    assert!(report.failures.is_empty());
  }
}
