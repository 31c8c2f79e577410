//! Static wiring of nodes and edges, assembled before execution.
//!
//! A [`Subgraph`] owns an ordered set of nodes and every edge between them.
//! Declaration order matters: the scheduler starts nodes in the order they
//! were added, delivers to them in that order every tick, and stops them in
//! reverse. All wiring mistakes are configuration errors caught by
//! [`connect`](Subgraph::connect) at build time — type mismatches, unknown
//! ports, zero capacities, and fan-in/fan-out violations never reach the
//! tick loop. Wiring is immutable once the scheduler begins ticking.
//!
//! # Example
//!
//! ```rust,no_run
//! use tickweave::edge::EdgePlane;
//! use tickweave::policy::OverflowPolicy;
//! use tickweave::subgraph::Subgraph;
//!
//! # fn example(sensor: Box<dyn tickweave::node::Node>, sink: Box<dyn tickweave::node::Node>)
//! #   -> Result<(), tickweave::error::ConfigError> {
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
//! # Ok(())
//! # }
//! ```

use crate::edge::{Edge, EdgeId, EdgePlane};
use crate::error::ConfigError;
use crate::node::Node;
use crate::policy::OverflowPolicy;
use crate::port::{Port, PortDirection};

/// An ordered set of nodes plus the bounded edges connecting them.
pub struct Subgraph {
  name: String,
  nodes: Vec<Box<dyn Node>>,
  edges: Vec<Edge>,
}

impl Subgraph {
  /// Creates an empty subgraph with the given name.
  #[must_use]
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      nodes: Vec::new(),
      edges: Vec::new(),
    }
  }

  /// Creates a subgraph and registers the given nodes in order.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::DuplicateNode`] if two nodes share a name.
  pub fn from_nodes(
    name: impl Into<String>,
    nodes: Vec<Box<dyn Node>>,
  ) -> Result<Self, ConfigError> {
    let mut graph = Self::new(name);
    for node in nodes {
      graph.add_node(node)?;
    }
    Ok(graph)
  }

  /// Returns the subgraph name.
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the number of registered nodes.
  #[must_use]
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// Returns node names in declaration order.
  #[must_use]
  pub fn node_names(&self) -> Vec<String> {
    self.nodes.iter().map(|n| n.name().to_string()).collect()
  }

  /// Returns every edge, in creation order.
  #[must_use]
  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  /// Looks up an edge by id.
  #[must_use]
  pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
    self.edges.iter().find(|e| e.id() == id)
  }

  /// Registers a node at the end of the declaration order.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::DuplicateNode`] if a node with the same name is
  /// already registered.
  pub fn add_node(&mut self, node: Box<dyn Node>) -> Result<(), ConfigError> {
    if self.node_index(node.name()).is_some() {
      return Err(ConfigError::DuplicateNode(node.name().to_string()));
    }
    self.nodes.push(node);
    Ok(())
  }

  /// Wires an output port to an input port with a bounded, policy-governed
  /// edge.
  ///
  /// `source` and `target` are `(node, port)` pairs. The new edge owns its
  /// queue; the connected nodes keep only the port names.
  ///
  /// # Errors
  ///
  /// Rejects the wiring (leaving the subgraph unchanged) when:
  ///
  /// - either node is unknown, or the named port is missing or has the wrong
  ///   direction
  /// - the payload types of the two ports differ
  /// - `capacity` is zero
  /// - the output port already feeds an edge, or the input port is already
  ///   fed by one (fan-out and fan-in are not allowed)
  pub fn connect(
    &mut self,
    source: (&str, &str),
    target: (&str, &str),
    capacity: usize,
    plane: EdgePlane,
    policy: OverflowPolicy,
  ) -> Result<EdgeId, ConfigError> {
    if capacity == 0 {
      return Err(ConfigError::ZeroCapacity);
    }
    let (source_node, source_port) = source;
    let (target_node, target_port) = target;

    let source_spec = *self
      .find_port(source_node, source_port, PortDirection::Output)?
      .spec();
    let target_spec = *self
      .find_port(target_node, target_port, PortDirection::Input)?
      .spec();

    if !source_spec.matches(&target_spec) {
      return Err(ConfigError::TypeMismatch {
        source_node: source_node.to_string(),
        source_port: source_port.to_string(),
        source_type: source_spec.type_name(),
        sink_node: target_node.to_string(),
        sink_port: target_port.to_string(),
        sink_type: target_spec.type_name(),
      });
    }

    if self
      .edges
      .iter()
      .any(|e| e.source_node() == source_node && e.source_port() == source_port)
    {
      return Err(ConfigError::OutputInUse {
        node: source_node.to_string(),
        port: source_port.to_string(),
      });
    }
    if self
      .edges
      .iter()
      .any(|e| e.sink_node() == target_node && e.sink_port() == target_port)
    {
      return Err(ConfigError::InputInUse {
        node: target_node.to_string(),
        port: target_port.to_string(),
      });
    }

    let id = EdgeId(self.edges.len() as u64);
    tracing::debug!(
      graph = %self.name,
      edge = %id,
      source_node,
      source_port,
      target_node,
      target_port,
      capacity,
      plane = %plane,
      "edge connected"
    );
    self.edges.push(Edge::new(
      id,
      (source_node.to_string(), source_port.to_string()),
      (target_node.to_string(), target_port.to_string()),
      capacity,
      plane,
      policy,
    ));
    Ok(id)
  }

  pub(crate) fn node_index(&self, name: &str) -> Option<usize> {
    self.nodes.iter().position(|n| n.name() == name)
  }

  pub(crate) fn split_mut(&mut self) -> (&mut [Box<dyn Node>], &[Edge]) {
    (self.nodes.as_mut_slice(), self.edges.as_slice())
  }

  fn find_port(
    &self,
    node_name: &str,
    port_name: &str,
    direction: PortDirection,
  ) -> Result<&Port, ConfigError> {
    let idx = self
      .node_index(node_name)
      .ok_or_else(|| ConfigError::UnknownNode(node_name.to_string()))?;
    let node = &self.nodes[idx];
    let ports = match direction {
      PortDirection::Input => node.input_ports(),
      PortDirection::Output => node.output_ports(),
    };
    ports
      .iter()
      .find(|p| p.name() == port_name && p.direction() == direction)
      .ok_or_else(|| ConfigError::UnknownPort {
        node: node_name.to_string(),
        port: port_name.to_string(),
        direction,
      })
  }
}

impl std::fmt::Debug for Subgraph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subgraph")
      .field("name", &self.name)
      .field("nodes", &self.node_names())
      .field("edges", &self.edges)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Probe {
    name: String,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
  }

  impl Probe {
    fn source(name: &str) -> Self {
      Self {
        name: name.to_string(),
        inputs: Vec::new(),
        outputs: vec![Port::output::<i64>("out")],
      }
    }

    fn sink(name: &str) -> Self {
      Self {
        name: name.to_string(),
        inputs: vec![Port::input::<i64>("in")],
        outputs: Vec::new(),
      }
    }

    fn string_sink(name: &str) -> Self {
      Self {
        name: name.to_string(),
        inputs: vec![Port::input::<String>("in")],
        outputs: Vec::new(),
      }
    }
  }

  #[async_trait::async_trait]
  impl Node for Probe {
    fn name(&self) -> &str {
      &self.name
    }
    fn input_ports(&self) -> &[Port] {
      &self.inputs
    }
    fn output_ports(&self) -> &[Port] {
      &self.outputs
    }
  }

  fn two_node_graph() -> Subgraph {
    Subgraph::from_nodes(
      "test",
      vec![
        Box::new(Probe::source("src")),
        Box::new(Probe::sink("dst")),
      ],
    )
    .unwrap()
  }

  #[test]
  fn test_duplicate_node_rejected() {
    let mut graph = Subgraph::new("test");
    graph.add_node(Box::new(Probe::source("a"))).unwrap();
    let err = graph.add_node(Box::new(Probe::source("a"))).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateNode(name) if name == "a"));
  }

  #[test]
  fn test_connect_happy_path() {
    let mut graph = two_node_graph();
    let id = graph
      .connect(
        ("src", "out"),
        ("dst", "in"),
        4,
        EdgePlane::Data,
        OverflowPolicy::Block,
      )
      .unwrap();
    assert_eq!(id, EdgeId(0));
    let edge = graph.edge(id).unwrap();
    assert_eq!(edge.source_node(), "src");
    assert_eq!(edge.sink_port(), "in");
    assert_eq!(edge.capacity(), 4);
  }

  #[test]
  fn test_connect_unknown_node() {
    let mut graph = two_node_graph();
    let err = graph
      .connect(
        ("ghost", "out"),
        ("dst", "in"),
        4,
        EdgePlane::Data,
        OverflowPolicy::Block,
      )
      .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownNode(name) if name == "ghost"));
  }

  #[test]
  fn test_connect_unknown_port() {
    let mut graph = two_node_graph();
    let err = graph
      .connect(
        ("src", "missing"),
        ("dst", "in"),
        4,
        EdgePlane::Data,
        OverflowPolicy::Block,
      )
      .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownPort { port, .. } if port == "missing"));
  }

  #[test]
  fn test_connect_type_mismatch() {
    let mut graph = Subgraph::from_nodes(
      "test",
      vec![
        Box::new(Probe::source("src")),
        Box::new(Probe::string_sink("dst")),
      ],
    )
    .unwrap();
    let err = graph
      .connect(
        ("src", "out"),
        ("dst", "in"),
        4,
        EdgePlane::Data,
        OverflowPolicy::Block,
      )
      .unwrap_err();
    assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    // the failed connect leaves the wiring unchanged
    assert!(graph.edges().is_empty());
  }

  #[test]
  fn test_connect_zero_capacity() {
    let mut graph = two_node_graph();
    let err = graph
      .connect(
        ("src", "out"),
        ("dst", "in"),
        0,
        EdgePlane::Data,
        OverflowPolicy::Block,
      )
      .unwrap_err();
    assert!(matches!(err, ConfigError::ZeroCapacity));
  }

  #[test]
  fn test_connect_rejects_fan_out_and_fan_in() {
    let mut graph = Subgraph::from_nodes(
      "test",
      vec![
        Box::new(Probe::source("a")),
        Box::new(Probe::source("b")),
        Box::new(Probe::sink("x")),
        Box::new(Probe::sink("y")),
      ],
    )
    .unwrap();
    graph
      .connect(("a", "out"), ("x", "in"), 4, EdgePlane::Data, OverflowPolicy::Block)
      .unwrap();

    let err = graph
      .connect(("a", "out"), ("y", "in"), 4, EdgePlane::Data, OverflowPolicy::Block)
      .unwrap_err();
    assert!(matches!(err, ConfigError::OutputInUse { .. }));

    let err = graph
      .connect(("b", "out"), ("x", "in"), 4, EdgePlane::Data, OverflowPolicy::Block)
      .unwrap_err();
    assert!(matches!(err, ConfigError::InputInUse { .. }));
  }

  #[test]
  fn test_node_names_preserve_declaration_order() {
    let graph = two_node_graph();
    assert_eq!(graph.node_names(), vec!["src", "dst"]);
    assert_eq!(graph.node_count(), 2);
  }
}
