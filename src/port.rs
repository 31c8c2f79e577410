//! Typed attachment points for nodes.
//!
//! A [`Port`] is a named, directed, typed attachment point declared by a
//! node. Ports own no storage; they exist so the subgraph can validate
//! wiring at connect time. The type tag is a runtime [`PortSpec`] carrying
//! the payload `TypeId` plus a readable type name for diagnostics.

use std::any::TypeId;

/// Direction of a port relative to its node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PortDirection {
  /// Messages flow into the node through this port.
  Input,
  /// Messages flow out of the node through this port.
  Output,
}

impl std::fmt::Display for PortDirection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PortDirection::Input => write!(f, "input"),
      PortDirection::Output => write!(f, "output"),
    }
  }
}

/// Runtime type tag for a port's payload type.
///
/// Two specs are compatible when their `TypeId`s are equal. The type name is
/// carried only for error messages and logs; it takes no part in matching.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PortSpec {
  type_id: TypeId,
  type_name: &'static str,
}

impl PortSpec {
  /// Builds the spec for payload type `T`.
  #[must_use]
  pub fn of<T: Send + Sync + 'static>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
    }
  }

  /// Returns the readable name of the payload type.
  #[must_use]
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// Returns true if the two specs carry the same payload type.
  #[must_use]
  pub fn matches(&self, other: &PortSpec) -> bool {
    self.type_id == other.type_id
  }
}

/// A named, directed, typed attachment point on a node.
///
/// A port belongs exclusively to one node and lives exactly as long as the
/// node's declaration of it.
#[derive(Clone, Debug)]
pub struct Port {
  name: String,
  direction: PortDirection,
  spec: PortSpec,
}

impl Port {
  /// Declares an input port carrying payloads of type `T`.
  #[must_use]
  pub fn input<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      direction: PortDirection::Input,
      spec: PortSpec::of::<T>(),
    }
  }

  /// Declares an output port carrying payloads of type `T`.
  #[must_use]
  pub fn output<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      direction: PortDirection::Output,
      spec: PortSpec::of::<T>(),
    }
  }

  /// Returns the port name.
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the port direction.
  #[must_use]
  pub fn direction(&self) -> PortDirection {
    self.direction
  }

  /// Returns the port's type tag.
  #[must_use]
  pub fn spec(&self) -> &PortSpec {
    &self.spec
  }
}
