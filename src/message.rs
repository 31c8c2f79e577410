//! Message envelope types for edge delivery.
//!
//! This module provides [`Message`], the immutable envelope moved across
//! edges. An envelope wraps a type-erased payload with a header map and an
//! optional trace identifier, enabling end-to-end correlation without the
//! runtime inspecting payload contents.
//!
//! # Forwarding invariant
//!
//! A `Message` handed to `emit` is forwarded exactly as constructed: the
//! runtime never re-wraps it, so headers and trace id set by the original
//! producer survive through every edge to the final consumer. Cloning an
//! envelope shares the payload allocation (`Arc`); it never copies payload
//! data.
//!
//! # Example
//!
//! ```rust
//! use tickweave::message::Message;
//!
//! let msg = Message::new(42i64)
//!   .with_header("source", "sensor-1")
//!   .with_trace_id("trace-abc");
//!
//! assert_eq!(msg.payload_ref::<i64>(), Some(&42));
//! assert_eq!(msg.header("source"), Some("sensor-1"));
//! assert_eq!(msg.trace_id(), Some("trace-abc"));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased, shareable message payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// An immutable envelope carrying one payload across an edge.
#[derive(Clone)]
pub struct Message {
  payload: Payload,
  headers: HashMap<String, String>,
  trace_id: Option<String>,
}

impl Message {
  /// Creates a new message wrapping the given payload.
  #[must_use]
  pub fn new<T: Send + Sync + 'static>(payload: T) -> Self {
    Self {
      payload: Arc::new(payload),
      headers: HashMap::new(),
      trace_id: None,
    }
  }

  /// Creates a message from an already-shared payload without re-wrapping it.
  #[must_use]
  pub fn from_payload(payload: Payload) -> Self {
    Self {
      payload,
      headers: HashMap::new(),
      trace_id: None,
    }
  }

  /// Adds a header entry.
  #[must_use]
  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.insert(name.into(), value.into());
    self
  }

  /// Sets the trace identifier.
  #[must_use]
  pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
    self.trace_id = Some(trace_id.into());
    self
  }

  /// Get the type-erased payload.
  #[must_use]
  pub fn payload(&self) -> &Payload {
    &self.payload
  }

  /// Downcast the payload to a concrete reference, if the type matches.
  #[must_use]
  pub fn payload_ref<T: Send + Sync + 'static>(&self) -> Option<&T> {
    self.payload.downcast_ref::<T>()
  }

  /// Returns true if the payload is of type `T`.
  #[must_use]
  pub fn payload_is<T: Send + Sync + 'static>(&self) -> bool {
    self.payload.is::<T>()
  }

  /// Downcast a shared handle to the payload, if the type matches.
  #[must_use]
  pub fn payload_arc<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
    Arc::clone(&self.payload).downcast::<T>().ok()
  }

  /// Get the header map.
  #[must_use]
  pub fn headers(&self) -> &HashMap<String, String> {
    &self.headers
  }

  /// Get a header by name.
  #[must_use]
  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(name).map(String::as_str)
  }

  /// Get the trace identifier, if set.
  #[must_use]
  pub fn trace_id(&self) -> Option<&str> {
    self.trace_id.as_deref()
  }
}

impl std::fmt::Debug for Message {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Message")
      .field("headers", &self.headers)
      .field("trace_id", &self.trace_id)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_message_payload_downcast() {
    let msg = Message::new("hello".to_string());
    assert!(msg.payload_is::<String>());
    assert!(!msg.payload_is::<i32>());
    assert_eq!(msg.payload_ref::<String>().map(String::as_str), Some("hello"));
    assert_eq!(msg.payload_ref::<i32>(), None);
  }

  #[test]
  fn test_message_headers_and_trace() {
    let msg = Message::new(1u8)
      .with_header("content-type", "application/json")
      .with_header("origin", "test")
      .with_trace_id("t-1");

    assert_eq!(msg.header("content-type"), Some("application/json"));
    assert_eq!(msg.header("origin"), Some("test"));
    assert_eq!(msg.header("missing"), None);
    assert_eq!(msg.trace_id(), Some("t-1"));
    assert_eq!(msg.headers().len(), 2);
  }

  #[test]
  fn test_message_clone_shares_payload() {
    let msg = Message::new(vec![1, 2, 3]);
    let cloned = msg.clone();
    assert!(Arc::ptr_eq(msg.payload(), cloned.payload()));
  }

  #[test]
  fn test_message_from_payload_preserves_allocation() {
    let payload: Payload = Arc::new(9.5f64);
    let msg = Message::from_payload(Arc::clone(&payload));
    assert!(Arc::ptr_eq(msg.payload(), &payload));
    assert_eq!(msg.payload_ref::<f64>(), Some(&9.5));
  }

  #[test]
  fn test_message_payload_arc() {
    let msg = Message::new(7i32);
    let arc = msg.payload_arc::<i32>().unwrap();
    assert_eq!(*arc, 7);
    assert!(msg.payload_arc::<String>().is_none());
  }
}
