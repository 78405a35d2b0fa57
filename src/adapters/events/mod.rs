//! Event publisher adapters.
//!
//! - `InMemoryEventBus` - Records envelopes for test assertions
//! - `TracingEventPublisher` - Emits envelopes as structured log records

mod in_memory;
mod tracing_publisher;

pub use in_memory::InMemoryEventBus;
pub use tracing_publisher::TracingEventPublisher;
