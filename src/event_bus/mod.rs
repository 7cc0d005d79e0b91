//! Progress events for pipeline runs.
//!
//! Workers and the scheduler emit [`PipelineEvent`]s over a channel; the
//! [`EventBus`] broadcasts them to pluggable [`EventSink`]s (stdout for
//! operator consoles, memory for tests, a channel for live consumers).
//! Events are observability only; no pipeline semantics depend on them.

pub mod bus;
pub mod event;
pub mod sink;

pub use bus::EventBus;
pub use event::PipelineEvent;
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
