// Adapters layer: concrete implementations of the domain ports.

pub mod memory;
pub mod notifier;

pub use memory::{InMemoryCircuitRepository, MatchKey};
pub use notifier::{ChannelNotifier, TracingNotifier};
