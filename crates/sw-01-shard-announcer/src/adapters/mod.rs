//! Adapters Layer - concrete registry clients

pub mod in_memory;

pub use in_memory::{InMemoryRegistry, InMemoryRegistryClient};
