//! Ports Layer - interfaces to the registry

pub mod outbound;

pub use outbound::ShardRegistry;
