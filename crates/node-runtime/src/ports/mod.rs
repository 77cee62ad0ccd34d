//! # Driven Ports
//!
//! Collaborators the node sequences but never looks inside. The registry
//! client port lives with the announcer in `sw-01-shard-announcer`.

pub mod engine;
pub mod handler;

pub use engine::ExecutionEngine;
pub use handler::ConnectionHandler;
