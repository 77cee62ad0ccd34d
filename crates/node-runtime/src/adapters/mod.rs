//! # In-Process Adapters
//!
//! Stand-ins for the engine, transport and registry that keep everything
//! inside one process. The `swarm-node` binary uses them for dry runs:
//! the full lifecycle runs, announcements land in an in-memory registry,
//! and no model weights or sockets are touched.

pub mod factory;
pub mod handler;
pub mod runtime;

pub use factory::LocalComponents;
pub use handler::LocalConnectionHandler;
pub use runtime::LocalRuntime;
