//! Domain Layer - lease timing, state and errors, no I/O

pub mod errors;
pub mod lease;
pub mod state;

pub use errors::*;
pub use lease::*;
pub use state::*;
