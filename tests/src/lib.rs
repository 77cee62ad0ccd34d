//! # Swarm Node Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Registry throughput
//! └── src/integration/  # Whole-node lifecycle across crates
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p swarm-tests
//! cargo test -p swarm-tests integration::lease_decay
//! cargo bench -p swarm-tests
//! ```

pub mod integration;
