//! mediahub - media cataloging backend
//!
//! The library holds the dispatcher (job table, HTTP API, artifact storage)
//! and the worker (dispatcher client, transform seam, polling loop). The
//! binary wires them to the CLI; integration tests drive them directly.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod search;
pub mod server;
pub mod state;
pub mod worker;
