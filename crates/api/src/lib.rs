//! # ChatSync API
//!
//! Host-facing application layer - commands and wiring.
//!
//! This crate contains:
//! - Host commands (messaging client → bridge)
//! - Application context (dependency injection)
//! - System browser and logging adapters
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Exposes plain async command handlers for the host shell

pub mod adapters;
pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use adapters::{LogEventSink, SystemBrowser};
pub use commands::*;
pub use context::{AppContext, AppContextOptions};
