//! floodmail daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `floodmail-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod daemon;
pub mod health;
pub mod input;
pub mod logging;
pub mod metrics_server;
