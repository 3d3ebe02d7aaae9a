//! # Stegproc - steganalysis tool battery over HTTP
//!
//! Stegproc accepts a file, stages it in a scratch directory, runs a fixed
//! battery of steganalysis and forensics programs against it one after
//! another, and returns everything they printed as JSON keyed by tool name.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the processor
//! stegproc serve --port 5000
//!
//! # Analyze a file
//! curl -F file=@challenge.png http://localhost:5000/upload
//!
//! # Or locally, without the server
//! stegproc analyze challenge.png --only zsteg,binwalk
//! ```

pub mod cli;
pub mod config;
pub mod runner;
pub mod sample;
pub mod server;
pub mod stegsolve;
pub mod tools;

pub use cli::{Cli, Output};
pub use config::StegprocConfig;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
