//! # System Interaction Layer
//!
//! This module provides abstractions for interacting with the underlying operating system.
//! It serves as a boundary between the core resolution logic and the external tools
//! that actually start workflow runs.
//!
//! ## Modules
//!
//! - **`executor`**: Spawns external processes with verbatim arguments and captures
//!   their output, turning spawn failures and non-zero exits into typed errors.
//! - **`github`**: The `WorkflowTrigger` seam and its two implementations: `GhCli`, which
//!   calls `gh workflow run`, and `PayloadWriter`, which writes the payloads to disk for
//!   dry runs.

pub mod executor;
pub mod github;
