// src/cli/handlers/mod.rs

// One handler per top-level mode of the binary.

pub mod extract;
pub mod wizard;
