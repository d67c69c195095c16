// src/core/mod.rs

pub mod config_loader;
pub mod dispatch;
pub mod extractor;
pub mod inputs;
pub mod interpolator;
pub mod matrix;
pub mod resolver;
