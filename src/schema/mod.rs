//! Schema module - Encoder configuration and animation settings.

mod config;

pub use config::*;
