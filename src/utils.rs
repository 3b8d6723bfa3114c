//! Utility functions and helpers.

pub mod settings;

pub use settings::{config_dir, get_env_var, Settings};
