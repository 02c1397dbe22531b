//! Utility functions and helpers.

pub mod settings;

pub use settings::{assume_yes, editor, get_env_var, get_env_vars, Settings};
