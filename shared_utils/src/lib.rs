//! Small helpers shared across the replay workspace.

pub mod env;

pub use env::{EnvError, get_env_var_opt, parse_env_var};
