use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading configuration from the process environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// The variable is set but its value could not be parsed.
    #[error("Invalid value for environment variable {name}: {value:?} ({message})")]
    Invalid {
        name: String,
        value: String,
        message: String,
    },
}

/// Reads an optional environment variable. Unset and blank values are `None`.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset or blank, and
/// [`EnvError::Invalid`] when it is set to something `T` cannot parse.
pub fn parse_env_var<T>(name: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = get_env_var_opt(name) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| EnvError::Invalid {
            name: name.to_string(),
            value: raw,
            message: e.to_string(),
        })
}
