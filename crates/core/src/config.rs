//! Environment variable helpers shared by the `*Config::from_env` loaders.

/// Errors raised while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("Environment variable {name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Read a variable that has no default.
pub fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Read a string variable, falling back to `default` when unset.
pub fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Read and parse a variable, falling back to `default` when unset.
pub fn parsed_var_or<T: std::str::FromStr>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unset_variable_uses_default() {
        let value: u64 = parsed_var_or("FRAMESMITH_TEST_UNSET_NUMBER", 42).unwrap();
        assert_eq!(value, 42);
        assert_eq!(var_or("FRAMESMITH_TEST_UNSET_STRING", "x"), "x");
    }

    #[test]
    fn missing_required_variable_is_reported() {
        let err = required_var("FRAMESMITH_TEST_UNSET_REQUIRED").unwrap_err();
        assert_matches!(err, ConfigError::Missing("FRAMESMITH_TEST_UNSET_REQUIRED"));
    }
}
