//! Environment variable parsing utilities.

use std::str::FromStr;

use super::ConfigError;

/// Parse environment variable with type conversion. Missing or empty
/// variables fall back to the default.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v.parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.into(),
            value: v,
            error: e.to_string(),
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_default_and_override() {
        std::env::remove_var("SURGEPOOL_TEST_PARSE");
        assert_eq!(env_parse("SURGEPOOL_TEST_PARSE", 7usize).unwrap(), 7);

        std::env::set_var("SURGEPOOL_TEST_PARSE", "42");
        assert_eq!(env_parse("SURGEPOOL_TEST_PARSE", 7usize).unwrap(), 42);

        std::env::set_var("SURGEPOOL_TEST_PARSE", "not-a-number");
        assert!(env_parse("SURGEPOOL_TEST_PARSE", 7usize).is_err());

        std::env::remove_var("SURGEPOOL_TEST_PARSE");
    }
}
