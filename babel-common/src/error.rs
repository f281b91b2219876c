//! Error types shared by Babel crates.

use thiserror::Error;

/// Result type alias using the Babel error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Startup errors. Either one stops the process before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required setting is absent
    #[error("Missing required configuration: {0}")]
    ConfigurationMissing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configuration_names_setting() {
        let err = Error::ConfigurationMissing("TELEGRAM_BOT_TOKEN".into());
        assert_eq!(
            err.to_string(),
            "Missing required configuration: TELEGRAM_BOT_TOKEN"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("translator.timeout_secs must be greater than zero".into());
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
