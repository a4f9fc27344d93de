use thiserror::Error;

/// Errors raised while turning raw period records into report sections.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// `current_data` is present and truthy but is not a mapping.
    #[error("section `{section}` has a `current_data` of type {found}, expected an object")]
    MalformedSection {
        section: &'static str,
        found: &'static str,
    },

    /// A data period label is neither `YYYY` nor `YYYY-QN`.
    #[error("invalid data period `{0}`")]
    InvalidPeriod(String),
}

/// Errors raised while loading processor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}
