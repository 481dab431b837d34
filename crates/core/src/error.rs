use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A parameter is outside its usable range.
    #[error("config validation error: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
