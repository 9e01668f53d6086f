use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold out of range, bad pass bound).
    ConfigValidation(String),
    /// A shape pattern failed to compile.
    Pattern(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Pattern(msg) => write!(f, "pattern compile error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<taxkal_catalog::CatalogError> for EngineError {
    fn from(e: taxkal_catalog::CatalogError) -> Self {
        Self::Pattern(e.to_string())
    }
}
