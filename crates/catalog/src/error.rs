use std::fmt;

#[derive(Debug)]
pub enum CatalogError {
    /// A cue automaton or shape pattern failed to compile.
    Pattern(String),
    /// A reference table is unusable (empty register, etc.).
    EmptyTable(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(msg) => write!(f, "pattern compile error: {msg}"),
            Self::EmptyTable(table) => write!(f, "reference table '{table}' is empty"),
        }
    }
}

impl std::error::Error for CatalogError {}
