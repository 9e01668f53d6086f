use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum IoError {
    /// Underlying file read/write failure.
    File(PathBuf, std::io::Error),
    /// CSV parse failure.
    Csv(PathBuf, String),
    /// A required column is missing from an input table.
    MissingColumn(PathBuf, &'static str),
    /// A cell that must be numeric was not.
    BadNumber(PathBuf, u64, String),
    /// A reference catalog failed validation after loading.
    Catalog(taxkal_catalog::CatalogError),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path, e) => write!(f, "{}: {e}", path.display()),
            Self::Csv(path, msg) => write!(f, "{}: csv error: {msg}", path.display()),
            Self::MissingColumn(path, col) => {
                write!(f, "{}: missing column `{col}`", path.display())
            }
            Self::BadNumber(path, record, value) => write!(
                f,
                "{}: record {record}: expected a number, got `{value}`",
                path.display()
            ),
            Self::Catalog(e) => write!(f, "catalog error: {e}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<taxkal_catalog::CatalogError> for IoError {
    fn from(e: taxkal_catalog::CatalogError) -> Self {
        Self::Catalog(e)
    }
}
