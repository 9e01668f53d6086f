use serde::Serialize;

/// A single OCR line, keyed by its physical position on the page.
///
/// Immutable once ingested. Two lines with the same position but different
/// text are distinct; the unique key therefore includes the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub page: u32,
    pub column: u32,
    pub row: u32,
    pub text: String,
}

impl Line {
    pub fn new(page: u32, column: u32, row: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            column,
            row,
            text: text.into(),
        }
    }

    /// Set-membership key used across classification buckets.
    pub fn unique_key(&self) -> String {
        format!("{}_{}_{}_{}", self.page, self.column, self.row, self.text)
    }
}
