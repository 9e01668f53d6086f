//! `taxkal-io` — CSV import of the scan lines and reference tables, and
//! CSV export of the reconstructed records.

pub mod error;
pub mod export;
pub mod import;

pub use error::IoError;
pub use export::write_records;
pub use import::{load_catalogs, load_lines, read_file_as_utf8, CatalogPaths};
