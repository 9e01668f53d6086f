//! `taxkal-engine` — Line reconstruction and entity extraction.
//!
//! The engine turns the normalized OCR lines of a tax-directory scan into
//! assembled records: surname resolution against the register, multi-line
//! join assignment, field peeling (initials, occupation, income, parish),
//! firm/estate tagging, location carry, and the final certainty triage.

pub mod assembler;
pub mod config;
pub mod error;
pub mod firm;
pub mod income;
pub mod joiner;
pub mod location;
pub mod normalize;
pub mod occupation;
pub mod parish;
pub mod patterns;
pub mod peeler;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod similarity;
pub mod text;
pub mod triage;

pub use config::EngineConfig;
pub use error::EngineError;
pub use pipeline::{Pipeline, RunOutput};
pub use report::RunSummary;
