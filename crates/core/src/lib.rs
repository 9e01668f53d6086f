//! `taxkal-core` — Core types shared by every crate.
//!
//! Plain data: the immutable OCR line, the per-line working entry mutated
//! by the pipeline stages, join codes, match tiers, certainty buckets, and
//! the cursor used to walk a (page, column) group in row order.

pub mod cursor;
pub mod entry;
pub mod line;
pub mod record;

pub use cursor::{group_ranges, GroupCursor};
pub use entry::{Bucket, Entry, JoinCode, MatchTier};
pub use line::Line;
pub use record::RecordRow;
