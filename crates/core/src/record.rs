use serde::Serialize;

use crate::entry::{Bucket, Entry, JoinCode, MatchTier};

/// One reconstructed record, flattened for CSV export.
///
/// A record is produced for every entry whose join code owns record text
/// (standalone, first half, complete); continuation halves are folded into
/// their owner and never emitted on their own. `rows` lists the source row
/// numbers that contributed, in order, joined with `+`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    pub page: u32,
    pub column: u32,
    pub rows: String,
    pub complete_text: String,
    pub join_code: JoinCode,
    pub surname: String,
    pub match_tier: MatchTier,
    pub best_match: String,
    pub initials: String,
    pub second_surname: String,
    pub occupation: String,
    pub secondary_occupation: String,
    pub income_primary: String,
    pub income_secondary: String,
    pub firm_flag: bool,
    pub estate_flag: bool,
    pub municipality: String,
    pub parish: String,
    pub matched_parish: String,
    pub bucket: Bucket,
    pub unique_key: String,
}

impl RecordRow {
    /// Flatten an owning entry plus the row numbers of its source lines.
    pub fn from_entry(entry: &Entry, source_rows: &[u32]) -> Self {
        let rows = source_rows
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("+");
        Self {
            page: entry.line.page,
            column: entry.line.column,
            rows,
            complete_text: entry.complete_text.clone(),
            join_code: entry.join,
            surname: entry.surname.clone(),
            match_tier: entry.tier,
            best_match: entry.best_match.clone(),
            initials: entry.initials.clone(),
            second_surname: entry.second_surname.clone(),
            occupation: entry.occupation.clone(),
            secondary_occupation: entry.secondary_occupation.clone(),
            income_primary: entry.income_primary.clone(),
            income_secondary: entry.income_secondary.clone(),
            firm_flag: entry.firm_flag,
            estate_flag: entry.estate_flag,
            municipality: entry.municipality.clone(),
            parish: entry.parish.clone(),
            matched_parish: entry.matched_parish.clone(),
            bucket: entry.bucket,
            unique_key: entry.unique_key(),
        }
    }
}
