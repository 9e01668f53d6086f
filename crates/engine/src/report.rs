//! Per-run counts, serialized to JSON by the caller and logged at the end
//! of a run. Distributions are keyed by the snake_case display names so the
//! output reads the same as the exported CSV.

use std::collections::BTreeMap;

use serde::Serialize;
use taxkal_core::Entry;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Working lines after normalization.
    pub lines: usize,
    /// Bare separator lines dropped at ingestion.
    pub lines_dropped: usize,
    /// Records emitted (owning rows only).
    pub records: usize,
    pub join_codes: BTreeMap<String, usize>,
    pub match_tiers: BTreeMap<String, usize>,
    pub buckets: BTreeMap<String, usize>,
    pub field_counts: FieldCounts,
    pub flags: FlagCounts,
}

/// Non-empty counts per extracted field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldCounts {
    pub surname: usize,
    pub initials: usize,
    pub second_surname: usize,
    pub occupation: usize,
    pub secondary_occupation: usize,
    pub income_primary: usize,
    pub income_secondary: usize,
    pub parish: usize,
    pub matched_parish: usize,
    pub municipality: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FlagCounts {
    pub firm: usize,
    pub estate: usize,
    pub v_dash: usize,
}

impl RunSummary {
    pub fn from_entries(entries: &[Entry], lines_dropped: usize, records: usize) -> Self {
        let mut join_codes: BTreeMap<String, usize> = BTreeMap::new();
        let mut match_tiers: BTreeMap<String, usize> = BTreeMap::new();
        let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
        let mut field_counts = FieldCounts::default();
        let mut flags = FlagCounts::default();

        for e in entries {
            *join_codes.entry(e.join.to_string()).or_default() += 1;
            *match_tiers.entry(e.tier.to_string()).or_default() += 1;
            *buckets.entry(e.bucket.to_string()).or_default() += 1;
            field_counts.surname += usize::from(!e.surname.is_empty());
            field_counts.initials += usize::from(!e.initials.is_empty());
            field_counts.second_surname += usize::from(!e.second_surname.is_empty());
            field_counts.occupation += usize::from(!e.occupation.is_empty());
            field_counts.secondary_occupation +=
                usize::from(!e.secondary_occupation.is_empty());
            field_counts.income_primary += usize::from(!e.income_primary.is_empty());
            field_counts.income_secondary += usize::from(!e.income_secondary.is_empty());
            field_counts.parish += usize::from(!e.parish.is_empty());
            field_counts.matched_parish += usize::from(!e.matched_parish.is_empty());
            field_counts.municipality += usize::from(!e.municipality.is_empty());
            flags.firm += usize::from(e.firm_flag);
            flags.estate += usize::from(e.estate_flag);
            flags.v_dash += usize::from(e.v_dash);
        }

        Self {
            lines: entries.len(),
            lines_dropped,
            records,
            join_codes,
            match_tiers,
            buckets,
            field_counts,
            flags,
        }
    }
}
