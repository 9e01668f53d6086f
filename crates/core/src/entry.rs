use serde::Serialize;

use crate::line::Line;

// ---------------------------------------------------------------------------
// Join code
// ---------------------------------------------------------------------------

/// Role of a physical line in multi-line record reconstruction.
///
/// Invariant: a `FirstHalf` at position *i* is immediately followed (within
/// the same page/column sequence, skipping pure-dash filler) by a
/// `SecondHalf`; a `ThirdPart` immediately follows a resolved `SecondHalf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinCode {
    Standalone,
    FirstHalf,
    SecondHalf,
    Complete,
    ThirdPart,
}

impl JoinCode {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Standalone => 0,
            Self::FirstHalf => 1,
            Self::SecondHalf => 2,
            Self::Complete => 3,
            Self::ThirdPart => 4,
        }
    }

    /// True for the codes that carry their own record text
    /// (standalone, first half, complete).
    pub fn owns_record(self) -> bool {
        matches!(self, Self::Standalone | Self::FirstHalf | Self::Complete)
    }
}

impl std::fmt::Display for JoinCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone => write!(f, "standalone"),
            Self::FirstHalf => write!(f, "first_half"),
            Self::SecondHalf => write!(f, "second_half"),
            Self::Complete => write!(f, "complete"),
            Self::ThirdPart => write!(f, "third_part"),
        }
    }
}

// ---------------------------------------------------------------------------
// Match tier
// ---------------------------------------------------------------------------

/// Confidence tier of a surname match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Line starts with a domestic-role word (hustru, fru, ...);
    /// definitionally not a name line.
    NonOccupation,
    /// Register entry found verbatim at the line start.
    Exact,
    /// Fuzzy score at or above the high threshold.
    FuzzyHigh,
    /// Fuzzy score at or above the low threshold with a plausible
    /// completed-word length.
    FuzzyLow,
    Unmatched,
}

impl MatchTier {
    pub fn is_matched(self) -> bool {
        !matches!(self, Self::Unmatched)
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonOccupation => write!(f, "non_occupation"),
            Self::Exact => write!(f, "exact"),
            Self::FuzzyHigh => write!(f, "fuzzy_high"),
            Self::FuzzyLow => write!(f, "fuzzy_low"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

// ---------------------------------------------------------------------------
// Certainty bucket
// ---------------------------------------------------------------------------

/// Final mutually-exclusive classification label.
///
/// Buckets are evaluated in a fixed priority order; the first matching rule
/// wins and every entry ends up in exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Unclassified,
    PageExcluded,
    LocationMarker,
    TelephoneListing,
    PureFiller,
    CertainEstate,
    NonOccupationIndividual,
    FullIndividual,
    PartialIndividual,
    CertainFirm,
    CertainNoiseA,
    CertainNoiseB,
    PotentialSecondA,
    PotentialSecondB,
    PotentialSecondC,
    PotentialSecondD,
    PotentialFirst,
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unclassified => "unclassified",
            Self::PageExcluded => "page_excluded",
            Self::LocationMarker => "location_marker",
            Self::TelephoneListing => "telephone_listing",
            Self::PureFiller => "pure_filler",
            Self::CertainEstate => "certain_estate",
            Self::NonOccupationIndividual => "non_occupation_individual",
            Self::FullIndividual => "full_individual",
            Self::PartialIndividual => "partial_individual",
            Self::CertainFirm => "certain_firm",
            Self::CertainNoiseA => "certain_noise_a",
            Self::CertainNoiseB => "certain_noise_b",
            Self::PotentialSecondA => "potential_second_a",
            Self::PotentialSecondB => "potential_second_b",
            Self::PotentialSecondC => "potential_second_c",
            Self::PotentialSecondD => "potential_second_d",
            Self::PotentialFirst => "potential_first",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// The per-line working row mutated in place by the pipeline stages.
///
/// `text` is the cleaned working text (the ingested line after
/// normalization); `complete_text` is the whitespace-joined concatenation
/// of the record's source lines once the assembler has run. Every string
/// field defaults to empty; flags default to false.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub line: Line,
    pub text: String,
    pub complete_text: String,
    pub join: JoinCode,
    pub tier: MatchTier,
    pub best_match: String,
    pub similarity: f64,
    pub surname: String,
    pub initials: String,
    pub second_surname: String,
    pub occupation: String,
    pub secondary_occupation: String,
    pub income_raw: String,
    pub income_primary: String,
    pub income_secondary: String,
    pub parish: String,
    pub matched_parish: String,
    pub municipality: String,
    pub location: String,
    pub firm_flag: bool,
    pub estate_flag: bool,
    pub residual: String,
    /// Line carried an `f. d.` (former) title marker.
    pub former_title: bool,
    /// Surname recovered through the V.-prefix / hyphen pass.
    pub v_dash: bool,
    /// Firm flag cleared by the individual-vs-firm arbitration.
    pub firm_cleared: bool,
    pub bucket: Bucket,
}

impl Entry {
    pub fn new(line: Line) -> Self {
        let text = line.text.clone();
        Self {
            line,
            complete_text: text.clone(),
            text,
            join: JoinCode::Standalone,
            tier: MatchTier::Unmatched,
            best_match: String::new(),
            similarity: 0.0,
            surname: String::new(),
            initials: String::new(),
            second_surname: String::new(),
            occupation: String::new(),
            secondary_occupation: String::new(),
            income_raw: String::new(),
            income_primary: String::new(),
            income_secondary: String::new(),
            parish: String::new(),
            matched_parish: String::new(),
            municipality: String::new(),
            location: String::new(),
            firm_flag: false,
            estate_flag: false,
            residual: String::new(),
            former_title: false,
            v_dash: false,
            firm_cleared: false,
            bucket: Bucket::Unclassified,
        }
    }

    pub fn unique_key(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.line.page, self.line.column, self.line.row, self.text
        )
    }

    /// Pure-dash filler line (no letters, no digits).
    pub fn is_filler(&self) -> bool {
        !self.text.chars().any(|c| c.is_ascii_alphanumeric())
    }

    /// Reset every surname-match field to the unmatched state.
    pub fn clear_match(&mut self) {
        self.tier = MatchTier::Unmatched;
        self.best_match.clear();
        self.similarity = 0.0;
        self.surname.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_defaults() {
        let e = Entry::new(Line::new(1, 1, 1, "Berg, A., snickare 2100"));
        assert_eq!(e.join, JoinCode::Standalone);
        assert_eq!(e.tier, MatchTier::Unmatched);
        assert_eq!(e.bucket, Bucket::Unclassified);
        assert_eq!(e.complete_text, e.text);
        assert!(!e.firm_flag && !e.estate_flag);
    }

    #[test]
    fn filler_detection() {
        assert!(Entry::new(Line::new(1, 1, 1, "- —")).is_filler());
        assert!(!Entry::new(Line::new(1, 1, 1, "-4")).is_filler());
        assert!(!Entry::new(Line::new(1, 1, 1, "a")).is_filler());
    }

    #[test]
    fn join_code_display_and_value() {
        assert_eq!(JoinCode::FirstHalf.as_u8(), 1);
        assert_eq!(JoinCode::ThirdPart.as_u8(), 4);
        assert_eq!(JoinCode::SecondHalf.to_string(), "second_half");
        assert!(JoinCode::Complete.owns_record());
        assert!(!JoinCode::SecondHalf.owns_record());
    }
}
