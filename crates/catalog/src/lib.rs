//! `taxkal-catalog` — Read-only reference catalogs.
//!
//! Everything the extraction engine matches against: the surname register,
//! first-name set, occupation vocabulary, firm/estate cue sets, parish
//! abbreviations and the verified parish reference, the city list, and the
//! dirty-surname correction table. Loaded once, immutable for the run,
//! cheap to share across worker threads behind a reference.

pub mod cues;
pub mod dirty;
pub mod error;
pub mod firstnames;
pub mod folding;
pub mod municipalities;
pub mod occupations;
pub mod parishes;
pub mod shapes;
pub mod surnames;

pub use cues::{CueRule, CueSet};
pub use dirty::DirtyNames;
pub use error::CatalogError;
pub use firstnames::FirstNames;
pub use folding::fold;
pub use municipalities::{is_city, CITY_NAMES};
pub use occupations::OccupationLexicon;
pub use parishes::{expand_abbreviation, is_abbreviation, letter_skeleton, ParishRef, ParishReference};
pub use shapes::Shapes;
pub use surnames::SurnameRegister;

/// The full catalog bundle handed to the engine.
#[derive(Debug)]
pub struct Catalogs {
    pub surnames: SurnameRegister,
    pub first_names: FirstNames,
    pub occupations: OccupationLexicon,
    pub parishes: ParishReference,
    pub dirty: DirtyNames,
    pub firm_cues: CueSet,
    pub estate_cues: CueSet,
    pub shapes: Shapes,
}

impl Catalogs {
    pub fn new(
        surnames: SurnameRegister,
        first_names: FirstNames,
        occupations: OccupationLexicon,
        parishes: ParishReference,
        dirty: DirtyNames,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            surnames,
            first_names,
            occupations,
            parishes,
            dirty,
            firm_cues: CueSet::firm()?,
            estate_cues: CueSet::estate()?,
            shapes: Shapes::new()?,
        })
    }
}
