use regex::Regex;

use crate::error::CatalogError;

/// Compiled token-shape patterns shared by several extractors.
#[derive(Debug)]
pub struct Shapes {
    /// Abbreviation shapes that count as initials: "A.", "AB.", "K:son",
    /// "Er.", trailing ". A.".
    pub initials: Regex,
    /// The looser variant (period optional) accepted as a parish candidate.
    pub parish_candidate: Regex,
    /// The "f. d." (former) title marker.
    pub former_title: Regex,
}

impl Shapes {
    pub fn new() -> Result<Self, CatalogError> {
        let compile = |p: &str| Regex::new(p).map_err(|e| CatalogError::Pattern(e.to_string()));
        Ok(Self {
            initials: compile(
                r"\b(?:[A-Z]{1,3}\.|[A-Z]:\w+|[A-Z]:\s|[A-Z]:,|[A-Z][a-z]\.|[A-Z][a-z]{2}\.|\. [A-Z]\.)",
            )?,
            parish_candidate: compile(
                r"\b(?:[A-Z]{1,3}\.?|[A-Z]:\w+|[A-Z]:\s|[A-Z]:,|[A-Z][a-z]\.?|[A-Z][a-z]{2}\.?)",
            )?,
            former_title: compile(r"\bf\.\s*d\.")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_shapes() {
        let shapes = Shapes::new().unwrap();
        assert!(shapes.initials.is_match("K. A."));
        assert!(shapes.initials.is_match("E:son"));
        assert!(shapes.initials.is_match("Er."));
        assert!(!shapes.initials.is_match("snickare"));
    }

    #[test]
    fn former_title_tolerates_spacing() {
        let shapes = Shapes::new().unwrap();
        assert!(shapes.former_title.is_match("f. d. kapten"));
        assert!(shapes.former_title.is_match("f.d. kapten"));
        assert!(!shapes.former_title.is_match("fad. kapten"));
    }
}
