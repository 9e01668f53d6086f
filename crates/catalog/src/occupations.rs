use crate::error::CatalogError;
use crate::folding::fold;

/// The occupation vocabulary, lowercase and sorted longest-first so that
/// longest-match scans see "byggnadsingenjor" before "ingenjor".
#[derive(Debug)]
pub struct OccupationLexicon {
    terms: Vec<String>,
}

impl OccupationLexicon {
    pub fn from_terms<I>(raw: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut terms: Vec<String> = raw
            .into_iter()
            .map(|t| fold(t.trim()).to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        terms.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        terms.dedup();
        if terms.is_empty() {
            return Err(CatalogError::EmptyTable("occupations".into()));
        }
        Ok(Self { terms })
    }

    /// All terms, longest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.terms.iter().any(|t| *t == word)
    }

    /// Terms containing a hyphen, longest first.
    pub fn hyphenated(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|t| t.contains('-'))
    }

    /// Terms longer than `n` characters, longest first.
    pub fn longer_than(&self, n: usize) -> impl Iterator<Item = &str> {
        self.iter().filter(move |t| t.len() > n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> OccupationLexicon {
        OccupationLexicon::from_terms(
            ["snickare", "ingenjör", "byggnadsingenjor", "styr-man", "bagare"].map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn longest_first_and_folded() {
        let lex = lexicon();
        assert_eq!(lex.iter().next(), Some("byggnadsingenjor"));
        assert!(lex.contains("ingenjor"));
        assert!(lex.contains("Snickare"));
    }

    #[test]
    fn hyphenated_subset() {
        let lex = lexicon();
        let hy: Vec<_> = lex.hyphenated().collect();
        assert_eq!(hy, vec!["styr-man"]);
    }
}
