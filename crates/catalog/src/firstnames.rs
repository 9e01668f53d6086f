use std::collections::{HashMap, HashSet};

use crate::folding::fold;

/// The first-name set, indexed by two-character prefix so the fallback scan
/// in the peeler only compares against a handful of candidates per word.
#[derive(Debug, Default)]
pub struct FirstNames {
    names: HashSet<String>,
    prefix: HashMap<String, Vec<String>>,
}

impl FirstNames {
    pub fn from_names<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut names = HashSet::new();
        let mut prefix: HashMap<String, Vec<String>> = HashMap::new();
        for name in raw {
            let name = fold(name.trim());
            if name.is_empty() {
                continue;
            }
            if names.insert(name.clone()) {
                let cut: String = name.chars().take(2).collect();
                prefix.entry(cut).or_default().push(name);
            }
        }
        Self { names, prefix }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.names.contains(word)
    }

    /// Candidate names sharing the word's two-character prefix.
    pub fn candidates(&self, word: &str) -> &[String] {
        let cut: String = word.chars().take(2).collect();
        self.prefix.get(&cut).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_candidates() {
        let names = FirstNames::from_names(["Karl", "Kalle", "Erik", "Östen"].map(String::from));
        assert!(names.contains("Karl"));
        assert!(names.contains("Osten"));
        let ka = names.candidates("Kanon");
        assert_eq!(ka.len(), 2);
        assert!(names.candidates("Zz").is_empty());
    }
}
