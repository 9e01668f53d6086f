use crate::folding::fold;

/// Manually curated raw-OCR-substring to clean-surname corrections, applied
/// as a last resort when the resolver cascade ends unmatched.
#[derive(Debug, Default)]
pub struct DirtyNames {
    pairs: Vec<(String, String)>,
}

impl DirtyNames {
    pub fn from_pairs<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut pairs: Vec<(String, String)> = raw
            .into_iter()
            .map(|(d, c)| (fold(d.trim()), fold(c.trim())))
            .filter(|(d, c)| !d.is_empty() && !c.is_empty())
            .collect();
        pairs.dedup_by(|a, b| a.0 == b.0);
        Self { pairs }
    }

    /// Clean surname for the first dirty substring found in the line.
    pub fn lookup_in(&self, line: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(dirty, _)| line.contains(dirty))
            .map(|(_, clean)| clean.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_lookup() {
        let dirty = DirtyNames::from_pairs([
            ("Anderssen".to_string(), "Andersson".to_string()),
            ("Biurman".to_string(), "Bjurman".to_string()),
        ]);
        assert_eq!(dirty.lookup_in("Anderssen, K., bagare 1200"), Some("Andersson"));
        assert_eq!(dirty.lookup_in("Lind, E. 900"), None);
    }
}
