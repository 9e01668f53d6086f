use std::collections::HashMap;

use crate::error::CatalogError;
use crate::folding::fold;

/// The surname register: attested surnames sorted longest-first, with a
/// two-character prefix index for the first fuzzy pass and a slice of
/// `von`-prefixed names for `V.` recovery.
///
/// The register excludes anything containing the domestic-role word
/// "hustru"; those rows are transcription noise in the source table.
#[derive(Debug)]
pub struct SurnameRegister {
    names: Vec<String>,
    prefix: HashMap<String, Vec<usize>>,
    von: Vec<usize>,
}

impl SurnameRegister {
    pub fn from_names<I>(raw: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut names: Vec<String> = raw
            .into_iter()
            .map(|n| fold(n.trim()))
            .filter(|n| !n.is_empty() && !n.contains("hustru"))
            .collect();
        names.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();
        if names.is_empty() {
            return Err(CatalogError::EmptyTable("surnames".into()));
        }

        let mut prefix: HashMap<String, Vec<usize>> = HashMap::new();
        let mut von = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let cut: String = name.chars().take(2).collect();
            prefix.entry(cut).or_default().push(i);
            if name.starts_with("von") {
                von.push(i);
            }
        }
        Ok(Self { names, prefix, von })
    }

    /// All names, longest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Names sharing the given two-character prefix, longest first.
    pub fn with_prefix(&self, cut: &str) -> impl Iterator<Item = &str> {
        self.prefix
            .get(cut)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|&i| self.names[i].as_str())
    }

    /// The `von`-prefixed slice, longest first.
    pub fn von_names(&self) -> impl Iterator<Item = &str> {
        self.von.iter().map(|&i| self.names[i].as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
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

    fn register() -> SurnameRegister {
        SurnameRegister::from_names(
            ["Andersson", "Berg", "von Essen", "Lind", "hustru Berg", "Törnqvist"]
                .map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn sorted_longest_first_and_folded() {
        let reg = register();
        let names: Vec<_> = reg.iter().collect();
        assert_eq!(names[0], "Andersson");
        assert!(names.contains(&"Tornqvist"));
        assert!(!names.iter().any(|n| n.contains("hustru")));
    }

    #[test]
    fn prefix_index() {
        let reg = register();
        let an: Vec<_> = reg.with_prefix("An").collect();
        assert_eq!(an, vec!["Andersson"]);
        assert_eq!(reg.with_prefix("Zz").count(), 0);
    }

    #[test]
    fn von_slice() {
        let reg = register();
        let von: Vec<_> = reg.von_names().collect();
        assert_eq!(von, vec!["von Essen"]);
    }

    #[test]
    fn empty_register_rejected() {
        assert!(SurnameRegister::from_names(Vec::new()).is_err());
    }
}
