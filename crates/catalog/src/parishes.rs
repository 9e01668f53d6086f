use crate::folding::fold;

// ---------------------------------------------------------------------------
// Stockholm parish abbreviations
// ---------------------------------------------------------------------------

/// Known Stockholm parish abbreviations as printed in the directories.
pub static ABBREVIATIONS: &[(&str, &str)] = &[
    ("N.", "Nikolai"),
    ("Kt.", "Katarina"),
    ("M.", "Maria"),
    ("Kh.", "Kungsholms"),
    ("Kl.", "Klara"),
    ("J.", "Jakobs o. Johannes"),
    ("A.", "Adolf Fredriks"),
    ("H.", "Hedvig Eleonora"),
    ("E.", "Engelbrekts"),
    ("O.", "Oscars"),
    ("G.", "Gustaf Wasa"),
    ("Dj:holm", "Djursholm"),
    ("Mt.", "Matteus"),
];

/// Only the letters of a token, punctuation and digits dropped. OCR mangles
/// periods and colons far more often than letters, so abbreviation matching
/// compares skeletons.
pub fn letter_skeleton(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}

/// Exact-key membership in the abbreviation table.
pub fn is_abbreviation(token: &str) -> bool {
    ABBREVIATIONS.iter().any(|(abbr, _)| *abbr == token)
}

/// Expand a parish abbreviation to its full name: exact lookup first, then
/// a skeleton match tolerating one character of length drift.
pub fn expand_abbreviation(token: &str) -> Option<&'static str> {
    if let Some((_, full)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == token) {
        return Some(full);
    }
    let skeleton = letter_skeleton(token);
    ABBREVIATIONS.iter().find_map(|(abbr, full)| {
        let drift = abbr.len().abs_diff(token.len());
        (drift <= 1 && letter_skeleton(abbr) == skeleton).then_some(*full)
    })
}

// ---------------------------------------------------------------------------
// Verified parish reference
// ---------------------------------------------------------------------------

/// One row of the verified parish/municipality reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParishRef {
    pub parish: String,
    pub municipality: String,
    pub mapped_parish: String,
}

#[derive(Debug, Default)]
pub struct ParishReference {
    rows: Vec<ParishRef>,
}

impl ParishReference {
    pub fn from_rows<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = ParishRef>,
    {
        let rows = raw
            .into_iter()
            .map(|r| ParishRef {
                parish: capitalize(&fold(r.parish.trim())),
                municipality: fold(r.municipality.trim()),
                mapped_parish: fold(r.mapped_parish.trim()),
            })
            .filter(|r| !r.parish.is_empty())
            .collect();
        Self { rows }
    }

    pub fn lookup(&self, parish: &str) -> Option<&ParishRef> {
        self.rows.iter().find(|r| r.parish == parish)
    }

    pub fn contains(&self, parish: &str) -> bool {
        self.lookup(parish).is_some()
    }

    /// The mapped name if present, else the parish's own spelling.
    pub fn resolve(&self, parish: &str) -> Option<&str> {
        self.lookup(parish).map(|r| {
            if r.mapped_parish.is_empty() {
                r.parish.as_str()
            } else {
                r.mapped_parish.as_str()
            }
        })
    }

    pub fn parishes(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.parish.as_str())
    }

    pub fn parishes_in<'a>(&'a self, municipality: &'a str) -> impl Iterator<Item = &'a str> {
        self.rows
            .iter()
            .filter(move |r| r.municipality == municipality)
            .map(|r| r.parish.as_str())
    }

    pub fn municipalities(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.municipality.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviation_exact_and_skeleton() {
        assert_eq!(expand_abbreviation("Kh."), Some("Kungsholms"));
        assert_eq!(expand_abbreviation("Kh,"), Some("Kungsholms"));
        assert_eq!(expand_abbreviation("Kh"), Some("Kungsholms"));
        assert_eq!(expand_abbreviation("snickare"), None);
    }

    #[test]
    fn reference_resolve_prefers_mapped() {
        let refs = ParishReference::from_rows([
            ParishRef {
                parish: "katarina".into(),
                municipality: "Stockholm".into(),
                mapped_parish: "Katarina forsamling".into(),
            },
            ParishRef {
                parish: "Bracke".into(),
                municipality: "Jamtland".into(),
                mapped_parish: "".into(),
            },
        ]);
        assert_eq!(refs.resolve("Katarina"), Some("Katarina forsamling"));
        assert_eq!(refs.resolve("Bracke"), Some("Bracke"));
        assert_eq!(refs.resolve("Okand"), None);
        assert_eq!(refs.parishes_in("Jamtland").count(), 1);
    }
}
