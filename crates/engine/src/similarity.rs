use strsim::levenshtein;

/// Token-sort ratio: whitespace tokens of both strings are sorted and
/// rejoined before a normalized Levenshtein comparison, so word order does
/// not count against OCR text. Scale 0-100.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

/// Normalized Levenshtein similarity on the raw strings, scale 0-100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 100.0;
    }
    let dist = levenshtein(a, b);
    100.0 * (1.0 - dist as f64 / longest as f64)
}

/// Best token-sort match among the candidates, with its score. Ties go to
/// the earliest candidate, which keeps longest-first orderings meaningful.
pub fn extract_one<'a, I>(query: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let sorted_query = sort_tokens(query);
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = ratio(&sort_tokens(candidate), &sorted_query);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_scores_hundred() {
        assert_eq!(token_sort_ratio("Andersson", "Andersson"), 100.0);
        assert_eq!(token_sort_ratio("", ""), 100.0);
    }

    #[test]
    fn word_order_is_free() {
        assert_eq!(token_sort_ratio("Karl Andersson", "Andersson Karl"), 100.0);
    }

    #[test]
    fn one_edit_in_nine() {
        let score = token_sort_ratio("Andersson", "Anderssen");
        assert!((score - 100.0 * (1.0 - 1.0 / 9.0)).abs() < 1e-9);
    }

    #[test]
    fn extract_one_picks_best() {
        let names = ["Berg", "Bergstrom", "Lind"];
        let (best, score) = extract_one("Bergstrom", names.iter().copied()).unwrap();
        assert_eq!(best, "Bergstrom");
        assert_eq!(score, 100.0);
    }

    #[test]
    fn extract_one_empty_candidates() {
        assert!(extract_one("Berg", std::iter::empty()).is_none());
    }
}
