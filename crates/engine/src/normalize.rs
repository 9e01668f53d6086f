use taxkal_catalog::fold;
use taxkal_core::{Entry, Line};

use crate::patterns::Patterns;
use crate::text::numbers;

/// Ingestion normalization: diacritic folding plus the recurring OCR
/// misreads the directories exhibit — a leading "0" for "O.", doubled
/// periods where a comma was printed, and thousands commas inside figures.
pub fn normalize_line(patterns: &Patterns, text: &str) -> String {
    let mut text = fold(text);
    text = patterns.zero_comma.replace_all(&text, "O., ").into_owned();
    text = patterns.space_zero_dot.replace_all(&text, " O.,").into_owned();
    text = patterns
        .double_dot_digit
        .replace_all(&text, "., $1")
        .into_owned();
    text = patterns.double_dot_dash.replace_all(&text, "., -").into_owned();
    text = patterns
        .double_dot_lower
        .replace_all(&text, "$1., $2")
        .into_owned();
    text = squash_comma_figures(patterns, &text);
    text
}

/// "3,200" is one figure, not two, when the line's magnitudes say so: squash
/// the comma unless a number over 100 coexists with none under 10.
fn squash_comma_figures(patterns: &Patterns, text: &str) -> String {
    if !patterns.comma_figure.is_match(text) {
        return text.to_string();
    }
    let nums = numbers(text);
    let plausible = !nums.iter().any(|&n| n > 100) || nums.iter().any(|&n| n < 10);
    if plausible {
        patterns.comma_figure.replace_all(text, "$1$2").into_owned()
    } else {
        text.to_string()
    }
}

/// Build the sorted working entries. Bare "-" separator lines are dropped;
/// the count of dropped lines is returned alongside.
pub fn build_entries(patterns: &Patterns, lines: Vec<Line>) -> (Vec<Entry>, usize) {
    let mut entries: Vec<Entry> = lines
        .into_iter()
        .filter(|l| !l.text.trim().is_empty())
        .map(|mut l| {
            l.text = normalize_line(patterns, l.text.trim());
            Entry::new(l)
        })
        .collect();
    let before = entries.len();
    entries.retain(|e| e.text != "-");
    let dropped = before - entries.len();
    entries.sort_by_key(|e| (e.line.page, e.line.column, e.line.row));
    (entries, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Patterns {
        Patterns::new().unwrap()
    }

    #[test]
    fn zero_becomes_initial_o() {
        let p = patterns();
        assert_eq!(
            normalize_line(&p, "Berg, 0, snickare 2100"),
            "Berg, O., snickare 2100"
        );
    }

    #[test]
    fn double_dots_become_comma() {
        let p = patterns();
        assert_eq!(normalize_line(&p, "Berg, K.. 3200"), "Berg, K., 3200");
        assert_eq!(normalize_line(&p, "Berg, K.. snickare"), "Berg, K., snickare");
    }

    #[test]
    fn thousands_comma_squashed_only_when_plausible() {
        let p = patterns();
        assert_eq!(normalize_line(&p, "Berg, K., hus 3, 200"), "Berg, K., hus 3200");
        // A large figure alongside says the comma separates two numbers.
        assert_eq!(
            normalize_line(&p, "Berg 3200, 15 ha"),
            "Berg 3200, 15 ha"
        );
    }

    #[test]
    fn folding_applied() {
        let p = patterns();
        assert_eq!(normalize_line(&p, "Törnqvist, K."), "Tornqvist, K.");
    }

    #[test]
    fn dash_lines_dropped_and_sorted() {
        let p = patterns();
        let lines = vec![
            Line::new(1, 2, 1, "Berg"),
            Line::new(1, 1, 2, "-"),
            Line::new(1, 1, 1, "Lind"),
        ];
        let (entries, dropped) = build_entries(&p, lines);
        assert_eq!(dropped, 1);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Lind");
        assert_eq!(entries[1].text, "Berg");
    }
}
