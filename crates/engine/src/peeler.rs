//! Residual field peeling: the record text is consumed field by field.
//! After the surname is removed, what remains is the residual line; each
//! extracted field (initials, second surname, occupation) is peeled off it
//! in turn so later extractors see a shorter, cleaner string.

use taxkal_catalog::{Catalogs, FirstNames};
use taxkal_core::Entry;

use crate::patterns::Patterns;
use crate::text::{drop_leading_word, has_lower, has_upper, remove_first};

/// Remove a just-extracted field from the residual: first occurrence only,
/// then drop the dangling fragment of the word it was cut from.
fn peel(residual: &str, field: &str) -> String {
    if field.trim().is_empty() {
        return residual.to_string();
    }
    let cut = remove_first(residual, field);
    drop_leading_word(&cut).to_string()
}

/// Seed the residual line: the record text with the surname peeled off.
pub fn residual_after_surname(entry: &mut Entry) {
    entry.residual = peel(&entry.complete_text, &entry.surname.clone());
}

// ---------------------------------------------------------------------------
// Initials
// ---------------------------------------------------------------------------

/// Collect the run of initial-shaped tokens at the front of the residual.
/// The run ends at a token carrying a comma, before a long lowercase word,
/// or at the first non-initial token once the run has started.
pub fn extract_initials(entry: &mut Entry, catalogs: &Catalogs, patterns: &Patterns) {
    let line = patterns
        .comma_spacing
        .replace_all(&entry.residual, ", ")
        .into_owned();
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let mut run: Vec<&str> = Vec::new();
    let mut started = false;
    for (i, token) in tokens.iter().enumerate() {
        if catalogs.shapes.initials.is_match(token) {
            run.push(token);
            started = true;
            let next = tokens.get(i + 1).copied().unwrap_or("");
            if token.contains(',') || (next.len() > 4 && has_lower(next)) {
                break;
            }
        } else if started {
            break;
        }
    }

    let joined = run.join(" ").replace(',', "");
    // "A.-B." reads like initials but is the company abbreviation.
    entry.initials = patterns.ab_abbrev.replace_all(&joined, "").into_owned();
}

/// Fall back to a full first name when no initials were found and the line
/// is not a firm listing.
pub fn first_name_fallback(entry: &mut Entry, first_names: &FirstNames, catalogs: &Catalogs) {
    if !entry.initials.is_empty() {
        return;
    }
    let line = entry.text.replace(',', "");
    if catalogs.firm_cues.is_match(&line) {
        return;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return;
    }
    for word in &words[..words.len() - 1] {
        if first_names.candidates(word).iter().any(|c| c == word) && *word != entry.surname {
            entry.initials = (*word).to_string();
            break;
        }
    }
}

/// Peel the initials off the residual, clearing degenerate dot-only runs.
pub fn residual_after_initials(entry: &mut Entry) {
    let initials = entry.initials.clone();
    entry.residual = peel(&entry.residual, &initials);
    if entry.initials == "." {
        entry.initials.clear();
    } else if entry.initials.starts_with('.') {
        entry.initials = entry.initials.trim().to_string();
    }
}

/// Initials echoed twice in the line (an OCR doubling) keep only the first
/// occurrence when a comma separates the copies.
pub fn adjust_duplicate_initials(entry: &mut Entry) {
    let initials = entry.initials.clone();
    let line = &entry.complete_text;
    let tokens: Vec<&str> = initials.split_whitespace().collect();
    for w in &tokens {
        if tokens.iter().filter(|t| *t == w).count() <= 1 {
            continue;
        }
        let positions: Vec<usize> = line.match_indices(*w).map(|(p, _)| p).collect();
        if positions.len() > 1 {
            let cut = &line[positions[0]..*positions.last().unwrap_or(&positions[0])];
            if cut.contains(',') {
                if let Some(last) = initials.rfind(*w) {
                    entry.initials = initials[..last].trim().to_string();
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Second surname
// ---------------------------------------------------------------------------

/// A leading residual token with a colon contraction ("J:son") is a second
/// surname, not initials.
pub fn extract_second_surname(entry: &mut Entry, catalogs: &Catalogs) {
    let Some(first_token) = entry.residual.split_whitespace().next() else {
        return;
    };
    let token = first_token.replace(',', "");
    if token.contains(':') && has_upper(&token) && !catalogs.firm_cues.is_match(&token) {
        entry.second_surname = token;
    }
    let second = entry.second_surname.clone();
    entry.residual = peel(&entry.residual, &second);
}

// ---------------------------------------------------------------------------
// Former-title marker
// ---------------------------------------------------------------------------

/// Strip an "f. d." (former) title marker, remembering it on the entry.
pub fn strip_former_title(entry: &mut Entry, catalogs: &Catalogs) {
    if !catalogs.shapes.former_title.is_match(&entry.residual) {
        return;
    }
    entry.former_title = true;
    entry.residual = catalogs
        .shapes
        .former_title
        .replace_all(&entry.residual, "")
        .into_owned();
    if entry.residual.starts_with(',') {
        entry.residual = entry.residual[1..].trim().to_string();
    }
}

// ---------------------------------------------------------------------------
// Occupation peel
// ---------------------------------------------------------------------------

/// Peel the occupation off the residual. When no occupation was extracted,
/// an all-lowercase leading comma fragment is peeled instead.
pub fn residual_after_occupation(entry: &mut Entry) {
    let occ = if !entry.occupation.is_empty() {
        entry.occupation.trim().to_string()
    } else {
        let first = entry
            .residual
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        if first.is_empty() || !has_lower(&first) || has_upper(&first) {
            return;
        }
        first
    };

    entry.residual = entry.residual.trim().to_string();
    let lowered = entry.residual.to_lowercase();
    let needle = occ.to_lowercase();
    if needle.is_empty() {
        return;
    }
    if let Some(pos) = lowered.find(&needle) {
        let tail = &entry.residual[pos + needle.len()..];
        entry.residual = drop_leading_word(tail).to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxkal_catalog::{
        DirtyNames, OccupationLexicon, ParishReference, SurnameRegister,
    };
    use taxkal_core::Line;

    fn catalogs() -> Catalogs {
        let surnames = SurnameRegister::from_names(["Berg"].map(String::from)).unwrap();
        let first_names = FirstNames::from_names(["Karl", "Erik"].map(String::from));
        let occupations =
            OccupationLexicon::from_terms(["snickare"].map(String::from)).unwrap();
        let parishes = ParishReference::from_rows([]);
        let dirty = DirtyNames::from_pairs([]);
        Catalogs::new(surnames, first_names, occupations, parishes, dirty).unwrap()
    }

    fn entry(text: &str) -> Entry {
        Entry::new(Line::new(1, 1, 1, text))
    }

    #[test]
    fn residual_drops_surname_and_fragment() {
        let mut e = entry("Bergstrom, K. A., snickare 2100");
        e.surname = "Bergstrom".to_string();
        residual_after_surname(&mut e);
        assert_eq!(e.residual, ", K. A., snickare 2100");
    }

    #[test]
    fn initials_run_collected() {
        let cats = catalogs();
        let pats = Patterns::new().unwrap();
        let mut e = entry("Berg, K. A., snickare 2100");
        e.residual = ", K. A., snickare 2100".to_string();
        extract_initials(&mut e, &cats, &pats);
        assert_eq!(e.initials, "K. A.");
    }

    #[test]
    fn initials_stop_before_long_lowercase_word() {
        let cats = catalogs();
        let pats = Patterns::new().unwrap();
        let mut e = entry("Berg, K. snickare 2100");
        e.residual = "K. snickare 2100".to_string();
        extract_initials(&mut e, &cats, &pats);
        assert_eq!(e.initials, "K.");
    }

    #[test]
    fn company_abbreviation_not_initials() {
        let cats = catalogs();
        let pats = Patterns::new().unwrap();
        let mut e = entry("Berg A.-B. 16500");
        e.residual = "A.-B. 16500".to_string();
        extract_initials(&mut e, &cats, &pats);
        assert_eq!(e.initials, "");
    }

    #[test]
    fn first_name_fallback_fills_empty_initials() {
        let cats = catalogs();
        let first = FirstNames::from_names(["Karl", "Erik"].map(String::from));
        let mut e = entry("Berg, Karl snickare 2100");
        e.surname = "Berg".to_string();
        first_name_fallback(&mut e, &first, &cats);
        assert_eq!(e.initials, "Karl");
    }

    #[test]
    fn second_surname_has_colon_contraction() {
        let cats = catalogs();
        let mut e = entry("Berg, J:son, snickare 2100");
        e.residual = "J:son, snickare 2100".to_string();
        extract_second_surname(&mut e, &cats);
        assert_eq!(e.second_surname, "J:son");
        assert!(e.residual.starts_with(", snickare"));
    }

    #[test]
    fn former_title_stripped_and_flagged() {
        let cats = catalogs();
        let mut e = entry("Berg, K., f. d. kapten 2100");
        e.residual = "f. d. kapten 2100".to_string();
        strip_former_title(&mut e, &cats);
        assert!(e.former_title);
        assert!(!e.residual.contains("f. d."));
        assert!(e.residual.contains("kapten"));
    }

    #[test]
    fn occupation_peeled_case_insensitively() {
        let mut e = entry("Berg, K., Snickare Kh. 2100");
        e.residual = "Snickare Kh. 2100".to_string();
        e.occupation = "snickare".to_string();
        residual_after_occupation(&mut e);
        assert_eq!(e.residual, "Kh. 2100");
    }

    #[test]
    fn duplicate_initials_truncated() {
        let mut e = entry("Berg, K. A., kapten, K. A. 2100");
        e.initials = "K. A. K. A.".to_string();
        adjust_duplicate_initials(&mut e);
        assert!(e.initials.len() < "K. A. K. A.".len());
    }
}
