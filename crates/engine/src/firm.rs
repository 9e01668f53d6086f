//! Firm and estate tagging. A cue hit sets the flag; parenthesized
//! asides and individual-shaped lines then argue it back off.

use taxkal_catalog::Catalogs;
use taxkal_core::{Entry, JoinCode};

use crate::patterns::Patterns;

/// Set the firm flag on a cue hit, unless the cue only lives inside a
/// parenthesized aside or a dangling parenthesis fragment.
pub fn tag_firm(entry: &mut Entry, catalogs: &Catalogs, patterns: &Patterns) {
    let line = entry.complete_text.clone();
    if catalogs.firm_cues.is_match(&line) {
        entry.firm_flag = true;
    }
    if line.contains('(') {
        let cleaned = patterns.paren_group.replace_all(&line, "");
        if !catalogs.firm_cues.is_match(&cleaned) {
            entry.firm_flag = false;
        }
    }
    if line.contains(')') && !line.contains('(') {
        let mut s = patterns.paren_group.replace_all(&line, "").into_owned();
        if s.contains(')') && !s.contains('(') {
            s = s.split(')').next_back().unwrap_or("").trim().to_string();
        }
        if s.contains('(') && !s.contains(')') {
            s = s.split('(').next().unwrap_or("").trim().to_string();
        }
        if !catalogs.firm_cues.is_match(&s) {
            entry.firm_flag = false;
        }
    }
}

/// Set the estate flag on a cue hit; the cue set's veto list already
/// rejects the known false positives.
pub fn tag_estate(entry: &mut Entry, catalogs: &Catalogs) {
    if catalogs.estate_cues.is_match(&entry.complete_text) {
        entry.estate_flag = true;
    }
}

/// Individual-vs-firm arbitration: a row shaped like a person (occupation,
/// matched surname, "Name, X." opening) loses its firm flag when the cue
/// is parenthetical, a genitive artifact, a dir/kontorist line, a
/// Bank-initial line, or only appears after the occupation. A cleared
/// first half clears its paired second half too.
pub fn arbitrate_individual_firms(
    entries: &mut [Entry],
    catalogs: &Catalogs,
    patterns: &Patterns,
) {
    for entry in entries.iter_mut() {
        arbitrate_one(entry, catalogs, patterns);
    }
    for i in 0..entries.len().saturating_sub(1) {
        if entries[i].join == JoinCode::FirstHalf
            && entries[i].firm_cleared
            && entries[i + 1].join == JoinCode::SecondHalf
            && entries[i + 1].firm_flag
        {
            entries[i + 1].firm_flag = false;
        }
    }
}

fn arbitrate_one(entry: &mut Entry, catalogs: &Catalogs, patterns: &Patterns) {
    entry.firm_cleared = false;
    if !(entry.firm_flag
        && !entry.occupation.is_empty()
        && !entry.surname.is_empty()
        && patterns.name_then_initial.is_match(&entry.text))
    {
        return;
    }
    let line = entry.text.replace("A.-B.", "");
    if !patterns.word_then_initial.is_match(&line) {
        return;
    }

    let complete = entry.complete_text.clone();
    if complete.contains('(') {
        let cleaned = patterns.paren_group.replace_all(&complete, "");
        if catalogs.firm_cues.is_match(&complete) && !catalogs.firm_cues.is_match(&cleaned) {
            entry.firm_flag = false;
            entry.firm_cleared = true;
        }
        return;
    }

    // A genitive 's' on the surname faked the firm shape.
    if let Some(base) = entry.surname.strip_suffix('s') {
        if !catalogs.surnames.contains(base) {
            entry.firm_flag = false;
            entry.firm_cleared = true;
            return;
        }
    }

    if line.contains("dir") || line.contains("kontorist") {
        entry.firm_flag = false;
        entry.firm_cleared = true;
        return;
    }
    if line.starts_with("Bank") {
        entry.firm_flag = false;
        entry.firm_cleared = true;
        return;
    }

    let lowered = complete.to_lowercase();
    if let Some(pos) = lowered.find(&entry.occupation) {
        let tail = &lowered[pos + entry.occupation.len()..];
        if catalogs.firm_cues.is_match(tail) {
            entry.firm_flag = false;
            entry.firm_cleared = true;
        }
    }
}

/// A firm row whose "initials" carry several lowercase letters picked up a
/// word from the firm name, not a person's initials.
pub fn clear_firm_initials(entry: &mut Entry) {
    let lower_count = entry
        .initials
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .count();
    if entry.firm_flag && lower_count > 3 {
        entry.initials.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxkal_catalog::{
        DirtyNames, FirstNames, OccupationLexicon, ParishReference, SurnameRegister,
    };
    use taxkal_core::Line;

    fn catalogs() -> Catalogs {
        let surnames =
            SurnameRegister::from_names(["Berg", "Lind"].map(String::from)).unwrap();
        let first_names = FirstNames::from_names(["Karl"].map(String::from));
        let occupations =
            OccupationLexicon::from_terms(["snickare", "direktor"].map(String::from)).unwrap();
        let parishes = ParishReference::from_rows([]);
        let dirty = DirtyNames::from_pairs([]);
        Catalogs::new(surnames, first_names, occupations, parishes, dirty).unwrap()
    }

    fn entry(text: &str) -> Entry {
        let mut e = Entry::new(Line::new(1, 1, 1, text));
        e.join = JoinCode::Complete;
        e
    }

    #[test]
    fn firm_cue_sets_flag() {
        let cats = catalogs();
        let pats = Patterns::new().unwrap();
        let mut e = entry("Skandia Aktiebol. 16500");
        tag_firm(&mut e, &cats, &pats);
        assert!(e.firm_flag);

        let mut person = entry("Berg, K., snickare 2100");
        tag_firm(&mut person, &cats, &pats);
        assert!(!person.firm_flag);
    }

    #[test]
    fn parenthesized_cue_does_not_count() {
        let cats = catalogs();
        let pats = Patterns::new().unwrap();
        let mut e = entry("Berg, K., snickare (Aktiebol. Skandia) 2100");
        tag_firm(&mut e, &cats, &pats);
        assert!(!e.firm_flag);
    }

    #[test]
    fn estate_flag_with_veto() {
        let cats = catalogs();
        let mut e = entry("Bergs starbhus 3200");
        tag_estate(&mut e, &cats);
        assert!(e.estate_flag);

        let mut vetoed = entry("Bergs starbhusnot. 3200");
        tag_estate(&mut vetoed, &cats);
        assert!(!vetoed.estate_flag);
    }

    #[test]
    fn genitive_surname_clears_firm() {
        let cats = catalogs();
        let pats = Patterns::new().unwrap();
        let mut e = entry("Holms, K., snickare Aktiebol. 2100");
        e.firm_flag = true;
        e.occupation = "snickare".to_string();
        e.surname = "Holms".to_string();
        let mut entries = vec![e];
        arbitrate_individual_firms(&mut entries, &cats, &pats);
        assert!(!entries[0].firm_flag);
        assert!(entries[0].firm_cleared);
    }

    #[test]
    fn cue_after_occupation_clears_firm() {
        let cats = catalogs();
        let pats = Patterns::new().unwrap();
        let mut e = entry("Berg, K., snickare hos aktiebol. 2100");
        e.firm_flag = true;
        e.occupation = "snickare".to_string();
        e.surname = "Berg".to_string();
        let mut entries = vec![e];
        arbitrate_individual_firms(&mut entries, &cats, &pats);
        assert!(!entries[0].firm_flag);
    }

    #[test]
    fn cleared_first_half_clears_second_half() {
        let cats = catalogs();
        let pats = Patterns::new().unwrap();
        let mut first = entry("Holms, K., snickare Aktiebol.");
        first.join = JoinCode::FirstHalf;
        first.firm_flag = true;
        first.occupation = "snickare".to_string();
        first.surname = "Holms".to_string();
        let mut second = entry("16500 - 4400");
        second.join = JoinCode::SecondHalf;
        second.firm_flag = true;
        let mut entries = vec![first, second];
        arbitrate_individual_firms(&mut entries, &cats, &pats);
        assert!(!entries[0].firm_flag);
        assert!(!entries[1].firm_flag);
    }

    #[test]
    fn firm_initials_with_lowercase_word_cleared() {
        let mut e = entry("x");
        e.firm_flag = true;
        e.initials = "Verkstad".to_string();
        clear_firm_initials(&mut e);
        assert_eq!(e.initials, "");
    }
}
