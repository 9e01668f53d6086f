//! Occupation extraction: exact token matching against the lexicon first,
//! with fuzzy and secondary passes for the rows the exact pass misses.

use taxkal_catalog::Catalogs;
use taxkal_core::{Entry, JoinCode, MatchTier};

use crate::config::EngineConfig;
use crate::similarity::{extract_one, token_sort_ratio};

fn clean_token(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}

fn joined_record(entry: &Entry) -> bool {
    matches!(entry.join, JoinCode::FirstHalf | JoinCode::Complete)
}

/// Exact pass: a lexicon term that appears as a whole token (or a whole
/// comma fragment) of the residual line. The lexicon iterates longest
/// first, so compound titles win over their suffixes.
pub fn extract_occupation(entry: &mut Entry, catalogs: &Catalogs, config: &EngineConfig) {
    entry.occupation.clear();
    let line = entry.residual.trim().to_lowercase();
    let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
    for term in catalogs.occupations.iter() {
        if !line.contains(term.trim_end()) {
            continue;
        }
        let cleaned = clean_token(term);
        let token_hit = line.split_whitespace().any(|t| clean_token(t) == cleaned)
            || line.split(',').any(|t| clean_token(t) == cleaned);
        if token_hit {
            entry.occupation = term.to_string();
            break;
        }
    }
    if entry.occupation.len() < config.limits.min_occupation_len || entry.occupation == "hustru" {
        entry.occupation.clear();
    } else {
        entry.occupation = entry.occupation.trim().to_lowercase();
    }
}

/// Fuzzy pass over the lowercase words of joined records that still have
/// no occupation.
pub fn fuzzy_occupation(entry: &Entry, catalogs: &Catalogs, config: &EngineConfig) -> String {
    let line = &entry.complete_text;
    let eligible = joined_record(entry)
        && !entry.firm_flag
        && !entry.estate_flag
        && entry.tier != MatchTier::NonOccupation
        && entry.occupation.is_empty()
        && line
            .split_whitespace()
            .any(|w| w.chars().next().is_some_and(|c| c.is_lowercase()));
    if !eligible {
        return String::new();
    }
    let candidate = line
        .split_whitespace()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
        .replace(',', " ")
        .trim()
        .to_string();
    if candidate.is_empty() {
        return String::new();
    }
    match extract_one(&candidate, catalogs.occupations.iter()) {
        Some((best, score)) if score >= config.thresholds.occupation_fuzzy => best.to_string(),
        _ => String::new(),
    }
}

/// Secondary occupation: a second lowercase comma fragment distinct from
/// the already-extracted occupation.
pub fn secondary_occupation(entry: &Entry, catalogs: &Catalogs, config: &EngineConfig) -> String {
    let line = entry.complete_text.clone();
    let occ = entry.occupation.clone();
    if !(joined_record(entry)
        && !entry.firm_flag
        && !entry.estate_flag
        && entry.tier != MatchTier::NonOccupation
        && !occ.is_empty())
    {
        return String::new();
    }
    let fragments: Vec<String> = line
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty() && w.chars().next().is_some_and(|c| c.is_lowercase()))
        .filter(|w| token_sort_ratio(w, &occ) < 82.0 && !entry.surname.contains(*w))
        .map(str::to_string)
        .collect();
    if fragments.is_empty() {
        return String::new();
    }
    let candidate = if fragments.len() > 1 && line.starts_with(fragments[0].as_str()) {
        fragments[1].clone()
    } else {
        fragments[0].clone()
    };
    let Some((_, score)) = extract_one(&candidate, catalogs.occupations.iter()) else {
        return String::new();
    };
    let accepted = score >= config.thresholds.secondary_occupation
        && !candidate.contains(&occ)
        && !occ.contains(&candidate)
        && !line.starts_with(candidate.as_str())
        && candidate.to_lowercase() != occ.to_lowercase();
    if accepted {
        candidate
    } else {
        String::new()
    }
}

/// Late re-scan: a comma fragment that equals a lexicon term verbatim fills
/// an occupation the earlier passes missed, except on domestic-role lines.
pub fn rescan_suspect_occupation(entry: &mut Entry, catalogs: &Catalogs) {
    let line = entry.complete_text.clone();
    let domestic = line.contains("froken")
        || line.contains("ankefru")
        || line.match_indices("fru").any(|(p, _)| {
            p == 0 || !line[..p].chars().next_back().is_some_and(char::is_alphanumeric)
        });
    if !(entry.occupation.is_empty()
        && !entry.firm_flag
        && joined_record(entry)
        && entry.tier != MatchTier::NonOccupation
        && !domestic)
    {
        return;
    }
    for fragment in line.split(',').map(str::trim) {
        if catalogs.occupations.iter().any(|t| t == fragment) {
            entry.occupation = fragment.to_string();
        }
    }
}

/// An occupation-vs-parish collision: the same token landed in both fields.
/// Lexicon membership decides which one is wrong.
pub fn spot_wrong_occupation(entry: &mut Entry, catalogs: &Catalogs) {
    let occ = entry.occupation.trim().to_string();
    let parish = entry.parish.trim().to_string();
    if occ.is_empty() || parish.is_empty() || occ != parish {
        return;
    }
    if !catalogs.occupations.contains(&occ) {
        entry.occupation.clear();
    } else {
        entry.parish.clear();
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
        let surnames = SurnameRegister::from_names(["Berg"].map(String::from)).unwrap();
        let first_names = FirstNames::from_names(["Karl"].map(String::from));
        let occupations = OccupationLexicon::from_terms(
            ["snickare", "ingenjor", "maskinist", "byggnadsingenjor", "kapten"]
                .map(String::from),
        )
        .unwrap();
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
    fn exact_token_match() {
        let cats = catalogs();
        let cfg = EngineConfig::default();
        let mut e = entry("Berg, K., snickare 2100");
        e.residual = "snickare 2100".to_string();
        extract_occupation(&mut e, &cats, &cfg);
        assert_eq!(e.occupation, "snickare");
    }

    #[test]
    fn longest_term_wins() {
        let cats = catalogs();
        let cfg = EngineConfig::default();
        let mut e = entry("Berg, K., byggnadsingenjor 2100");
        e.residual = "byggnadsingenjor 2100".to_string();
        extract_occupation(&mut e, &cats, &cfg);
        assert_eq!(e.occupation, "byggnadsingenjor");
    }

    #[test]
    fn substring_alone_does_not_match() {
        let cats = catalogs();
        let cfg = EngineConfig::default();
        let mut e = entry("Berg, K., snickarexyz 2100");
        e.residual = "snickarexyz 2100".to_string();
        extract_occupation(&mut e, &cats, &cfg);
        assert_eq!(e.occupation, "");
    }

    #[test]
    fn fuzzy_pass_recovers_misread() {
        let cats = catalogs();
        let cfg = EngineConfig::default();
        let mut e = entry("Berg, K., snickarc 2100");
        assert_eq!(fuzzy_occupation(&e, &cats, &cfg), "snickare");
        e.firm_flag = true;
        assert_eq!(fuzzy_occupation(&e, &cats, &cfg), "");
    }

    #[test]
    fn secondary_occupation_found() {
        let cats = catalogs();
        let cfg = EngineConfig::default();
        let mut e = entry("Berg, K., snickare, maskinist");
        e.occupation = "snickare".to_string();
        assert_eq!(secondary_occupation(&e, &cats, &cfg), "maskinist");
    }

    #[test]
    fn wrong_occupation_cleared_when_not_in_lexicon() {
        let cats = catalogs();
        let mut e = entry("Berg, K., Kh. 2100");
        e.occupation = "Kh.".to_string();
        e.parish = "Kh.".to_string();
        spot_wrong_occupation(&mut e, &cats);
        assert_eq!(e.occupation, "");
        assert_eq!(e.parish, "Kh.");
    }

    #[test]
    fn parish_cleared_when_token_is_occupation() {
        let cats = catalogs();
        let mut e = entry("Berg, K., snickare 2100");
        e.occupation = "snickare".to_string();
        e.parish = "snickare".to_string();
        spot_wrong_occupation(&mut e, &cats);
        assert_eq!(e.occupation, "snickare");
        assert_eq!(e.parish, "");
    }

    #[test]
    fn rescan_fills_missed_fragment() {
        let cats = catalogs();
        let mut e = entry("Berg, K., kapten, Kh. 2100");
        rescan_suspect_occupation(&mut e, &cats);
        assert_eq!(e.occupation, "kapten");
    }
}
