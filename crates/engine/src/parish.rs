//! Parish extraction and reconciliation. Parish handling spans several
//! passes: three extraction variants over the assembled record text, a
//! post-processing veto chain, abbreviation and reference mapping, fills
//! for rows and firm rows still missing one, and a final quality check
//! against the verified reference table.

use std::collections::HashSet;

use taxkal_catalog::{expand_abbreviation, is_abbreviation, Catalogs};
use taxkal_core::{Entry, JoinCode, MatchTier};

use crate::config::EngineConfig;
use crate::patterns::Patterns;
use crate::similarity::extract_one;
use crate::text::{has_digit, has_letter, has_lower, has_upper};

fn joined_record(entry: &Entry) -> bool {
    matches!(entry.join, JoinCode::FirstHalf | JoinCode::Complete)
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Walk back from the first letterless number token to the nearest token
/// that carries letters. The number itself must not open the line.
fn candidate_before_number(tokens: &[String]) -> Option<String> {
    let pos = tokens
        .iter()
        .position(|t| !has_letter(t) && has_digit(t))?;
    if pos == 0 {
        return None;
    }
    let mut j = 1;
    while pos > j {
        let token = &tokens[pos - j];
        if has_letter(token) {
            return Some(token.trim().to_string());
        }
        j += 1;
    }
    None
}

fn is_upper_lower_pair(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(a), Some(b), None) if a.is_ascii_uppercase() && b.is_ascii_lowercase()
    )
}

fn is_single_lower(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), None, _) => a.is_ascii_lowercase(),
        (Some(a), Some('.'), None) => a.is_ascii_lowercase(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Extraction passes
// ---------------------------------------------------------------------------

/// First pass: the token just before the income figures, accepted when it
/// is initials- or abbreviation-shaped. A parish token that was swept into
/// the initials run is stripped back out when a comma separates them.
pub fn extract_parish(entry: &mut Entry, catalogs: &Catalogs, patterns: &Patterns) {
    let line = entry.complete_text.clone();

    let flat = line.replace(',', " ").replace('-', "");
    let flat = collapse_ws(&flat);
    let flat = patterns
        .digits_then_letters
        .replace_all(&flat, "$1")
        .into_owned();
    let tokens: Vec<String> = flat.split_whitespace().map(str::to_string).collect();

    let Some(candidate) = candidate_before_number(&tokens) else {
        return;
    };
    let shaped = catalogs.shapes.initials.is_match(&candidate)
        || catalogs.shapes.parish_candidate.is_match(&candidate)
        || is_upper_lower_pair(&candidate);
    if !(shaped && joined_record(entry)) {
        return;
    }
    if !line.contains(&candidate) {
        return;
    }
    entry.parish = candidate.clone();

    let initials = entry.initials.clone();
    if initials.contains(&candidate) && comma_between_tokens(&initials, &line) {
        let toks: Vec<&str> = initials.split_whitespace().collect();
        if toks.last().copied() == Some(candidate.as_str()) {
            entry.initials = toks[..toks.len() - 1].join(" ");
        } else {
            entry.initials = initials.replace(&candidate, "");
        }
    }
}

/// True when a comma sits between two adjacent tokens of `run` as they
/// appear in `line`.
fn comma_between_tokens(run: &str, line: &str) -> bool {
    let tokens: Vec<&str> = run.split_whitespace().collect();
    for pair in tokens.windows(2) {
        let (Some(a), Some(b)) = (line.find(pair[0]), line.find(pair[1])) else {
            continue;
        };
        if a < b && line[a..b].contains(',') {
            return true;
        }
    }
    false
}

/// Second pass for rows without an initials-shaped parish: a comma
/// fragment just before the figures carrying both cases, a hyphen, or a
/// colon contraction.
pub fn extract_parish_loose(entry: &mut Entry, patterns: &Patterns) {
    extract_from_fragments(entry, patterns, false);
}

/// Third pass over the residual edge cases: same fragment walk, but only
/// dash-joined figure pairs are spliced apart, and a bare lowercase letter
/// is accepted too.
pub fn extract_parish_residual(entry: &mut Entry, patterns: &Patterns) {
    extract_from_fragments(entry, patterns, true);
}

fn extract_from_fragments(entry: &mut Entry, patterns: &Patterns, residual_pass: bool) {
    let line = entry.complete_text.clone();
    let sec = collapse_ws(&line);
    let sec = patterns
        .digits_then_letters
        .replace_all(&sec, "$1")
        .into_owned();

    let mut fragments: Vec<String> = sec.split(',').map(str::to_string).collect();
    let mut h = 0;
    while h < fragments.len() {
        let splice = if residual_pass {
            patterns.number_dash_number.is_match(&fragments[h])
        } else {
            has_digit(&fragments[h])
        };
        if splice {
            let parts: Vec<String> = fragments[h]
                .replace('-', " ")
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if parts.len() > 1 {
                let n = parts.len();
                fragments.splice(h..h + 1, parts);
                h += n;
                continue;
            }
        }
        h += 1;
    }

    let Some(candidate) = candidate_before_number(&fragments) else {
        return;
    };

    let dash_parts: Vec<&str> = candidate.split('-').collect();
    let mixed = (candidate.contains('-')
        || candidate.contains(':')
        || candidate
            .split_whitespace()
            .any(|w| has_lower(w) && !has_upper(w)))
        && joined_record(entry)
        && entry.parish.is_empty()
        && dash_parts.iter().any(|w| has_lower(w))
        && dash_parts.iter().any(|w| has_upper(w));
    let accepted = mixed || (residual_pass && is_single_lower(&candidate));
    if !accepted {
        return;
    }
    if !line.contains(&candidate) && has_digit(&candidate) {
        return;
    }
    if candidate != entry.occupation {
        entry.parish = candidate;
    }
}

// ---------------------------------------------------------------------------
// Post-processing vetoes
// ---------------------------------------------------------------------------

/// The veto chain run after the extraction passes: non-name lines carry no
/// parish, digits are stripped, firm cues and occupation vocabulary
/// disqualify the token.
pub fn clear_suspect_parishes(entry: &mut Entry, catalogs: &Catalogs) {
    if entry.tier == MatchTier::NonOccupation {
        entry.parish.clear();
    }
    entry.parish = entry
        .parish
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect();
    if catalogs.firm_cues.is_match(&entry.parish) {
        entry.parish.clear();
    }
    if !entry.occupation.is_empty() && entry.parish.ends_with(&entry.occupation) {
        entry.parish.clear();
    }
    let lowered = entry.parish.to_lowercase();
    let vocab_hit = catalogs.occupations.contains(&lowered)
        || catalogs.firm_cues.is_match(&entry.parish)
        || lowered
            .split_whitespace()
            .any(|w| catalogs.occupations.contains(w));
    let lower_count = entry
        .parish
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .count();
    if vocab_hit && lower_count > 4 && !entry.parish.contains('-') {
        entry.parish.clear();
    }
}

// ---------------------------------------------------------------------------
// Abbreviation and reference mapping
// ---------------------------------------------------------------------------

/// Map the extracted token to its verified name: abbreviation table first
/// (exact, then letter skeleton), then the reference table.
pub fn map_parish(entry: &mut Entry, catalogs: &Catalogs) {
    if entry.parish.is_empty() {
        return;
    }
    if let Some(full) = expand_abbreviation(&entry.parish) {
        entry.matched_parish = full.to_string();
    } else if let Some(resolved) = catalogs.parishes.resolve(&entry.parish) {
        entry.matched_parish = resolved.to_string();
    }
}

// ---------------------------------------------------------------------------
// Fills for rows still missing a parish
// ---------------------------------------------------------------------------

/// Fill a missing parish from the fragment just before the first figure
/// above 50. Runs in a comma variant and a whitespace variant.
pub fn fill_missing_parish(entry: &mut Entry, catalogs: &Catalogs, comma: bool) {
    if !(entry.parish.is_empty()
        && joined_record(entry)
        && !entry.initials.is_empty()
        && entry.tier != MatchTier::NonOccupation)
    {
        return;
    }
    let line = entry.complete_text.clone();
    let fragments: Vec<&str> = if comma {
        line.split(',').collect()
    } else {
        line.split_whitespace().collect()
    };
    let Some(number) = crate::text::numbers(&line)
        .into_iter()
        .find(|&n| n > 50)
        .map(|n| n.to_string())
    else {
        return;
    };
    let Some(idx) = fragments.iter().position(|p| p.contains(&number)) else {
        return;
    };
    if idx == 0 {
        return;
    }
    let mut candidate = fragments[idx - 1].trim().to_string();
    if candidate.is_empty() && idx > 1 {
        candidate = fragments[idx - 2].trim().to_string();
    }
    if catalogs.parishes.contains(&candidate) || has_upper(&candidate) {
        entry.parish = candidate.clone();
        if let Some(resolved) = catalogs.parishes.resolve(&candidate) {
            entry.matched_parish = resolved.to_string();
        }
    }
}

/// Firm rows get their parish from the fragment before the figures:
/// initials-shaped candidates in the first two variants, a short mixed-case
/// word in the third.
pub fn fill_firm_parish(entry: &mut Entry, catalogs: &Catalogs, initials_shaped: bool, comma: bool) {
    if !(entry.firm_flag && entry.parish.is_empty() && joined_record(entry)) {
        return;
    }
    let line = entry.complete_text.clone();
    let fragments: Vec<&str> = if comma {
        line.split(',').collect()
    } else {
        line.split_whitespace().collect()
    };
    let number = crate::text::numbers(&line)
        .into_iter()
        .find(|&n| n > 50)
        .map(|n| n.to_string())
        .unwrap_or_default();
    let Some(pos) = fragments.iter().position(|w| w.contains(&number)) else {
        return;
    };
    if pos == 0 {
        return;
    }
    let candidate = fragments[pos - 1].trim();
    if candidate.is_empty() {
        return;
    }
    if initials_shaped {
        let short_alpha = (1..=2).contains(&candidate.len())
            && candidate.chars().all(|c| c.is_ascii_alphabetic());
        if (catalogs.shapes.initials.is_match(candidate)
            && !catalogs.firm_cues.is_match(candidate))
            || short_alpha
        {
            entry.parish = candidate.to_string();
        }
    } else if has_upper(candidate)
        && has_lower(candidate)
        && !catalogs.firm_cues.is_match(candidate)
        && candidate.len() <= 25
    {
        entry.parish = candidate.to_string();
    }
}

// ---------------------------------------------------------------------------
// Firm leakage into the parish column
// ---------------------------------------------------------------------------

/// Split the distinct parish values of a run into clean ones and ones that
/// carry a firm cue; the firm set drives [`strip_firm_parish`].
pub fn parish_vocabulary(
    entries: &[Entry],
    catalogs: &Catalogs,
) -> (HashSet<String>, HashSet<String>) {
    let mut clean = HashSet::new();
    let mut firm = HashSet::new();
    for entry in entries {
        if entry.parish.is_empty() {
            continue;
        }
        if catalogs.firm_cues.is_match(&entry.parish) {
            firm.insert(entry.parish.clone());
        } else {
            clean.insert(entry.parish.clone());
        }
    }
    (clean, firm)
}

/// Clear firm names leaked into the parish column, recovering the trailing
/// word when it is itself a known-clean parish value.
pub fn strip_firm_parish(
    entry: &mut Entry,
    clean: &HashSet<String>,
    firm: &HashSet<String>,
    catalogs: &Catalogs,
) {
    let parish = entry.parish.clone();
    if parish.is_empty() {
        return;
    }
    let occ_leak =
        !entry.occupation.is_empty() && parish.contains(&entry.occupation) && entry.occupation.len() > 4;
    if !(firm.contains(&parish) || occ_leak || parish.len() > 30) {
        return;
    }
    entry.parish.clear();
    if let Some(candidate) = parish.split_whitespace().last() {
        if clean.contains(candidate) && !catalogs.firm_cues.is_match(candidate) {
            entry.parish = candidate.to_string();
        }
    }
}

// ---------------------------------------------------------------------------
// Field conflicts
// ---------------------------------------------------------------------------

/// A token claimed by two fields at once: occupation wins over parish, a
/// dotless first name stays initials, the abbreviation table arbitrates
/// parish against second surname, and a firm row's echoed initials clear.
pub fn resolve_field_conflicts(entry: &mut Entry, catalogs: &Catalogs) {
    if !entry.parish.is_empty()
        && entry.parish.to_lowercase() == entry.occupation.to_lowercase()
    {
        entry.parish.clear();
    }
    if !entry.initials.is_empty()
        && entry.parish == entry.initials
        && !entry.initials.contains('.')
        && catalogs.first_names.contains(&entry.initials)
    {
        entry.parish.clear();
    }
    if !entry.parish.is_empty() && entry.parish == entry.second_surname {
        if is_abbreviation(&entry.parish) {
            entry.second_surname.clear();
        } else {
            entry.parish.clear();
        }
    }
    if entry.firm_flag
        && !entry.parish.is_empty()
        && entry.initials == entry.parish
        && entry.complete_text.matches(&entry.initials).count() == 1
    {
        entry.initials.clear();
    }
}

/// A single-token initials value echoed in the parish column of a firm row
/// is a double count; the initials side goes.
pub fn final_initials_adjustment(entry: &mut Entry) {
    if entry.firm_flag
        && entry.parish == entry.initials
        && entry.initials.split_whitespace().count() == 1
    {
        entry.initials.clear();
    }
}

// ---------------------------------------------------------------------------
// Double-count resolution
// ---------------------------------------------------------------------------

fn double_counted(entry: &Entry) -> bool {
    !entry.initials.is_empty()
        && !entry.firm_flag
        && entry.parish == entry.initials
        && entry.complete_text.matches(&entry.initials).count() == 1
}

/// Individual rows where parish and initials hold the same token. The
/// position of the occupation decides which side is wrong; when the
/// initials side goes, a full first name from the line replaces it.
pub fn resolve_double_counts(entry: &mut Entry, catalogs: &Catalogs) {
    if double_counted(entry) {
        first_clean(entry, catalogs);
    }
    if double_counted(entry) {
        reseat_initials(entry, catalogs);
    }
}

fn first_clean(entry: &mut Entry, catalogs: &Catalogs) {
    if entry.occupation.is_empty() {
        return;
    }
    let line = entry.complete_text.clone();
    let (Some(pos_occ), Some(pos_init)) = (
        line.to_lowercase().find(&entry.occupation),
        line.find(&entry.initials),
    ) else {
        return;
    };
    if pos_occ == 0 || pos_init == 0 {
        return;
    }
    if pos_occ > pos_init {
        entry.parish.clear();
    } else {
        entry.initials.clear();
        let replacement = line
            .split_whitespace()
            .map(|w| w.replace(',', ""))
            .find(|w| {
                catalogs.first_names.contains(w) && *w != entry.surname && w.len() > 2
            });
        if let Some(name) = replacement {
            entry.initials = name;
        }
    }
}

fn reseat_initials(entry: &mut Entry, catalogs: &Catalogs) {
    if entry.surname.is_empty() {
        return;
    }
    let line = entry.complete_text.clone();
    let fragments: Vec<String> = line.split(',').map(|x| x.trim().to_string()).collect();
    let mixed_line = line
        .split_whitespace()
        .any(|w| has_lower(w) && !has_upper(w))
        && line
            .as_bytes()
            .windows(2)
            .any(|w| w[0].is_ascii_uppercase() && w[1].is_ascii_lowercase());
    if mixed_line {
        let Some(pos) = fragments.iter().position(|x| x.contains(&entry.initials)) else {
            return;
        };
        if pos > 0
            && fragments[pos - 1]
                .split_whitespace()
                .any(|w| has_lower(w) && !has_upper(w))
        {
            entry.initials.clear();
            if fragments.len() > 1 && catalogs.first_names.contains(&fragments[1]) {
                entry.initials = fragments[1].clone();
            }
        }
    } else if fragments.iter().any(|w| catalogs.first_names.contains(w)) {
        let names: Vec<&str> = fragments
            .iter()
            .filter(|w| {
                catalogs.first_names.contains(w) && **w != entry.surname && w.len() > 2
            })
            .map(String::as_str)
            .collect();
        entry.initials = names.join(" ").trim().to_string();
    }
}

/// An initials-shaped parish living inside the initials run with no comma
/// between them is the same token counted twice; the parish copy goes.
pub fn absorb_duplicate_initials(entry: &mut Entry, catalogs: &Catalogs) {
    let parish = entry.parish.clone();
    let line = entry.complete_text.clone();
    let domestic = line.contains("anke")
        || line.contains("froken")
        || line.match_indices("fru").any(|(p, _)| {
            p == 0 || !line[..p].chars().next_back().is_some_and(char::is_alphanumeric)
        });
    if !(catalogs.shapes.initials.is_match(&parish)
        && !parish.is_empty()
        && entry.initials.contains(parish.trim_end_matches(','))
        && line.matches(&parish).count() == 1
        && entry.occupation.is_empty()
        && entry.join == JoinCode::Complete
        && !entry.firm_flag
        && !entry.estate_flag
        && !domestic)
    {
        return;
    }
    let Some(pos) = line.find(&entry.initials) else {
        return;
    };
    // The run minus its final char; char-wise, the tail may be multibyte.
    let mut inner = line[pos..pos + entry.initials.len()].chars();
    inner.next_back();
    if !inner.as_str().contains(',') {
        entry.parish.clear();
    }
}

/// A parish on a row with no occupation and no initials, sitting right
/// after the surname, is in fact the initials token.
pub fn reassign_parish_as_initials(entry: &mut Entry) {
    let line = entry.complete_text.clone();
    let cap_dot = line
        .as_bytes()
        .windows(2)
        .any(|w| w[0].is_ascii_uppercase() && w[1] == b'.');
    if !(entry.occupation.is_empty()
        && joined_record(entry)
        && !entry.firm_flag
        && !entry.estate_flag
        && !entry.parish.is_empty()
        && entry.initials.is_empty()
        && !entry.surname.is_empty()
        && cap_dot)
    {
        return;
    }
    let Some(pos) = line.find(&entry.parish) else {
        return;
    };
    let word = line[..pos]
        .split(|c: char| !(c.is_ascii_alphabetic() || c == '-'))
        .filter(|w| !w.is_empty())
        .next_back()
        .unwrap_or("");
    if word.contains(&entry.surname) {
        entry.initials = entry.parish.clone();
        entry.parish.clear();
    }
}

// ---------------------------------------------------------------------------
// Quality check
// ---------------------------------------------------------------------------

fn clean_for_matching(parish: &str) -> String {
    let mut s = parish.replace(['(', ')'], "");
    let mut from = 0;
    while let Some(rel) = s[from..].find(". ") {
        let pos = from + rel;
        let boundary = s[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        if boundary {
            s.replace_range(pos..pos + 2, "");
        } else {
            from = pos + 1;
        }
    }
    let start = s
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    s[start..].trim().to_string()
}

/// Final reconciliation against the verified reference: abbreviation
/// skeletons first, then a fuzzy match scoped to the row's municipality,
/// then unscoped, then once more with OCR hyphens squashed out. A parish
/// that matches nothing and is not in the reference verbatim is dropped.
pub fn quality_check(
    entries: &mut [Entry],
    catalogs: &Catalogs,
    config: &EngineConfig,
    patterns: &Patterns,
) {
    let threshold = config.thresholds.parish_fuzzy;
    for entry in entries.iter_mut() {
        if entry.parish.is_empty() {
            entry.matched_parish.clear();
            continue;
        }
        let cleaned = clean_for_matching(&entry.parish);
        let mut matched = expand_abbreviation(&cleaned)
            .map(str::to_string)
            .unwrap_or_default();

        if matched.is_empty() && !cleaned.is_empty() {
            let municipality = match extract_one(&entry.municipality, catalogs.parishes.municipalities())
            {
                Some((m, score)) if score >= threshold => m.to_string(),
                _ => entry.municipality.clone(),
            };
            if let Some((best, score)) =
                extract_one(&cleaned, catalogs.parishes.parishes_in(&municipality))
            {
                if score >= threshold {
                    matched = best.to_string();
                }
            }
            if matched.is_empty() {
                if let Some((best, score)) = extract_one(&cleaned, catalogs.parishes.parishes()) {
                    if score > threshold {
                        matched = best.to_string();
                    }
                }
            }
            if matched.is_empty() {
                let squashed = patterns.hyphen_squash.replace_all(&cleaned, "$1$2");
                if let Some((best, score)) = extract_one(&squashed, catalogs.parishes.parishes()) {
                    if score > threshold {
                        matched = best.to_string();
                    }
                }
            }
        }

        if !matched.is_empty() {
            entry.matched_parish = matched;
        } else if let Some(resolved) = catalogs.parishes.resolve(&entry.parish) {
            entry.matched_parish = resolved.to_string();
        } else {
            entry.parish.clear();
            entry.matched_parish.clear();
        }
        if entry.matched_parish.is_empty() && !entry.parish.is_empty() {
            entry.matched_parish = entry.parish.clone();
        }
    }
}
