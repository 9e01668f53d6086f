//! Certainty triage: every row ends the run in exactly one bucket. The
//! certain buckets are evaluated in a fixed priority order; the potential
//! buckets then sweep what is left, each pass working from an immutable
//! snapshot of the keys claimed so far.

use std::collections::{BTreeMap, HashMap, HashSet};

use taxkal_catalog::is_city;
use taxkal_core::{Bucket, Entry, JoinCode, MatchTier};

use crate::config::EngineConfig;
use crate::patterns::Patterns;
use crate::text::{has_digit, has_letter, numbers};

pub struct Triage<'a> {
    config: &'a EngineConfig,
    patterns: &'a Patterns,
}

fn compact(parts: &[&str]) -> String {
    parts
        .concat()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

impl<'a> Triage<'a> {
    pub fn new(config: &'a EngineConfig, patterns: &'a Patterns) -> Self {
        Self { config, patterns }
    }

    // -----------------------------------------------------------------
    // Page exclusion
    // -----------------------------------------------------------------

    /// Pages that are not directory listings at all: almost no surnames
    /// and occupations, long prose lines, or no occupations whatsoever.
    pub fn pages_to_cut(&self, entries: &[Entry]) -> HashSet<u32> {
        #[derive(Default)]
        struct Stats {
            surnames: usize,
            occupations: usize,
            firms: usize,
            long_lines: usize,
        }
        let mut by_page: BTreeMap<u32, Stats> = BTreeMap::new();
        for e in entries {
            let s = by_page.entry(e.line.page).or_default();
            if !e.surname.trim().is_empty() {
                s.surnames += 1;
            }
            if !e.occupation.trim().is_empty() {
                s.occupations += 1;
            }
            if e.firm_flag {
                s.firms += 1;
            }
            if e.text.len() > 60 {
                s.long_lines += 1;
            }
        }
        by_page
            .into_iter()
            .filter(|(_, s)| {
                (s.surnames < 5 && s.occupations < 5 && s.firms < 10)
                    || s.long_lines > 3
                    || s.occupations < 1
            })
            .map(|(page, _)| page)
            .collect()
    }

    // -----------------------------------------------------------------
    // Certain buckets
    // -----------------------------------------------------------------

    /// Assign the certain buckets in priority order. Returns the claimed
    /// unique-key set for the potential passes. Buckets from an earlier
    /// iteration are recomputed from scratch.
    pub fn classify_certain(
        &self,
        entries: &mut [Entry],
        pages: &HashSet<u32>,
    ) -> HashSet<String> {
        for e in entries.iter_mut() {
            e.bucket = Bucket::Unclassified;
        }
        let mut claimed = HashSet::new();

        for e in entries.iter_mut() {
            if pages.contains(&e.line.page) {
                e.bucket = Bucket::PageExcluded;
            } else if self.patterns.inv_marker.is_match(&e.text) {
                e.bucket = Bucket::LocationMarker;
            } else if self.patterns.telephone.is_match(&e.complete_text) {
                e.bucket = Bucket::TelephoneListing;
            } else if e.is_filler() {
                e.bucket = Bucket::PureFiller;
            }
            if e.bucket != Bucket::Unclassified {
                claimed.insert(e.unique_key());
            }
        }

        let mut text_counts: HashMap<&str, usize> = HashMap::new();
        for e in entries.iter() {
            *text_counts.entry(e.text.as_str()).or_default() += 1;
        }
        let duplicated: HashSet<String> = text_counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(t, _)| t.to_string())
            .collect();

        // The sequential walk skips the marker rows entirely: adjacency for
        // first-half/second-half propagation is over record rows only.
        let order: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                !matches!(
                    e.bucket,
                    Bucket::LocationMarker | Bucket::TelephoneListing | Bucket::PureFiller
                )
            })
            .map(|(i, _)| i)
            .collect();

        for (pos, &i) in order.iter().enumerate() {
            if entries[i].bucket != Bucket::Unclassified {
                continue;
            }
            let next = order.get(pos + 1).copied();
            if let Some(bucket) = self.certain_bucket(entries, i, next, &duplicated) {
                entries[i].bucket = bucket;
                claimed.insert(entries[i].unique_key());
                let propagate = matches!(
                    bucket,
                    Bucket::CertainEstate
                        | Bucket::FullIndividual
                        | Bucket::PartialIndividual
                        | Bucket::CertainFirm
                );
                if propagate && entries[i].join == JoinCode::FirstHalf {
                    if let Some(j) = next {
                        if entries[j].join == JoinCode::SecondHalf {
                            entries[j].bucket = bucket;
                            claimed.insert(entries[j].unique_key());
                        }
                    }
                }
            }
        }
        claimed
    }

    fn certain_bucket(
        &self,
        entries: &[Entry],
        i: usize,
        next: Option<usize>,
        duplicated: &HashSet<String>,
    ) -> Option<Bucket> {
        let e = &entries[i];
        if e.estate_flag {
            return Some(Bucket::CertainEstate);
        }
        if e.tier == MatchTier::NonOccupation {
            return Some(Bucket::NonOccupationIndividual);
        }

        // Fully-specified individual: the extracted fields, squashed
        // together, reproduce the head of the record text.
        let head = compact(&[&e.surname, &e.initials, &e.occupation]);
        let initials_tokens: Vec<&str> = e.initials.split_whitespace().collect();
        let initials_head = if initials_tokens.is_empty() {
            String::new()
        } else {
            initials_tokens[..initials_tokens.len() - 1].concat()
        };
        let head_short = compact(&[&e.surname, &initials_head, &e.occupation]);
        let complete = compact(&[&e.complete_text]);
        let pair_ok = match e.join {
            JoinCode::Complete => true,
            JoinCode::FirstHalf => next.is_some_and(|j| !entries[j].firm_flag),
            _ => false,
        };
        if !e.occupation.is_empty()
            && !e.surname.is_empty()
            && !e.initials.is_empty()
            && (complete.starts_with(&head) || complete.starts_with(&head_short))
            && !e.firm_flag
            && pair_ok
        {
            return Some(Bucket::FullIndividual);
        }

        if !e.firm_flag
            && e.join != JoinCode::SecondHalf
            && (!e.occupation.is_empty()
                || (!e.initials.is_empty() && has_digit(&e.complete_text)))
            && !(e.join == JoinCode::Standalone && e.tier == MatchTier::Unmatched)
        {
            return Some(Bucket::PartialIndividual);
        }

        if e.firm_flag
            && !(!e.occupation.is_empty() && !e.initials.is_empty() && !e.surname.is_empty())
        {
            return Some(Bucket::CertainFirm);
        }

        if e.tier == MatchTier::Unmatched
            && e.join == JoinCode::Standalone
            && !e.firm_flag
            && duplicated.contains(&e.text)
        {
            let first_word = e.text.split_whitespace().next().unwrap_or("");
            let first_comma = if e.text.contains(',') {
                e.text.split(',').next().unwrap_or("")
            } else {
                ""
            };
            if !(is_city(first_word) || is_city(first_comma)) {
                let word_count = e
                    .text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .count();
                return Some(if (1..=2).contains(&word_count) && has_digit(&e.text) {
                    Bucket::CertainNoiseB
                } else {
                    Bucket::CertainNoiseA
                });
            }
        }
        None
    }

    // -----------------------------------------------------------------
    // Potential buckets
    // -----------------------------------------------------------------

    /// The four potential-second sweeps, each excluding the keys claimed
    /// before it started. Returns the grown claimed set and the keys the
    /// sweeps flagged.
    pub fn classify_potential(
        &self,
        entries: &mut [Entry],
        claimed: &HashSet<String>,
    ) -> (HashSet<String>, HashSet<String>) {
        let floor = self.config.limits.income_floor;
        let mut claimed = claimed.clone();
        let mut potential = HashSet::new();

        let passes: [(Bucket, Box<dyn Fn(&Entry) -> bool + '_>); 4] = [
            (
                Bucket::PotentialSecondA,
                Box::new(|e: &Entry| {
                    !has_letter(&e.text)
                        && matches!(e.join, JoinCode::Standalone | JoinCode::SecondHalf)
                }),
            ),
            (
                Bucket::PotentialSecondB,
                Box::new(|e: &Entry| {
                    matches!(e.join, JoinCode::Standalone | JoinCode::SecondHalf)
                        && !e.occupation.is_empty()
                        && has_digit(&e.text)
                }),
            ),
            (
                Bucket::PotentialSecondC,
                Box::new(move |e: &Entry| {
                    let first_word = e.text.split_whitespace().next().unwrap_or("");
                    let first_comma = e.text.split(',').next().unwrap_or("");
                    matches!(
                        e.join,
                        JoinCode::Standalone | JoinCode::SecondHalf | JoinCode::Complete
                    ) && !e.firm_flag
                        && !self.patterns.inv_marker.is_match(&e.text)
                        && (is_city(first_word) || is_city(first_comma))
                        && has_digit(&e.text)
                        && numbers(&e.text).iter().any(|&n| n > floor)
                }),
            ),
            (
                Bucket::PotentialSecondD,
                Box::new(move |e: &Entry| {
                    matches!(
                        e.join,
                        JoinCode::Standalone | JoinCode::SecondHalf | JoinCode::Complete
                    ) && has_letter(&e.text)
                        && numbers(&e.text).iter().any(|&n| n > floor)
                }),
            ),
        ];

        for (bucket, accept) in passes {
            let mut new_keys = Vec::new();
            for e in entries.iter_mut() {
                let key = e.unique_key();
                if claimed.contains(&key) || !accept(e) {
                    continue;
                }
                e.bucket = bucket;
                new_keys.push(key);
            }
            for key in new_keys {
                claimed.insert(key.clone());
                potential.insert(key);
            }
        }
        (claimed, potential)
    }

    /// Bucket the flagged potential openers that nothing else claimed.
    pub fn mark_potential_first(
        &self,
        entries: &mut [Entry],
        keys: &HashSet<String>,
        claimed: &mut HashSet<String>,
    ) {
        for e in entries.iter_mut() {
            let key = e.unique_key();
            if e.bucket == Bucket::Unclassified && keys.contains(&key) {
                e.bucket = Bucket::PotentialFirst;
                claimed.insert(key);
            }
        }
    }

    /// Keys of the telephone-listing rows, for the join corrections.
    pub fn telephone_keys(&self, entries: &[Entry]) -> HashSet<String> {
        entries
            .iter()
            .filter(|e| self.patterns.telephone.is_match(&e.complete_text))
            .map(|e| e.unique_key())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxkal_core::Line;

    fn entry(row: u32, text: &str) -> Entry {
        Entry::new(Line::new(1, 1, row, text))
    }

    #[test]
    fn page_without_occupations_is_cut() {
        let cfg = EngineConfig::default();
        let pats = Patterns::new().unwrap();
        let triage = Triage::new(&cfg, &pats);
        let entries = vec![entry(1, "garbled text"), entry(2, "more garbled text")];
        let pages = triage.pages_to_cut(&entries);
        assert!(pages.contains(&1));
    }

    #[test]
    fn marker_buckets_take_priority() {
        let cfg = EngineConfig::default();
        let pats = Patterns::new().unwrap();
        let triage = Triage::new(&cfg, &pats);
        let mut entries = vec![
            entry(1, "Rimbo (1200 inv.)"),
            entry(2, "Berg, K., Allm. Tel. 243"),
            entry(3, "- —"),
        ];
        triage.classify_certain(&mut entries, &HashSet::new());
        assert_eq!(entries[0].bucket, Bucket::LocationMarker);
        assert_eq!(entries[1].bucket, Bucket::TelephoneListing);
        assert_eq!(entries[2].bucket, Bucket::PureFiller);
    }

    #[test]
    fn full_individual_matches_field_head() {
        let cfg = EngineConfig::default();
        let pats = Patterns::new().unwrap();
        let triage = Triage::new(&cfg, &pats);
        let mut e = entry(1, "Berg, K., snickare 2100");
        e.join = JoinCode::Complete;
        e.tier = MatchTier::Exact;
        e.surname = "Berg".to_string();
        e.initials = "K.".to_string();
        e.occupation = "snickare".to_string();
        let mut entries = vec![e];
        triage.classify_certain(&mut entries, &HashSet::new());
        assert_eq!(entries[0].bucket, Bucket::FullIndividual);
    }

    #[test]
    fn estate_bucket_propagates_to_second_half() {
        let cfg = EngineConfig::default();
        let pats = Patterns::new().unwrap();
        let triage = Triage::new(&cfg, &pats);
        let mut first = entry(1, "Bergs starbhus");
        first.join = JoinCode::FirstHalf;
        first.estate_flag = true;
        let mut second = entry(2, "16500");
        second.join = JoinCode::SecondHalf;
        let mut entries = vec![first, second];
        triage.classify_certain(&mut entries, &HashSet::new());
        assert_eq!(entries[0].bucket, Bucket::CertainEstate);
        assert_eq!(entries[1].bucket, Bucket::CertainEstate);
    }

    #[test]
    fn firm_without_person_fields_is_certain_firm() {
        let cfg = EngineConfig::default();
        let pats = Patterns::new().unwrap();
        let triage = Triage::new(&cfg, &pats);
        let mut e = entry(1, "Skandia Aktiebol. 16500");
        e.join = JoinCode::Complete;
        e.firm_flag = true;
        let mut entries = vec![e];
        triage.classify_certain(&mut entries, &HashSet::new());
        assert_eq!(entries[0].bucket, Bucket::CertainFirm);
    }

    #[test]
    fn duplicated_unmatched_line_is_noise() {
        let cfg = EngineConfig::default();
        let pats = Patterns::new().unwrap();
        let triage = Triage::new(&cfg, &pats);
        let mut entries = vec![entry(1, "qqrs 12"), entry(2, "qqrs 12")];
        triage.classify_certain(&mut entries, &HashSet::new());
        assert_eq!(entries[0].bucket, Bucket::CertainNoiseB);
        assert_eq!(entries[1].bucket, Bucket::CertainNoiseB);
    }

    #[test]
    fn potential_passes_respect_claimed_snapshot() {
        let cfg = EngineConfig::default();
        let pats = Patterns::new().unwrap();
        let triage = Triage::new(&cfg, &pats);
        let mut bare = entry(1, "16500 - 4400");
        bare.join = JoinCode::Standalone;
        let mut claimed_row = entry(2, "8800");
        claimed_row.join = JoinCode::Standalone;
        let claimed: HashSet<String> = [claimed_row.unique_key()].into();
        let mut entries = vec![bare, claimed_row];
        let (claimed_after, potential) = triage.classify_potential(&mut entries, &claimed);
        assert_eq!(entries[0].bucket, Bucket::PotentialSecondA);
        assert_eq!(entries[1].bucket, Bucket::Unclassified);
        assert!(potential.contains(&entries[0].unique_key()));
        assert!(claimed_after.contains(&entries[1].unique_key()));
    }

    #[test]
    fn each_entry_lands_in_one_bucket() {
        let cfg = EngineConfig::default();
        let pats = Patterns::new().unwrap();
        let triage = Triage::new(&cfg, &pats);
        let mut e = entry(1, "Berg, K., snickare 2100");
        e.join = JoinCode::Complete;
        e.tier = MatchTier::Exact;
        e.surname = "Berg".to_string();
        e.initials = "K.".to_string();
        e.occupation = "snickare".to_string();
        let mut entries = vec![e];
        let claimed = triage.classify_certain(&mut entries, &HashSet::new());
        let before = entries[0].bucket;
        triage.classify_potential(&mut entries, &claimed);
        assert_eq!(entries[0].bucket, before);
    }
}
