//! Run orchestration. Page/column groups are mutually independent, so the
//! structural passes fan out over them with rayon; the triage and the final
//! parish reconciliation need the whole run and stay sequential.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use rayon::prelude::*;
use tracing::{debug, debug_span, info};

use taxkal_catalog::Catalogs;
use taxkal_core::{group_ranges, Entry, Line, RecordRow};

use crate::assembler::{source_rows, unite_lines};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::firm::{arbitrate_individual_firms, clear_firm_initials, tag_estate, tag_firm};
use crate::income::extract_income;
use crate::joiner::Joiner;
use crate::location::{assign_municipalities, fill_municipality_edges, find_location};
use crate::normalize::build_entries;
use crate::occupation::{
    fuzzy_occupation, rescan_suspect_occupation, secondary_occupation, spot_wrong_occupation,
};
use crate::parish;
use crate::patterns::Patterns;
use crate::peeler;
use crate::report::RunSummary;
use crate::resolver::Resolver;
use crate::triage::Triage;

/// The municipality in force before the first population header of a run.
const SEED_MUNICIPALITY: &str = "Stockholm";

pub struct RunOutput {
    pub records: Vec<RecordRow>,
    pub summary: RunSummary,
}

pub struct Pipeline {
    catalogs: Catalogs,
    config: EngineConfig,
    patterns: Patterns,
}

impl Pipeline {
    pub fn new(catalogs: Catalogs, config: EngineConfig) -> Result<Self, EngineError> {
        let patterns = Patterns::new()?;
        Ok(Self {
            catalogs,
            config,
            patterns,
        })
    }

    pub fn run(&self, lines: Vec<Line>) -> RunOutput {
        let (mut entries, dropped) = build_entries(&self.patterns, lines);
        info!(lines = entries.len(), dropped, "ingested");

        let duplicated = duplicated_texts(&entries);
        let resolver = Resolver::new(&self.catalogs, &self.config, &self.patterns);
        self.for_each_entry(&mut entries, |e| resolver.resolve(e));
        for e in entries.iter_mut() {
            resolver.recover_v_dash(e, &duplicated);
        }

        let joiner = Joiner::new(&self.catalogs, &self.config, &self.patterns);

        // Bounded fixed point: the structural pass re-runs until nothing
        // it derives changes, capped by the configured pass bound.
        let mut previous = fingerprint(&entries);
        for pass in 0..self.config.pipeline.max_passes {
            let span = debug_span!("structural_pass", pass);
            let _guard = span.enter();
            self.structural_pass(&mut entries, &joiner);
            let current = fingerprint(&entries);
            if current == previous {
                debug!(pass, "fixed point reached");
                break;
            }
            previous = current;
        }

        self.place_rows(&mut entries);
        self.triage_and_correct(&mut entries, &joiner);
        self.finish_fields(&mut entries);

        let records = self.collect_records(&entries);
        let summary = RunSummary::from_entries(&entries, dropped, records.len());
        info!(
            lines = summary.lines,
            records = summary.records,
            "run complete"
        );
        RunOutput { records, summary }
    }

    // -----------------------------------------------------------------
    // Structural pass (per group, parallelizable)
    // -----------------------------------------------------------------

    fn structural_pass(&self, entries: &mut [Entry], joiner: &Joiner<'_>) {
        let cats = &self.catalogs;
        let cfg = &self.config;
        let pats = &self.patterns;
        self.for_each_group(entries, |group| {
            let range = 0..group.len();
            joiner.assign(group, range.clone());
            joiner.third_parts(group, range.clone());
            joiner.adjust_lowercase_seconds(group, range.clone());
            joiner.remove_fake_second_halves(group, range.clone());
            unite_lines(group, range);

            for e in group.iter_mut() {
                extract_income(e);
                peeler::residual_after_surname(e);
                peeler::extract_initials(e, cats, pats);
                peeler::first_name_fallback(e, &cats.first_names, cats);
                peeler::residual_after_initials(e);
                peeler::adjust_duplicate_initials(e);
                crate::occupation::extract_occupation(e, cats, cfg);
                peeler::extract_second_surname(e, cats);
                peeler::strip_former_title(e, cats);
                peeler::residual_after_occupation(e);

                parish::extract_parish(e, cats, pats);
                parish::extract_parish_loose(e, pats);
                parish::extract_parish_residual(e, pats);
                spot_wrong_occupation(e, cats);
                parish::clear_suspect_parishes(e, cats);
                parish::map_parish(e, cats);
                parish::fill_missing_parish(e, cats, true);
                parish::fill_missing_parish(e, cats, false);

                tag_firm(e, cats, pats);
                tag_estate(e, cats);
            }
            arbitrate_individual_firms(group, cats, pats);
            for e in group.iter_mut() {
                clear_firm_initials(e);
            }
        });
    }

    // -----------------------------------------------------------------
    // Locations (sequential: the municipality carries across groups)
    // -----------------------------------------------------------------

    fn place_rows(&self, entries: &mut [Entry]) {
        for e in entries.iter_mut() {
            find_location(e, &self.patterns);
        }
        assign_municipalities(entries, Some(SEED_MUNICIPALITY));
        fill_municipality_edges(entries);
        for e in entries.iter_mut() {
            rescan_suspect_occupation(e, &self.catalogs);
        }
    }

    // -----------------------------------------------------------------
    // Triage and the join corrections it unlocks
    // -----------------------------------------------------------------

    fn triage_and_correct(&self, entries: &mut [Entry], joiner: &Joiner<'_>) {
        let triage = Triage::new(&self.config, &self.patterns);
        let ranges = group_ranges(entries);
        for r in &ranges {
            joiner.adjust_extra_first_halves(entries, r.clone());
        }

        let pages = triage.pages_to_cut(entries);
        debug!(excluded_pages = pages.len(), "page exclusion");
        let claimed = triage.classify_certain(entries, &pages);
        let (_, potential) = triage.classify_potential(entries, &claimed);
        let telephone = triage.telephone_keys(entries);

        for r in &ranges {
            joiner.retro_join_openers(entries, r.clone(), &potential, &telephone);
        }
        let mut first_keys: HashSet<String> = HashSet::new();
        for r in &ranges {
            first_keys.extend(joiner.mark_potential_first(entries, r.clone()));
        }
        for r in &ranges {
            joiner.adjust_potential_first(entries, r.clone(), &first_keys);
        }
        joiner.downgrade_telephone_completes(entries, &telephone);

        // Join codes moved: rebuild the assembled text, re-extract the
        // fields the new text invalidates, then re-triage from a fresh
        // snapshot. A retro-joined opener picks up its parish and income
        // from the tail it just absorbed.
        let cats = &self.catalogs;
        let pats = &self.patterns;
        self.for_each_group(entries, |group| {
            unite_lines(group, 0..group.len());
            for e in group.iter_mut() {
                extract_income(e);
                parish::extract_parish(e, cats, pats);
                parish::extract_parish_loose(e, pats);
                parish::extract_parish_residual(e, pats);
                spot_wrong_occupation(e, cats);
                parish::clear_suspect_parishes(e, cats);
                parish::map_parish(e, cats);
                parish::fill_missing_parish(e, cats, true);
                parish::fill_missing_parish(e, cats, false);
                peeler::adjust_duplicate_initials(e);
                rescan_suspect_occupation(e, cats);
            }
        });
        let claimed = triage.classify_certain(entries, &pages);
        let (mut claimed, _) = triage.classify_potential(entries, &claimed);
        triage.mark_potential_first(entries, &first_keys, &mut claimed);
    }

    // -----------------------------------------------------------------
    // Field finishing (fuzzy occupation, parish reconciliation)
    // -----------------------------------------------------------------

    fn finish_fields(&self, entries: &mut [Entry]) {
        let cats = &self.catalogs;
        let cfg = &self.config;
        self.for_each_entry(entries, |e| {
            let matched = fuzzy_occupation(e, cats, cfg);
            if !matched.is_empty() {
                e.occupation = matched;
            }
            let secondary = secondary_occupation(e, cats, cfg);
            if !secondary.is_empty() {
                e.secondary_occupation = secondary;
            }
        });

        for e in entries.iter_mut() {
            parish::final_initials_adjustment(e);
            parish::resolve_field_conflicts(e, cats);
        }
        let (clean, firm) = parish::parish_vocabulary(entries, cats);
        for e in entries.iter_mut() {
            parish::strip_firm_parish(e, &clean, &firm, cats);
            parish::fill_firm_parish(e, cats, true, true);
            parish::fill_firm_parish(e, cats, true, false);
            parish::fill_firm_parish(e, cats, false, true);
        }
        // The fills grew the vocabulary; strip once more against it.
        let (clean, firm) = parish::parish_vocabulary(entries, cats);
        for e in entries.iter_mut() {
            parish::strip_firm_parish(e, &clean, &firm, cats);
            parish::resolve_field_conflicts(e, cats);
            parish::resolve_double_counts(e, cats);
            parish::absorb_duplicate_initials(e, cats);
            parish::reassign_parish_as_initials(e);
        }
        parish::quality_check(entries, cats, cfg, &self.patterns);
    }

    fn collect_records(&self, entries: &[Entry]) -> Vec<RecordRow> {
        let mut records = Vec::new();
        for range in group_ranges(entries) {
            for i in range.clone() {
                if entries[i].join.owns_record() && !entries[i].is_filler() {
                    let rows = source_rows(entries, range.clone(), i);
                    records.push(RecordRow::from_entry(&entries[i], &rows));
                }
            }
        }
        records
    }

    // -----------------------------------------------------------------
    // Parallel fan-out helpers
    // -----------------------------------------------------------------

    fn for_each_group<F>(&self, entries: &mut [Entry], f: F)
    where
        F: Fn(&mut [Entry]) + Sync + Send,
    {
        let groups = group_slices(entries);
        if self.config.pipeline.parallel {
            groups.into_par_iter().for_each(f);
        } else {
            groups.into_iter().for_each(f);
        }
    }

    fn for_each_entry<F>(&self, entries: &mut [Entry], f: F)
    where
        F: Fn(&mut Entry) + Sync + Send,
    {
        if self.config.pipeline.parallel {
            entries.par_iter_mut().for_each(f);
        } else {
            entries.iter_mut().for_each(f);
        }
    }
}

/// Carve the sorted entries into disjoint mutable page/column slices.
fn group_slices(entries: &mut [Entry]) -> Vec<&mut [Entry]> {
    let ranges = group_ranges(entries);
    let mut slices = Vec::with_capacity(ranges.len());
    let mut rest = entries;
    let mut offset = 0;
    for r in ranges {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(r.end - offset);
        offset = r.end;
        slices.push(head);
        rest = tail;
    }
    slices
}

fn duplicated_texts(entries: &[Entry]) -> HashSet<String> {
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for e in entries {
        *counts.entry(e.text.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(t, _)| t.to_string())
        .collect()
}

/// Hash of the fields the structural pass derives, for the fixed-point
/// equality check.
fn fingerprint(entries: &[Entry]) -> u64 {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    for e in entries {
        e.join.as_u8().hash(&mut h);
        e.complete_text.hash(&mut h);
        e.surname.hash(&mut h);
        e.initials.hash(&mut h);
        e.second_surname.hash(&mut h);
        e.occupation.hash(&mut h);
        e.income_raw.hash(&mut h);
        e.parish.hash(&mut h);
        e.firm_flag.hash(&mut h);
        e.estate_flag.hash(&mut h);
    }
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxkal_core::JoinCode;

    fn entry(page: u32, column: u32, row: u32, text: &str) -> Entry {
        Entry::new(Line::new(page, column, row, text))
    }

    #[test]
    fn group_slices_partition_by_page_and_column() {
        let mut entries = vec![
            entry(1, 1, 1, "a"),
            entry(1, 1, 2, "b"),
            entry(1, 2, 1, "c"),
            entry(2, 1, 1, "d"),
        ];
        let slices = group_slices(&mut entries);
        let lens: Vec<usize> = slices.iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![2, 1, 1]);
    }

    #[test]
    fn fingerprint_tracks_derived_fields() {
        let mut entries = vec![entry(1, 1, 1, "Berg, K., snickare 2100")];
        let before = fingerprint(&entries);
        entries[0].join = JoinCode::Complete;
        assert_ne!(fingerprint(&entries), before);
    }

    #[test]
    fn duplicated_texts_found() {
        let entries = vec![
            entry(1, 1, 1, "16500"),
            entry(1, 1, 2, "16500"),
            entry(1, 1, 3, "unique"),
        ];
        let dups = duplicated_texts(&entries);
        assert!(dups.contains("16500"));
        assert!(!dups.contains("unique"));
    }
}
