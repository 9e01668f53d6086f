//! Line-join classification: decide whether each physical line is a
//! standalone record, the first or second half of one record printed over
//! two rows, a complete single-row record, or a trailing third part.
//!
//! All passes work within one (page, column) group; neighbors never cross a
//! column boundary.

use std::collections::HashSet;
use std::ops::Range;

use taxkal_catalog::Catalogs;
use taxkal_core::{Entry, GroupCursor, JoinCode, MatchTier};

use crate::config::EngineConfig;
use crate::patterns::Patterns;
use crate::text::{
    char_at, digit_count, first_char_is_digit, first_char_is_upper, has_digit, has_letter,
    has_lower, has_upper, longest_token_len, numbers, prefix2,
};

pub struct Joiner<'a> {
    catalogs: &'a Catalogs,
    config: &'a EngineConfig,
    patterns: &'a Patterns,
}

impl<'a> Joiner<'a> {
    pub fn new(catalogs: &'a Catalogs, config: &'a EngineConfig, patterns: &'a Patterns) -> Self {
        Self {
            catalogs,
            config,
            patterns,
        }
    }

    // -----------------------------------------------------------------
    // Primary assignment
    // -----------------------------------------------------------------

    /// Recompute join codes for one group from scratch. Idempotent: the
    /// codes depend only on line text and the current initials/occupation
    /// fields, so a repeated pass converges.
    pub fn assign(&self, entries: &mut [Entry], range: Range<usize>) {
        for i in range.clone() {
            entries[i].join = JoinCode::Standalone;
        }
        if range.is_empty() {
            return;
        }
        let mut cursor = GroupCursor::new(range);
        loop {
            self.classify_at(entries, cursor.current(), cursor.peek_next());
            if !cursor.advance() {
                break;
            }
        }
    }

    fn classify_at(&self, entries: &mut [Entry], i: usize, next: Option<usize>) {
        let line = entries[i].text.trim_end().to_string();

        // A domestic-role line that carries a figure is a record by itself.
        if entries[i].tier == MatchTier::NonOccupation && has_digit(&line) {
            entries[i].join = JoinCode::Complete;
            return;
        }
        if entries[i].join != JoinCode::Standalone {
            return;
        }

        if self.condition_one(entries, i, next, &line) {
            return;
        }
        if self.condition_one_bis(entries, i, next, &line) {
            entries[i].join = JoinCode::Complete;
            return;
        }

        // A truncation artifact at the right edge of the column.
        let mut line = line;
        if ["->", "-.", ">", "<", "/"].iter().any(|s| line.ends_with(s)) {
            line.pop();
        }

        if self.condition_two(entries, i, next, &line) {
            return;
        }
        if self.condition_two_bis(entries, i, next, &line) {
            return;
        }
        self.condition_two_extra(entries, i, next, &line);
    }

    /// A line already carrying a dash-and-figure shape: pair it with a
    /// following bare figure when the two complete a dash-joined triple,
    /// otherwise the line stands complete.
    fn condition_one(
        &self,
        entries: &mut [Entry],
        i: usize,
        next: Option<usize>,
        line: &str,
    ) -> bool {
        let floor = self.config.limits.income_floor;
        if !(has_upper(line)
            && has_lower(line)
            && any_num_over(line, floor)
            && digit_count(line) > 1
            && self.patterns.hyphen_number.is_match(line)
            && line.len() > 5
            && longest_token_len(line) > 4)
        {
            return false;
        }
        let pair_floor = self.config.limits.pair_magnitude_floor;
        if let Some(j) = next {
            let next_line = entries[j].text.clone();
            let combined = format!("{line}{next_line}");
            let next_nums = numbers(&next_line);
            if !has_letter(&next_line)
                && next_nums.len() == 1
                && next_nums[0] > floor
                && (self.patterns.number_triple.is_match(&combined)
                    || (self.patterns.pair_then_number.is_match(&combined)
                        && next_nums.iter().all(|&n| n > pair_floor)))
            {
                entries[i].join = JoinCode::FirstHalf;
                entries[j].join = JoinCode::SecondHalf;
                return true;
            }
        }
        entries[i].join = JoinCode::Complete;
        true
    }

    /// A figure-bearing name or firm line whose successor opens a new
    /// record (uppercase, or a "de " particle) is complete as printed.
    fn condition_one_bis(
        &self,
        entries: &[Entry],
        i: usize,
        next: Option<usize>,
        line: &str,
    ) -> bool {
        let e = &entries[i];
        let anchored = !e.initials.is_empty() || self.catalogs.firm_cues.is_match(line);
        let last = line.chars().next_back();
        let tail_ok = line.ends_with('-')
            || last.is_some_and(|c| c.is_ascii_alphabetic())
            || line.ends_with(',')
            || (anchored && last.is_some_and(|c| c.is_ascii_digit()));
        if !(!line.is_empty()
            && has_upper(line)
            && has_lower(line)
            && has_digit(line)
            && digit_count(line) > 1
            && anchored
            && !first_char_is_digit(line)
            && tail_ok)
        {
            return false;
        }
        let Some(j) = next else { return false };
        let next_line = &entries[j].text;
        !next_line.is_empty()
            && (first_char_is_upper(next_line)
                || (next_line.starts_with("de ")
                    && any_num_over(line, self.config.limits.income_floor)))
    }

    /// The general overflow shape: a long mixed-case line whose successor
    /// is the spilled figure tail.
    fn condition_two(
        &self,
        entries: &mut [Entry],
        i: usize,
        next: Option<usize>,
        line: &str,
    ) -> bool {
        let floor = self.config.limits.income_floor;
        let first_token_lettered = line
            .split(',')
            .next()
            .is_some_and(has_letter)
            || line.split_whitespace().next().is_some_and(has_letter);
        let last = line.chars().next_back();
        let tail_ok = last.is_some_and(|c| {
            c.is_ascii_digit() || "-.,);>".contains(c) || c.is_ascii_alphabetic()
        });
        if !(!line.is_empty()
            && !first_char_is_digit(line)
            && first_token_lettered
            && tail_ok
            && has_upper(line)
            && has_lower(line)
            && line.len() > 10
            && !self.patterns.population_paren.is_match(line))
        {
            return false;
        }
        let Some(j) = next else { return false };
        if entries[j].tier == MatchTier::NonOccupation {
            return false;
        }
        let next_line = entries[j].text.clone();
        let combined = format!("{line}{next_line}");
        let shape_ok = self.patterns.hyphen_number.is_match(&combined)
            || self.patterns.number_hyphen.is_match(&combined)
            || self.patterns.number_pair.is_match(&next_line)
            || (has_digit(&next_line) && all_nums_over(&next_line, floor));
        let firm = self.catalogs.firm_cues.is_match(line);
        let start_ok = (soft_start(&next_line) && any_num_over(&next_line, floor))
            || (firm && any_num_over(&next_line, floor) && soft_start_firm(&next_line));
        if shape_ok && start_ok {
            entries[i].join = JoinCode::FirstHalf;
            entries[j].join = JoinCode::SecondHalf;
            return true;
        }
        false
    }

    /// A dash-free line (every hyphen accounted for by a firm or occupation
    /// term) followed by a bare one- or two-figure line: the dash that
    /// would join them fell off the scan.
    fn condition_two_bis(
        &self,
        entries: &mut [Entry],
        i: usize,
        next: Option<usize>,
        line: &str,
    ) -> bool {
        let floor = self.config.limits.income_floor;
        let firm = self.catalogs.firm_cues.is_match(line);
        if !(!line.is_empty()
            && line.split(',').next().is_some_and(has_letter)
            && self.only_accounted_hyphens(line)
            && line.len() > 10
            && !self.patterns.adjacent_numbers.is_match(line)
            && !self.patterns.population_paren.is_match(line)
            && ((has_lower(line) && has_upper(line) && first_char_is_upper(line)) || firm))
        {
            return false;
        }
        let Some(j) = next else { return false };
        if entries[j].tier == MatchTier::NonOccupation {
            return false;
        }
        let next_line = entries[j].text.clone();
        let nums = numbers(&next_line);
        if nums.is_empty() || next_line.contains('-') || has_letter(&next_line) {
            return false;
        }
        let magnitude_ok = (nums.len() == 1 && nums[0] > floor)
            || (nums.len() == 2 && nums.iter().all(|&n| n > floor));
        if !magnitude_ok {
            return false;
        }
        let dashed = format!("-{next_line}");
        let combined = format!("{line}{dashed}");
        if self.patterns.hyphen_number.is_match(&combined)
            || ((self.patterns.number_hyphen.is_match(&combined)
                || self.patterns.dash_number_pair.is_match(&dashed))
                && firm)
        {
            entries[i].join = JoinCode::FirstHalf;
            entries[j].join = JoinCode::SecondHalf;
            return true;
        }
        false
    }

    /// A figure-free name or firm line whose successor is a lone
    /// dash-trailed figure.
    fn condition_two_extra(&self, entries: &mut [Entry], i: usize, next: Option<usize>, line: &str) {
        let floor = self.config.limits.income_floor;
        let individual_shape = first_char_is_upper(line)
            && has_lower(line)
            && has_upper(line)
            && line.contains(',')
            && !entries[i].initials.is_empty();
        if !(!line.is_empty()
            && !has_digit(line)
            && line.len() > 10
            && !self.patterns.population_paren.is_match(line)
            && (individual_shape || self.catalogs.firm_cues.is_match(line)))
        {
            return;
        }
        let Some(j) = next else { return };
        if entries[j].tier == MatchTier::NonOccupation {
            return;
        }
        let next_line = entries[j].text.clone();
        if has_letter(&next_line) {
            return;
        }
        let before: Vec<u64> = self
            .patterns
            .number_before_hyphen
            .captures_iter(&next_line)
            .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse().ok()))
            .collect();
        if before.len() == 1 && before[0] > floor {
            entries[i].join = JoinCode::FirstHalf;
            entries[j].join = JoinCode::SecondHalf;
        }
    }

    /// Every hyphen in the line belongs to a hyphenated firm literal, a
    /// hyphenated occupation term, or a word-hyphen-word compound.
    fn only_accounted_hyphens(&self, line: &str) -> bool {
        if !line.contains('-') {
            return true;
        }
        for literal in self.catalogs.firm_cues.hyphenated() {
            if line.contains(literal) {
                return !line.replace(literal, "").contains('-');
            }
        }
        for term in self.catalogs.occupations.hyphenated() {
            if line.contains(term) {
                return !line.replace(term, "").contains('-');
            }
        }
        self.patterns.word_hyphen_word.is_match(line)
    }

    // -----------------------------------------------------------------
    // Third parts
    // -----------------------------------------------------------------

    /// A bare high figure right after a resolved pair can be a third
    /// physical row of the same record: fold it into the opener's
    /// assembled text.
    pub fn third_parts(&self, entries: &mut [Entry], range: Range<usize>) {
        let floor = self.config.limits.income_floor;
        let third_floor = self.config.limits.third_part_floor;
        if range.is_empty() {
            return;
        }
        let mut cursor = GroupCursor::new(range);
        loop {
            let i = cursor.current();
            if entries[i].join != JoinCode::SecondHalf {
                if !cursor.advance() {
                    break;
                }
                continue;
            }
            let line = entries[i].text.clone();
            if !(line.len() > 25 || !has_letter(&line)) {
                if !cursor.advance() {
                    break;
                }
                continue;
            }
            let (Some(j), Some(p)) = (cursor.peek_next(), cursor.peek_prev()) else {
                if !cursor.advance() {
                    break;
                }
                continue;
            };
            let next_line = entries[j].text.clone();
            let prev_text = entries[p].text.clone();
            let combined = format!("{}{}", entries[p].complete_text, next_line);
            let lowered = line.to_lowercase();
            let line_cues = self.catalogs.firm_cues.find_all(&line);
            let prev_cues = self.catalogs.firm_cues.find_all(&prev_text);
            if numbers(&next_line).iter().all(|&n| n > third_floor)
                && next_line != "-"
                && (all_nums_over(&line, floor) || line.len() > 35)
                && !has_letter(&next_line)
                && entries[j].join == JoinCode::Standalone
                && numbers(&combined).len() <= 3
                && !self
                    .catalogs
                    .occupations
                    .longer_than(3)
                    .any(|t| lowered.contains(t))
                && (self.catalogs.firm_cues.is_match(&prev_text)
                    || !entries[p].initials.is_empty())
                && !prev_cues.iter().any(|c| line_cues.contains(c))
            {
                entries[j].join = JoinCode::ThirdPart;
                entries[p].complete_text.push(' ');
                entries[p].complete_text.push_str(&next_line);
            }
            if !cursor.advance() {
                break;
            }
        }
    }

    // -----------------------------------------------------------------
    // Corrective passes
    // -----------------------------------------------------------------

    /// A second half that itself starts with a resolved surname is no
    /// continuation: unhook it from its opener and re-pair it forward.
    pub fn adjust_lowercase_seconds(&self, entries: &mut [Entry], range: Range<usize>) {
        let floor = self.config.limits.income_floor;
        for i in range.clone() {
            if i == range.start || entries[i].join != JoinCode::SecondHalf {
                continue;
            }
            let p = i - 1;
            let prev_line = entries[p].text.clone();
            if prev_line.ends_with('-') {
                continue;
            }
            let line = entries[i].text.clone();
            let last_name = entries[i].surname.clone();
            let name_shape = last_name.chars().next().is_some_and(|c| c.is_lowercase())
                || (first_char_is_upper(&last_name) && char_at(&last_name, 1) == Some('.'));
            if !(line.starts_with(&last_name)
                && !line.contains('(')
                && last_name.chars().count() > 1
                && name_shape)
            {
                continue;
            }
            entries[i].join = JoinCode::Standalone;
            entries[p].join = JoinCode::Standalone;

            let next = (i + 1 < range.end).then_some(i + 1);
            let mut paired_forward = false;
            let mut next_high = false;
            if let Some(j) = next {
                let next_line = entries[j].text.clone();
                next_high = any_num_over(&next_line, floor);
                if !has_letter(&next_line)
                    && next_high
                    && entries[j].join == JoinCode::Standalone
                {
                    entries[i].join = JoinCode::FirstHalf;
                    entries[j].join = JoinCode::SecondHalf;
                    let tail = entries[j].complete_text.clone();
                    entries[i].complete_text.push_str(&tail);
                    paired_forward = true;
                }
            }
            if !paired_forward {
                entries[i].join = JoinCode::Complete;
            }
            if prev_line.split(',').count() > 2
                && (self.catalogs.firm_cues.is_match(&prev_line)
                    || self.catalogs.shapes.initials.is_match(&prev_line))
                && next_high
            {
                entries[p].join = JoinCode::Complete;
            }
        }
    }

    /// A first half whose pairing fell through in a later pass: settle it
    /// as complete when it already carries fields, otherwise standalone.
    pub fn adjust_extra_first_halves(&self, entries: &mut [Entry], range: Range<usize>) {
        for i in range.clone() {
            if i + 2 >= range.end {
                continue;
            }
            if entries[i].join == JoinCode::FirstHalf
                && entries[i + 1].join != JoinCode::SecondHalf
                && entries[i + 1].text != "-"
                && entries[i + 2].join != JoinCode::SecondHalf
            {
                let settled = (!entries[i].initials.is_empty() && has_digit(&entries[i].text))
                    || !entries[i].occupation.is_empty();
                entries[i].join = if settled {
                    JoinCode::Complete
                } else {
                    JoinCode::Standalone
                };
            }
        }
    }

    /// A second half that is a fully-specified individual on its own
    /// (surname, initials, occupation, parish) was mis-paired.
    pub fn remove_fake_second_halves(&self, entries: &mut [Entry], range: Range<usize>) {
        for i in range.clone() {
            if entries[i].join != JoinCode::SecondHalf {
                continue;
            }
            let line = entries[i].text.clone();
            let last_name = entries[i].surname.clone();
            let particle = ["von", "af ", "de "]
                .iter()
                .any(|p| last_name.starts_with(p));
            let e = &entries[i];
            if !(!e.initials.is_empty()
                && !last_name.is_empty()
                && !e.occupation.is_empty()
                && !e.parish.is_empty()
                && line.starts_with(&last_name)
                && (!last_name.chars().next().is_some_and(|c| c.is_lowercase()) || particle))
            {
                continue;
            }
            if i > range.start {
                entries[i - 1].join = JoinCode::Standalone;
            }
            entries[i].join = JoinCode::Standalone;
            if let Some(j) = (i + 1 < range.end).then_some(i + 1) {
                if self.patterns.hyphen_number.is_match(&line) && has_letter(&entries[j].text) {
                    entries[i].join = JoinCode::Complete;
                }
            }
        }
    }

    /// Pair a triaged potential-second line backward to its opener when
    /// the predecessor reads like an unfinished individual or firm line.
    pub fn retro_join_openers(
        &self,
        entries: &mut [Entry],
        range: Range<usize>,
        potential_keys: &HashSet<String>,
        telephone_keys: &HashSet<String>,
    ) {
        for i in range.clone() {
            if i == range.start || !potential_keys.contains(&entries[i].unique_key()) {
                continue;
            }
            let p = i - 1;
            let line = entries[i].text.clone();
            let prev_line = entries[p].text.clone();
            let opener_start = first_char_is_upper(&prev_line)
                || ["von ", "de ", "af. ", "af "]
                    .iter()
                    .any(|s| prev_line.starts_with(s));
            if entries[i].join != JoinCode::SecondHalf
                && (entries[p].join == JoinCode::Standalone
                    || (entries[p].join == JoinCode::Complete && !has_letter(&line)))
                && opener_start
                && (self.catalogs.shapes.initials.is_match(&prev_line)
                    || entries[p].firm_flag
                    || !entries[p].initials.is_empty())
                && prev_line.len() > 10
                && has_lower(&prev_line)
                && !telephone_keys.contains(&entries[p].unique_key())
            {
                entries[p].join = JoinCode::FirstHalf;
                entries[i].join = JoinCode::SecondHalf;
            }
        }
    }

    /// Flag lines that read like a record opener whose figure sits on the
    /// next physical row. Returns the flagged unique keys.
    pub fn mark_potential_first(&self, entries: &[Entry], range: Range<usize>) -> Vec<String> {
        let floor = self.config.limits.income_floor;
        let mut keys = Vec::new();
        for i in range.clone() {
            let e = &entries[i];
            let line = &e.text;
            let Some(j) = (i + 1 < range.end).then_some(i + 1) else {
                continue;
            };
            if entries[j].line.row != e.line.row + 1 {
                continue;
            }
            let next_line = &entries[j].text;
            if (first_char_is_upper(line)
                || line.starts_with("von ")
                || line.starts_with("de "))
                && has_letter(line)
                && (self.catalogs.shapes.initials.is_match(line)
                    || self.catalogs.firm_cues.is_match(line))
                && any_num_over(next_line, floor)
                && prefix2(line) != prefix2(next_line)
                && e.join != JoinCode::SecondHalf
                && line.len() > 8
            {
                keys.push(e.unique_key());
            }
        }
        keys
    }

    /// Settle the flagged potential openers: pair forward onto an
    /// unclaimed figure line.
    pub fn adjust_potential_first(
        &self,
        entries: &mut [Entry],
        range: Range<usize>,
        potential_first: &HashSet<String>,
    ) {
        let floor = self.config.limits.income_floor;
        for i in range.clone() {
            if !potential_first.contains(&entries[i].unique_key())
                || entries[i].join == JoinCode::FirstHalf
            {
                continue;
            }
            let Some(j) = (i + 1 < range.end).then_some(i + 1) else {
                continue;
            };
            let line = entries[i].text.clone();
            let next_line = entries[j].text.clone();
            let split = entries[i].join;
            if !matches!(entries[j].join, JoinCode::FirstHalf | JoinCode::SecondHalf)
                && has_digit(&next_line)
                && prefix2(&line) != prefix2(&next_line)
                && any_num_over(&next_line, floor)
                && ((split == JoinCode::Complete && !has_letter(&next_line))
                    || split == JoinCode::Standalone)
                && entries[j].tier != MatchTier::NonOccupation
            {
                entries[i].join = JoinCode::FirstHalf;
                entries[j].join = JoinCode::SecondHalf;
            }
        }
    }

    /// Telephone listings never span rows: demote them from complete.
    pub fn downgrade_telephone_completes(
        &self,
        entries: &mut [Entry],
        telephone_keys: &HashSet<String>,
    ) {
        for e in entries.iter_mut() {
            if e.join == JoinCode::Complete && telephone_keys.contains(&e.unique_key()) {
                e.join = JoinCode::Standalone;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shape helpers
// ---------------------------------------------------------------------------

fn any_num_over(s: &str, floor: u64) -> bool {
    numbers(s).iter().any(|&n| n > floor)
}

fn all_nums_over(s: &str, floor: u64) -> bool {
    numbers(s).iter().all(|&n| n > floor)
}

/// A continuation line, not a fresh record: empty, lowercase-initial, or an
/// uppercase initial immediately followed by punctuation.
fn soft_start(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return true;
    };
    if !first.is_uppercase() {
        return true;
    }
    matches!(char_at(s, 1), Some('.' | ',')) || matches!(char_at(s, 2), Some('.' | ','))
}

/// Same as `soft_start`, except an "A.-B" opener counts as a fresh record.
fn soft_start_firm(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return true;
    };
    if !first.is_uppercase() {
        return true;
    }
    (!s.starts_with("A.-B") && matches!(char_at(s, 1), Some('.' | ',')))
        || matches!(char_at(s, 2), Some('.' | ','))
}
