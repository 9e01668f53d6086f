//! Income extraction: the figures sit at the end of the assembled record
//! text, so the scan walks backwards from the last character.

use taxkal_core::Entry;

use crate::text::has_digit;

/// Extract the raw income tail and split it into the two assessed figures.
/// Only record-owning lines carry income; second halves and third parts
/// are left empty.
pub fn extract_income(entry: &mut Entry) {
    entry.income_raw.clear();
    entry.income_primary.clear();
    entry.income_secondary.clear();
    if !entry.join.owns_record() {
        return;
    }
    let raw = income_tail(&entry.complete_text);
    if !has_digit(&raw) {
        return;
    }
    entry.income_raw = raw.trim_start().to_string();
    let mut runs = entry
        .income_raw
        .split(|c: char| !c.is_ascii_digit())
        .filter(|r| !r.is_empty());
    entry.income_primary = runs.next().unwrap_or("").to_string();
    entry.income_secondary = runs.next().unwrap_or("").to_string();
}

/// Backward scan from the end of the line. Digits accumulate; a letter
/// terminates; a comma or period terminates unless it is the very last
/// character; any other character is kept once digits have started.
fn income_tail(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut kept: Vec<char> = Vec::new();
    let mut started = false;
    for (i, &ch) in chars.iter().enumerate().rev() {
        if ch.is_ascii_digit() {
            kept.push(ch);
            started = true;
        } else if (ch == ',' || ch == '.') && i != chars.len() - 1 {
            break;
        } else if ch.is_alphabetic() {
            break;
        } else if started && !(ch == ',' || ch == '.') {
            kept.push(ch);
        }
    }
    kept.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxkal_core::{JoinCode, Line};

    fn entry(text: &str, join: JoinCode) -> Entry {
        let mut e = Entry::new(Line::new(1, 1, 1, text));
        e.join = join;
        e
    }

    #[test]
    fn single_figure() {
        let mut e = entry("Berg, K., snickare 2100", JoinCode::Standalone);
        extract_income(&mut e);
        assert_eq!(e.income_raw, "2100");
        assert_eq!(e.income_primary, "2100");
        assert_eq!(e.income_secondary, "");
    }

    #[test]
    fn dash_joined_pair() {
        let mut e = entry("Berg, K., snickare 16500 - 4400", JoinCode::Complete);
        extract_income(&mut e);
        assert_eq!(e.income_raw, "16500 - 4400");
        assert_eq!(e.income_primary, "16500");
        assert_eq!(e.income_secondary, "4400");
    }

    #[test]
    fn comma_inside_tail_terminates() {
        let mut e = entry("Berg, K., hus 3, 200", JoinCode::Standalone);
        extract_income(&mut e);
        assert_eq!(e.income_raw, "200");
    }

    #[test]
    fn trailing_period_ignored() {
        let mut e = entry("Berg, K., snickare 2100.", JoinCode::Standalone);
        extract_income(&mut e);
        assert_eq!(e.income_primary, "2100");
    }

    #[test]
    fn second_half_carries_no_income() {
        let mut e = entry("16500 - 4400", JoinCode::SecondHalf);
        extract_income(&mut e);
        assert_eq!(e.income_raw, "");
        assert_eq!(e.income_primary, "");
    }

    #[test]
    fn letterless_prefix_stops_at_letter() {
        let mut e = entry("Lind, A., ingenjor vid verket 9300", JoinCode::Standalone);
        extract_income(&mut e);
        assert_eq!(e.income_raw, "9300");
    }
}
