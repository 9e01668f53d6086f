//! Record assembly: rebuild each record's full text from its join-coded
//! physical lines.

use std::ops::Range;

use taxkal_core::{Entry, JoinCode};

/// Rebuild `complete_text` for one group from the current join codes.
///
/// Overwrites rather than appends, so re-running after a join-code revision
/// converges instead of duplicating tails. Third parts are folded in later
/// by the third-part pass.
pub fn unite_lines(entries: &mut [Entry], range: Range<usize>) {
    for i in range.clone() {
        entries[i].complete_text = entries[i].text.clone();
    }
    for i in range.clone() {
        if entries[i].join != JoinCode::FirstHalf {
            continue;
        }
        let Some(j) = (i + 1 < range.end).then_some(i + 1) else {
            continue;
        };
        let tail = entries[j].text.trim_start().to_string();
        let head = entries[i].text.trim_end();
        entries[i].complete_text = format!("{head} {tail}");
    }
}

/// The source rows backing each record-owning entry, in reading order.
/// A first half pulls in its second half and any third part.
pub fn source_rows(entries: &[Entry], range: Range<usize>, i: usize) -> Vec<u32> {
    let mut rows = vec![entries[i].line.row];
    if entries[i].join == JoinCode::FirstHalf {
        if let Some(j) = (i + 1 < range.end).then_some(i + 1) {
            rows.push(entries[j].line.row);
            if let Some(k) = (i + 2 < range.end).then_some(i + 2) {
                if entries[k].join == JoinCode::ThirdPart {
                    rows.push(entries[k].line.row);
                }
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxkal_core::Line;

    fn entry(row: u32, text: &str, join: JoinCode) -> Entry {
        let mut e = Entry::new(Line::new(1, 1, row, text));
        e.join = join;
        e
    }

    #[test]
    fn first_half_joined_with_tail() {
        let mut es = vec![
            entry(1, "Berg, K., snickare", JoinCode::FirstHalf),
            entry(2, "  16500 - 4400", JoinCode::SecondHalf),
            entry(3, "Lind, A. 2100", JoinCode::Standalone),
        ];
        unite_lines(&mut es, 0..3);
        assert_eq!(es[0].complete_text, "Berg, K., snickare 16500 - 4400");
        assert_eq!(es[2].complete_text, "Lind, A. 2100");
    }

    #[test]
    fn reassembly_is_idempotent() {
        let mut es = vec![
            entry(1, "Berg, K., snickare", JoinCode::FirstHalf),
            entry(2, "16500", JoinCode::SecondHalf),
        ];
        unite_lines(&mut es, 0..2);
        let first = es[0].complete_text.clone();
        unite_lines(&mut es, 0..2);
        assert_eq!(es[0].complete_text, first);
    }

    #[test]
    fn rows_cover_all_parts() {
        let es = vec![
            entry(4, "Berg, K., snickare", JoinCode::FirstHalf),
            entry(5, "16500", JoinCode::SecondHalf),
            entry(6, "8800", JoinCode::ThirdPart),
        ];
        assert_eq!(source_rows(&es, 0..3, 0), vec![4, 5, 6]);
    }

    #[test]
    fn standalone_rows_are_single() {
        let es = vec![entry(7, "Lind, A. 2100", JoinCode::Standalone)];
        assert_eq!(source_rows(&es, 0..1, 0), vec![7]);
    }
}
