use std::ops::Range;

use crate::entry::Entry;

/// Position cursor over one (page, column) group.
///
/// The join classifier needs "the next line" and "the previous line"
/// relative to the current row. Raw index arithmetic hides the group
/// boundaries, so neighbor access goes through this cursor: `peek_next` /
/// `peek_prev` return `None` at the edges instead of walking into a
/// different column.
#[derive(Debug, Clone)]
pub struct GroupCursor {
    range: Range<usize>,
    pos: usize,
}

impl GroupCursor {
    pub fn new(range: Range<usize>) -> Self {
        let pos = range.start;
        Self { range, pos }
    }

    pub fn current(&self) -> usize {
        self.pos
    }

    pub fn peek_next(&self) -> Option<usize> {
        self.peek_ahead(1)
    }

    pub fn peek_ahead(&self, n: usize) -> Option<usize> {
        let idx = self.pos.checked_add(n)?;
        (idx < self.range.end).then_some(idx)
    }

    pub fn peek_prev(&self) -> Option<usize> {
        (self.pos > self.range.start).then(|| self.pos - 1)
    }

    /// Move to the next row. Returns false once the group is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.pos + 1 < self.range.end {
            self.pos += 1;
            true
        } else {
            false
        }
    }

}

/// Split a slice of entries, already sorted by (page, column, row), into
/// contiguous index ranges per (page, column) group.
///
/// Groups are mutually independent and safe to process in parallel.
pub fn group_ranges(entries: &[Entry]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0usize;
    for i in 1..entries.len() {
        let prev = &entries[i - 1].line;
        let cur = &entries[i].line;
        if (cur.page, cur.column) != (prev.page, prev.column) {
            ranges.push(start..i);
            start = i;
        }
    }
    if !entries.is_empty() {
        ranges.push(start..entries.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::Line;

    fn entry(page: u32, column: u32, row: u32) -> Entry {
        Entry::new(Line::new(page, column, row, "x"))
    }

    #[test]
    fn cursor_edges() {
        let mut c = GroupCursor::new(2..5);
        assert_eq!(c.current(), 2);
        assert_eq!(c.peek_prev(), None);
        assert_eq!(c.peek_next(), Some(3));
        assert_eq!(c.peek_ahead(2), Some(4));
        assert_eq!(c.peek_ahead(3), None);
        assert!(c.advance());
        assert_eq!(c.peek_prev(), Some(2));
        assert!(c.advance());
        assert_eq!(c.current(), 4);
        assert_eq!(c.peek_next(), None);
        assert!(!c.advance());
    }

    #[test]
    fn groups_split_on_page_and_column() {
        let entries = vec![
            entry(1, 1, 1),
            entry(1, 1, 2),
            entry(1, 2, 1),
            entry(2, 1, 1),
            entry(2, 1, 2),
        ];
        let ranges = group_ranges(&entries);
        assert_eq!(ranges, vec![0..2, 2..3, 3..5]);
    }

    #[test]
    fn groups_of_empty_input() {
        assert!(group_ranges(&[]).is_empty());
    }
}
