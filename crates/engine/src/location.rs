//! Location markers and municipality assignment. A directory section opens
//! with a header line like "Rimbo (1200 inv.)"; every row after it belongs
//! to that municipality until the next header.

use taxkal_core::Entry;

use crate::patterns::Patterns;

/// Pull the location name out of a population-header line: the text before
/// the parenthesis, with digits, commas, and the "inv." marker removed.
/// Non-header lines are untouched.
pub fn find_location(entry: &mut Entry, patterns: &Patterns) {
    if !patterns.inv_marker.is_match(&entry.text) {
        return;
    }
    let prefix: String = entry
        .text
        .chars()
        .take_while(|c| *c != '(' && *c != ')')
        .collect();
    let stripped: String = prefix
        .chars()
        .filter(|c| !c.is_ascii_digit() && *c != ',')
        .collect();
    entry.location = stripped.replace("inv.", "");
}

/// Walk the rows in reading order carrying the current municipality
/// forward. A header whose own name was unreadable takes the previous
/// line's text instead. Rows before the first header get the seed
/// municipality when one is given, otherwise stay empty for the
/// alphabetical edge fill.
pub fn assign_municipalities(entries: &mut [Entry], seed: Option<&str>) {
    let mut current = seed.unwrap_or("").to_string();
    let mut prev_text = String::new();
    for entry in entries.iter_mut() {
        if !entry.location.is_empty() {
            let name = entry.location.trim().to_string();
            let resolved = if name.is_empty() { prev_text.clone() } else { name };
            if !resolved.is_empty() {
                entry.location = resolved.clone();
                current = resolved;
            }
        }
        entry.municipality = current.clone();
        prev_text = entry.text.trim().to_string();
    }
}

/// Rows still without a municipality sit at a section boundary. The
/// directory is alphabetical, so a line opening early in the alphabet
/// belongs to the section ahead and a late one to the section behind.
pub fn fill_municipality_edges(entries: &mut [Entry]) {
    for i in 0..entries.len() {
        if !(entries[i].location.is_empty() && entries[i].municipality.is_empty()) {
            continue;
        }
        let Some(first) = entries[i].text.chars().next() else {
            continue;
        };
        if ('A'..='G').contains(&first) {
            if let Some(next) = entries.get(i + 3) {
                entries[i].municipality = next.municipality.clone();
            }
        } else if ('O'..='Z').contains(&first) && i > 0 {
            entries[i].municipality = entries[i - 1].municipality.clone();
        }
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
    fn header_name_extracted() {
        let pats = Patterns::new().unwrap();
        let mut e = entry(1, "Rimbo (1200 inv.)");
        find_location(&mut e, &pats);
        assert_eq!(e.location.trim(), "Rimbo");

        let mut plain = entry(2, "Berg, K., snickare 2100");
        find_location(&mut plain, &pats);
        assert_eq!(plain.location, "");
    }

    #[test]
    fn municipality_carried_until_next_header() {
        let pats = Patterns::new().unwrap();
        let mut entries = vec![
            entry(1, "Berg, K., snickare 2100"),
            entry(2, "Rimbo (1200 inv.)"),
            entry(3, "Lind, A., ingenjor 3200"),
            entry(4, "Sala (4000 inv.)"),
            entry(5, "Ahl, B., kapten 2800"),
        ];
        for e in entries.iter_mut() {
            find_location(e, &pats);
        }
        assign_municipalities(&mut entries, Some("Stockholm"));
        assert_eq!(entries[0].municipality, "Stockholm");
        assert_eq!(entries[2].municipality, "Rimbo");
        assert_eq!(entries[4].municipality, "Sala");
    }

    #[test]
    fn unreadable_header_takes_previous_line() {
        let pats = Patterns::new().unwrap();
        let mut entries = vec![
            entry(1, "Rimbo"),
            entry(2, " (1200 inv.)"),
            entry(3, "Lind, A., ingenjor 3200"),
        ];
        for e in entries.iter_mut() {
            find_location(e, &pats);
        }
        assign_municipalities(&mut entries, Some("Stockholm"));
        assert_eq!(entries[2].municipality, "Rimbo");
    }

    #[test]
    fn alphabetical_edge_fill() {
        let pats = Patterns::new().unwrap();
        let mut entries = vec![
            entry(1, "Ahl, B., kapten 2800"),
            entry(2, "Rimbo (1200 inv.)"),
            entry(3, "Lind, A., ingenjor 3200"),
            entry(4, "Moberg, C. 2100"),
            entry(5, "Sved, D. 1900"),
        ];
        for e in entries.iter_mut() {
            find_location(e, &pats);
        }
        assign_municipalities(&mut entries, None);
        assert_eq!(entries[0].municipality, "");
        fill_municipality_edges(&mut entries);
        // "Ahl" opens early in the alphabet: the section ahead.
        assert_eq!(entries[0].municipality, "Rimbo");
    }
}
