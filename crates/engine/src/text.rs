//! Small string helpers shared by the extraction stages. Everything here
//! operates on already-folded text.

/// Maximal digit runs in the text, parsed. Runs that overflow u64 are
/// clamped; directory figures never get near that.
pub fn numbers(s: &str) -> Vec<u64> {
    let mut out = Vec::new();
    let mut current: Option<u64> = None;
    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            let acc = current.unwrap_or(0);
            current = Some(acc.saturating_mul(10).saturating_add(d as u64));
        } else if let Some(n) = current.take() {
            out.push(n);
        }
    }
    if let Some(n) = current {
        out.push(n);
    }
    out
}

pub fn digit_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

pub fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

pub fn has_letter(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_alphabetic())
}

pub fn has_upper(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_uppercase())
}

pub fn has_lower(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_lowercase())
}

pub fn first_char_is_upper(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_uppercase())
}

pub fn first_char_is_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Char at position `i`, if any.
pub fn char_at(s: &str, i: usize) -> Option<char> {
    s.chars().nth(i)
}

/// Extend a line prefix to the first complete word: from the start of
/// `partial` in `full_line`, run until whitespace, comma, or period.
pub fn complete_first_word(partial: &str, full_line: &str) -> String {
    if partial.is_empty() {
        return String::new();
    }
    for (i, _) in full_line.match_indices(partial) {
        let word_start = full_line[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        if !word_start {
            continue;
        }
        let end = i + partial.len();
        let stop = full_line[end..]
            .find(|c: char| c.is_whitespace() || c == ',' || c == '.')
            .unwrap_or(full_line.len() - end);
        return full_line[i..end + stop].to_string();
    }
    partial.to_string()
}

/// Remove the first occurrence of `needle`, if any.
pub fn remove_first(s: &str, needle: &str) -> String {
    match s.find(needle) {
        Some(i) => {
            let mut out = String::with_capacity(s.len() - needle.len());
            out.push_str(&s[..i]);
            out.push_str(&s[i + needle.len()..]);
            out
        }
        None => s.to_string(),
    }
}

/// Drop the leading alphabetic run (a dangling fragment of a removed
/// field), keep from the first non-alphabetic character on, trimmed.
pub fn drop_leading_word(s: &str) -> &str {
    match s.find(|c: char| !c.is_alphabetic()) {
        Some(i) => s[i..].trim(),
        None => s,
    }
}

/// Two-character prefix by chars, not bytes.
pub fn prefix2(s: &str) -> String {
    s.chars().take(2).collect()
}

/// Longest token when splitting by both whitespace and commas.
pub fn longest_token_len(s: &str) -> usize {
    let by_space = s.split_whitespace().map(str::len).max().unwrap_or(0);
    let by_comma = s.split(',').map(str::len).max().unwrap_or(0);
    by_space.max(by_comma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_runs() {
        assert_eq!(numbers("Kh. 3200-1500, hus 4"), vec![3200, 1500, 4]);
        assert!(numbers("no digits").is_empty());
    }

    #[test]
    fn complete_word_extends_to_delimiter() {
        assert_eq!(complete_first_word("Anders", "Anderssons gata 3"), "Anderssons");
        assert_eq!(complete_first_word("Berg", "Berg, K."), "Berg");
        assert_eq!(complete_first_word("Xyz", "Berg, K."), "Xyz");
    }

    #[test]
    fn leading_word_dropped() {
        assert_eq!(drop_leading_word("sson, K. snickare"), ", K. snickare");
        assert_eq!(drop_leading_word(", K."), ", K.");
        assert_eq!(drop_leading_word("bara"), "bara");
    }

    #[test]
    fn remove_only_first() {
        assert_eq!(remove_first("A. B. A.", "A."), " B. A.");
    }
}
