use regex::Regex;

use crate::error::EngineError;

/// Shape regexes used across the joiner and taggers, compiled once per run.
#[derive(Debug)]
pub struct Patterns {
    /// Hyphen-prefixed number: "- 16200".
    pub hyphen_number: Regex,
    /// Number followed by a hyphen: "16500 -".
    pub number_hyphen: Regex,
    /// Two bare numbers side by side.
    pub number_pair: Regex,
    /// Dash-joined numeric triple: "16500-16200-400".
    pub number_triple: Regex,
    /// Dash-joined pair followed by a bare number.
    pub pair_then_number: Regex,
    /// Population parenthetical that marks a location header.
    pub inv_marker: Regex,
    /// Population parenthetical with its figure, as it appears mid-line.
    pub population_paren: Regex,
    /// Two numbers joined by whitespace or a hyphen.
    pub adjacent_numbers: Regex,
    /// A full dash-prefixed number pair: "- 16500 400".
    pub dash_number_pair: Regex,
    /// Number captured just before a hyphen.
    pub number_before_hyphen: Regex,
    /// Two numbers joined by a hyphen, spacing tolerant.
    pub number_dash_number: Regex,
    /// Hyphenated word pair with captures, for squashing OCR hyphens.
    pub hyphen_squash: Regex,
    /// Telephone listing forms.
    pub telephone: Regex,
    /// Hyphenated word (letters on both sides).
    pub word_hyphen_word: Regex,
    /// Any word-hyphen-word shape, digits allowed.
    pub dashed_token: Regex,
    /// A digit run glued to trailing letters ("3200kr").
    pub digits_then_letters: Regex,
    /// The "0., " OCR error for an initial "O., ".
    pub zero_comma: Regex,
    /// " 0.," variant of the same error.
    pub space_zero_dot: Regex,
    /// Double dot before a digit.
    pub double_dot_digit: Regex,
    /// Double dot before a dash.
    pub double_dot_dash: Regex,
    /// Capital, double dot, lowercase.
    pub double_dot_lower: Regex,
    /// Thousands comma inside a figure: "3,200".
    pub comma_figure: Regex,
    /// The "A.-B." initials false positive, spacing-tolerant.
    pub ab_abbrev: Regex,
    /// Comma with arbitrary surrounding whitespace.
    pub comma_spacing: Regex,
    /// Capitalized name followed by a comma and a dotted initial.
    pub name_then_initial: Regex,
    /// Any word followed by a comma and a dotted initial.
    pub word_then_initial: Regex,
    /// A complete parenthesized group.
    pub paren_group: Regex,
}

impl Patterns {
    pub fn new() -> Result<Self, EngineError> {
        let compile = |p: &str| Regex::new(p).map_err(|e| EngineError::Pattern(e.to_string()));
        Ok(Self {
            hyphen_number: compile(r"-\s*\d+")?,
            number_hyphen: compile(r"\d+\s*-")?,
            number_pair: compile(r"\b\d+\s+\d+\b")?,
            number_triple: compile(r"\d+\s*-\s*\d+\s*-\s*\d+")?,
            pair_then_number: compile(r"\d+\s*-\s*\d+\s\d+")?,
            inv_marker: compile(r"inv\.\)")?,
            population_paren: compile(r"\d+\s*inv\.\)")?,
            adjacent_numbers: compile(r"\d+(?:\s+|-)\d+")?,
            dash_number_pair: compile(r"^-\s*\d+\s+\d+$")?,
            number_before_hyphen: compile(r"(\d+)\s*-")?,
            number_dash_number: compile(r"\d+\s*-\s*\d+")?,
            hyphen_squash: compile(r"(\w+)\s*-\s*(\w+)")?,
            telephone: compile(r"[Tt]el\.?\s*\d|[Tt]el\.\s|Allm\.\s*[Tt]el")?,
            word_hyphen_word: compile(r"\b[a-zA-Z]+\s*-\s*[a-zA-Z]+\b")?,
            dashed_token: compile(r"\w+\s*-\s*\w+")?,
            digits_then_letters: compile(r"(\d+)[A-Za-z]+")?,
            zero_comma: compile(r"\b0,\s")?,
            space_zero_dot: compile(r"\s0\.,")?,
            double_dot_digit: compile(r"\.\.\s(\d)")?,
            double_dot_dash: compile(r"\.\.\s-")?,
            double_dot_lower: compile(r"([A-Z])\.\.\s([a-z])")?,
            comma_figure: compile(r"(\d)\s*,\s*(\d\d)")?,
            ab_abbrev: compile(r"A\s*\.?\s*-\s*B\.?")?,
            comma_spacing: compile(r"\s*,\s*")?,
            name_then_initial: compile(r"[A-Z]\w*,\s*[A-Z]\.")?,
            word_then_initial: compile(r"\w+,\s*[A-Z]\.")?,
            paren_group: compile(r"\([^)]*\)")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joiner_shapes() {
        let p = Patterns::new().unwrap();
        assert!(p.hyphen_number.is_match("verkstad - 16200"));
        assert!(p.number_triple.is_match("16500-16200-400"));
        assert!(p.inv_marker.is_match("Rimbo (1200 inv.)"));
        assert!(p.telephone.is_match("Allm. Tel. 243"));
        assert!(!p.telephone.is_match("Berg, K., snickare 2100"));
    }

    #[test]
    fn ab_abbrev_spacing_tolerant() {
        let p = Patterns::new().unwrap();
        assert!(p.ab_abbrev.is_match("A.-B."));
        assert!(p.ab_abbrev.is_match("A - B"));
    }
}
