use aho_corasick::AhoCorasick;

use crate::error::CatalogError;

// ---------------------------------------------------------------------------
// Boundary-sensitive rules
// ---------------------------------------------------------------------------

/// Cue forms that need a boundary check beyond plain substring matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueRule {
    /// The cue text must not be immediately followed by an ASCII letter
    /// ("bank" hits "Riksbank," but not "bankir").
    NotFollowedByLetter(&'static str),
    /// The cue text must start a word (preceding character, if any, is not
    /// an ASCII letter).
    WordStart(&'static str),
    /// A maximal ASCII-letter run of at least `min_len` characters ending
    /// in `suffix`. With `trailing` the run must be followed by at least
    /// one more character ("Gjuterisverk," but not line-final "sverk").
    SuffixRun {
        suffix: &'static str,
        min_len: usize,
        trailing: bool,
    },
}

impl CueRule {
    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Byte offset and cue length of the first hit.
    pub fn find(&self, text: &str) -> Option<(usize, usize)> {
        let bytes = text.as_bytes();
        match *self {
            Self::NotFollowedByLetter(cue) => text.match_indices(cue).find_map(|(i, _)| {
                let end = i + cue.len();
                let followed = bytes.get(end).is_some_and(|b| b.is_ascii_alphabetic());
                (!followed).then_some((i, cue.len()))
            }),
            Self::WordStart(cue) => text.match_indices(cue).find_map(|(i, _)| {
                let preceded = i > 0 && bytes[i - 1].is_ascii_alphabetic();
                (!preceded).then_some((i, cue.len()))
            }),
            Self::SuffixRun {
                suffix,
                min_len,
                trailing,
            } => text.match_indices(suffix).find_map(|(i, _)| {
                let end = i + suffix.len();
                if bytes.get(end).is_some_and(|b| b.is_ascii_alphabetic()) {
                    return None;
                }
                if trailing && end >= bytes.len() {
                    return None;
                }
                let mut start = i;
                while start > 0 && bytes[start - 1].is_ascii_alphabetic() {
                    start -= 1;
                }
                (end - start >= min_len).then_some((start, end - start))
            }),
        }
    }

    fn text(&self) -> &'static str {
        match *self {
            Self::NotFollowedByLetter(cue) | Self::WordStart(cue) => cue,
            Self::SuffixRun { suffix, .. } => suffix,
        }
    }
}

// ---------------------------------------------------------------------------
// Cue set
// ---------------------------------------------------------------------------

/// A multi-pattern cue matcher: plain literals compiled to an Aho-Corasick
/// automaton, plus the handful of boundary-sensitive rules, plus veto
/// substrings that suppress any hit on the same line.
#[derive(Debug)]
pub struct CueSet {
    automaton: AhoCorasick,
    literals: Vec<&'static str>,
    rules: Vec<CueRule>,
    vetoes: Vec<&'static str>,
}

impl CueSet {
    pub fn new(
        literals: Vec<&'static str>,
        rules: Vec<CueRule>,
        vetoes: Vec<&'static str>,
    ) -> Result<Self, CatalogError> {
        let automaton =
            AhoCorasick::new(&literals).map_err(|e| CatalogError::Pattern(e.to_string()))?;
        Ok(Self {
            automaton,
            literals,
            rules,
            vetoes,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// First cue hit in the text, as the cue's own spelling.
    pub fn find(&self, text: &str) -> Option<&'static str> {
        if self.vetoes.iter().any(|v| text.contains(v)) {
            return None;
        }
        if let Some(m) = self.automaton.find(text) {
            return Some(self.literals[m.pattern().as_usize()]);
        }
        self.rules.iter().find(|r| r.is_match(text)).map(|r| r.text())
    }

    /// Every distinct cue spelling hit in the text.
    pub fn find_all(&self, text: &str) -> Vec<&'static str> {
        if self.vetoes.iter().any(|v| text.contains(v)) {
            return Vec::new();
        }
        let mut hits: Vec<&'static str> = self
            .automaton
            .find_overlapping_iter(text)
            .map(|m| self.literals[m.pattern().as_usize()])
            .collect();
        hits.extend(self.rules.iter().filter(|r| r.is_match(text)).map(|r| r.text()));
        hits.sort_unstable();
        hits.dedup();
        hits
    }

    /// Literal cues that contain a hyphen. The join classifier uses these to
    /// decide whether every hyphen in a line is accounted for by vocabulary.
    pub fn hyphenated(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.literals.iter().copied().filter(|l| l.contains('-'))
    }

    /// The firm cue catalog: company forms, institutions, and the
    /// abbreviation soup OCR makes of "aktiebolag".
    pub fn firm() -> Result<Self, CatalogError> {
        Self::new(FIRM_LITERALS.to_vec(), FIRM_RULES.to_vec(), Vec::new())
    }

    /// The estate cue catalog ("sterbhus" and its OCR mutilations). The one
    /// known false positive vetoes the whole line.
    pub fn estate() -> Result<Self, CatalogError> {
        Self::new(ESTATE_LITERALS.to_vec(), Vec::new(), vec!["starbhusnot."])
    }
}

// ---------------------------------------------------------------------------
// Firm cues
// ---------------------------------------------------------------------------

static FIRM_LITERALS: &[&str] = &[
    "Sparkassa",
    "Pharmacia",
    "Produktkompaniet",
    "Norra Frivilliga Arbetshuset",
    "Mellersta & Norra Sveriges Angpannefor- ening",
    "Siosteens",
    "Social-Demokraten",
    "Maleriarbetarforbundet",
    "Missionsforbunaet",
    "Metallindustriarbetareforbundet",
    "Landtmannens Riksforbund",
    "Traarbetareforbundet",
    "Tvalkompaniet",
    "Norra Station",
    "Pilgrimstads Andersmejeri",
    "AB",
    "Machinery",
    "Exportaffar",
    "Centralautomaten",
    "Pram- & Bogs",
    "Sagverksforbundet",
    "Bryggeriidkareforbundet",
    "Credit",
    "Sallskapet",
    "Elektriska",
    "Handelsbanken",
    "Pappersbruk",
    "Sjomanshemmet",
    "Sprithandelsbol",
    "Timmermansorden",
    "Tomtrattskassa",
    "Hypotekskassa",
    "Societe General",
    "Schlesische Feuerversicherungs",
    "Rante- och Kapitalforsakringsanstalten",
    "Olycksfallsforsakr.",
    "Hotell",
    "Centralbanken",
    "Banque",
    "Laval Separator",
    "United Shoe",
    "Forlagsexpedition",
    "Accumuslatoren",
    "Affarssystem",
    "Affarsbanken",
    "Gesellschaft",
    "servicekassa",
    "Spirituosabol",
    "Assurance-Comp",
    "Afdeln",
    "Spritforsaljningsbol",
    "Mjolkcentral",
    "Tegelindustri",
    "C:o",
    "Industriforbund",
    "Express Comp",
    "Elektricitats-Ges",
    "Coldinu Orden",
    "Transmissionsverken",
    "Pensionsfond",
    "National Versicherungs",
    "Advokatsamfund",
    "Publicistklubben",
    "Generaldepot",
    "Lanekassa",
    "C:o Limited",
    "Pupillkassan",
    "olycksfallsforsakringsanstalten",
    "Lmtd",
    "Kreditkassa",
    "laskedrycksfabr.",
    "generaldepot",
    "pensionsfond",
    "Olycksfallforsakringsanstalten",
    "Stora Sallskapet",
    "Stadernas Allmanna",
    "forsamlingen",
    "hamnarbetskontor",
    "hypotekskassa",
    "brandforsakringskontor",
    "Schweizerische Unfallversicherungs",
    "Commercial Union",
    "Elektricitetsv.",
    "Elektr.-verk",
    "samfundet",
    "Petroleum",
    "A.-B",
    "A. -B",
    "organisationen",
    "Stads",
    "Centralforbundet",
    "-verk,",
    "Hartzlimfabr",
    "Cementgjuteri",
    "fabriksbod",
    "Borgerskapskassa",
    "intressenter",
    "Korkfabrik",
    "filial",
    "Angbryggeri",
    "Lysoljeaffar",
    "Yllefabrik",
    "verket",
    "hofding gre",
    "Allm.",
    "Byra",
    "Kungl.",
    "Foreningen",
    "Armaturfabriken",
    "Forenade Industrier",
    "besparingsskog",
    "jarnvagsdrift",
    "Brandforsakringsinrattn",
    "tradgardinfabriken",
    "Andels",
    "haradsallmanning",
    "u.p.a",
    "Nya Ullspinneri",
    "Petroleumselskab",
    "Goteborgssystemet",
    "Hushallsskolan",
    "Bolag",
    "Stadspark",
    "Sparbanken",
    "firma",
    "sparkasse",
    "stiftelse",
    "villastad",
    "tomtrattsk",
    "arbetshuset",
    "foren",
    "kaffebranneri",
    "Insurance",
    "Bolaget",
    "Banken",
    "u. p. a.",
    "stationer",
    "A.B.",
    "Company",
    "Ltd",
    "Filial",
    "Hogfjallspensionat",
    "Koop.",
    "Kooperativa",
    "Gasverket",
    "Mjolkforsaljn",
    "Vattenledning",
    "A-B",
    "A- B",
    "-B.",
    "A.-B.",
    "c:o",
    "A-.B",
    "Svenska",
    "svenska",
    "forening",
    "Sthlms",
    "sthlms",
    "-akt.-bol.",
    "-akt.",
    "akt.-",
    "-b.",
    "societ",
    "aktie",
    "Aktie",
    "-bol",
    "bol.",
    "bolag",
    "Bostad",
    "L:td",
    "a.-b.",
    "akt.-bol.",
    "fonden",
];

static FIRM_RULES: &[CueRule] = &[
    CueRule::WordStart("Kredit"),
    CueRule::WordStart("Akt."),
    CueRule::NotFollowedByLetter("jarnvag"),
    CueRule::NotFollowedByLetter("Jarnvag"),
    CueRule::NotFollowedByLetter("bank"),
    CueRule::NotFollowedByLetter("Bank"),
    // "<stem>fabrik" as a whole word with a stem of at least 5 letters.
    CueRule::SuffixRun {
        suffix: "fabrik",
        min_len: 11,
        trailing: false,
    },
    // "<stem>sverk" followed by punctuation, stem of at least 2 letters.
    CueRule::SuffixRun {
        suffix: "sverk",
        min_len: 7,
        trailing: true,
    },
];

// ---------------------------------------------------------------------------
// Estate cues
// ---------------------------------------------------------------------------

static ESTATE_LITERALS: &[&str] = &[
    "st.-hus",
    "starbh",
    "sterbh",
    "starkbhus",
    "starb-",
    "starb'h",
    "sta bh",
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firm_literal_hits() {
        let cues = CueSet::firm().unwrap();
        assert!(cues.is_match("Andersson A.-B. verkstad"));
        assert!(cues.is_match("Svenska Tobaksmonopolet"));
        assert!(!cues.is_match("Lind, E., snickare 2100"));
    }

    #[test]
    fn bank_needs_a_word_end() {
        let cues = CueSet::firm().unwrap();
        assert!(cues.is_match("Riksbank, Kh. 4500"));
        assert!(!cues.is_match("bankir Olsson 2300"));
    }

    #[test]
    fn fabrik_needs_a_long_stem() {
        let cues = CueSet::firm().unwrap();
        assert!(cues.is_match("Strumpfabrik, N. 9000"));
        assert!(!cues.is_match("en fabrik dock"));
    }

    #[test]
    fn sverk_needs_trailing_punctuation() {
        let rule = CueRule::SuffixRun {
            suffix: "sverk",
            min_len: 7,
            trailing: true,
        };
        assert!(rule.is_match("Gjuterisverk, N. 12000"));
        assert!(!rule.is_match("Gjuterisverk"));
    }

    #[test]
    fn estate_veto_suppresses_hit() {
        let cues = CueSet::estate().unwrap();
        assert!(cues.is_match("Petterssons sterbhus, N. 3000"));
        assert!(!cues.is_match("se starbhusnot. nedan"));
    }

    #[test]
    fn hyphenated_literals_listed() {
        let cues = CueSet::firm().unwrap();
        let hy: Vec<_> = cues.hyphenated().collect();
        assert!(hy.contains(&"A.-B."));
        assert!(hy.contains(&"Social-Demokraten"));
    }

    #[test]
    fn find_all_reports_each_cue_once() {
        let cues = CueSet::firm().unwrap();
        let hits = cues.find_all("Svenska Handelsbanken A.-B.");
        assert!(hits.contains(&"Svenska"));
        assert!(hits.contains(&"Handelsbanken"));
        assert!(hits.contains(&"A.-B."));
    }
}
