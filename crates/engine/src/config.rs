use serde::Deserialize;

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Tunable engine parameters. Every threshold the extraction stages use is
/// a field here; the defaults reproduce the calibration the directories
/// were originally processed with.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            limits: Limits::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Fuzzy-match acceptance scores, on the 0-100 token-sort-ratio scale.
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    /// Low-tier surname acceptance.
    #[serde(default = "d_fuzzy_low")]
    pub fuzzy_low: f64,
    /// High-tier surname acceptance.
    #[serde(default = "d_fuzzy_high")]
    pub fuzzy_high: f64,
    /// Minimum score for `V.`-prefix and hyphenated-surname recovery.
    #[serde(default = "d_v_dash_min")]
    pub v_dash_min: f64,
    /// Fuzzy occupation recovery.
    #[serde(default = "d_occupation_fuzzy")]
    pub occupation_fuzzy: f64,
    /// Secondary occupation acceptance.
    #[serde(default = "d_secondary_occupation")]
    pub secondary_occupation: f64,
    /// Parish quality-check acceptance.
    #[serde(default = "d_parish_fuzzy")]
    pub parish_fuzzy: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fuzzy_low: d_fuzzy_low(),
            fuzzy_high: d_fuzzy_high(),
            v_dash_min: d_v_dash_min(),
            occupation_fuzzy: d_occupation_fuzzy(),
            secondary_occupation: d_secondary_occupation(),
            parish_fuzzy: d_parish_fuzzy(),
        }
    }
}

fn d_fuzzy_low() -> f64 {
    85.0
}
fn d_fuzzy_high() -> f64 {
    90.0
}
fn d_v_dash_min() -> f64 {
    86.0
}
fn d_occupation_fuzzy() -> f64 {
    85.5
}
fn d_secondary_occupation() -> f64 {
    87.0
}
fn d_parish_fuzzy() -> f64 {
    85.5
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Length and magnitude cutoffs.
#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    /// Max length drift between a completed word and its fuzzy candidate.
    #[serde(default = "d_completed_word_slack")]
    pub completed_word_slack: usize,
    /// A bare number above this reads as an income figure, not a page or
    /// house number.
    #[serde(default = "d_income_floor")]
    pub income_floor: u64,
    /// Third-fragment numbers must exceed this.
    #[serde(default = "d_third_part_floor")]
    pub third_part_floor: u64,
    /// Dash-joined numeric pairs count as split income above this.
    #[serde(default = "d_pair_magnitude_floor")]
    pub pair_magnitude_floor: u64,
    /// Exact surname matches must be longer than this.
    #[serde(default = "d_min_surname_len")]
    pub min_surname_len: usize,
    /// Occupation matches shorter than this are discarded.
    #[serde(default = "d_min_occupation_len")]
    pub min_occupation_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            completed_word_slack: d_completed_word_slack(),
            income_floor: d_income_floor(),
            third_part_floor: d_third_part_floor(),
            pair_magnitude_floor: d_pair_magnitude_floor(),
            min_surname_len: d_min_surname_len(),
            min_occupation_len: d_min_occupation_len(),
        }
    }
}

fn d_completed_word_slack() -> usize {
    5
}
fn d_income_floor() -> u64 {
    1000
}
fn d_third_part_floor() -> u64 {
    6000
}
fn d_pair_magnitude_floor() -> u64 {
    15000
}
fn d_min_surname_len() -> usize {
    2
}
fn d_min_occupation_len() -> usize {
    3
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on extract/classify/adjust iterations. The loop stops
    /// earlier as soon as an iteration changes nothing.
    #[serde(default = "d_max_passes")]
    pub max_passes: usize,
    /// Process (page, column) groups on the rayon pool.
    #[serde(default = "d_parallel")]
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_passes: d_max_passes(),
            parallel: d_parallel(),
        }
    }
}

fn d_max_passes() -> usize {
    2
}
fn d_parallel() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let t = &self.thresholds;
        for (name, value) in [
            ("fuzzy_low", t.fuzzy_low),
            ("fuzzy_high", t.fuzzy_high),
            ("v_dash_min", t.v_dash_min),
            ("occupation_fuzzy", t.occupation_fuzzy),
            ("secondary_occupation", t.secondary_occupation),
            ("parish_fuzzy", t.parish_fuzzy),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(EngineError::ConfigValidation(format!(
                    "thresholds.{name} must be within 0..=100, got {value}"
                )));
            }
        }
        if t.fuzzy_low > t.fuzzy_high {
            return Err(EngineError::ConfigValidation(format!(
                "fuzzy_low ({}) must not exceed fuzzy_high ({})",
                t.fuzzy_low, t.fuzzy_high
            )));
        }

        let l = &self.limits;
        if l.income_floor > l.third_part_floor || l.third_part_floor > l.pair_magnitude_floor {
            return Err(EngineError::ConfigValidation(format!(
                "magnitude cutoffs must be ordered: income_floor ({}) <= third_part_floor ({}) <= pair_magnitude_floor ({})",
                l.income_floor, l.third_part_floor, l.pair_magnitude_floor
            )));
        }

        let p = &self.pipeline;
        if p.max_passes == 0 || p.max_passes > 8 {
            return Err(EngineError::ConfigValidation(format!(
                "pipeline.max_passes must be within 1..=8, got {}",
                p.max_passes
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
