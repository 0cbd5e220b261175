//! Output Parser - scrapes metrics from the solver's human-readable report
//!
//! The determinant program prints lines such as:
//!
//! ```text
//! Детерминант: -inf
//! Время последовательно: 1.234567890 сек (1234.568 мс)
//! Время параллельно: 0.352733000 сек (352.733 мс)
//! Ускорение: 3.500x
//! Эффективность: 87.50% (0.8750)
//! ```
//!
//! Each field is matched independently. A missing label leaves the field
//! `None`; it is never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Signed decimal, optionally with an exponent.
const NUMBER: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

/// Determinant token: a number or a signed infinity.
const DETERMINANT: &str = r"[-+]?(?:inf(?:inity)?|\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

/// Metrics extracted from one successful invocation.
///
/// Every field is independently optional: `None` means the corresponding
/// label did not appear in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Determinant value, possibly infinite
    pub determinant: Option<f64>,
    /// Speedup factor (sequential / parallel)
    pub speedup: Option<f64>,
    /// Parallel efficiency in percent
    pub efficiency: Option<f64>,
    /// Sequential execution time in seconds
    pub sequential_time: Option<f64>,
    /// Parallel execution time in seconds
    pub parallel_time: Option<f64>,
}

impl TrialResult {
    /// True when no field was found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.determinant.is_none()
            && self.speedup.is_none()
            && self.efficiency.is_none()
            && self.sequential_time.is_none()
            && self.parallel_time.is_none()
    }

    /// Speedup, or 0.0 when absent.
    #[must_use]
    pub fn speedup_or_zero(&self) -> f64 {
        self.speedup.unwrap_or_default()
    }

    /// Efficiency, or 0.0 when absent.
    #[must_use]
    pub fn efficiency_or_zero(&self) -> f64 {
        self.efficiency.unwrap_or_default()
    }

    /// Sequential time, or 0.0 when absent.
    #[must_use]
    pub fn sequential_time_or_zero(&self) -> f64 {
        self.sequential_time.unwrap_or_default()
    }

    /// Parallel time, or 0.0 when absent.
    #[must_use]
    pub fn parallel_time_or_zero(&self) -> f64 {
        self.parallel_time.unwrap_or_default()
    }
}

/// Localized label text the solver prints in front of each value.
///
/// Labels are matched literally (case-insensitive); suffixes follow the
/// number, with optional whitespace in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLabels {
    /// Label before the determinant
    pub determinant: String,
    /// Label before the speedup
    pub speedup: String,
    /// Suffix after the speedup number
    pub speedup_suffix: String,
    /// Label before the efficiency
    pub efficiency: String,
    /// Suffix after the efficiency number
    pub efficiency_suffix: String,
    /// Label before the sequential time
    pub sequential_time: String,
    /// Label before the parallel time
    pub parallel_time: String,
    /// Time unit after both time values
    pub seconds_unit: String,
}

impl OutputLabels {
    /// Labels printed by the stock (Russian-localized) solver.
    #[must_use]
    pub fn russian() -> Self {
        Self {
            determinant: "Детерминант:".to_string(),
            speedup: "Ускорение:".to_string(),
            speedup_suffix: "x".to_string(),
            efficiency: "Эффективность:".to_string(),
            efficiency_suffix: "%".to_string(),
            sequential_time: "Время последовательно:".to_string(),
            parallel_time: "Время параллельно:".to_string(),
            seconds_unit: "сек".to_string(),
        }
    }

    /// Labels for an English build of the solver.
    #[must_use]
    pub fn english() -> Self {
        Self {
            determinant: "Determinant:".to_string(),
            speedup: "Speedup:".to_string(),
            speedup_suffix: "x".to_string(),
            efficiency: "Efficiency:".to_string(),
            efficiency_suffix: "%".to_string(),
            sequential_time: "Sequential time:".to_string(),
            parallel_time: "Parallel time:".to_string(),
            seconds_unit: "sec".to_string(),
        }
    }
}

impl Default for OutputLabels {
    fn default() -> Self {
        Self::russian()
    }
}

/// Turns raw program output into a [`TrialResult`].
///
/// Implementations are best-effort adapters for one output format. Swapping
/// the adapter is how a format change is absorbed.
pub trait OutputParser {
    /// Extract whatever fields are present in `output`.
    fn parse(&self, output: &str) -> TrialResult;
}

/// Regex-based parser for the solver's localized text report.
#[derive(Debug, Clone)]
pub struct LocalizedTextParser {
    determinant: Regex,
    speedup: Regex,
    efficiency: Regex,
    sequential_time: Regex,
    parallel_time: Regex,
}

impl LocalizedTextParser {
    /// Compile the patterns for the given labels.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Pattern`] if a pattern fails to compile.
    pub fn new(labels: &OutputLabels) -> Result<Self> {
        Ok(Self {
            determinant: labelled(&labels.determinant, DETERMINANT, "")?,
            speedup: labelled(&labels.speedup, NUMBER, &labels.speedup_suffix)?,
            efficiency: labelled(&labels.efficiency, NUMBER, &labels.efficiency_suffix)?,
            sequential_time: labelled(&labels.sequential_time, NUMBER, &labels.seconds_unit)?,
            parallel_time: labelled(&labels.parallel_time, NUMBER, &labels.seconds_unit)?,
        })
    }

    /// Parser for the stock Russian labels.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Pattern`] if a pattern fails to compile.
    pub fn russian() -> Result<Self> {
        Self::new(&OutputLabels::russian())
    }
}

impl OutputParser for LocalizedTextParser {
    fn parse(&self, output: &str) -> TrialResult {
        let result = TrialResult {
            determinant: capture(&self.determinant, output).and_then(parse_determinant),
            speedup: capture(&self.speedup, output).and_then(parse_number),
            efficiency: capture(&self.efficiency, output).and_then(parse_number),
            sequential_time: capture(&self.sequential_time, output).and_then(parse_number),
            parallel_time: capture(&self.parallel_time, output).and_then(parse_number),
        };
        tracing::debug!(?result, "parsed trial output");
        result
    }
}

/// Build `(?i)<label>\s*(<value>)\s*<suffix>`.
fn labelled(label: &str, value: &str, suffix: &str) -> Result<Regex> {
    let suffix = if suffix.is_empty() {
        String::new()
    } else {
        format!(r"\s*{}", regex::escape(suffix))
    };
    let pattern = format!(r"(?i){}\s*({value}){suffix}", regex::escape(label));
    Ok(Regex::new(&pattern)?)
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Overflowing tokens such as `1e400` are dropped: metrics must be finite.
fn parse_number(token: &str) -> Option<f64> {
    token.parse().ok().filter(|v: &f64| v.is_finite())
}

/// Infinity keeps the sign of a leading minus; anything else is positive.
fn parse_determinant(token: &str) -> Option<f64> {
    if token.to_ascii_lowercase().contains("inf") {
        if token.starts_with('-') {
            Some(f64::NEG_INFINITY)
        } else {
            Some(f64::INFINITY)
        }
    } else {
        token.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REPORT: &str = "\
Детерминант: -1234.500000
Время последовательно: 1.250000000 сек (1250.000 мс)
Время параллельно: 0.500000000 сек (500.000 мс)
Ускорение: 2.500x
Эффективность: 62.50% (0.6250)
";

    fn parser() -> LocalizedTextParser {
        LocalizedTextParser::russian().unwrap()
    }

    #[test]
    fn test_parse_full_report() {
        let result = parser().parse(FULL_REPORT);
        assert_eq!(result.determinant, Some(-1234.5));
        assert_eq!(result.sequential_time, Some(1.25));
        assert_eq!(result.parallel_time, Some(0.5));
        assert_eq!(result.speedup, Some(2.5));
        assert_eq!(result.efficiency, Some(62.5));
    }

    #[test]
    fn test_parse_negative_infinity() {
        let result = parser().parse("Детерминант: -inf\n");
        assert_eq!(result.determinant, Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_parse_positive_infinity() {
        let result = parser().parse("Детерминант: inf\n");
        assert_eq!(result.determinant, Some(f64::INFINITY));
        let result = parser().parse("Детерминант: +INF\n");
        assert_eq!(result.determinant, Some(f64::INFINITY));
    }

    #[test]
    fn test_parse_speedup_only() {
        let result = parser().parse("Ускорение: 3.50x");
        assert_eq!(result.speedup, Some(3.5));
        assert!(result.efficiency.is_none());
        assert!(result.determinant.is_none());
    }

    #[test]
    fn test_missing_speedup_is_none_not_zero() {
        let result = parser().parse("Эффективность: 40.0%");
        assert!(result.speedup.is_none());
        assert!((result.speedup_or_zero() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_output_yields_empty_record() {
        let result = parser().parse("");
        assert!(result.is_empty());
        assert_eq!(result, TrialResult::default());
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let result = parser().parse("УСКОРЕНИЕ: 1.75X\nвремя ПАРАЛЛЕЛЬНО: 0.25 СЕК");
        assert_eq!(result.speedup, Some(1.75));
        assert_eq!(result.parallel_time, Some(0.25));
    }

    #[test]
    fn test_negative_times_accepted_verbatim() {
        let result = parser().parse("Время последовательно: -0.5 сек");
        assert_eq!(result.sequential_time, Some(-0.5));
    }

    #[test]
    fn test_overflowing_metrics_are_dropped() {
        let result = parser().parse("Ускорение: 1e400x\nВремя параллельно: -1e999 сек\nДетерминант: 1e400");
        assert!(result.speedup.is_none());
        assert!(result.parallel_time.is_none());
        assert_eq!(result.determinant, Some(f64::INFINITY));
    }

    #[test]
    fn test_speedup_requires_suffix() {
        let result = parser().parse("Ускорение: 3.5 раза");
        assert!(result.speedup.is_none());
    }

    #[test]
    fn test_english_labels() {
        let parser = LocalizedTextParser::new(&OutputLabels::english()).unwrap();
        let result = parser.parse("Determinant: 42\nSpeedup: 1.9x\nEfficiency: 95%\n");
        assert_eq!(result.determinant, Some(42.0));
        assert_eq!(result.speedup, Some(1.9));
        assert_eq!(result.efficiency, Some(95.0));
    }

    #[test]
    fn test_labels_with_regex_metacharacters_are_literal() {
        let labels = OutputLabels {
            speedup: "Speedup (x):".to_string(),
            ..OutputLabels::english()
        };
        let parser = LocalizedTextParser::new(&labels).unwrap();
        assert_eq!(parser.parse("Speedup (x): 2x").speedup, Some(2.0));
        assert!(parser.parse("Speedup x: 2x").speedup.is_none());
    }
}
