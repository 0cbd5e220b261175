//! Matrix Series - per-matrix time series across thread counts

use serde::{Deserialize, Serialize};

use crate::parser::TrialResult;

/// Relative tolerance when comparing determinants from different trials.
const DETERMINANT_REL_TOLERANCE: f64 = 1e-6;

/// Matrix Series holds the aligned measurements for one matrix.
///
/// `threads[i]`, `speedup[i]`, `efficiency[i]`, `sequential_times[i]` and
/// `parallel_times[i]` all describe the same successful trial. The five
/// sequences always have equal length: [`MatrixSeries::record`] appends to
/// all of them at once and deserialization rejects misaligned input.
///
/// The determinant is latched from the first trial that reported one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct MatrixSeries {
    threads: Vec<u32>,
    speedup: Vec<f64>,
    efficiency: Vec<f64>,
    sequential_times: Vec<f64>,
    parallel_times: Vec<f64>,
    #[serde(with = "determinant_text")]
    determinant: Option<f64>,
}

/// Outcome of offering a trial's determinant to the series latch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeterminantCheck {
    /// The trial reported no determinant.
    Absent,
    /// First determinant for this matrix; now latched.
    Latched,
    /// Agrees with the latched value.
    Consistent,
    /// Disagrees with the latched value, which is kept.
    Mismatch {
        /// Value latched from an earlier trial
        latched: f64,
        /// Value this trial reported
        observed: f64,
    },
}

impl MatrixSeries {
    /// Create an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one successful trial.
    ///
    /// Missing numeric fields are stored as `0.0` so the sequences stay
    /// aligned. Returns how the trial's determinant related to the latch.
    pub fn record(&mut self, threads: u32, result: &TrialResult) -> DeterminantCheck {
        self.threads.push(threads);
        self.speedup.push(result.speedup_or_zero());
        self.efficiency.push(result.efficiency_or_zero());
        self.sequential_times.push(result.sequential_time_or_zero());
        self.parallel_times.push(result.parallel_time_or_zero());

        match (self.determinant, result.determinant) {
            (_, None) => DeterminantCheck::Absent,
            (None, Some(observed)) => {
                self.determinant = Some(observed);
                DeterminantCheck::Latched
            }
            (Some(latched), Some(observed)) if determinants_agree(latched, observed) => {
                DeterminantCheck::Consistent
            }
            (Some(latched), Some(observed)) => DeterminantCheck::Mismatch { latched, observed },
        }
    }

    /// Number of recorded trials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// True if no trial succeeded for this matrix.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Thread counts of the recorded trials, in trial order.
    #[must_use]
    pub fn threads(&self) -> &[u32] {
        &self.threads
    }

    /// Speedup per recorded trial.
    #[must_use]
    pub fn speedup(&self) -> &[f64] {
        &self.speedup
    }

    /// Efficiency (percent) per recorded trial.
    #[must_use]
    pub fn efficiency(&self) -> &[f64] {
        &self.efficiency
    }

    /// Sequential time (seconds) per recorded trial.
    #[must_use]
    pub fn sequential_times(&self) -> &[f64] {
        &self.sequential_times
    }

    /// Parallel time (seconds) per recorded trial.
    #[must_use]
    pub fn parallel_times(&self) -> &[f64] {
        &self.parallel_times
    }

    /// Latched determinant, if any trial reported one.
    #[must_use]
    pub const fn determinant(&self) -> Option<f64> {
        self.determinant
    }

    /// Largest recorded thread count.
    #[must_use]
    pub fn max_threads(&self) -> Option<u32> {
        self.threads.iter().copied().max()
    }
}

fn determinants_agree(a: f64, b: f64) -> bool {
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= DETERMINANT_REL_TOLERANCE * scale
}

/// Unchecked wire form of a series.
#[derive(Deserialize)]
struct RawSeries {
    threads: Vec<u32>,
    speedup: Vec<f64>,
    efficiency: Vec<f64>,
    sequential_times: Vec<f64>,
    parallel_times: Vec<f64>,
    #[serde(default, with = "determinant_text")]
    determinant: Option<f64>,
}

impl TryFrom<RawSeries> for MatrixSeries {
    type Error = String;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        let n = raw.threads.len();
        let lengths = [
            raw.speedup.len(),
            raw.efficiency.len(),
            raw.sequential_times.len(),
            raw.parallel_times.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(format!(
                "misaligned series: threads={n}, speedup={}, efficiency={}, sequential_times={}, parallel_times={}",
                lengths[0], lengths[1], lengths[2], lengths[3]
            ));
        }
        Ok(Self {
            threads: raw.threads,
            speedup: raw.speedup,
            efficiency: raw.efficiency,
            sequential_times: raw.sequential_times,
            parallel_times: raw.parallel_times,
            determinant: raw.determinant,
        })
    }
}

/// JSON has no infinity, so the determinant travels as text (`"-inf"`,
/// `"12.5"`). Plain numbers are still accepted on read.
mod determinant_text {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Number(v)) => Ok(Some(v)),
            Some(Repr::Text(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid determinant '{text}'"))),
        }
    }
}
