use std::fmt;

/// Named aggregate reducing a sequence of samples to one scalar.
///
/// All functions return `0.0` for an empty sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cumulation {
    /// Last element. Only reachable as the implicit default.
    Last,
    Sum,
    Mean,
    Min,
    Max,
    /// Element at index `n / 2` of the ascending sort. For even lengths this
    /// is the upper-middle element, not the average of the two middle ones.
    Median,
    Geomean,
    HarmonicMean,
    /// Population variance.
    Variance,
    Stddev,
}

impl Cumulation {
    /// Looks up a cumulation by its script token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "sum" => Some(Self::Sum),
            "mean" => Some(Self::Mean),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "median" => Some(Self::Median),
            "geomean" => Some(Self::Geomean),
            "harmonic-mean" => Some(Self::HarmonicMean),
            "variance" => Some(Self::Variance),
            "stddev" => Some(Self::Stddev),
            _ => None,
        }
    }

    pub fn apply(self, samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let n = samples.len() as f64;
        match self {
            Self::Last => samples[samples.len() - 1],
            Self::Sum => samples.iter().sum(),
            Self::Mean => mean(samples),
            Self::Min => samples.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Median => {
                let mut sorted = samples.to_vec();
                sorted.sort_by(f64::total_cmp);
                sorted[sorted.len() / 2]
            }
            Self::Geomean => samples.iter().product::<f64>().powf(1.0 / n),
            Self::HarmonicMean => n / samples.iter().map(|value| 1.0 / value).sum::<f64>(),
            Self::Variance => variance(samples),
            Self::Stddev => variance(samples).sqrt(),
        }
    }
}

impl fmt::Display for Cumulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Last => "last",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::Geomean => "geomean",
            Self::HarmonicMean => "harmonic-mean",
            Self::Variance => "variance",
            Self::Stddev => "stddev",
        })
    }
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn variance(samples: &[f64]) -> f64 {
    let mean = mean(samples);
    samples
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn median_takes_upper_middle_element() {
        assert_eq!(Cumulation::Median.apply(&[4.0, 1.0, 3.0, 2.0]), 3.0);
        assert_eq!(Cumulation::Median.apply(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(Cumulation::Median.apply(&[]), 0.0);
    }

    #[test]
    fn means_match_reference_values() {
        assert!(close(Cumulation::Geomean.apply(&[4.0, 9.0]), 6.0));
        assert!(close(
            Cumulation::HarmonicMean.apply(&[1.0, 2.0, 4.0]),
            12.0 / 7.0
        ));
        assert!(close(Cumulation::Mean.apply(&[1.0, 2.0, 3.0, 6.0]), 3.0));
    }

    #[test]
    fn variance_is_population_variance() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(Cumulation::Variance.apply(&samples), 4.0));
        assert!(close(Cumulation::Stddev.apply(&samples), 2.0));
    }

    #[test]
    fn extremes_and_sum() {
        let samples = [3.0, -1.0, 8.0];
        assert_eq!(Cumulation::Min.apply(&samples), -1.0);
        assert_eq!(Cumulation::Max.apply(&samples), 8.0);
        assert_eq!(Cumulation::Sum.apply(&samples), 10.0);
        assert_eq!(Cumulation::Last.apply(&samples), 8.0);
    }

    #[test]
    fn every_cumulation_is_zero_on_empty_input() {
        for token in [
            "sum",
            "mean",
            "min",
            "max",
            "median",
            "geomean",
            "harmonic-mean",
            "variance",
            "stddev",
        ] {
            let cumulation = Cumulation::from_token(token).unwrap();
            assert_eq!(cumulation.apply(&[]), 0.0, "{token}");
            assert_eq!(cumulation.to_string(), token);
        }
        assert_eq!(Cumulation::Last.apply(&[]), 0.0);
    }

    #[test]
    fn last_is_not_a_script_token() {
        assert_eq!(Cumulation::from_token("last"), None);
        assert_eq!(Cumulation::from_token("average"), None);
    }
}
