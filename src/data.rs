//! Data preparation: min-max scaling and fixed-window sequence extraction.

use crate::error::{Error, Result};

/// Bounds of a series, used to map it onto [0, 1] and back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationParams {
    pub min: f64,
    pub max: f64,
}

impl NormalizationParams {
    /// Scan `series` once for its bounds.
    ///
    /// Fails on an empty series, on any NaN or infinite value, and on a constant
    /// series, where `max - min` would be zero.
    pub fn fit(series: &[f64]) -> Result<Self> {
        if series.is_empty() {
            return Err(Error::EmptySeries);
        }

        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for (index, &value) in series.iter().enumerate() {
            if !value.is_finite() {
                return Err(Error::NonFiniteValue { index, value });
            }
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
        }

        if max == min {
            return Err(Error::DegenerateRange { value: min });
        }

        Ok(Self { min, max })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Map a raw value into the normalized scale
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    /// Map a normalized value back to the raw scale
    pub fn denormalize(&self, value: f64) -> f64 {
        value * self.range() + self.min
    }
}

/// A series mapped onto [0, 1] together with the bounds that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub values: Vec<f64>,
    pub params: NormalizationParams,
}

/// Ordered window/label pairs cut from a series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequences {
    pub windows: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl Sequences {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over `(window, label)` pairs in series order
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], f64)> + '_ {
        self.windows
            .iter()
            .map(Vec::as_slice)
            .zip(self.labels.iter().copied())
    }
}

/// Min-max scale `series` onto [0, 1].
pub fn normalize(series: &[f64]) -> Result<NormalizedSeries> {
    let params = NormalizationParams::fit(series)?;
    let values = series.iter().map(|&x| params.normalize(x)).collect();
    Ok(NormalizedSeries { values, params })
}

/// Inverse of [`normalize`] for a single value: `x * (max - min) + min`
pub fn denormalize(value: f64, params: &NormalizationParams) -> f64 {
    params.denormalize(value)
}

/// Cut `series` into every window of `sequence_length` consecutive values,
/// each labelled with the value that follows it.
///
/// Returns an empty collection when the series is not longer than the window.
pub fn make_sequences(series: &[f64], sequence_length: usize) -> Sequences {
    if sequence_length == 0 || series.len() <= sequence_length {
        return Sequences::default();
    }

    let count = series.len() - sequence_length;
    let mut windows = Vec::with_capacity(count);
    let mut labels = Vec::with_capacity(count);

    for i in 0..count {
        windows.push(series[i..i + sequence_length].to_vec());
        labels.push(series[i + sequence_length]);
    }

    Sequences { windows, labels }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bounds() {
        let series: Vec<f64> = (1..=8).map(f64::from).collect();
        let normalized = normalize(&series).unwrap();

        assert_eq!(normalized.params, NormalizationParams { min: 1.0, max: 8.0 });
        assert!((normalized.values[0] - 0.0).abs() < 1e-12);
        assert!((normalized.values[7] - 1.0).abs() < 1e-12);
        assert!(normalized.values.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_normalize_round_trip() {
        let series = vec![187.44, 191.2, 179.05, 200.5, 183.33, 195.0];
        let normalized = normalize(&series).unwrap();

        for (&original, &scaled) in series.iter().zip(normalized.values.iter()) {
            let restored = denormalize(scaled, &normalized.params);
            assert!((restored - original).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_rejects_constant_series() {
        match normalize(&[3.0, 3.0, 3.0]) {
            Err(Error::DegenerateRange { value }) => assert_eq!(value, 3.0),
            other => panic!("expected DegenerateRange, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_rejects_non_finite_values() {
        match normalize(&[f64::NAN, f64::NAN]) {
            Err(Error::NonFiniteValue { index, value }) => {
                assert_eq!(index, 0);
                assert!(value.is_nan());
            }
            other => panic!("expected NonFiniteValue, got {:?}", other),
        }

        match normalize(&[f64::INFINITY, 1.0, 2.0]) {
            Err(Error::NonFiniteValue { index, value }) => {
                assert_eq!(index, 0);
                assert_eq!(value, f64::INFINITY);
            }
            other => panic!("expected NonFiniteValue, got {:?}", other),
        }

        assert!(matches!(
            normalize(&[1.0, 2.0, f64::NEG_INFINITY]),
            Err(Error::NonFiniteValue { index: 2, .. })
        ));
    }

    #[test]
    fn test_normalize_rejects_empty_series() {
        assert!(matches!(normalize(&[]), Err(Error::EmptySeries)));
    }

    #[test]
    fn test_make_sequences_windows_and_labels() {
        let series: Vec<f64> = (1..=8).map(f64::from).collect();
        let sequences = make_sequences(&series, 3);

        assert_eq!(sequences.len(), 5);
        assert_eq!(sequences.windows[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(sequences.windows[4], vec![5.0, 6.0, 7.0]);
        assert_eq!(sequences.labels, vec![4.0, 5.0, 6.0, 7.0, 8.0]);

        for (i, (window, label)) in sequences.iter().enumerate() {
            assert_eq!(window.len(), 3);
            assert_eq!(label, series[i + 3]);
        }
    }

    #[test]
    fn test_make_sequences_too_short() {
        let series = vec![1.0, 2.0, 3.0];

        assert!(make_sequences(&series, 3).is_empty());
        assert!(make_sequences(&series, 5).is_empty());
        assert!(make_sequences(&series, 0).is_empty());
        assert_eq!(make_sequences(&series, 2).len(), 1);
    }
}
