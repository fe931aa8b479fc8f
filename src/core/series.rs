//! Price series data structures.

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Label reported for a series uploaded without a grade or type.
pub const DEFAULT_LABEL: &str = "default";

/// A single dated price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar date of the observation.
    pub date: NaiveDate,
    /// Observed price (finite, non-negative).
    pub price: f64,
}

impl Observation {
    /// Create an observation, rejecting negative or non-finite prices.
    pub fn new(date: NaiveDate, price: f64) -> Result<Self> {
        if !price.is_finite() || price < 0.0 {
            return Err(ForecastError::InvalidObservation {
                index: 0,
                reason: format!("price must be finite and non-negative, got {price}"),
            });
        }
        Ok(Self { date, price })
    }
}

/// An ordered sequence of observations with a day-offset x-axis.
///
/// The x value of each observation is the number of days since the first
/// observation's date. Dates must be non-decreasing; duplicate dates are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    label: Option<String>,
    observations: Vec<Observation>,
    offsets: Vec<i64>,
}

impl Series {
    /// Build a series from observations already sorted by date.
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        for (i, obs) in observations.iter().enumerate() {
            if !obs.price.is_finite() || obs.price < 0.0 {
                return Err(ForecastError::InvalidObservation {
                    index: i,
                    reason: format!("price must be finite and non-negative, got {}", obs.price),
                });
            }
            if i > 0 && obs.date < observations[i - 1].date {
                return Err(ForecastError::InvalidObservation {
                    index: i,
                    reason: format!(
                        "date {} precedes previous date {}",
                        obs.date,
                        observations[i - 1].date
                    ),
                });
            }
        }

        Ok(Self::from_sorted(None, observations))
    }

    /// Build a series from `(date, price)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let observations = pairs
            .into_iter()
            .map(|(date, price)| Observation { date, price })
            .collect();
        Self::new(observations)
    }

    /// Build a daily series of `prices` starting at `start`.
    pub fn daily(start: NaiveDate, prices: &[f64]) -> Result<Self> {
        Self::from_pairs(
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| (start + Duration::days(i as i64), p)),
        )
    }

    fn from_sorted(label: Option<String>, observations: Vec<Observation>) -> Self {
        let origin = observations.first().map(|o| o.date);
        let offsets = observations
            .iter()
            .map(|o| origin.map_or(0, |d| (o.date - d).num_days()))
            .collect();
        Self {
            label,
            observations,
            offsets,
        }
    }

    /// Attach a descriptive label (e.g. commodity grade).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The label, or [`DEFAULT_LABEL`] when none is set.
    pub fn label_or_default(&self) -> &str {
        self.label().unwrap_or(DEFAULT_LABEL)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Price values in order.
    pub fn prices(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.price).collect()
    }

    /// Day offsets from the first observation.
    pub fn x(&self) -> &[i64] {
        &self.offsets
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    pub fn last_price(&self) -> Option<f64> {
        self.observations.last().map(|o| o.price)
    }

    /// Number of days between the first and last observation.
    pub fn span_days(&self) -> i64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Keep only observations matching `keep`; the x-axis is rebased on the new first date.
    pub fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Observation) -> bool,
    {
        let observations = self
            .observations
            .iter()
            .filter(|o| keep(o))
            .copied()
            .collect();
        Self::from_sorted(self.label.clone(), observations)
    }

    /// Insert linearly interpolated prices for calendar days missing between observations.
    ///
    /// Duplicate dates are left untouched.
    pub fn fill_missing_days(&self) -> Self {
        if self.observations.len() < 2 {
            return self.clone();
        }

        let mut out = Vec::with_capacity(self.span_days().max(0) as usize + 1);
        out.push(self.observations[0]);

        for pair in self.observations.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let gap = (b.date - a.date).num_days();
            for d in 1..gap {
                let frac = d as f64 / gap as f64;
                out.push(Observation {
                    date: a.date + Duration::days(d),
                    price: a.price + frac * (b.price - a.price),
                });
            }
            out.push(b);
        }

        Self::from_sorted(self.label.clone(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn offsets_are_days_from_first_observation() {
        let series = Series::from_pairs(vec![
            (date(2024, 1, 1), 10.0),
            (date(2024, 1, 3), 11.0),
            (date(2024, 1, 3), 11.5),
            (date(2024, 1, 10), 12.0),
        ])
        .unwrap();

        assert_eq!(series.x(), &[0, 2, 2, 9]);
        assert_eq!(series.span_days(), 9);
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn unlabelled_series_uses_default_label() {
        let series = Series::daily(date(2024, 1, 1), &[1.0, 2.0]).unwrap();
        assert_eq!(series.label_or_default(), DEFAULT_LABEL);
        assert_eq!(series.with_label("grade B").label_or_default(), "grade B");
    }

    #[test]
    fn rejects_negative_price() {
        let result = Series::from_pairs(vec![(date(2024, 1, 1), 10.0), (date(2024, 1, 2), -1.0)]);
        assert!(matches!(
            result,
            Err(ForecastError::InvalidObservation { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_unsorted_dates() {
        let result = Series::from_pairs(vec![(date(2024, 1, 5), 10.0), (date(2024, 1, 2), 11.0)]);
        assert!(matches!(
            result,
            Err(ForecastError::InvalidObservation { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(Series::new(vec![]), Err(ForecastError::EmptyData)));
    }

    #[test]
    fn observation_validates_price() {
        assert!(Observation::new(date(2024, 1, 1), f64::NAN).is_err());
        assert!(Observation::new(date(2024, 1, 1), 0.0).is_ok());
    }

    #[test]
    fn filtered_rebases_offsets() {
        let series = Series::daily(date(2024, 1, 1), &[1.0, 100.0, 3.0, 4.0]).unwrap();
        let kept = series.filtered(|o| o.price < 50.0);
        assert_eq!(kept.prices(), vec![1.0, 3.0, 4.0]);
        assert_eq!(kept.x(), &[0, 2, 3]);

        let tail = series.filtered(|o| o.date > date(2024, 1, 2));
        assert_eq!(tail.x(), &[0, 1]);
    }

    #[test]
    fn fill_missing_days_interpolates_linearly() {
        let series = Series::from_pairs(vec![(date(2024, 1, 1), 10.0), (date(2024, 1, 5), 14.0)])
            .unwrap()
            .with_label("grade A");
        let filled = series.fill_missing_days();

        assert_eq!(filled.len(), 5);
        assert_eq!(filled.label(), Some("grade A"));
        for (i, obs) in filled.observations().iter().enumerate() {
            assert_relative_eq!(obs.price, 10.0 + i as f64, epsilon = 1e-10);
        }
    }
}
