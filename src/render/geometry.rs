//! Column-width strategies and day-grid geometry.
//!
//! A strategy maps a period to one column width per day; every x
//! coordinate in the diagram derives from those widths. Periods are small
//! (tens of days), so widths are recomputed where needed instead of cached.

use enum_dispatch::enum_dispatch;

use crate::errors::Error;
use crate::extract::{activity_days, day_labels};
use crate::metrics::TextMeasure;
use crate::schedule::Period;

#[enum_dispatch]
pub trait WidthStrategy {
    /// Column width for every day of the period, in px.
    fn day_widths(&self, period: &Period, measure: &dyn TextMeasure) -> Result<Vec<f64>, Error>;
}

/// Every day gets the width of a two-character placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl WidthStrategy for Uniform {
    fn day_widths(&self, period: &Period, measure: &dyn TextMeasure) -> Result<Vec<f64>, Error> {
        Ok(vec![measure.width("XX"); period.len()])
    }
}

/// Labeled days get full width, unlabeled days collapse to a third.
/// A single-day period always stays at full width.
#[derive(Debug, Clone, Copy, Default)]
pub struct Condensed;

impl WidthStrategy for Condensed {
    fn day_widths(&self, period: &Period, measure: &dyn TextMeasure) -> Result<Vec<f64>, Error> {
        let full = measure.width("XX");
        let labels = day_labels(period)?;
        if labels.len() == 1 {
            return Ok(vec![full]);
        }
        Ok(labels
            .iter()
            .map(|label| if label.is_some() { full } else { full / 3.0 })
            .collect())
    }
}

/// Width driven by the derived activity-day flags instead of labels:
/// boundary and activity days get full width, the rest collapse.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoCompressed;

impl WidthStrategy for AutoCompressed {
    fn day_widths(&self, period: &Period, measure: &dyn TextMeasure) -> Result<Vec<f64>, Error> {
        let full = measure.width("XX");
        Ok(activity_days(period)?
            .iter()
            .map(|&active| if active { full } else { full / 3.0 })
            .collect())
    }
}

/// The configured column-width policy.
#[enum_dispatch(WidthStrategy)]
#[derive(Debug, Clone, Copy)]
pub enum WidthPolicy {
    Uniform,
    Condensed,
    AutoCompressed,
}

impl Default for WidthPolicy {
    fn default() -> Self {
        Uniform.into()
    }
}

/// X coordinate where each day's column starts.
pub fn day_starts(widths: &[f64], x_offset: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(widths.len());
    let mut x = x_offset;
    for width in widths {
        out.push(x);
        x += width;
    }
    out
}

/// X coordinate of each day's column center.
pub fn day_centers(widths: &[f64], x_offset: f64) -> Vec<f64> {
    day_starts(widths, x_offset)
        .iter()
        .zip(widths)
        .map(|(start, width)| start + width / 2.0)
        .collect()
}

/// X coordinate where each day's column ends.
pub fn day_ends(widths: &[f64], x_offset: f64) -> Vec<f64> {
    day_starts(widths, x_offset)
        .iter()
        .zip(widths)
        .map(|(start, width)| start + width)
        .collect()
}

/// Total width of a period's day grid.
pub fn period_width(widths: &[f64]) -> f64 {
    widths.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FontMetrics;

    fn period(json: serde_json::Value) -> Period {
        serde_json::from_value(json).expect("period fixture")
    }

    #[test]
    fn uniform_widths_sum_to_duration_times_placeholder() {
        let m = FontMetrics::new(11.0);
        let p = period(serde_json::json!({"caption": "P", "start": 1, "duration": 9}));
        let widths = Uniform.day_widths(&p, &m).unwrap();
        assert_eq!(widths.len(), 9);
        let sum = period_width(&widths);
        assert!((sum - 9.0 * m.width("XX")).abs() < 1e-9);
    }

    #[test]
    fn condensed_collapses_unlabeled_days() {
        let m = FontMetrics::new(11.0);
        let p = period(serde_json::json!({
            "caption": "P", "start": 1, "duration": 3, "daylabels": [1, 3],
        }));
        let widths = Condensed.day_widths(&p, &m).unwrap();
        let full = m.width("XX");
        assert_eq!(widths, vec![full, full / 3.0, full]);
    }

    #[test]
    fn condensed_single_day_period_keeps_full_width() {
        let m = FontMetrics::new(11.0);
        let p = period(serde_json::json!({"caption": "P", "start": 1, "duration": 1}));
        assert_eq!(Condensed.day_widths(&p, &m).unwrap(), vec![m.width("XX")]);
    }

    #[test]
    fn auto_compressed_follows_activity_days() {
        let m = FontMetrics::new(11.0);
        let p = period(serde_json::json!({
            "caption": "P", "start": 1, "duration": 5,
            "procedures": [{"caption": "ECG", "days": [3]}],
        }));
        let widths = AutoCompressed.day_widths(&p, &m).unwrap();
        let full = m.width("XX");
        assert_eq!(
            widths,
            vec![full, full / 3.0, full, full / 3.0, full]
        );
    }

    #[test]
    fn geometry_coordinates_are_cumulative() {
        let widths = vec![10.0, 20.0, 30.0];
        assert_eq!(day_starts(&widths, 5.0), vec![5.0, 15.0, 35.0]);
        assert_eq!(day_centers(&widths, 5.0), vec![10.0, 25.0, 50.0]);
        assert_eq!(day_ends(&widths, 5.0), vec![15.0, 35.0, 65.0]);
        assert_eq!(period_width(&widths), 60.0);
    }
}
