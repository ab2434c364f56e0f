//! Schedule data model and fail-fast validation.
//!
//! A schedule is parsed once from its JSON description, validated up front,
//! and then treated as immutable for the rest of the render. Periods and
//! cycles are flattened into a single left-to-right timeline; a cycle is a
//! period whose missing start day defaults to 1.

use std::fmt;

use serde::Deserialize;

use crate::errors::Error;

/// A complete trial design: an ordered list of periods and/or cycles.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub cycles: Vec<Period>,
}

impl Schedule {
    /// Validate the schedule and flatten periods and cycles into render
    /// order (periods first, then cycles, each in input order).
    ///
    /// This is the single fail-fast gate: every schema error is raised here,
    /// before any geometry is computed.
    pub fn resolve(&self) -> Result<Vec<Period>, Error> {
        let mut out = Vec::with_capacity(self.periods.len() + self.cycles.len());
        for period in &self.periods {
            period.validate(false)?;
            out.push(period.clone());
        }
        for cycle in &self.cycles {
            cycle.validate(true)?;
            let mut cycle = cycle.clone();
            if cycle.start.is_none() {
                cycle.start = Some(1);
            }
            out.push(cycle);
        }
        if out.is_empty() {
            return Err(Error::EmptySchedule);
        }
        Ok(out)
    }
}

/// A contiguous span of trial days with its attached activities.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Period {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub daylabels: Option<DaySpec>,
    #[serde(default)]
    pub dayshading: Option<DaySpec>,
    #[serde(default)]
    pub decoration: Option<String>,
    #[serde(default)]
    pub intervals: Vec<Activity>,
    #[serde(default)]
    pub administrations: Vec<Activity>,
    #[serde(default)]
    pub procedures: Vec<Activity>,
}

impl Period {
    /// First trial day of the period. Only meaningful after [`Schedule::resolve`].
    pub fn start_day(&self) -> i64 {
        self.start.unwrap_or(1)
    }

    /// Period length in days, as a usize for indexing.
    pub fn len(&self) -> usize {
        self.duration.max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.duration <= 0
    }

    /// Activities of one kind, in input order.
    pub fn activities_of(&self, kind: ActivityKind) -> &[Activity] {
        match kind {
            ActivityKind::Interval => &self.intervals,
            ActivityKind::Administration => &self.administrations,
            ActivityKind::Procedure => &self.procedures,
        }
    }

    fn validate(&self, is_cycle: bool) -> Result<(), Error> {
        let kind = if is_cycle { "cycle" } else { "period" };
        if self.caption.is_empty() {
            return Err(Error::Schema {
                kind,
                caption: self.caption.clone(),
                field: "caption",
            });
        }
        if self.duration < 1 {
            return Err(Error::BadDuration {
                caption: self.caption.clone(),
            });
        }
        if !is_cycle && self.start.is_none() {
            return Err(Error::Schema {
                kind,
                caption: self.caption.clone(),
                field: "start",
            });
        }
        for interval in &self.intervals {
            if interval.caption.is_empty() {
                return Err(Error::Schema {
                    kind: "interval",
                    caption: interval.caption.clone(),
                    field: "caption",
                });
            }
            let has_span = interval.start.is_some() && interval.duration.is_some();
            if !has_span && interval.days.is_none() {
                return Err(Error::AmbiguousInterval {
                    period: self.caption.clone(),
                    caption: interval.caption.clone(),
                });
            }
            interval.validate_footnotes()?;
        }
        for kind in [ActivityKind::Administration, ActivityKind::Procedure] {
            for activity in self.activities_of(kind) {
                if activity.caption.is_empty() {
                    return Err(Error::Schema {
                        kind: kind.name(),
                        caption: activity.caption.clone(),
                        field: "caption",
                    });
                }
                if activity.days.is_none() {
                    return Err(Error::Schema {
                        kind: kind.name(),
                        caption: activity.caption.clone(),
                        field: "days",
                    });
                }
                activity.validate_footnotes()?;
            }
        }
        Ok(())
    }
}

/// The three activity classes a period can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Interval,
    Administration,
    Procedure,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 3] = [
        ActivityKind::Interval,
        ActivityKind::Administration,
        ActivityKind::Procedure,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActivityKind::Interval => "interval",
            ActivityKind::Administration => "administration",
            ActivityKind::Procedure => "procedure",
        }
    }
}

/// A named, day-anchored event: procedure, administration or interval.
///
/// One struct backs all three kinds; extraction walks them through a single
/// uniform fold, and which list an activity sits in decides how it renders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub days: Option<DaySpec>,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub times: Option<Vec<f64>>,
    #[serde(default)]
    pub freq: Option<String>,
    #[serde(default)]
    pub relative: Option<i64>,
    #[serde(default)]
    pub decoration: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub dose: Option<f64>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub footnotes: Vec<Footnote>,
    #[serde(default)]
    pub timescale: Option<String>,
}

impl Activity {
    /// Hour offsets within the anchor day. Defaults to a single event at
    /// hour 0, or two for rich sampling.
    pub fn sampling_times(&self) -> Vec<f64> {
        if let Some(times) = &self.times {
            times.clone()
        } else if self.freq.as_deref() == Some("rich") {
            vec![0.0, 0.0]
        } else {
            vec![0.0]
        }
    }

    /// Reference day for flattening multi-day event times.
    pub fn relative_day(&self) -> i64 {
        self.relative.unwrap_or(1)
    }

    pub fn shows_timescale(&self) -> bool {
        self.timescale.as_deref() == Some("show")
    }

    pub fn is_bracketed(&self) -> bool {
        self.decoration.as_deref() == Some("bracketed")
    }

    fn validate_footnotes(&self) -> Result<(), Error> {
        for footnote in &self.footnotes {
            if footnote.days.is_none() {
                return Err(Error::Schema {
                    kind: "footnote",
                    caption: footnote.text.clone(),
                    field: "days",
                });
            }
        }
        Ok(())
    }
}

/// A footnote attached to specific days of an activity.
#[derive(Debug, Clone, Deserialize)]
pub struct Footnote {
    pub symbol: FootnoteSymbol,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub days: Option<DaySpec>,
}

/// Footnote markers may be written as strings or bare numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FootnoteSymbol {
    Text(String),
    Number(i64),
}

impl fmt::Display for FootnoteSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FootnoteSymbol::Text(s) => write!(f, "{s}"),
            FootnoteSymbol::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A flexible day specification: one token or a list of tokens, where each
/// token is a plain day number or a range string like `"1-3, 5"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DaySpec {
    One(DayToken),
    Many(Vec<DayToken>),
}

impl DaySpec {
    pub fn tokens(&self) -> &[DayToken] {
        match self {
            DaySpec::One(token) => std::slice::from_ref(token),
            DaySpec::Many(tokens) => tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DayToken {
    Number(i64),
    Text(String),
}

/// Distinct activity captions of one kind across a list of periods,
/// first-occurrence order. The caption is the row-grouping key: all
/// activities sharing one render onto the same logical row.
pub fn item_names(periods: &[Period], kind: ActivityKind) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for period in periods {
        for activity in period.activities_of(kind) {
            if !out.iter().any(|name| name == &activity.caption) {
                out.push(activity.caption.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(json: serde_json::Value) -> Schedule {
        serde_json::from_value(json).expect("schedule fixture")
    }

    #[test]
    fn resolve_flattens_periods_and_cycles() {
        let s = schedule(serde_json::json!({
            "periods": [{"caption": "Screening", "start": -14, "duration": 14}],
            "cycles": [{"caption": "Cycle 1", "duration": 21}],
        }));
        let periods = s.resolve().unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].start_day(), -14);
        // cycle start defaults to day 1
        assert_eq!(periods[1].start_day(), 1);
    }

    #[test]
    fn empty_schedule_is_rejected() {
        let s = schedule(serde_json::json!({}));
        assert!(matches!(s.resolve(), Err(Error::EmptySchedule)));
    }

    #[test]
    fn period_without_start_is_rejected() {
        let s = schedule(serde_json::json!({
            "periods": [{"caption": "P1", "duration": 7}],
        }));
        assert!(matches!(
            s.resolve(),
            Err(Error::Schema { field: "start", .. })
        ));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let s = schedule(serde_json::json!({
            "periods": [{"caption": "P1", "start": 1, "duration": 0}],
        }));
        assert!(matches!(s.resolve(), Err(Error::BadDuration { .. })));
    }

    #[test]
    fn interval_without_span_or_days_is_ambiguous() {
        let s = schedule(serde_json::json!({
            "periods": [{
                "caption": "P1", "start": 1, "duration": 7,
                "intervals": [{"caption": "Hospitalization"}],
            }],
        }));
        assert!(matches!(s.resolve(), Err(Error::AmbiguousInterval { .. })));
    }

    #[test]
    fn procedure_without_days_is_rejected() {
        let s = schedule(serde_json::json!({
            "periods": [{
                "caption": "P1", "start": 1, "duration": 7,
                "procedures": [{"caption": "ECG"}],
            }],
        }));
        assert!(matches!(
            s.resolve(),
            Err(Error::Schema { field: "days", .. })
        ));
    }

    #[test]
    fn item_names_deduplicate_across_periods() {
        let s = schedule(serde_json::json!({
            "periods": [
                {"caption": "P1", "start": 1, "duration": 7,
                 "procedures": [{"caption": "ECG", "days": [1]}, {"caption": "PK", "days": [2]}]},
                {"caption": "P2", "start": 1, "duration": 7,
                 "procedures": [{"caption": "ECG", "days": [3]}]},
            ],
        }));
        let periods = s.resolve().unwrap();
        assert_eq!(
            item_names(&periods, ActivityKind::Procedure),
            vec!["ECG".to_string(), "PK".to_string()]
        );
    }

    #[test]
    fn rich_sampling_defaults_to_two_times() {
        let a = Activity {
            freq: Some("rich".into()),
            ..Activity::default()
        };
        assert_eq!(a.sampling_times(), vec![0.0, 0.0]);
        assert_eq!(Activity::default().sampling_times(), vec![0.0]);
    }
}
