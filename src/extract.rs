//! Per-day extraction of activity data.
//!
//! All extractors share one traversal: visit every activity in a period
//! whose caption matches, and fold it into a per-day accumulator sized to
//! the period's duration. The caption is the row key, so an extractor sees
//! the union of every matching interval, administration and procedure.

use crate::days::{day_index, decode_daylist, run_boundaries};
use crate::errors::Error;
use crate::schedule::{Activity, ActivityKind, Period};
use crate::times::{TimedEntry, normalize};

/// Visit every activity in `period` whose caption matches, folding into
/// `acc`. Scans intervals, then administrations, then procedures.
pub fn fold_matching<T>(
    period: &Period,
    caption: &str,
    mut acc: T,
    mut visit: impl FnMut(&Activity, &mut T) -> Result<(), Error>,
) -> Result<T, Error> {
    for kind in ActivityKind::ALL {
        for activity in period.activities_of(kind) {
            if activity.caption == caption {
                visit(activity, &mut acc)?;
            }
        }
    }
    Ok(acc)
}

/// Timed entries for one activity caption: one `(day, times, relative)`
/// entry per anchored day, before any normalization.
pub fn timed_entries(period: &Period, caption: &str) -> Result<Vec<TimedEntry>, Error> {
    fold_matching(period, caption, Vec::new(), |activity, acc| {
        if let Some(spec) = &activity.days {
            let times = activity.sampling_times();
            let relative = activity.relative_day();
            for day in decode_daylist(spec) {
                acc.push(TimedEntry::new(day, times.clone(), relative));
            }
        }
        Ok(())
    })
}

/// Per-day label text for one activity caption. Day-anchored activities
/// zip their labels with their day list; span intervals put their first
/// label on the span's start day.
pub fn labels(period: &Period, caption: &str) -> Result<Vec<String>, Error> {
    fold_matching(
        period,
        caption,
        vec![String::new(); period.len()],
        |activity, out| {
            if activity.labels.is_empty() {
                return Ok(());
            }
            if let Some(spec) = &activity.days {
                for (day, label) in decode_daylist(spec).iter().zip(&activity.labels) {
                    out[day_index(period, *day)?] = label.clone();
                }
            } else if let (Some(start), Some(_)) = (activity.start, activity.duration) {
                out[day_index(period, start)?] = activity.labels[0].clone();
            }
            Ok(())
        },
    )
}

/// Footnote flags for one activity caption within one period.
#[derive(Debug, Clone, Default)]
pub struct DayFootnotes {
    /// Whether any footnote applies on the day.
    pub flagged: Vec<bool>,
    /// Comma-joined footnote symbols per day.
    pub symbols: Vec<String>,
    /// `(symbol, text)` pairs in discovery order, duplicates included.
    pub entries: Vec<(String, String)>,
}

pub fn footnotes(period: &Period, caption: &str) -> Result<DayFootnotes, Error> {
    let acc = DayFootnotes {
        flagged: vec![false; period.len()],
        symbols: vec![String::new(); period.len()],
        entries: Vec::new(),
    };
    fold_matching(period, caption, acc, |activity, out| {
        for footnote in &activity.footnotes {
            let Some(spec) = &footnote.days else {
                return Err(Error::Schema {
                    kind: "footnote",
                    caption: footnote.text.clone(),
                    field: "days",
                });
            };
            let symbol = footnote.symbol.to_string();
            for day in decode_daylist(spec) {
                let index = day_index(period, day)?;
                out.flagged[index] = true;
                if !out.symbols[index].is_empty() {
                    out.symbols[index].push(',');
                }
                out.symbols[index].push_str(&symbol);
                out.entries.push((symbol.clone(), footnote.text.clone()));
            }
        }
        Ok(())
    })
}

/// Global footnote legend: `(symbol, text)` pairs across the whole
/// schedule, de-duplicated by symbol, empty texts dropped, symbol-sorted.
pub fn footnote_registry(periods: &[Period]) -> Result<Vec<(String, String)>, Error> {
    let mut captions = Vec::new();
    for kind in ActivityKind::ALL {
        captions.extend(crate::schedule::item_names(periods, kind));
    }
    let mut registry: Vec<(String, String)> = Vec::new();
    for caption in &captions {
        for period in periods {
            for (symbol, text) in footnotes(period, caption)?.entries {
                if !text.is_empty() && !registry.iter().any(|(s, _)| s == &symbol) {
                    registry.push((symbol, text));
                }
            }
        }
    }
    registry.sort();
    Ok(registry)
}

/// Per-day value of one optional activity field. A later matching activity
/// overwrites earlier values on its days, even with an absent field.
pub fn field_by_day<T: Clone>(
    period: &Period,
    caption: &str,
    get: impl Fn(&Activity) -> Option<T>,
) -> Result<Vec<Option<T>>, Error> {
    fold_matching(period, caption, vec![None; period.len()], |activity, out| {
        if let Some(spec) = &activity.days {
            let value = get(activity);
            for day in decode_daylist(spec) {
                out[day_index(period, day)?] = value.clone();
            }
        }
        Ok(())
    })
}

/// True when any matching activity asks for a visible time scale.
pub fn has_timescale(period: &Period, caption: &str) -> bool {
    fold_matching(period, caption, false, |activity, acc| {
        if activity.shows_timescale() {
            *acc = true;
        }
        Ok(())
    })
    .unwrap_or(false)
}

/// Per-day grid labels: the day number on labeled days, `None` elsewhere.
pub fn day_labels(period: &Period) -> Result<Vec<Option<i64>>, Error> {
    let mut out = vec![None; period.len()];
    if let Some(spec) = &period.daylabels {
        for day in decode_daylist(spec) {
            out[day_index(period, day)?] = Some(day);
        }
    }
    Ok(out)
}

/// Per-day shading flags from the period's `dayshading` list.
pub fn day_shadings(period: &Period) -> Result<Vec<bool>, Error> {
    let mut out = vec![false; period.len()];
    if let Some(spec) = &period.dayshading {
        for day in decode_daylist(spec) {
            out[day_index(period, day)?] = true;
        }
    }
    Ok(out)
}

/// Marker glyphs drawn on activity days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Diamond,
    Arrow,
    Block,
}

/// Per-day marker for one activity caption: the default marker, upgraded
/// to a block on days with more than one event time.
pub fn markers(
    period: &Period,
    caption: &str,
    default: Marker,
) -> Result<Vec<Option<Marker>>, Error> {
    let mut out = vec![None; period.len()];
    for entry in normalize(&timed_entries(period, caption)?) {
        let marker = if entry.times.len() > 1 {
            Marker::Block
        } else {
            default
        };
        out[day_index(period, entry.day)?] = Some(marker);
    }
    Ok(out)
}

/// Per-day "worth a full-width column" flags for the auto-compressed grid.
///
/// A day qualifies when it is a period boundary, the start or end of a
/// contiguous run of activity days, or touched by a normalized multi-day
/// sampling time.
pub fn activity_days(period: &Period) -> Result<Vec<bool>, Error> {
    let start = period.start_day();
    let mut duration = period.duration;
    if start < 0 && start + duration > 0 {
        duration += 1;
    }

    let mut days = vec![start, start + duration - 1];
    for kind in [ActivityKind::Administration, ActivityKind::Procedure] {
        for activity in period.activities_of(kind) {
            if let Some(spec) = &activity.days {
                days.extend(run_boundaries(&decode_daylist(spec)));
            }
        }
    }
    // days reached by sampling beyond 24 h stay visible
    for activity in period.activities_of(ActivityKind::Procedure) {
        if activity.times.is_some() {
            for entry in normalize(&timed_entries(period, &activity.caption)?) {
                days.push(entry.day);
            }
        }
    }
    for interval in period.activities_of(ActivityKind::Interval) {
        if let (Some(interval_start), Some(interval_duration)) = (interval.start, interval.duration)
        {
            let mut interval_duration = interval_duration;
            if interval_start < 0 && interval_start + interval_duration > 0 {
                interval_duration += 1;
            }
            let span: Vec<i64> = (interval_start..interval_start + interval_duration)
                .filter(|&day| day != 0)
                .collect();
            days.extend(run_boundaries(&span));
        }
    }

    days.sort_unstable();
    days.dedup();
    let mut flags = vec![false; period.len()];
    for day in days {
        flags[day_index(period, day)?] = true;
    }
    Ok(flags)
}
