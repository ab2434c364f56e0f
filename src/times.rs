//! Event-time normalization across day boundaries.
//!
//! Sampling times are hour offsets within an anchor day and may exceed 24
//! hours (e.g. a 48 h post-dose sample). Normalization splits such entries
//! into consecutive-day buckets with local 0-24 h times; unnormalization
//! collates them back onto the reference day as hours elapsed since that
//! day's start, which is what the time-scale axis plots.

/// One dosing or sampling entry: an anchor day, its hour offsets, and the
/// reference day used to flatten multi-day times.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEntry {
    pub day: i64,
    pub times: Vec<f64>,
    pub relative: i64,
}

impl TimedEntry {
    pub fn new(day: i64, times: Vec<f64>, relative: i64) -> Self {
        Self {
            day,
            times,
            relative,
        }
    }
}

/// Split entries whose times exceed 24 h into one entry per calendar day
/// touched, each with local (0-24 h) times.
pub fn normalize(entries: &[TimedEntry]) -> Vec<TimedEntry> {
    let mut out = Vec::new();
    for entry in entries {
        let mut remaining = entry.times.clone();
        let mut day_shift = 0;
        while !remaining.is_empty() {
            let local: Vec<f64> = remaining.iter().copied().filter(|&t| t < 24.0).collect();
            if !local.is_empty() {
                out.push(TimedEntry::new(
                    entry.day + day_shift,
                    local,
                    entry.relative,
                ));
            }
            remaining = remaining
                .iter()
                .copied()
                .filter(|&t| t >= 24.0)
                .map(|t| t - 24.0)
                .collect();
            day_shift += 1;
        }
    }
    out
}

/// Collate normalized entries back into one entry per reference day, with
/// times expressed as hours elapsed since that day's start.
///
/// Groups iterate in ascending reference-day order so output is stable.
pub fn unnormalize(entries: &[TimedEntry]) -> Vec<TimedEntry> {
    let mut out = Vec::new();
    let mut relatives: Vec<i64> = entries.iter().map(|e| e.relative).collect();
    relatives.sort_unstable();
    relatives.dedup();
    for relative in relatives {
        let mut times = Vec::new();
        for entry in entries {
            if entry.relative == relative {
                for &t in &entry.times {
                    times.push(t + (entry.day - relative) as f64 * 24.0);
                }
            }
        }
        out.push(TimedEntry::new(relative, times, relative));
    }
    out
}

/// Flatten entries into hours elapsed since each one's reference day.
pub fn elapsed_hours(entries: &[TimedEntry]) -> Vec<f64> {
    entries
        .iter()
        .flat_map(|entry| {
            let offset = (entry.day - entry.relative) as f64 * 24.0;
            entry.times.iter().map(move |&t| offset + t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_splits_times_beyond_24h() {
        let out = normalize(&[TimedEntry::new(1, vec![22.0, 26.0], 1)]);
        assert_eq!(
            out,
            vec![
                TimedEntry::new(1, vec![22.0], 1),
                TimedEntry::new(2, vec![2.0], 1),
            ]
        );
    }

    #[test]
    fn normalize_rolls_exactly_24h_to_next_day() {
        let out = normalize(&[TimedEntry::new(3, vec![24.0], 2)]);
        assert_eq!(out, vec![TimedEntry::new(4, vec![0.0], 2)]);
    }

    #[test]
    fn normalize_keeps_sub_24h_entries_intact() {
        let entries = vec![TimedEntry::new(1, vec![0.0, 4.0, 12.0], 1)];
        assert_eq!(normalize(&entries), entries);
    }

    #[test]
    fn unnormalize_collates_by_reference_day() {
        let out = unnormalize(&[
            TimedEntry::new(1, vec![22.0], 1),
            TimedEntry::new(2, vec![2.0], 1),
        ]);
        assert_eq!(out, vec![TimedEntry::new(1, vec![22.0, 26.0], 1)]);
    }

    #[test]
    fn round_trip_preserves_flat_time_sets() {
        let entries = vec![
            TimedEntry::new(1, vec![0.0, 2.0, 8.0, 25.0, 47.5], 1),
            TimedEntry::new(8, vec![0.0, 36.0], 8),
        ];
        let mut round_tripped = unnormalize(&normalize(&entries));
        for entry in &mut round_tripped {
            entry.times.sort_by(f64::total_cmp);
        }
        let mut expected = entries.clone();
        for entry in &mut expected {
            entry.times.sort_by(f64::total_cmp);
        }
        assert_eq!(round_tripped, expected);
    }

    #[test]
    fn elapsed_hours_offsets_by_reference_day() {
        let hours = elapsed_hours(&[
            TimedEntry::new(1, vec![22.0], 1),
            TimedEntry::new(2, vec![2.0], 1),
        ]);
        assert_eq!(hours, vec![22.0, 26.0]);
    }
}
