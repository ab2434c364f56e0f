//! Day-index resolution: trial-day numbering to dense column indices.
//!
//! Trial days are signed and skip day 0: a period may start at a negative
//! day (e.g. a pre-dose week ending at day -1) and continue into positive
//! days with no day 0 in between. Negative and positive day ranges are
//! therefore contiguous in index space but not in day-number space.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::Error;
use crate::schedule::{DaySpec, DayToken, Period};

fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)(?:-(\d+))?").expect("valid literal pattern"))
}

/// Expand a day specification into an explicit day list.
///
/// Numeric tokens pass through unchanged. String tokens are scanned for
/// day numbers and inclusive ranges (`"1-3, 5"` gives 1, 2, 3, 5);
/// malformed text is silently skipped. Output follows input order, then
/// range expansion order; duplicates are kept.
pub fn decode_daylist(spec: &DaySpec) -> Vec<i64> {
    let mut days = Vec::new();
    for token in spec.tokens() {
        match token {
            DayToken::Number(day) => days.push(*day),
            DayToken::Text(text) => {
                for caps in range_pattern().captures_iter(text) {
                    let Ok(first) = caps[1].parse::<i64>() else {
                        continue;
                    };
                    match caps.get(2).and_then(|m| m.as_str().parse::<i64>().ok()) {
                        Some(last) => days.extend(first..=last),
                        None => days.push(first),
                    }
                }
            }
        }
    }
    days
}

/// Map a trial day to its zero-based column index within the period.
///
/// The index is `day - start`, minus one more when the period starts on a
/// negative day and `day` is positive, because day 0 does not exist.
/// Fails when the result falls outside `[0, duration)`.
pub fn day_index(period: &Period, day: i64) -> Result<usize, Error> {
    let start = period.start_day();
    let mut index = day - start;
    if start < 0 && day > 0 {
        index -= 1;
    }
    if index < 0 || index >= period.duration {
        return Err(Error::DayRange {
            period: period.caption.clone(),
            day,
            start,
            end: start + period.duration,
        });
    }
    Ok(index as usize)
}

/// Start and end days of every contiguous run in a day list.
///
/// The list is sorted first; a day opens a new run when it is not exactly
/// one after its predecessor, treating -1 followed by 1 as consecutive.
/// Day 0 never appears in the output.
pub fn run_boundaries(days: &[i64]) -> Vec<i64> {
    let mut sorted = days.to_vec();
    let mut out: Vec<i64> = Vec::new();
    if sorted.is_empty() {
        return out;
    }
    sorted.sort_unstable();
    let first = sorted[0];
    let mut last_day = 0;
    for &day in &sorted {
        if day == first || (day != last_day + 1 && !(last_day == -1 && day == 1)) {
            out.push(last_day);
            out.push(day);
        }
        last_day = day;
    }
    out.push(last_day);

    let mut unique = Vec::with_capacity(out.len());
    for day in out {
        if day != 0 && !unique.contains(&day) {
            unique.push(day);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::DayToken;
    use rstest::rstest;

    fn spec(tokens: Vec<DayToken>) -> DaySpec {
        DaySpec::Many(tokens)
    }

    fn period(start: i64, duration: i64) -> Period {
        Period {
            caption: "P".into(),
            start: Some(start),
            duration,
            ..Period::default()
        }
    }

    #[test]
    fn decode_mixes_numbers_and_ranges() {
        let days = decode_daylist(&spec(vec![
            DayToken::Text("1-3".into()),
            DayToken::Text("5".into()),
        ]));
        assert_eq!(days, vec![1, 2, 3, 5]);
    }

    #[test]
    fn decode_passes_numbers_through() {
        let days = decode_daylist(&spec(vec![
            DayToken::Number(-1),
            DayToken::Number(1),
            DayToken::Number(2),
        ]));
        assert_eq!(days, vec![-1, 1, 2]);
    }

    #[test]
    fn decode_multi_segment_string() {
        let days = decode_daylist(&spec(vec![DayToken::Text("1-3, 6, 8-9".into())]));
        assert_eq!(days, vec![1, 2, 3, 6, 8, 9]);
    }

    #[test]
    fn decode_skips_malformed_tokens_and_keeps_duplicates() {
        let days = decode_daylist(&spec(vec![
            DayToken::Text("abc".into()),
            DayToken::Number(4),
            DayToken::Number(4),
        ]));
        assert_eq!(days, vec![4, 4]);
    }

    #[test]
    fn decode_scalar_spec() {
        let days = decode_daylist(&DaySpec::One(DayToken::Number(3)));
        assert_eq!(days, vec![3]);
    }

    // The four sign combinations of period start and day, including the
    // skip over the absent day 0.
    #[rstest]
    #[case(-2, 5, -2, 0)]
    #[case(-2, 5, -1, 1)]
    #[case(-2, 5, 1, 2)]
    #[case(-2, 5, 2, 3)]
    #[case(-2, 5, 3, 4)]
    #[case(1, 7, 1, 0)]
    #[case(1, 7, 7, 6)]
    #[case(-7, 7, -7, 0)]
    #[case(-7, 7, -1, 6)]
    fn day_index_resolves(
        #[case] start: i64,
        #[case] duration: i64,
        #[case] day: i64,
        #[case] expected: usize,
    ) {
        assert_eq!(day_index(&period(start, duration), day).unwrap(), expected);
    }

    #[rstest]
    #[case(1, 7, 8)]
    #[case(1, 7, 0)]
    #[case(1, 7, -1)]
    #[case(-7, 7, 1)]
    #[case(-2, 5, 4)]
    fn day_index_out_of_range(#[case] start: i64, #[case] duration: i64, #[case] day: i64) {
        assert!(matches!(
            day_index(&period(start, duration), day),
            Err(Error::DayRange { .. })
        ));
    }

    #[test]
    fn run_boundaries_mark_train_edges() {
        assert_eq!(run_boundaries(&[1, 2, 3, 5]), vec![1, 3, 5]);
    }

    #[test]
    fn run_boundaries_bridge_the_missing_day_zero() {
        // -2..-1 and 1..2 form one continuous train
        assert_eq!(run_boundaries(&[-2, -1, 1, 2]), vec![-2, 2]);
    }

    #[test]
    fn run_boundaries_empty_input() {
        assert!(run_boundaries(&[]).is_empty());
    }
}
