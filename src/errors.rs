//! Error types for schedule validation and layout.
//!
//! Every failure is deterministic for a given input and carries enough
//! context (period caption, activity caption) to locate the offending
//! schedule entry. There is no retry or partial-output path: the first
//! error aborts the whole render.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while validating a schedule or laying out its diagram.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// A required field is absent from a period, activity or footnote.
    #[error("missing required field `{field}` in {kind} `{caption}`")]
    #[diagnostic(code(soachart::schema::missing_field))]
    Schema {
        kind: &'static str,
        caption: String,
        field: &'static str,
    },

    /// A period declared with fewer than one day.
    #[error("duration must be at least 1 day in period `{caption}`")]
    #[diagnostic(code(soachart::schema::bad_duration))]
    BadDuration { caption: String },

    /// A trial day resolved outside its period's day span.
    #[error("day {day} out of range ({start} to {end}) in period `{period}`")]
    #[diagnostic(
        code(soachart::layout::day_range),
        help("days must fall between the period's start day and its last day; day 0 does not exist")
    )]
    DayRange {
        period: String,
        day: i64,
        start: i64,
        end: i64,
    },

    /// An interval with neither `start` + `duration` nor a day list.
    #[error("interval `{caption}` in period `{period}` has neither start and duration nor days")]
    #[diagnostic(code(soachart::schema::ambiguous_interval))]
    AmbiguousInterval { period: String, caption: String },

    /// A schedule with no periods and no cycles.
    #[error("no period or cycle found in trial design")]
    #[diagnostic(code(soachart::schema::empty))]
    EmptySchedule,

    /// A row-level failure, tagged with the activity it was rendering.
    #[error("error rendering row `{caption}`")]
    #[diagnostic(code(soachart::layout::row))]
    Row {
        caption: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap a row-rendering failure with the activity caption it belongs to.
    pub(crate) fn in_row(caption: &str, source: Error) -> Error {
        Error::Row {
            caption: caption.to_string(),
            source: Box::new(source),
        }
    }
}
