//! Schedule-of-assessments diagrams for clinical trial designs.
//!
//! `soachart` turns a declarative description of a clinical-trial visit
//! schedule - periods and cycles containing procedures, drug
//! administrations and intervals - into an SVG timeline: a grid of days
//! grouped into periods, one row per tracked activity, annotated with
//! markers, brackets, labels, footnotes and optional time-of-day scales.
//!
//! Trial days are signed and skip day 0, so a pre-dose period can end at
//! day -1 with treatment starting at day 1; all column indexing accounts
//! for the gap. Rendering is pure and deterministic: the same schedule
//! yields byte-identical output on every call.
//!
//! ```
//! use soachart::{RenderOptions, Schedule, render};
//!
//! let schedule: Schedule = serde_json::from_str(
//!     r#"{
//!         "periods": [{
//!             "caption": "Treatment",
//!             "start": 1,
//!             "duration": 7,
//!             "daylabels": ["1, 7"],
//!             "procedures": [{"caption": "ECG", "days": [1, 7]}]
//!         }]
//!     }"#,
//! )?;
//! let svg = render(&schedule, &RenderOptions::default())?;
//! assert!(svg.starts_with("<svg"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod days;
pub mod errors;
pub mod extract;
pub mod log;
pub mod metrics;
pub mod render;
pub mod schedule;
pub mod times;

pub use errors::Error;
pub use metrics::{FontMetrics, TextMeasure, TextSize};
pub use render::{RenderOptions, render, render_with};
pub use schedule::{Activity, ActivityKind, Period, Schedule};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_smoke_test() {
        let schedule: Schedule = serde_json::from_value(serde_json::json!({
            "periods": [{
                "caption": "Screening",
                "start": -7,
                "duration": 7,
                "procedures": [{"caption": "Vitals", "days": [-7, -1]}],
            }],
            "cycles": [{
                "caption": "Cycle 1",
                "duration": 21,
                "administrations": [{"caption": "Drug A", "days": ["1-5"]}],
            }],
        }))
        .unwrap();
        let svg = render(&schedule, &RenderOptions::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Screening"));
        assert!(svg.contains("Cycle 1"));
        assert!(svg.contains("Drug A"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn schema_errors_surface_from_render() {
        let schedule: Schedule = serde_json::from_value(serde_json::json!({
            "periods": [{"caption": "P1", "duration": 7}],
        }))
        .unwrap();
        let err = render(&schedule, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Schema { field: "start", .. }));
    }
}
