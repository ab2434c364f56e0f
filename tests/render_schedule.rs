//! End-to-end rendering tests over complete schedules.

use soachart::{Error, RenderOptions, Schedule, render};

fn schedule(json: serde_json::Value) -> Schedule {
    serde_json::from_value(json).expect("schedule fixture")
}

/// A two-period design exercising most row kinds at once.
fn crossover_design() -> Schedule {
    schedule(serde_json::json!({
        "periods": [
            {
                "caption": "Screening",
                "start": -14,
                "duration": 14,
                "daylabels": [-14, -1],
                "procedures": [
                    {"caption": "Vital signs", "days": [-14, -1]},
                ],
            },
            {
                "caption": "Treatment",
                "start": -1,
                "duration": 9,
                "daylabels": [-1, 1, 4, 8],
                "dayshading": ["4-5"],
                "decoration": "highlighted",
                "intervals": [
                    {"caption": "Hospitalization", "start": -1, "duration": 6,
                     "decoration": "bracketed"},
                ],
                "administrations": [
                    {"caption": "Drug A", "days": ["1-5"], "dose": 100,
                     "labels": ["QD"],
                     "footnotes": [{"symbol": "a", "text": "morning dose", "days": [1]}]},
                ],
                "procedures": [
                    {"caption": "Vital signs", "days": [-1, 4, 8]},
                    {"caption": "PK sampling", "days": [1],
                     "times": [0, 0.5, 1, 2, 4, 8, 12, 24, 48],
                     "relative": 1, "timescale": "show"},
                ],
            },
        ],
    }))
}

fn all_options() -> RenderOptions {
    RenderOptions {
        title: "crossover".to_string(),
        condensed: true,
        ellipsis: true,
        timescale: true,
        graph: true,
        footnotes: true,
        ..RenderOptions::default()
    }
}

#[test]
fn full_design_renders_every_row_kind() {
    let svg = render(&crossover_design(), &all_options()).unwrap();
    assert!(svg.starts_with("<svg"));
    // row captions and period captions all present
    for caption in [
        "Screening",
        "Treatment",
        "Hospitalization",
        "Drug A",
        "Vital signs",
        "PK sampling",
    ] {
        assert!(svg.contains(caption), "missing {caption}");
    }
    // footnote legend line
    assert!(svg.contains("(a)\tmorning dose"));
    // highlighted period underlay
    assert!(svg.contains("fill:#eee"));
}

#[test]
fn rendering_is_idempotent() {
    let design = crossover_design();
    let options = all_options();
    let first = render(&design, &options).unwrap();
    let second = render(&design, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn uniform_and_condensed_layouts_differ() {
    let design = crossover_design();
    let uniform = render(&design, &RenderOptions::default()).unwrap();
    let condensed = render(
        &design,
        &RenderOptions {
            condensed: true,
            ..RenderOptions::default()
        },
    )
    .unwrap();
    assert_ne!(uniform, condensed);
}

#[test]
fn auto_compression_renders() {
    let design = crossover_design();
    let svg = render(
        &design,
        &RenderOptions {
            autocompress: true,
            ..RenderOptions::default()
        },
    )
    .unwrap();
    assert!(svg.starts_with("<svg"));
}

#[test]
fn day_out_of_range_fails_with_row_context() {
    let design = schedule(serde_json::json!({
        "periods": [{
            "caption": "P1", "start": 1, "duration": 7,
            "procedures": [{"caption": "ECG", "days": [9]}],
        }],
    }));
    let err = render(&design, &RenderOptions::default()).unwrap_err();
    let Error::Row { caption, source } = err else {
        panic!("expected a row error, got {err:?}");
    };
    assert_eq!(caption, "ECG");
    assert!(matches!(*source, Error::DayRange { day: 9, .. }));
}

#[test]
fn interval_day_list_form_renders() {
    let design = schedule(serde_json::json!({
        "periods": [{
            "caption": "P1", "start": 1, "duration": 7,
            "intervals": [{"caption": "Visit window", "days": [2, 5]}],
        }],
    }));
    let svg = render(&design, &RenderOptions::default()).unwrap();
    assert!(svg.contains("Visit window"));
}

#[test]
fn interval_crossing_day_zero_spans_inclusive_days() {
    // period days are -2, -1, 1, 2, 3; the interval covers days 1-3
    let design = schedule(serde_json::json!({
        "periods": [{
            "caption": "P1", "start": -2, "duration": 5,
            "intervals": [{"caption": "Stay", "start": 1, "duration": 3}],
        }],
    }));
    let svg = render(&design, &RenderOptions::default()).unwrap();
    // the bar is exactly three uniform columns wide: 3 x 13.2 at 11 px
    assert!(svg.contains(r#"width="39.6""#));
}

#[test]
fn empty_design_is_rejected() {
    let design = schedule(serde_json::json!({"periods": []}));
    assert!(matches!(
        render(&design, &RenderOptions::default()),
        Err(Error::EmptySchedule)
    ));
}

#[test]
fn value_markers_render_as_circles() {
    let design = schedule(serde_json::json!({
        "periods": [{
            "caption": "P1", "start": 1, "duration": 3,
            "procedures": [
                {"caption": "Score", "days": [1, 2], "value": 1},
                {"caption": "Score", "days": [3], "value": 0},
            ],
        }],
    }));
    let svg = render(&design, &RenderOptions::default()).unwrap();
    // two filled circles and one hollow one
    assert_eq!(svg.matches("fill:black").count(), 2);
    assert!(svg.contains("<circle"));
}

#[test]
fn timescale_splits_below_and_above_24h() {
    let design = schedule(serde_json::json!({
        "periods": [{
            "caption": "P1", "start": 1, "duration": 4,
            "procedures": [{"caption": "PK", "days": [1],
                "times": [0, 1, 2, 4, 8, 24, 48],
                "relative": 1, "timescale": "show"}],
        }],
    }));
    let svg = render(
        &design,
        &RenderOptions {
            timescale: true,
            ..RenderOptions::default()
        },
    )
    .unwrap();
    // the above-24h axis carries the hour unit on its boundary label
    assert!(svg.contains("48 h"));
}

#[test]
fn dose_graph_labels_level_changes() {
    let design = schedule(serde_json::json!({
        "periods": [{
            "caption": "Titration", "start": 1, "duration": 9,
            "daylabels": [1, 9],
            "administrations": [
                {"caption": "Drug", "days": ["1-3"], "dose": 50},
                {"caption": "Drug", "days": ["4-6"], "dose": 100},
                {"caption": "Drug", "days": ["7-9"], "dose": 200},
            ],
        }],
    }));
    let svg = render(
        &design,
        &RenderOptions {
            graph: true,
            ..RenderOptions::default()
        },
    )
    .unwrap();
    for dose in ["50", "100", "200"] {
        assert!(svg.contains(&format!(">{dose}</text>")), "missing dose {dose}");
    }
}
