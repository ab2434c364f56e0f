//! Row renderers: one per row kind, behind a common dispatch contract.
//!
//! Every renderer consumes a period, the row's activity caption, the x/y
//! cursor and the nominal row height, and returns a drawable fragment plus
//! the vertical space it consumed. The orchestrator stacks fragments and
//! heights; renderers never see each other.

use enum_dispatch::enum_dispatch;
use glam::dvec2;

use super::geometry::{day_centers, day_ends, day_starts, period_width};
use super::svg::{Primitive, fmt_num};
use super::symbols::{close_bracket, curly_brace, marker, open_bracket};
use super::{Layout, Style};
use crate::days::{day_index, decode_daylist};
use crate::errors::Error;
use crate::extract::{
    DayFootnotes, Marker, day_labels, day_shadings, field_by_day, footnotes, labels, timed_entries,
};
use crate::schedule::{ActivityKind, Period};
use crate::times::normalize;

/// Fixed x position of the leading row caption.
const CAPTION_X: f64 = 5.0;

/// A rendered row fragment and the vertical space it consumed.
#[derive(Debug, Clone, Default)]
pub struct RowOutput {
    pub fragment: Vec<Primitive>,
    pub height: f64,
}

#[enum_dispatch]
pub trait RenderRow {
    /// Render one period's slice of this row at `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    fn render(
        &self,
        period: &Period,
        caption: &str,
        x: f64,
        y: f64,
        height: f64,
        layout: &Layout,
        first_pass: bool,
    ) -> Result<RowOutput, Error>;
}

/// The row kinds a diagram is stacked from.
#[enum_dispatch(RenderRow)]
#[derive(Debug, Clone)]
pub enum Row {
    PeriodCaption,
    DayGrid,
    MarkerRow,
    IntervalRow,
    DoseGraph,
    LabelRow,
    TimeScale,
}

/// Bounding box underlay for visual debugging.
fn debug_box(x: f64, y: f64, width: f64, height: f64) -> Primitive {
    Primitive::Rect {
        origin: dvec2(x, y),
        width,
        height,
        line_width: 0.0,
        fill: Some("cornsilk"),
    }
}

/// Leading caption, drawn once per logical row.
fn row_caption(caption: &str, y_mid: f64, layout: &Layout) -> Primitive {
    Primitive::Text {
        anchor: dvec2(
            CAPTION_X,
            y_mid + layout.text_height(caption) * (0.5 - 0.1),
        ),
        content: caption.to_string(),
        class: None,
    }
}

/// Centered period caption above the grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodCaption;

impl RenderRow for PeriodCaption {
    fn render(
        &self,
        period: &Period,
        _caption: &str,
        x: f64,
        y: f64,
        height: f64,
        layout: &Layout,
        _first_pass: bool,
    ) -> Result<RowOutput, Error> {
        let style = &layout.style;
        let widths = layout.day_widths(period)?;
        let mut fragment = Vec::new();
        if style.debug {
            fragment.push(debug_box(x, y, period_width(&widths), height));
        }
        let x_center = x + period_width(&widths) / 2.0;
        fragment.push(Primitive::Text {
            anchor: dvec2(
                x_center - layout.text_width(&period.caption) / 2.0,
                y + height - (height - layout.text_height("X")) / 2.0,
            ),
            content: period.caption.clone(),
            class: None,
        });
        Ok(RowOutput {
            fragment,
            height: height + style.y_padding / 2.0,
        })
    }
}

/// The per-day cell grid with shading and day labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayGrid;

impl RenderRow for DayGrid {
    fn render(
        &self,
        period: &Period,
        _caption: &str,
        x: f64,
        y: f64,
        height: f64,
        layout: &Layout,
        _first_pass: bool,
    ) -> Result<RowOutput, Error> {
        let style = &layout.style;
        let widths = layout.day_widths(period)?;
        let starts = day_starts(&widths, x);
        let centers = day_centers(&widths, x);
        let labels = day_labels(period)?;
        let shadings = day_shadings(period)?;

        let mut fragment = Vec::new();
        if style.debug {
            fragment.push(debug_box(x, y, period_width(&widths), height));
        }
        let narrow = layout.text_width("XX") / 3.0;
        for day in 0..widths.len() {
            if shadings[day] {
                fragment.push(Primitive::Rect {
                    origin: dvec2(starts[day], y),
                    width: widths[day],
                    height,
                    line_width: 0.0,
                    fill: Some("lightgray"),
                });
            }
            if widths[day] > narrow {
                fragment.push(Primitive::Rect {
                    origin: dvec2(starts[day], y),
                    width: widths[day],
                    height,
                    line_width: style.line_width,
                    fill: None,
                });
            } else {
                // collapsed columns keep only dashed top and bottom edges
                for edge_y in [y, y + height] {
                    fragment.push(Primitive::Line {
                        from: dvec2(starts[day], edge_y),
                        to: dvec2(starts[day] + widths[day], edge_y),
                        line_width: style.line_width,
                        dashed: true,
                    });
                }
            }
            if let Some(number) = labels[day] {
                let label = number.to_string();
                // optical correction: a leading "1" sits visually off-center
                let delta = if label.starts_with('1') {
                    layout.text_width("1") * 0.5
                } else {
                    0.0
                };
                if widths[day] > layout.text_width(&label) {
                    fragment.push(Primitive::Text {
                        anchor: dvec2(
                            centers[day] - layout.text_width(&label) / 2.0 - delta,
                            y + height - (height - layout.text_height("X")) / 2.0,
                        ),
                        content: label,
                        class: None,
                    });
                }
            }
        }
        Ok(RowOutput {
            fragment,
            height: height + style.y_padding * 2.0,
        })
    }
}

/// Activity markers: one glyph per anchored day.
#[derive(Debug, Clone, Copy)]
pub struct MarkerRow {
    pub default_marker: Marker,
}

impl RenderRow for MarkerRow {
    fn render(
        &self,
        period: &Period,
        caption: &str,
        x: f64,
        y: f64,
        height: f64,
        layout: &Layout,
        first_pass: bool,
    ) -> Result<RowOutput, Error> {
        let style = &layout.style;
        let widths = layout.day_widths(period)?;
        let centers = day_centers(&widths, x);
        let y_mid = y + height / 2.0;

        let mut fragment = Vec::new();
        if style.debug {
            fragment.push(debug_box(x, y, period_width(&widths), height));
        }
        if first_pass {
            fragment.push(row_caption(caption, y_mid, layout));
        }

        let decorations = field_by_day(period, caption, |a| a.decoration.clone())?;
        let markers = crate::extract::markers(period, caption, self.default_marker)?;
        let grid_labels = day_labels(period)?;
        let values = field_by_day(period, caption, |a| a.value)?;

        for day in 0..widths.len() {
            let Some(glyph) = markers[day] else {
                continue;
            };
            let decorated = decorations[day].is_some();
            let bracketed = decorations[day].as_deref() == Some("bracketed");
            let collapsible = grid_labels[day].is_none() && period.duration >= 3;
            if let Some(value) = values[day] {
                // numeric value wins over every other display mode
                if decorated {
                    crate::log::warn!(
                        activity = caption,
                        "day carries both a value and a decoration; the value wins"
                    );
                }
                let fill = if value == 0.0 { None } else { Some("black") };
                fragment.push(Primitive::Circle {
                    center: dvec2(centers[day], y_mid),
                    radius: widths[day] * 0.25,
                    line_width: style.line_width,
                    fill,
                });
            } else if collapsible && !decorated && style.ellipsis {
                fragment.push(Primitive::Circle {
                    center: dvec2(centers[day], y_mid),
                    radius: height / 30.0,
                    line_width: style.line_width,
                    fill: Some("black"),
                });
            } else {
                fragment.push(marker(
                    dvec2(centers[day], y_mid),
                    widths[day],
                    glyph,
                    layout.text_height("X"),
                    style.line_width,
                ));
                if bracketed {
                    let center = dvec2(centers[day], y_mid);
                    fragment.push(open_bracket(
                        center,
                        height,
                        widths[day] * 0.8,
                        height / 8.0,
                        style.line_width,
                    ));
                    fragment.push(close_bracket(
                        center,
                        height,
                        widths[day] * 0.8,
                        height / 8.0,
                        style.line_width,
                    ));
                }
            }
        }
        Ok(RowOutput {
            fragment,
            height: height + style.y_padding,
        })
    }
}

/// Horizontal interval bar spanning the interval's day range.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalRow;

impl RenderRow for IntervalRow {
    fn render(
        &self,
        period: &Period,
        caption: &str,
        x: f64,
        y: f64,
        height: f64,
        layout: &Layout,
        first_pass: bool,
    ) -> Result<RowOutput, Error> {
        let style = &layout.style;
        let widths = layout.day_widths(period)?;
        let starts = day_starts(&widths, x);
        let ends = day_ends(&widths, x);
        let y_mid = y + height / 2.0;

        let mut fragment = Vec::new();
        if style.debug {
            fragment.push(debug_box(x, y, period_width(&widths), height));
        }
        if first_pass {
            fragment.push(row_caption(caption, y_mid, layout));
        }

        let bar_height = 0.4 * height;
        for interval in period.activities_of(ActivityKind::Interval) {
            if interval.caption != caption {
                continue;
            }
            let (span_starts, span_durations): (Vec<i64>, Vec<i64>) =
                if let (Some(start), Some(duration)) = (interval.start, interval.duration) {
                    (vec![start], vec![duration])
                } else if let Some(spec) = &interval.days {
                    let days = decode_daylist(spec);
                    let ones = vec![1; days.len()];
                    (days, ones)
                } else {
                    return Err(Error::AmbiguousInterval {
                        period: period.caption.clone(),
                        caption: interval.caption.clone(),
                    });
                };

            for (&span_start, &span_duration) in span_starts.iter().zip(&span_durations) {
                let start_x = starts[day_index(period, span_start)?];
                let mut span_end = span_start + span_duration - 1;
                if span_start < 0 && span_end > 0 {
                    span_end += 1;
                }
                let end_x = ends[day_index(period, span_end)?];
                if interval.is_bracketed() {
                    let open_width = widths[day_index(period, span_start)?] * 0.6;
                    let close_width = widths[day_index(period, span_end)?] * 0.6;
                    fragment.push(open_bracket(
                        dvec2(start_x, y_mid),
                        height,
                        open_width,
                        height / 8.0,
                        style.line_width,
                    ));
                    fragment.push(close_bracket(
                        dvec2(end_x, y_mid),
                        height,
                        close_width,
                        height / 8.0,
                        style.line_width,
                    ));
                }
                fragment.push(Primitive::Rect {
                    origin: dvec2(start_x, y_mid - bar_height / 2.0),
                    width: end_x - start_x,
                    height: bar_height,
                    line_width: style.line_width,
                    fill: None,
                });
            }
        }
        Ok(RowOutput {
            fragment,
            height: height + style.y_padding,
        })
    }
}

/// Step plot of dose levels under an administration row.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoseGraph;

impl RenderRow for DoseGraph {
    fn render(
        &self,
        period: &Period,
        caption: &str,
        x: f64,
        y: f64,
        height: f64,
        layout: &Layout,
        _first_pass: bool,
    ) -> Result<RowOutput, Error> {
        let style = &layout.style;
        let widths = layout.day_widths(period)?;
        let starts = day_starts(&widths, x);
        let ends = day_ends(&widths, x);

        let mut fragment = Vec::new();
        if style.debug {
            fragment.push(debug_box(
                x,
                y,
                period_width(&widths),
                height + layout.text_height("X"),
            ));
        }

        let doses = field_by_day(period, caption, |a| a.dose)?;
        let numeric: Vec<f64> = doses.iter().flatten().copied().collect();
        if !numeric.is_empty() {
            let max_dose = numeric.iter().copied().fold(f64::MIN, f64::max);
            let min_dose = numeric.iter().copied().fold(f64::MAX, f64::min);
            let span = max_dose - min_dose;
            let dose_y = |dose: f64| {
                let level = if span > 0.0 { (dose - min_dose) / span } else { 0.0 };
                y + height * 0.6 - level * height * 0.6
            };

            let mut previous: Option<(f64, f64)> = None;
            let mut last_dose = 0.0;
            let mut last_label_end = 0.0;
            for day in 0..widths.len() {
                let Some(dose) = doses[day] else {
                    continue;
                };
                let level_y = dose_y(dose);
                fragment.push(Primitive::Line {
                    from: dvec2(starts[day], level_y),
                    to: dvec2(ends[day], level_y),
                    line_width: style.line_width,
                    dashed: false,
                });
                if let Some((prev_x, prev_y)) = previous {
                    fragment.push(Primitive::Line {
                        from: dvec2(prev_x, prev_y),
                        to: dvec2(starts[day], level_y),
                        line_width: style.line_width,
                        dashed: false,
                    });
                }
                previous = Some((ends[day], level_y));
                if dose != last_dose {
                    // suppress the label when it would crowd the previous one
                    if last_label_end + layout.text_width("n") < starts[day] {
                        let label = fmt_num(dose);
                        last_label_end = starts[day] + layout.text_width(&label);
                        fragment.push(Primitive::Text {
                            anchor: dvec2(starts[day], y + height + layout.text_height("X")),
                            content: label,
                            class: None,
                        });
                    }
                    last_dose = dose;
                }
            }
        }
        Ok(RowOutput {
            fragment,
            height: height + layout.text_height("X") + style.y_padding,
        })
    }
}

/// Per-day labels with appended footnote symbols.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelRow;

impl RenderRow for LabelRow {
    fn render(
        &self,
        period: &Period,
        caption: &str,
        x: f64,
        y: f64,
        height: f64,
        layout: &Layout,
        _first_pass: bool,
    ) -> Result<RowOutput, Error> {
        let style = &layout.style;
        let day_labels = labels(period, caption)?;
        let notes: DayFootnotes = footnotes(period, caption)?;
        let has_labels = day_labels.iter().any(|label| !label.is_empty());
        let has_notes = style.footnotes && notes.flagged.iter().any(|&flag| flag);

        let mut fragment = Vec::new();
        if has_labels || has_notes {
            let widths = layout.day_widths(period)?;
            let centers = day_centers(&widths, x);
            if style.debug {
                fragment.push(debug_box(x, y, period_width(&widths), height));
            }
            let text_y = y + height - layout.text_height("X") / 2.0;
            for day in 0..centers.len() {
                let mut text = day_labels[day].clone();
                if notes.flagged[day] && style.footnotes {
                    text.push_str(&format!(" ({})", notes.symbols[day]));
                }
                if text.is_empty() {
                    continue;
                }
                fragment.push(Primitive::Text {
                    anchor: dvec2(centers[day] - layout.text_width(&text) / 2.0, text_y),
                    content: text,
                    class: None,
                });
            }
        }
        Ok(RowOutput {
            fragment,
            height: height + style.y_padding,
        })
    }
}

/// Curly-bracketed time-of-day scale for sampling around reference days.
#[derive(Debug, Clone, Copy)]
pub struct TimeScale {
    /// Right edge the scale may extend to (the diagram's full width).
    pub max_width: f64,
}

/// Vertical space one time-scale block consumes, used to keep period
/// decorations clear of it.
pub fn timescale_height(style: &Style) -> f64 {
    let bracket_height = style.line_height * 2.0 / 3.0;
    let scale_height = style.line_height * 1.33 + style.y_padding * 2.0;
    bracket_height + style.y_padding * 1.5 + scale_height + style.y_padding * 2.0
}

impl RenderRow for TimeScale {
    fn render(
        &self,
        period: &Period,
        caption: &str,
        x: f64,
        y_offset: f64,
        height: f64,
        layout: &Layout,
        _first_pass: bool,
    ) -> Result<RowOutput, Error> {
        let style = &layout.style;
        let entries = normalize(&timed_entries(period, caption)?);

        // reference days with a visible scale, in stable order
        let mut reference_days: Vec<i64> = Vec::new();
        for kind in [ActivityKind::Procedure, ActivityKind::Administration] {
            for activity in period.activities_of(kind) {
                if activity.caption == caption && activity.shows_timescale() {
                    reference_days.push(activity.relative_day());
                }
            }
        }
        reference_days.sort_unstable();
        reference_days.dedup();

        let mut fragment = Vec::new();
        if reference_days.is_empty() {
            return Ok(RowOutput {
                fragment,
                height: 0.0,
            });
        }

        let widths = layout.day_widths(period)?;
        let starts = day_starts(&widths, x);
        let ends = day_ends(&widths, x);
        let bracket_height = height * 2.0 / 3.0;
        let mut y = y_offset;

        if style.debug {
            fragment.push(debug_box(x, y, period_width(&widths), bracket_height));
        }
        for &reference in &reference_days {
            let group: Vec<_> = entries.iter().filter(|e| e.relative == reference).collect();
            let (Some(min_day), Some(max_day)) = (
                group.iter().map(|e| e.day).min(),
                group.iter().map(|e| e.day).max(),
            ) else {
                continue;
            };
            let mut start_x = starts[day_index(period, min_day)?];
            let mut end_x = ends[day_index(period, max_day)?];
            let mut radius = bracket_height / 2.0;
            if radius * 4.0 > end_x - start_x {
                start_x -= radius / 2.0;
                end_x += radius / 2.0;
                radius = (end_x - start_x) / 5.0;
            }
            fragment.push(curly_brace(start_x, end_x, y, radius, style.line_width));
        }
        y += bracket_height + style.y_padding * 1.5;

        if style.debug {
            fragment.push(debug_box(
                x,
                y,
                period_width(&widths),
                height * 1.33 + style.y_padding * 2.0 + layout.text_height("X"),
            ));
        }
        let mut last_scale_end = 0.0;
        for &reference in &reference_days {
            let group: Vec<_> = entries.iter().filter(|e| e.relative == reference).collect();
            let Some(min_day) = group.iter().map(|e| e.day).min() else {
                continue;
            };
            let times: Vec<f64> = group
                .iter()
                .flat_map(|e| {
                    let offset = (e.day - reference) as f64 * 24.0;
                    e.times.iter().map(move |&t| offset + t)
                })
                .collect();
            let max_time = times.iter().copied().fold(f64::MIN, f64::max);
            let break_time = times
                .iter()
                .copied()
                .filter(|&t| t < 24.0)
                .fold(f64::MIN, f64::max);
            let break_time = if break_time > f64::MIN {
                (break_time + 2.0).min(23.0)
            } else {
                0.0
            };
            let count_below = times.iter().filter(|&&t| t <= break_time).count();
            let count_above = times.iter().filter(|&&t| t > break_time).count();

            let anchor_x = starts[day_index(period, min_day)?];
            let scale_height = height / 3.0;
            let scale_width =
                (times.len() as f64 * layout.text_width("XX")).min(self.max_width - x);
            let scale_break = scale_width * count_below as f64 / (count_below + count_above) as f64;
            let scale_gap = layout.text_width("m");

            let grid_width = period_width(&widths);
            let scale_x = anchor_x.min(x + grid_width - scale_width).max(x);
            if scale_x < last_scale_end {
                // stack onto a new line rather than overlap the previous scale
                y += height * 1.33 + style.y_padding * 3.0 + layout.text_height("X");
            }

            fragment.extend(scale_points(
                &times,
                scale_x,
                y,
                scale_break,
                0.0,
                break_time,
                height,
                layout,
            ));
            fragment.extend(scale_points(
                &times,
                scale_x + scale_break + scale_gap,
                y,
                scale_width - scale_gap - scale_break,
                24.0,
                max_time.max(36.0),
                height,
                layout,
            ));

            let below_ticks: Vec<f64> = (0..break_time as i64)
                .step_by(2)
                .map(|t| t as f64)
                .collect();
            fragment.extend(scale_axis(
                scale_x,
                y + height + style.y_padding,
                scale_break,
                scale_height,
                0.0,
                break_time,
                &below_ticks,
                false,
                layout,
            ));
            if max_time >= 24.0 {
                let above_ticks: Vec<f64> = (1..=(max_time / 24.0).floor() as i64)
                    .map(|d| d as f64 * 24.0)
                    .collect();
                fragment.extend(scale_axis(
                    scale_x + scale_break + scale_gap,
                    y + height + style.y_padding,
                    scale_width - scale_gap - scale_break,
                    scale_height,
                    24.0,
                    max_time.max(36.0),
                    &above_ticks,
                    true,
                    layout,
                ));
            }
            last_scale_end = scale_x + scale_width;
        }

        Ok(RowOutput {
            fragment,
            height: y + height * 1.33 + style.y_padding * 3.0 + layout.text_height("X") - y_offset,
        })
    }
}

/// Diamonds marking the sampling points that fall inside one scale segment.
#[allow(clippy::too_many_arguments)]
fn scale_points(
    times: &[f64],
    x: f64,
    y: f64,
    width: f64,
    scale_min: f64,
    scale_max: f64,
    line_height: f64,
    layout: &Layout,
) -> Vec<Primitive> {
    let span = scale_max - scale_min;
    if span <= 0.0 {
        return Vec::new();
    }
    times
        .iter()
        .filter(|&&t| t >= scale_min && t <= scale_max)
        .map(|&t| {
            let point_x = (t - scale_min) * width / span + x;
            marker(
                dvec2(point_x, y + line_height / 2.0),
                0.0,
                Marker::Diamond,
                layout.text_height("X"),
                layout.style.line_width,
            )
        })
        .collect()
}

/// One axis segment: baseline, ticks, and collision-suppressed labels.
/// The boundary label is always drawn, with an hour unit when requested.
#[allow(clippy::too_many_arguments)]
fn scale_axis(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    scale_min: f64,
    scale_max: f64,
    ticks: &[f64],
    show_unit: bool,
    layout: &Layout,
) -> Vec<Primitive> {
    let style = &layout.style;
    let mut fragment = vec![Primitive::Line {
        from: dvec2(x, y),
        to: dvec2(x + width, y),
        line_width: style.line_width,
        dashed: false,
    }];
    let span = scale_max - scale_min;
    if ticks.is_empty() || span <= 0.0 {
        return fragment;
    }

    let tick_labels: Vec<String> = ticks.iter().map(|&t| fmt_num(t)).collect();
    let final_label_begin = x + width
        - layout.text_width(&tick_labels[tick_labels.len() - 1]) / 2.0;
    let min_clearance = layout.text_width(".");
    let label_y = y + height / 2.0 + layout.text_height("X") + style.y_padding;
    let mut last_label_end = 0.0;

    for (index, (&tick, label)) in ticks.iter().zip(&tick_labels).enumerate() {
        let tick_x = (tick - scale_min) * width / span + x;
        fragment.push(Primitive::Line {
            from: dvec2(tick_x, y - height / 2.0),
            to: dvec2(tick_x, y + height / 2.0),
            line_width: style.line_width,
            dashed: false,
        });
        let half_width = layout.text_width(label) / 2.0;
        let is_last = index + 1 == ticks.len();
        if is_last {
            let mut content = label.clone();
            if show_unit {
                content.push_str(" h");
            }
            fragment.push(Primitive::Text {
                anchor: dvec2(tick_x - half_width, label_y),
                content,
                class: None,
            });
        } else if tick_x - half_width > last_label_end
            && tick_x + half_width < final_label_begin - min_clearance
        {
            fragment.push(Primitive::Text {
                anchor: dvec2(tick_x - half_width, label_y),
                content: label.clone(),
                class: None,
            });
            last_label_end = tick_x + half_width + min_clearance;
        }
    }
    fragment
}
