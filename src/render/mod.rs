//! Layout orchestration: stacking rows into a complete SVG document.
//!
//! This module is organized into submodules:
//! - `geometry`: column-width strategies and day-grid coordinates
//! - `symbols`: marker, bracket and brace path construction
//! - `rows`: one renderer per row kind
//! - `svg`: draw primitives and document assembly
//!
//! The orchestrator walks a fixed state sequence - validate, build metrics
//! and style, render the header, then intervals, administrations and
//! procedures, then period decorations and the footnote legend - threading
//! a single `(fragment, y)` accumulator throughout. Any row failure aborts
//! the whole render; no partial document is produced.

pub mod geometry;
pub mod rows;
pub mod svg;
pub mod symbols;

pub use geometry::{AutoCompressed, Condensed, Uniform, WidthPolicy, WidthStrategy};
pub use rows::{RenderRow, Row, RowOutput};
pub use svg::{Document, Primitive};

use glam::dvec2;

use crate::errors::Error;
use crate::extract::{Marker, field_by_day, footnote_registry, footnotes, has_timescale, labels};
use crate::metrics::{FontMetrics, TextMeasure};
use crate::schedule::{ActivityKind, Period, Schedule, item_names};
use geometry::period_width;
use rows::{
    DayGrid, DoseGraph, IntervalRow, LabelRow, MarkerRow, PeriodCaption, TimeScale,
    timescale_height,
};
use symbols::{close_bracket, open_bracket};

/// Left margin before the first period's grid, excluding row captions.
const BASE_X_OFFSET: f64 = 30.0;

/// Top margin above the period captions.
const Y_OFFSET: f64 = 10.0;

/// Configuration surface consumed by the renderer.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Document title element.
    pub title: String,
    /// Font family fixed for all text nodes.
    pub font: String,
    /// Font size in px; all metrics scale from it.
    pub font_size: f64,
    /// Vertical padding scale factor.
    pub padding: f64,
    /// Condense the day grid by day labels.
    pub condensed: bool,
    /// Compress the day grid by activity density instead.
    pub autocompress: bool,
    /// Collapse unlabeled marker runs into small dots.
    pub ellipsis: bool,
    /// Draw time-of-day scales where activities request them.
    pub timescale: bool,
    /// Draw dose-over-time graphs under administrations.
    pub graph: bool,
    /// Show footnote markers and the footnote legend.
    pub footnotes: bool,
    /// Draw row bounding boxes for visual debugging.
    pub debug: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            font: "Arial".to_string(),
            font_size: 11.0,
            padding: 1.0,
            condensed: false,
            autocompress: false,
            ellipsis: false,
            timescale: false,
            graph: false,
            footnotes: false,
            debug: false,
        }
    }
}

/// Immutable layout constants derived from the options, threaded through
/// every row-rendering call.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub period_spacing: f64,
    pub line_height: f64,
    pub y_padding: f64,
    pub line_width: f64,
    pub ellipsis: bool,
    pub footnotes: bool,
    pub debug: bool,
}

/// The measurement capability, width policy and style constants a row
/// renderer needs.
pub struct Layout<'a> {
    pub measure: &'a dyn TextMeasure,
    pub widths: WidthPolicy,
    pub style: Style,
}

impl Layout<'_> {
    pub fn text_width(&self, text: &str) -> f64 {
        self.measure.width(text)
    }

    pub fn text_height(&self, text: &str) -> f64 {
        self.measure.height(text)
    }

    pub fn day_widths(&self, period: &Period) -> Result<Vec<f64>, Error> {
        self.widths.day_widths(period, self.measure)
    }

    pub fn period_width(&self, period: &Period) -> Result<f64, Error> {
        Ok(period_width(&self.day_widths(period)?))
    }
}

/// Running render accumulator: the primitive list and the y cursor.
struct Canvas {
    primitives: Vec<Primitive>,
    y: f64,
}

impl Canvas {
    fn add(&mut self, row: RowOutput) {
        self.primitives.extend(row.fragment);
        self.y += row.height;
    }
}

/// Render one logical row across all periods, left to right.
///
/// The x cursor starts at the shared left margin and advances by each
/// period's width plus the period spacing. When any period carries labels
/// or footnotes for this caption, an inline label row is stacked above
/// first. `connect` joins adjacent period grids with a short line.
#[allow(clippy::too_many_arguments)]
fn render_row(
    periods: &[Period],
    x_offset: f64,
    y_offset: f64,
    caption: &str,
    height: f64,
    row: &Row,
    layout: &Layout,
    connect: bool,
) -> Result<RowOutput, Error> {
    let style = &layout.style;
    let mut fragment = Vec::new();
    let mut label_height = 0.0;
    let mut y = y_offset;

    let mut has_labels = false;
    for period in periods {
        if labels(period, caption)?.iter().any(|label| !label.is_empty()) {
            has_labels = true;
        }
        if style.footnotes && footnotes(period, caption)?.flagged.iter().any(|&flag| flag) {
            has_labels = true;
        }
    }
    if has_labels {
        let label_row = Row::from(LabelRow);
        let mut x = x_offset;
        for period in periods {
            let out = label_row.render(period, caption, x, y, height, layout, false)?;
            fragment.extend(out.fragment);
            x += layout.period_width(period)? + style.period_spacing;
        }
        label_height = style.line_height;
        y += label_height;
    }

    let mut x = x_offset;
    let mut row_height = 0.0;
    for (index, period) in periods.iter().enumerate() {
        let first = index == 0;
        let last = index + 1 == periods.len();
        let out = row.render(period, caption, x, y, height, layout, first)?;
        fragment.extend(out.fragment);
        row_height = out.height;
        let width = layout.period_width(period)?;
        if connect && !last {
            fragment.push(Primitive::Line {
                from: dvec2(x + width, y + height / 2.0),
                to: dvec2(x + width + style.period_spacing, y + height / 2.0),
                line_width: style.line_width,
                dashed: false,
            });
        }
        x += width + style.period_spacing;
    }
    Ok(RowOutput {
        fragment,
        height: label_height + row_height,
    })
}

/// Render a schedule with the built-in glyph metrics.
pub fn render(schedule: &Schedule, options: &RenderOptions) -> Result<String, Error> {
    let metrics = FontMetrics::new(options.font_size);
    render_with(schedule, options, &metrics)
}

/// Render a schedule with a caller-supplied text-measurement capability.
pub fn render_with(
    schedule: &Schedule,
    options: &RenderOptions,
    measure: &dyn TextMeasure,
) -> Result<String, Error> {
    // Validate: every schema error fires before any geometry is computed.
    let periods = schedule.resolve()?;
    crate::log::debug!(periods = periods.len(), "schedule resolved");

    // Measure and style.
    let widths: WidthPolicy = if options.condensed {
        Condensed.into()
    } else if options.autocompress {
        AutoCompressed.into()
    } else {
        Uniform.into()
    };
    let style = Style {
        period_spacing: measure.width("XX"),
        line_height: measure.height("X") * 2.0,
        y_padding: options.font_size / 1.8 * options.padding,
        line_width: options.font_size / 10.0,
        ellipsis: options.ellipsis,
        footnotes: options.footnotes,
        debug: options.debug,
    };
    let layout = Layout {
        measure,
        widths,
        style,
    };

    // Row captions share one left column sized to the widest caption.
    let mut x_offset = BASE_X_OFFSET;
    let mut captions = item_names(&periods, ActivityKind::Procedure);
    captions.extend(item_names(&periods, ActivityKind::Interval));
    captions.extend(item_names(&periods, ActivityKind::Administration));
    if let Some(widest) = captions
        .iter()
        .map(|caption| layout.text_width(caption))
        .max_by(f64::total_cmp)
    {
        x_offset += widest;
    }

    let mut canvas = Canvas {
        primitives: Vec::new(),
        y: Y_OFFSET,
    };

    // Header: period captions, then the day grid with period connectors.
    let caption_row = Row::from(PeriodCaption);
    let grid_row = Row::from(DayGrid);
    canvas.add(render_row(
        &periods,
        x_offset,
        canvas.y,
        "",
        style.line_height,
        &caption_row,
        &layout,
        false,
    )?);
    canvas.add(render_row(
        &periods,
        x_offset,
        canvas.y,
        "",
        style.line_height,
        &grid_row,
        &layout,
        true,
    )?);

    // Intervals.
    let interval_row = Row::from(IntervalRow);
    for name in item_names(&periods, ActivityKind::Interval) {
        let out = render_row(
            &periods,
            x_offset,
            canvas.y,
            &name,
            style.line_height,
            &interval_row,
            &layout,
            false,
        )
        .map_err(|source| Error::in_row(&name, source))?;
        canvas.add(out);
    }

    // Administrations, each optionally followed by its dose graph.
    let administration_row = Row::from(MarkerRow {
        default_marker: Marker::Arrow,
    });
    let dose_row = Row::from(DoseGraph);
    for name in item_names(&periods, ActivityKind::Administration) {
        let out = render_row(
            &periods,
            x_offset,
            canvas.y,
            &name,
            style.line_height,
            &administration_row,
            &layout,
            false,
        )
        .map_err(|source| Error::in_row(&name, source))?;
        canvas.add(out);
        if options.graph {
            let mut any_dose = false;
            for period in &periods {
                if field_by_day(period, &name, |a| a.dose)
                    .map_err(|source| Error::in_row(&name, source))?
                    .iter()
                    .any(|dose| dose.is_some())
                {
                    any_dose = true;
                }
            }
            if any_dose {
                let out = render_row(
                    &periods,
                    x_offset,
                    canvas.y,
                    &name,
                    style.line_height,
                    &dose_row,
                    &layout,
                    false,
                )
                .map_err(|source| Error::in_row(&name, source))?;
                canvas.add(out);
            }
        }
    }

    // Procedures, each optionally followed by its time scale.
    let procedure_row = Row::from(MarkerRow {
        default_marker: Marker::Diamond,
    });
    let mut grid_total = 0.0;
    for period in &periods {
        grid_total += layout.period_width(period)?;
    }
    let full_width =
        x_offset + grid_total + (periods.len() as f64 - 1.0).max(0.0) * style.period_spacing;
    let procedure_names = item_names(&periods, ActivityKind::Procedure);
    let mut last_procedure_has_timescale = false;
    for name in &procedure_names {
        let out = render_row(
            &periods,
            x_offset,
            canvas.y,
            name,
            style.line_height,
            &procedure_row,
            &layout,
            false,
        )
        .map_err(|source| Error::in_row(name, source))?;
        canvas.add(out);
        if options.timescale {
            let mut x = x_offset;
            let mut target: Option<&Period> = None;
            for period in &periods {
                if has_timescale(period, name) {
                    target = Some(period);
                    break;
                }
                x += layout.period_width(period)? + style.period_spacing;
            }
            if let Some(period) = target {
                if Some(name) == procedure_names.last() {
                    last_procedure_has_timescale = true;
                }
                let scale_row = Row::from(TimeScale {
                    max_width: full_width,
                });
                let out = scale_row
                    .render(period, name, x, canvas.y, style.line_height, &layout, false)
                    .map_err(|source| Error::in_row(name, source))?;
                canvas.add(out);
            }
        }
    }

    // Period decorations paint underneath everything rendered so far.
    let mut decorations = Vec::new();
    {
        let mut x = x_offset;
        let mut height = canvas.y - Y_OFFSET - style.y_padding / 2.0;
        if last_procedure_has_timescale {
            height -= timescale_height(&style);
        }
        for period in &periods {
            let width = layout.period_width(period)?;
            match period.decoration.as_deref() {
                Some("highlighted") => decorations.push(Primitive::Rect {
                    origin: dvec2(x - style.period_spacing / 4.0, Y_OFFSET),
                    width: width + style.period_spacing / 2.0,
                    height,
                    line_width: 0.0,
                    fill: Some("#eee"),
                }),
                Some("bracketed") => {
                    let y_mid = Y_OFFSET + height / 2.0;
                    decorations.push(open_bracket(
                        dvec2(x - style.period_spacing / 4.0, y_mid),
                        height,
                        style.line_height / 4.0,
                        style.line_height / 4.0,
                        style.line_width,
                    ));
                    decorations.push(close_bracket(
                        dvec2(x + width + style.period_spacing / 4.0, y_mid),
                        height,
                        style.line_height / 4.0,
                        style.line_height / 4.0,
                        style.line_width,
                    ));
                }
                _ => {}
            }
            x += width + style.period_spacing;
        }
    }
    canvas.primitives.splice(0..0, decorations);

    // Footnote legend.
    let registry = footnote_registry(&periods)?;
    let mut legend_width: f64 = 0.0;
    if options.footnotes && !registry.is_empty() {
        canvas.y += style.y_padding * 4.0;
        for (symbol, text) in &registry {
            let line = format!("({symbol})\t{text}");
            legend_width = legend_width.max(layout.text_width(&line));
            canvas.primitives.push(Primitive::Text {
                anchor: dvec2(x_offset, canvas.y),
                content: line,
                class: Some("footnote"),
            });
            canvas.y += layout.text_height("XX") + style.y_padding;
        }
    }

    // Finalize: viewport bounds from the consumed width and height.
    let viewport_width = (x_offset + grid_total + periods.len() as f64 * style.period_spacing)
        .max(x_offset + legend_width);
    crate::log::debug!(
        width = viewport_width,
        height = canvas.y,
        "document finalized"
    );
    let document = Document {
        width: viewport_width,
        height: canvas.y,
        font: options.font.clone(),
        font_size: options.font_size,
        title: options.title.clone(),
        primitives: canvas.primitives,
    };
    Ok(document.to_svg())
}
