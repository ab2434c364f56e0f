//! Draw primitives and SVG document assembly.
//!
//! Rendering produces a flat list of primitives in paint order; the
//! document wrapper adds the size, an embedded style rule fixing the font
//! for all text nodes, and the metadata elements. There is no grouping or
//! z-order beyond the order of the list.

use std::fmt::Write;

use glam::DVec2;

/// One drawable element. Coordinates are in px, y growing downward.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        from: DVec2,
        to: DVec2,
        line_width: f64,
        dashed: bool,
    },
    Rect {
        origin: DVec2,
        width: f64,
        height: f64,
        line_width: f64,
        fill: Option<&'static str>,
    },
    Circle {
        center: DVec2,
        radius: f64,
        line_width: f64,
        fill: Option<&'static str>,
    },
    Path {
        data: PathData,
        line_width: f64,
        fill: Option<&'static str>,
        dashed: bool,
    },
    Text {
        anchor: DVec2,
        content: String,
        class: Option<&'static str>,
    },
}

impl Primitive {
    fn write_svg(&self, out: &mut String) {
        match self {
            Primitive::Line {
                from,
                to,
                line_width,
                dashed,
            } => {
                let dash = dash_style(*dashed, *line_width);
                let _ = writeln!(
                    out,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" style="stroke:black; stroke-width:{}; {}" />"#,
                    fmt_num(from.x),
                    fmt_num(from.y),
                    fmt_num(to.x),
                    fmt_num(to.y),
                    fmt_num(*line_width),
                    dash,
                );
            }
            Primitive::Rect {
                origin,
                width,
                height,
                line_width,
                fill,
            } => {
                let _ = writeln!(
                    out,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" style="stroke:black; stroke-width:{}; fill:{};" />"#,
                    fmt_num(origin.x),
                    fmt_num(origin.y),
                    fmt_num(*width),
                    fmt_num(*height),
                    fmt_num(*line_width),
                    fill.unwrap_or("none"),
                );
            }
            Primitive::Circle {
                center,
                radius,
                line_width,
                fill,
            } => {
                let _ = writeln!(
                    out,
                    r#"<circle cx="{}" cy="{}" r="{}" style="stroke:black; stroke-width:{}; fill:{};" />"#,
                    fmt_num(center.x),
                    fmt_num(center.y),
                    fmt_num(*radius),
                    fmt_num(*line_width),
                    fill.unwrap_or("none"),
                );
            }
            Primitive::Path {
                data,
                line_width,
                fill,
                dashed,
            } => {
                let dash = dash_style(*dashed, *line_width);
                let _ = writeln!(
                    out,
                    r#"<path d="{}" style="stroke:black; fill:{}; stroke-width:{}; {}" />"#,
                    data.0,
                    fill.unwrap_or("none"),
                    fmt_num(*line_width),
                    dash,
                );
            }
            Primitive::Text {
                anchor,
                content,
                class,
            } => {
                let _ = match class {
                    Some(class) => writeln!(
                        out,
                        r#"<text x="{}" y="{}" class="{}">{}</text>"#,
                        fmt_num(anchor.x),
                        fmt_num(anchor.y),
                        class,
                        escape_text(content),
                    ),
                    None => writeln!(
                        out,
                        r#"<text x="{}" y="{}">{}</text>"#,
                        fmt_num(anchor.x),
                        fmt_num(anchor.y),
                        escape_text(content),
                    ),
                };
            }
        }
    }
}

fn dash_style(dashed: bool, line_width: f64) -> String {
    if dashed {
        let on_off = fmt_num(line_width * 3.0);
        format!("stroke-dasharray: {on_off} {on_off}")
    } else {
        String::new()
    }
}

/// Path outline data, built segment by segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData(String);

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, p: DVec2) -> Self {
        self.push_segment('M', p);
        self
    }

    pub fn line_to(mut self, p: DVec2) -> Self {
        self.push_segment('L', p);
        self
    }

    /// Circular arc to `p`; `sweep` selects the bend direction.
    pub fn arc_to(mut self, radius: f64, sweep: bool, p: DVec2) -> Self {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        let _ = write!(
            self.0,
            "A{r}, {r} 0 0,{s} {x}, {y}",
            r = fmt_num(radius),
            s = u8::from(sweep),
            x = fmt_num(p.x),
            y = fmt_num(p.y),
        );
        self
    }

    pub fn close(mut self) -> Self {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        self.0.push('Z');
        self
    }

    fn push_segment(&mut self, op: char, p: DVec2) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        let _ = write!(self.0, "{op}{}, {}", fmt_num(p.x), fmt_num(p.y));
    }
}

/// A finished diagram: viewport size, font binding, and the primitive list.
#[derive(Debug, Clone)]
pub struct Document {
    pub width: f64,
    pub height: f64,
    pub font: String,
    pub font_size: f64,
    pub title: String,
    pub primitives: Vec<Primitive>,
}

impl Document {
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg width="{}" height="{}" xmlns="http://www.w3.org/2000/svg">"#,
            fmt_num(self.width),
            fmt_num(self.height),
        );
        let _ = writeln!(
            out,
            "<style>text {{font-family: {}; font-size: {}px ;}}</style>",
            self.font,
            fmt_num(self.font_size),
        );
        let _ = writeln!(
            out,
            "<desc>Schedule of assessments generated by soachart {}</desc><title>{}</title>",
            env!("CARGO_PKG_VERSION"),
            escape_text(&self.title),
        );
        for primitive in &self.primitives {
            primitive.write_svg(&mut out);
        }
        out.push_str("</svg>");
        out
    }
}

/// Escape text content for XML.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format a number with 6 significant figures, trailing zeros trimmed.
pub fn fmt_num(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let sig_figs = 6;
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10_f64.powi(sig_figs - 1 - magnitude);
    let rounded = (value * scale).round() / scale;

    let decimals = (sig_figs - 1 - magnitude).max(0) as usize;
    let s = format!("{rounded:.decimals$}");
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn fmt_num_trims_trailing_zeros() {
        assert_eq!(fmt_num(0.0), "0");
        assert_eq!(fmt_num(100.0), "100");
        assert_eq!(fmt_num(2.5), "2.5");
        assert_eq!(fmt_num(-13.75), "-13.75");
        assert_eq!(fmt_num(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn path_data_chains_segments() {
        let d = PathData::new()
            .move_to(dvec2(0.0, -0.5))
            .line_to(dvec2(0.25, 0.0))
            .close();
        assert_eq!(d.0, "M0, -0.5 L0.25, 0 Z");
    }

    #[test]
    fn arc_segment_carries_sweep_flag() {
        let d = PathData::new()
            .move_to(dvec2(10.0, 0.0))
            .arc_to(8.0, false, dvec2(18.0, 8.0));
        assert_eq!(d.0, "M10, 0 A8, 8 0 0,0 18, 8");
    }

    #[test]
    fn text_content_is_escaped() {
        let mut out = String::new();
        Primitive::Text {
            anchor: dvec2(1.0, 2.0),
            content: "a < b & c".into(),
            class: None,
        }
        .write_svg(&mut out);
        assert!(out.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn dashed_line_has_dasharray() {
        let mut out = String::new();
        Primitive::Line {
            from: dvec2(0.0, 0.0),
            to: dvec2(10.0, 0.0),
            line_width: 1.0,
            dashed: true,
        }
        .write_svg(&mut out);
        assert!(out.contains("stroke-dasharray: 3 3"));
    }

    #[test]
    fn document_embeds_font_style_and_title() {
        let doc = Document {
            width: 120.0,
            height: 60.0,
            font: "Arial".into(),
            font_size: 11.0,
            title: "design".into(),
            primitives: vec![],
        };
        let svg = doc.to_svg();
        assert!(svg.starts_with(r#"<svg width="120" height="60""#));
        assert!(svg.contains("font-family: Arial"));
        assert!(svg.contains("<title>design</title>"));
        assert!(svg.ends_with("</svg>"));
    }
}
