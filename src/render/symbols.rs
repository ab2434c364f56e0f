//! Marker and bracket path construction.
//!
//! Markers are defined as unit-square outlines around the origin and scaled
//! into place; brackets and the curly brace are arc paths sized from the
//! row height.

use glam::{DVec2, dvec2};

use super::svg::{PathData, Primitive};
use crate::extract::Marker;

const DIAMOND: [DVec2; 4] = [
    dvec2(0.0, -0.5),
    dvec2(0.25, 0.0),
    dvec2(0.0, 0.5),
    dvec2(-0.25, 0.0),
];

const ARROW: [DVec2; 7] = [
    dvec2(-0.03, -0.5),
    dvec2(0.03, -0.5),
    dvec2(0.03, 0.0),
    dvec2(0.1875, 0.0),
    dvec2(0.0, 0.5),
    dvec2(-0.1875, 0.0),
    dvec2(-0.03, 0.0),
];

/// Closed polygon through `points` scaled by `size` around `center`. The
/// outline starts from the final point so the closing segment is implicit.
fn polygon(
    center: DVec2,
    points: &[DVec2],
    size: f64,
    line_width: f64,
    fill: Option<&'static str>,
) -> Primitive {
    let mut data = PathData::new().move_to(center + points[points.len() - 1] * size);
    for &p in points {
        data = data.line_to(center + p * size);
    }
    Primitive::Path {
        data: data.close(),
        line_width,
        fill,
        dashed: false,
    }
}

/// The marker glyph for one activity day.
///
/// `column_width` only matters for blocks, which stretch to fit their
/// column; `size` is the text cap height the glyphs are scaled against.
pub fn marker(
    center: DVec2,
    column_width: f64,
    kind: Marker,
    size: f64,
    line_width: f64,
) -> Primitive {
    match kind {
        Marker::Diamond => polygon(center, &DIAMOND, size * 1.4, line_width, None),
        Marker::Arrow => polygon(center, &ARROW, size * 1.2, line_width, Some("black")),
        Marker::Block => {
            let half = column_width / size / 1.5 * 0.7 / 2.0;
            let corners = [
                dvec2(-half, -0.25),
                dvec2(half, -0.25),
                dvec2(half, 0.25),
                dvec2(-half, 0.25),
            ];
            polygon(center, &corners, size * 1.5, line_width, None)
        }
    }
}

/// Opening round bracket centered on `center`, spanning `height`.
pub fn open_bracket(
    center: DVec2,
    height: f64,
    width: f64,
    radius: f64,
    line_width: f64,
) -> Primitive {
    let left = center.x - width / 2.0;
    let top = center.y - height / 2.0;
    let bottom = center.y + height / 2.0;
    let data = PathData::new()
        .move_to(dvec2(left + radius, top))
        .arc_to(radius, false, dvec2(left, top + radius))
        .line_to(dvec2(left, bottom - radius))
        .arc_to(radius, false, dvec2(left + radius, bottom));
    Primitive::Path {
        data,
        line_width,
        fill: None,
        dashed: false,
    }
}

/// Closing round bracket centered on `center`, spanning `height`.
pub fn close_bracket(
    center: DVec2,
    height: f64,
    width: f64,
    radius: f64,
    line_width: f64,
) -> Primitive {
    let right = center.x + width / 2.0;
    let top = center.y - height / 2.0;
    let bottom = center.y + height / 2.0;
    let data = PathData::new()
        .move_to(dvec2(right - radius, top))
        .arc_to(radius, true, dvec2(right, top + radius))
        .line_to(dvec2(right, bottom - radius))
        .arc_to(radius, true, dvec2(right - radius, bottom));
    Primitive::Path {
        data,
        line_width,
        fill: None,
        dashed: false,
    }
}

/// Downward-opening curly brace from `x_start` to `x_end` at height `y`.
pub fn curly_brace(x_start: f64, x_end: f64, y: f64, radius: f64, line_width: f64) -> Primitive {
    let x_center = x_start + (x_end - x_start) / 2.0;
    let data = PathData::new()
        .move_to(dvec2(x_start, y))
        .arc_to(radius, false, dvec2(x_start + radius, y + radius))
        .line_to(dvec2(x_center - radius, y + radius))
        .arc_to(radius, true, dvec2(x_center, y + 2.0 * radius))
        .arc_to(radius, true, dvec2(x_center + radius, y + radius))
        .line_to(dvec2(x_end - radius, y + radius))
        .arc_to(radius, false, dvec2(x_end, y));
    Primitive::Path {
        data,
        line_width,
        fill: None,
        dashed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diamond_marker_is_a_closed_outline() {
        let p = marker(dvec2(10.0, 20.0), 12.0, Marker::Diamond, 8.0, 1.2);
        let Primitive::Path { data, fill, .. } = p else {
            panic!("expected a path");
        };
        assert!(format!("{data:?}").contains('Z'));
        assert_eq!(fill, None);
    }

    #[test]
    fn arrow_marker_is_filled() {
        let p = marker(dvec2(0.0, 0.0), 12.0, Marker::Arrow, 8.0, 1.2);
        let Primitive::Path { fill, .. } = p else {
            panic!("expected a path");
        };
        assert_eq!(fill, Some("black"));
    }

    #[test]
    fn brackets_face_each_other() {
        let open = open_bracket(dvec2(50.0, 10.0), 20.0, 8.0, 2.5, 1.0);
        let close = close_bracket(dvec2(50.0, 10.0), 20.0, 8.0, 2.5, 1.0);
        let (Primitive::Path { data: od, .. }, Primitive::Path { data: cd, .. }) = (open, close)
        else {
            panic!("expected paths");
        };
        // opening bracket starts left of center, closing bracket right of it
        assert!(format!("{od:?}").contains("M48.5"));
        assert!(format!("{cd:?}").contains("M51.5"));
    }
}
