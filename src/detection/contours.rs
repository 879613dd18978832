use image::GrayImage;
use imageproc::contours::{BorderType, Contour as Border, find_contours as trace_borders};
use imageproc::geometry::{arc_length, convex_hull};
use imageproc::point::Point as Pixel;

use crate::models::{Contour, Point};

/// Trace the outermost contours of a binary mask (non-zero = foreground).
///
/// Shapes nested inside another shape's hole belong to that shape and are
/// not reported on their own.
pub fn find_contours(mask: &GrayImage) -> Vec<Contour> {
    trace_borders::<i32>(mask)
        .iter()
        .filter(|b| matches!(b.border_type, BorderType::Outer) && b.parent.is_none())
        .filter_map(measure)
        .collect()
}

fn measure(border: &Border<i32>) -> Option<Contour> {
    let points = &border.points;
    let first = points.first()?;

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    let mut scan = *first;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
        if (p.y, p.x) < (scan.y, scan.x) {
            scan = *p;
        }
    }

    let centroid = polygon_centroid(points).unwrap_or(Point::new(
        (min_x + max_x) as f64 / 2.0,
        (min_y + max_y) as f64 / 2.0,
    ));

    let perimeter = if points.len() > 1 {
        arc_length(points, true)
    } else {
        0.0
    };

    Some(Contour {
        min_x: min_x as u32,
        min_y: min_y as u32,
        max_x: max_x as u32,
        max_y: max_y as u32,
        area: enclosed_pixels(points),
        scan_x: scan.x as u32,
        scan_y: scan.y as u32,
        // Shift from pixel indices to pixel centres.
        centroid: Point::new(centroid.x + 0.5, centroid.y + 0.5),
        perimeter,
        hull_area: enclosed_pixels_of_polygon(&convex_hull(&points[..])),
    })
}

/// Pixels enclosed by a traced boundary, boundary pixels included.
///
/// Pick's theorem on the boundary polygon: interior lattice points plus the
/// `B` boundary points is `area + B/2 + 1`.
fn enclosed_pixels(points: &[Pixel<i32>]) -> f64 {
    match points.len() {
        0 => 0.0,
        1 => 1.0,
        n => shoelace(points) + n as f64 / 2.0 + 1.0,
    }
}

/// Same count for a convex polygon given by its vertices only, where the
/// boundary is measured by length instead of by lattice points.
fn enclosed_pixels_of_polygon(vertices: &[Pixel<i32>]) -> f64 {
    match vertices.len() {
        0 => 0.0,
        1 => 1.0,
        _ => shoelace(vertices) + arc_length(vertices, true) / 2.0 + 1.0,
    }
}

fn shoelace(points: &[Pixel<i32>]) -> f64 {
    let n = points.len();
    let mut twice = 0i64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        twice += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    twice.abs() as f64 / 2.0
}

/// Area centroid of a polygon; `None` when the polygon has no area.
fn polygon_centroid(points: &[Pixel<i32>]) -> Option<Point> {
    let n = points.len();
    let (mut a2, mut cx, mut cy) = (0.0f64, 0.0f64, 0.0f64);
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let cross = p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
        a2 += cross;
        cx += (p.x + q.x) as f64 * cross;
        cy += (p.y + q.y) as f64 * cross;
    }
    if a2.abs() < 1e-9 {
        return None;
    }
    Some(Point::new(cx / (3.0 * a2), cy / (3.0 * a2)))
}
