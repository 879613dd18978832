use std::cmp::Ordering;

use crate::models::Contour;

/// A contour that survived suppression, with the number of fragments it absorbed.
#[derive(Debug, Clone)]
pub struct Kept {
    pub contour: Contour,
    pub merged: u32,
}

fn sort_by_area(contours: Vec<Contour>) -> Vec<Contour> {
    let mut contours = contours;
    contours.sort_by(|a, b| {
        b.area
            .partial_cmp(&a.area)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (a.scan_y, a.scan_x).cmp(&(b.scan_y, b.scan_x)))
    });
    contours
}

/// Greedy overlap suppression, largest first: a contour whose box overlaps a
/// kept box by more than `fraction` of the smaller box's area is folded into
/// that kept contour.
pub fn suppress_overlaps(contours: Vec<Contour>, fraction: f64) -> Vec<Kept> {
    let mut kept: Vec<Kept> = Vec::new();

    for contour in sort_by_area(contours) {
        let bbox = contour.bounding_box();
        let absorber = kept.iter_mut().find(|k| {
            let other = k.contour.bounding_box();
            let smaller = bbox.area().min(other.area()) as f64;
            bbox.intersection_area(&other) as f64 > fraction * smaller
        });
        match absorber {
            Some(k) => k.merged += 1,
            None => kept.push(Kept { contour, merged: 0 }),
        }
    }

    kept
}

/// Final output order: row-major scan position, then larger area, then
/// centroid x and y.
pub fn scan_order(a: &Contour, b: &Contour) -> Ordering {
    (a.scan_y, a.scan_x)
        .cmp(&(b.scan_y, b.scan_x))
        .then_with(|| b.area.partial_cmp(&a.area).unwrap_or(Ordering::Equal))
        .then_with(|| a.centroid.x.partial_cmp(&b.centroid.x).unwrap_or(Ordering::Equal))
        .then_with(|| a.centroid.y.partial_cmp(&b.centroid.y).unwrap_or(Ordering::Equal))
}
