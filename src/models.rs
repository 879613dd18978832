use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point in either view or document space, depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with `x_min <= x_max` and `y_min <= y_max`.
///
/// Coordinates are continuous: a page raster of `w × h` pixels spans
/// `[0, w] × [0, h]`, and pixel `(i, j)` covers `[i, i + 1) × [j, j + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Rect {
    /// Build a rectangle from two arbitrary opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x_min: a.x.min(b.x),
            y_min: a.y.min(b.y),
            x_max: a.x.max(b.x),
            y_max: a.y.max(b.y),
        }
    }

    /// Build a rectangle from the top-left corner and a size, the way drawing
    /// canvases usually report a drag.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners(Point::new(x, y), Point::new(x + width, y + height))
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x_min.is_finite()
            && self.y_min.is_finite()
            && self.x_max.is_finite()
            && self.y_max.is_finite()
    }

    /// True when either side is shorter than `min_extent`.
    pub fn is_degenerate(&self, min_extent: f64) -> bool {
        self.width() < min_extent
            || self.height() < min_extent
            || self.width() <= 0.0
            || self.height() <= 0.0
    }

    /// Intersection with another rectangle; `None` when they share no area.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x_min: self.x_min.max(other.x_min),
            y_min: self.y_min.max(other.y_min),
            x_max: self.x_max.min(other.x_max),
            y_max: self.y_max.min(other.y_max),
        };
        (r.x_min < r.x_max && r.y_min < r.y_max).then_some(r)
    }

    /// Pixel box touched by this rectangle, clipped to a `width × height` raster.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let x0 = self.x_min.floor().max(0.0) as u32;
        let y0 = self.y_min.floor().max(0.0) as u32;
        let x1 = (self.x_max.ceil().max(0.0) as u32).min(width);
        let y1 = (self.y_max.ceil().max(0.0) as u32).min(height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(BoundingBox {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Integer pixel box in document space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return 0;
        }
        (x1 - x0) as u64 * (y1 - y0) as u64
    }

    pub fn translate(&self, dx: u32, dy: u32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect {
            x_min: self.x as f64,
            y_min: self.y as f64,
            x_max: self.right() as f64,
            y_max: self.bottom() as f64,
        }
    }
}

/// One outer contour with its measurements, in the coordinates of the
/// region it was traced in.
#[derive(Debug, Clone)]
pub struct Contour {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// Pixels enclosed by the outer boundary, holes included.
    pub area: f64,
    /// First boundary pixel met by a row-major scan.
    pub scan_x: u32,
    pub scan_y: u32,
    pub centroid: Point,
    /// Length of the traced outer boundary.
    pub perimeter: f64,
    /// Area of the convex hull of the boundary pixel squares.
    pub hull_area: f64,
}

impl Contour {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.min_x,
            y: self.min_y,
            width: self.width(),
            height: self.height(),
        }
    }

    /// 4π·area / perimeter², 0 for a contour without length.
    pub fn circularity(&self) -> f64 {
        if self.perimeter <= 0.0 {
            return 0.0;
        }
        4.0 * std::f64::consts::PI * self.area / (self.perimeter * self.perimeter)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    pub fn solidity(&self) -> f64 {
        if self.hull_area <= 0.0 {
            return 0.0;
        }
        (self.area / self.hull_area).min(1.0)
    }

    /// Fraction of the bounding box covered by the enclosed area.
    pub fn extent(&self) -> f64 {
        (self.area / self.bounding_box().area() as f64).min(1.0)
    }

    pub fn shape(&self) -> ShapeClass {
        ShapeClass::classify(
            self.circularity(),
            self.aspect_ratio(),
            self.solidity(),
            self.extent(),
        )
    }
}

/// Coarse geometric grouping of a candidate. Purely descriptive; it never
/// affects which candidates are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeClass {
    Circular,
    Square,
    Rectangle,
    Triangle,
    Complex,
    Other,
}

impl ShapeClass {
    pub fn classify(circularity: f64, aspect_ratio: f64, solidity: f64, extent: f64) -> Self {
        let skew = (aspect_ratio - 1.0).abs();
        if solidity > 0.85 && extent > 0.88 {
            if skew < 0.2 {
                ShapeClass::Square
            } else {
                ShapeClass::Rectangle
            }
        } else if circularity > 0.7 && skew < 0.3 && (0.65..=0.88).contains(&extent) {
            ShapeClass::Circular
        } else if solidity > 0.85 && (0.35..0.65).contains(&extent) {
            ShapeClass::Triangle
        } else if solidity < 0.8 {
            ShapeClass::Complex
        } else {
            ShapeClass::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeClass::Circular => "circular",
            ShapeClass::Square => "square",
            ShapeClass::Rectangle => "rectangle",
            ShapeClass::Triangle => "triangle",
            ShapeClass::Complex => "complex",
            ShapeClass::Other => "other",
        }
    }
}

/// A component that passed every filter for a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolCandidate {
    pub section_id: Uuid,
    /// Document-space pixel box.
    pub bbox: BoundingBox,
    /// Enclosed area in px².
    pub area: f64,
    pub perimeter: f64,
    pub solidity: f64,
    pub circularity: f64,
    pub aspect_ratio: f64,
    pub extent: f64,
    /// Document-space centroid.
    pub centroid: Point,
    pub shape: ShapeClass,
    /// Fragments folded into this candidate by overlap suppression.
    pub merged: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(10.0, 2.0), Point::new(3.0, 8.0));
        assert_eq!(r, Rect { x_min: 3.0, y_min: 2.0, x_max: 10.0, y_max: 8.0 });
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = Rect::from_origin_size(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_origin_size(10.0, 0.0, 5.0, 5.0);
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn pixel_bounds_cover_partial_pixels() {
        let r = Rect::from_corners(Point::new(1.5, 2.2), Point::new(4.1, 6.0));
        let b = r.pixel_bounds(100, 100).unwrap();
        assert_eq!(b, bbox(1, 2, 4, 4));
    }

    fn bbox(x: u32, y: u32, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn bbox_intersection_area() {
        let a = bbox(0, 0, 10, 10);
        let b = bbox(5, 5, 10, 10);
        assert_eq!(a.intersection_area(&b), 25);
        let c = bbox(10, 0, 3, 3);
        assert_eq!(a.intersection_area(&c), 0);
    }

    #[test]
    fn filled_square_groups_as_square() {
        assert_eq!(ShapeClass::classify(0.8, 1.0, 1.0, 1.0), ShapeClass::Square);
        assert_eq!(ShapeClass::classify(0.95, 1.0, 0.97, 0.78), ShapeClass::Circular);
        assert_eq!(ShapeClass::classify(0.3, 1.0, 0.4, 0.3), ShapeClass::Complex);
    }

    #[test]
    fn compact_square_is_not_circular() {
        // A filled 30x30 box traced through pixel centres: circularity ~0.84.
        assert_eq!(ShapeClass::classify(0.84, 1.0, 1.0, 1.0), ShapeClass::Square);
        assert_eq!(ShapeClass::classify(0.7, 2.0, 1.0, 1.0), ShapeClass::Rectangle);
        // Filled right triangle: nearly convex, covers half its box.
        assert_eq!(ShapeClass::classify(0.6, 1.0, 0.98, 0.5), ShapeClass::Triangle);
    }
}
