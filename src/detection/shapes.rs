use crate::detection::config::{DetectionConfig, ShapeFilter};
use crate::models::Contour;

/// Shape-only checks: solidity, extent and the selected shape mode.
pub fn passes_shape(contour: &Contour, config: &DetectionConfig) -> bool {
    let solidity = contour.solidity();
    if solidity < config.min_solidity || solidity > config.max_solidity {
        return false;
    }
    if contour.extent() < config.min_extent {
        return false;
    }
    match config.shape_filter {
        ShapeFilter::None => true,
        ShapeFilter::Circularity { min, max } => {
            let c = contour.circularity();
            c >= min && c <= max
        }
        ShapeFilter::AspectRatio { min, max } => {
            let r = contour.aspect_ratio();
            r >= min && r <= max
        }
    }
}

pub fn passes_area(contour: &Contour, config: &DetectionConfig) -> bool {
    contour.area >= config.min_area && contour.area <= config.max_area
}

/// Keep contours within the area bounds that also pass the shape checks.
/// Only these take part in overlap suppression.
pub fn filter_candidates(contours: Vec<Contour>, config: &DetectionConfig) -> Vec<Contour> {
    contours
        .into_iter()
        .filter(|c| passes_area(c, config) && passes_shape(c, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;

    fn contour(width: u32, height: u32, area: f64, hull_area: f64, perimeter: f64) -> Contour {
        Contour {
            min_x: 0,
            min_y: 0,
            max_x: width - 1,
            max_y: height - 1,
            area,
            scan_x: 0,
            scan_y: 0,
            centroid: Point::new(width as f64 / 2.0, height as f64 / 2.0),
            perimeter,
            hull_area,
        }
    }

    #[test]
    fn solidity_bounds_reject_concave_shapes() {
        let config = DetectionConfig::default().with_solidity(0.8, 1.0);
        let compact = contour(20, 20, 380.0, 400.0, 76.0);
        let spindly = contour(20, 20, 120.0, 400.0, 150.0);
        assert!(passes_shape(&compact, &config));
        assert!(!passes_shape(&spindly, &config));
    }

    #[test]
    fn aspect_ratio_mode_rejects_lines() {
        let config = DetectionConfig::default()
            .with_shape_filter(ShapeFilter::AspectRatio { min: 0.5, max: 2.0 });
        let line = contour(60, 3, 180.0, 180.0, 120.0);
        assert!(!passes_shape(&line, &config));
    }

    #[test]
    fn circularity_mode_uses_perimeter() {
        let config = DetectionConfig::default()
            .with_shape_filter(ShapeFilter::Circularity { min: 0.8, max: 1.2 });
        // Disc of radius 10: area ~314, perimeter ~63.
        let disc = contour(21, 21, 314.0, 320.0, 62.8);
        // Same area spread along a jagged outline.
        let jagged = contour(21, 21, 314.0, 400.0, 140.0);
        assert!(passes_shape(&disc, &config));
        assert!(!passes_shape(&jagged, &config));
    }

    #[test]
    fn oversized_contours_are_not_candidates() {
        let config = DetectionConfig::default().with_area(50.0, 1000.0);
        let kept = filter_candidates(
            vec![contour(80, 80, 5000.0, 5100.0, 250.0), contour(10, 10, 90.0, 95.0, 34.0)],
            &config,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].area, 90.0);
    }

    #[test]
    fn area_bounds_are_inclusive() {
        let config = DetectionConfig::default().with_area(100.0, 200.0);
        assert!(passes_area(&contour(10, 10, 100.0, 100.0, 40.0), &config));
        assert!(passes_area(&contour(10, 20, 200.0, 200.0, 60.0), &config));
        assert!(!passes_area(&contour(10, 21, 210.0, 210.0, 62.0), &config));
    }
}
