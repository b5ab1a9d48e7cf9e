//! Conversion of provider-reported geometry into page-point space.
//!
//! Extraction providers report polygons in whatever unit their engine
//! works in: pixels against a rendered image, inches, centimeters, or
//! already points. Everything downstream works in points anchored to the
//! page's native size, so every span goes through [`polygon_to_box`] and
//! [`to_points`] exactly once, at ingestion.

use shared_types::{BoundingBox, PageDimensions, SourceUnit, POINTS_PER_CM, POINTS_PER_INCH};

/// Axis-aligned bounding box over a flat `[x0, y0, x1, y1, ...]` polygon.
/// Degenerate polygons (fewer than two vertices) collapse to a zero box
/// at the origin.
pub fn polygon_to_box(polygon: &[f64]) -> BoundingBox {
    if polygon.len() < 4 {
        return BoundingBox::new(0.0, 0.0, 0.0, 0.0);
    }
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for pair in polygon.chunks_exact(2) {
        min_x = min_x.min(pair[0]);
        max_x = max_x.max(pair[0]);
        min_y = min_y.min(pair[1]);
        max_y = max_y.max(pair[1]);
    }
    BoundingBox::new(min_x, min_y, max_x, max_y)
}

/// Convert a box from the provider's unit into page points.
///
/// - inches and centimeters use fixed factors;
/// - pixels scale per axis by native/reported page size;
/// - points pass through, unless the reported size is known and differs
///   from the native size, in which case the same per-axis scaling applies
///   (the provider measured against a resized rendition).
///
/// Degenerate reported dimensions fall back to pass-through rather than
/// dividing by zero.
pub fn to_points(
    bbox: BoundingBox,
    unit: SourceUnit,
    reported: PageDimensions,
    native: PageDimensions,
) -> BoundingBox {
    match unit {
        SourceUnit::Inch => bbox.scale(POINTS_PER_INCH, POINTS_PER_INCH),
        SourceUnit::Centimeter => bbox.scale(POINTS_PER_CM, POINTS_PER_CM),
        SourceUnit::Pixel => bbox.scale(axis_scale(native.width, reported.width), axis_scale(native.height, reported.height)),
        SourceUnit::Point => {
            if reported.is_degenerate() || dims_match(reported, native) {
                bbox
            } else {
                bbox.scale(
                    axis_scale(native.width, reported.width),
                    axis_scale(native.height, reported.height),
                )
            }
        }
    }
}

/// Polygon in a source unit straight to a page-point box.
pub fn polygon_to_box_points(
    polygon: &[f64],
    unit: SourceUnit,
    reported: PageDimensions,
    native: PageDimensions,
) -> BoundingBox {
    to_points(polygon_to_box(polygon), unit, reported, native)
}

fn axis_scale(native: f64, reported: f64) -> f64 {
    if reported > 0.0 {
        native / reported
    } else {
        1.0
    }
}

fn dims_match(a: PageDimensions, b: PageDimensions) -> bool {
    (a.width - b.width).abs() < 0.01 && (a.height - b.height).abs() < 0.01
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LETTER: PageDimensions = PageDimensions { width: 612.0, height: 792.0 };

    #[test]
    fn test_polygon_collapses_to_min_max() {
        let polygon = [10.0, 20.0, 50.0, 20.0, 50.0, 35.0, 10.0, 35.0];
        assert_eq!(
            polygon_to_box(&polygon),
            BoundingBox { x0: 10.0, y0: 20.0, x1: 50.0, y1: 35.0 }
        );
    }

    #[test]
    fn test_skewed_polygon_still_axis_aligned() {
        // Rotated quads from OCR must cover their full extent.
        let polygon = [12.0, 8.0, 48.0, 10.0, 46.0, 22.0, 10.0, 20.0];
        assert_eq!(
            polygon_to_box(&polygon),
            BoundingBox { x0: 10.0, y0: 8.0, x1: 48.0, y1: 22.0 }
        );
    }

    #[test]
    fn test_short_polygon_yields_zero_box() {
        assert_eq!(polygon_to_box(&[5.0, 5.0]), BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(polygon_to_box(&[]), BoundingBox::new(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_inch_conversion() {
        let reported = PageDimensions::new(8.5, 11.0);
        let b = to_points(
            BoundingBox::new(1.0, 1.0, 2.0, 1.5),
            SourceUnit::Inch,
            reported,
            LETTER,
        );
        assert_eq!(b, BoundingBox { x0: 72.0, y0: 72.0, x1: 144.0, y1: 108.0 });
    }

    #[test]
    fn test_centimeter_conversion() {
        let reported = PageDimensions::new(21.0, 29.7);
        let b = to_points(
            BoundingBox::new(2.54, 2.54, 5.08, 2.54),
            SourceUnit::Centimeter,
            reported,
            PageDimensions::new(595.0, 842.0),
        );
        assert!((b.x0 - 72.0).abs() < 1e-9);
        assert!((b.x1 - 144.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_conversion_scales_per_axis() {
        // 1224x1584 render of a letter page: exactly 2x in both axes.
        let reported = PageDimensions::new(1224.0, 1584.0);
        let b = to_points(
            BoundingBox::new(100.0, 200.0, 300.0, 400.0),
            SourceUnit::Pixel,
            reported,
            LETTER,
        );
        assert_eq!(b, BoundingBox { x0: 50.0, y0: 100.0, x1: 150.0, y1: 200.0 });
    }

    #[test]
    fn test_zero_reported_dimensions_pass_through() {
        let reported = PageDimensions::new(0.0, 0.0);
        let original = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(to_points(original, SourceUnit::Pixel, reported, LETTER), original);
    }

    #[test]
    fn test_point_passes_through_when_sizes_match() {
        let original = BoundingBox::new(100.0, 100.0, 200.0, 120.0);
        assert_eq!(to_points(original, SourceUnit::Point, LETTER, LETTER), original);
    }

    #[test]
    fn test_point_rescales_when_reported_size_differs() {
        // Provider measured points against a half-size rendition.
        let reported = PageDimensions::new(306.0, 396.0);
        let b = to_points(
            BoundingBox::new(100.0, 100.0, 200.0, 120.0),
            SourceUnit::Point,
            reported,
            LETTER,
        );
        assert_eq!(b, BoundingBox { x0: 200.0, y0: 200.0, x1: 400.0, y1: 240.0 });
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn box_strategy() -> impl Strategy<Value = BoundingBox> {
        (0.1f64..500.0, 0.1f64..500.0, 0.1f64..500.0, 0.1f64..500.0)
            .prop_map(|(a, b, c, d)| BoundingBox::new(a, b, c, d))
    }

    proptest! {
        /// Property: inch conversion round-trips within float tolerance
        #[test]
        fn inch_round_trip(b in box_strategy()) {
            let native = PageDimensions::new(612.0, 792.0);
            let pts = to_points(b, SourceUnit::Inch, PageDimensions::new(8.5, 11.0), native);
            let back = pts.scale(1.0 / POINTS_PER_INCH, 1.0 / POINTS_PER_INCH);
            prop_assert!((back.x0 - b.x0).abs() < 1e-9);
            prop_assert!((back.y0 - b.y0).abs() < 1e-9);
            prop_assert!((back.x1 - b.x1).abs() < 1e-9);
            prop_assert!((back.y1 - b.y1).abs() < 1e-9);
        }

        /// Property: pixel conversion round-trips through the inverse scale
        #[test]
        fn pixel_round_trip(
            b in box_strategy(),
            rw in 1.0f64..4000.0,
            rh in 1.0f64..4000.0,
        ) {
            let native = PageDimensions::new(612.0, 792.0);
            let reported = PageDimensions::new(rw, rh);
            let pts = to_points(b, SourceUnit::Pixel, reported, native);
            let back = pts.scale(rw / native.width, rh / native.height);
            prop_assert!((back.x0 - b.x0).abs() < 1e-6);
            prop_assert!((back.y1 - b.y1).abs() < 1e-6);
        }

        /// Property: degenerate reported dimensions never panic and never
        /// produce non-finite coordinates
        #[test]
        fn degenerate_dims_stay_finite(
            b in box_strategy(),
            rw in proptest::option::of(0.0f64..0.0001),
        ) {
            let native = PageDimensions::new(612.0, 792.0);
            let reported = PageDimensions::new(rw.unwrap_or(0.0), 0.0);
            for unit in [SourceUnit::Pixel, SourceUnit::Point, SourceUnit::Inch, SourceUnit::Centimeter] {
                let out = to_points(b, unit, reported, native);
                prop_assert!(out.x0.is_finite() && out.y0.is_finite());
                prop_assert!(out.x1.is_finite() && out.y1.is_finite());
            }
        }

        /// Property: normalization preserves corner ordering
        #[test]
        fn output_corners_ordered(polygon in proptest::collection::vec(0.0f64..1000.0, 4..16)) {
            let b = polygon_to_box(&polygon);
            prop_assert!(b.x0 <= b.x1);
            prop_assert!(b.y0 <= b.y1);
        }
    }
}
