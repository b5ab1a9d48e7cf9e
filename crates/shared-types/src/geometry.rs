//! Page-point geometry shared by every pipeline stage.

use serde::{Deserialize, Serialize};

/// Points per inch in page space.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Points per centimeter.
pub const POINTS_PER_CM: f64 = 72.0 / 2.54;

/// Axis-aligned rectangle in page-point coordinates, top-left origin.
///
/// Invariant: `x0 <= x1` and `y0 <= y1` after construction through `new`
/// or `normalized`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }.normalized()
    }

    /// Reorder corners so that (x0, y0) is the top-left corner.
    pub fn normalized(self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn top_left(&self) -> (f64, f64) {
        (self.x0, self.y0)
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Duplicate test used by redaction dedup: both top-left coordinate
    /// deltas strictly below `tolerance`. Page equality is the caller's
    /// responsibility.
    pub fn near_duplicate(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.x0 - other.x0).abs() < tolerance && (self.y0 - other.y0).abs() < tolerance
    }

    /// Multiply both corners by per-axis scale factors.
    pub fn scale(&self, sx: f64, sy: f64) -> BoundingBox {
        BoundingBox {
            x0: self.x0 * sx,
            y0: self.y0 * sy,
            x1: self.x1 * sx,
            y1: self.y1 * sy,
        }
    }

    /// Clamp to the page rectangle. Boxes may exceed page bounds while
    /// flowing through the pipeline; rendering and redaction clamp.
    pub fn clamp_to(&self, page: &PageDimensions) -> BoundingBox {
        BoundingBox {
            x0: self.x0.clamp(0.0, page.width),
            y0: self.y0.clamp(0.0, page.height),
            x1: self.x1.clamp(0.0, page.width),
            y1: self.y1.clamp(0.0, page.height),
        }
    }
}

/// Reported or native page size, in whatever unit the context implies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero or negative extents; conversion treats these as unknown.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Coordinate unit reported by an extraction provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceUnit {
    Pixel,
    Inch,
    Centimeter,
    Point,
}

impl SourceUnit {
    /// Parse a provider-reported unit string. Unknown units fall back to
    /// `Point`, which converts as pass-through.
    pub fn from_report(report: &str) -> SourceUnit {
        match report.trim().to_lowercase().as_str() {
            "pixel" | "px" => SourceUnit::Pixel,
            "inch" | "in" => SourceUnit::Inch,
            "centimeter" | "cm" => SourceUnit::Centimeter,
            _ => SourceUnit::Point,
        }
    }
}

impl std::fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceUnit::Pixel => "pixel",
            SourceUnit::Inch => "inch",
            SourceUnit::Centimeter => "centimeter",
            SourceUnit::Point => "point",
        };
        write!(f, "{}", name)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn box_strategy() -> impl Strategy<Value = BoundingBox> {
        (0.0f64..1000.0, 0.0f64..1000.0, 0.0f64..1000.0, 0.0f64..1000.0)
            .prop_map(|(a, b, c, d)| BoundingBox::new(a, b, c, d))
    }

    proptest! {
        /// Property: construction always yields ordered corners
        #[test]
        fn normalized_corners_ordered(b in box_strategy()) {
            prop_assert!(b.x0 <= b.x1);
            prop_assert!(b.y0 <= b.y1);
        }

        /// Property: a union contains both inputs
        #[test]
        fn union_contains_inputs(a in box_strategy(), b in box_strategy()) {
            let u = a.union(&b);
            prop_assert!(u.x0 <= a.x0 && u.x0 <= b.x0);
            prop_assert!(u.y0 <= a.y0 && u.y0 <= b.y0);
            prop_assert!(u.x1 >= a.x1 && u.x1 >= b.x1);
            prop_assert!(u.y1 >= a.y1 && u.y1 >= b.y1);
        }

        /// Property: near-duplicate is symmetric
        #[test]
        fn near_duplicate_symmetric(a in box_strategy(), b in box_strategy(), tol in 0.1f64..50.0) {
            prop_assert_eq!(a.near_duplicate(&b, tol), b.near_duplicate(&a, tol));
        }

        /// Property: clamping lands inside the page
        #[test]
        fn clamp_stays_on_page(b in box_strategy()) {
            let page = PageDimensions::new(612.0, 792.0);
            let c = b.clamp_to(&page);
            prop_assert!(c.x0 >= 0.0 && c.x1 <= page.width);
            prop_assert!(c.y0 >= 0.0 && c.y1 <= page.height);
        }
    }
}
