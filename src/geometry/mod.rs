//! Geometric primitives for page coordinates.
//!
//! Glyph boxes and synthesized word corners share these types. All values are
//! in layout units with the origin in the top-left corner of the page.

use serde::{Deserialize, Serialize};

/// Round a coordinate to two decimal places.
///
/// Every coordinate leaving the crate goes through this function so that two
/// runs over identical input produce identical output.
///
/// # Examples
///
/// ```
/// use glyph_anchor::geometry::round2;
///
/// assert_eq!(round2(12.3456), 12.35);
/// assert_eq!(round2(700.0), 700.0);
/// ```
#[inline]
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Create a point with both coordinates rounded to two decimals.
    pub fn rounded(x: f32, y: f32) -> Self {
        Self::new(round2(x), round2(y))
    }
}

/// A rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from two corner points.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::geometry::Rect;
    ///
    /// let rect = Rect::from_points(10.0, 20.0, 110.0, 70.0);
    /// assert_eq!(rect.x, 10.0);
    /// assert_eq!(rect.y, 20.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}
