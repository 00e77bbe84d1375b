//! Minimal scene geometry.

/// An axis-aligned rectangle in scene coordinates.
///
/// `(x, y)` is the top-left corner; scene y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width, non-negative for normalized rectangles.
    pub width: f64,
    /// Height, non-negative for normalized rectangles.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a normalized rectangle spanning two opposite corners,
    /// in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let x = x0.min(x1);
        let y = y0.min(y1);
        Self {
            x,
            y,
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Left edge.
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Top edge.
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}
