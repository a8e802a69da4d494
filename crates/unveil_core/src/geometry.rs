//! Rectangles and viewport intersection
//!
//! All coordinates are document coordinates in pixels. The viewport is just
//! another rectangle that moves when the page scrolls.

/// An axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Rectangle of the given size anchored at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Move the rectangle by an offset
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Same size, new vertical position
    pub fn with_y(self, y: f32) -> Self {
        Self { y, ..self }
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Overlapping region of two rectangles, if they overlap with positive area
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > left && bottom > top {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }
}

/// Fraction of `target`'s area that lies inside `viewport`, in `0.0..=1.0`
///
/// Zero-area targets count as fully visible when their origin is inside the
/// viewport, which matches how browsers report collapsed elements.
pub fn intersection_ratio(target: &Rect, viewport: &Rect) -> f32 {
    if target.is_empty() {
        return if viewport.contains_point(target.x, target.y) {
            1.0
        } else {
            0.0
        };
    }

    match target.intersection(viewport) {
        Some(overlap) => (overlap.area() / target.area()).clamp(0.0, 1.0),
        None => 0.0,
    }
}
