// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page and canvas geometry.
//
// Page space is measured in PDF points with the origin at the top-left corner
// of the page's MediaBox and y growing downward. Canvas space is measured in
// screen pixels; the two are related by the display zoom factor.

use serde::{Deserialize, Serialize};

/// A point in page space (points, top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position of this point on a canvas displayed at `zoom`.
    pub fn to_canvas(self, zoom: f32) -> CanvasPoint {
        CanvasPoint::new(self.x * zoom, self.y * zoom)
    }
}

/// An axis-aligned rectangle in page space.
///
/// Always normalised: `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageRect {
    /// Build a rectangle from two opposite corners in any order.
    pub fn from_corners(a: PagePoint, b: PagePoint) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    /// Build a rectangle from its origin and size.
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_corners(PagePoint::new(x, y), PagePoint::new(x + width, y + height))
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> PagePoint {
        PagePoint::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Whether the rectangle encloses no area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: PagePoint) -> bool {
        point.x >= self.x0 && point.x <= self.x1 && point.y >= self.y0 && point.y <= self.y1
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            x0: self.x0 - margin,
            y0: self.y0 - margin,
            x1: self.x1 + margin,
            y1: self.y1 + margin,
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &PageRect) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// This rectangle on a canvas displayed at `zoom`, truncated to whole pixels.
    pub fn to_canvas(&self, zoom: f32) -> CanvasRect {
        CanvasRect {
            x0: (self.x0 * zoom) as i32,
            y0: (self.y0 * zoom) as i32,
            x1: (self.x1 * zoom) as i32,
            y1: (self.y1 * zoom) as i32,
        }
    }
}

impl std::fmt::Display for PageRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect({:.1}, {:.1}, {:.1}, {:.1})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

/// A point on the display canvas, in pixels (scroll offset already applied).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Page-space position of this canvas point at `zoom`.
    pub fn to_page(self, zoom: f32) -> PagePoint {
        PagePoint::new(self.x / zoom, self.y / zoom)
    }
}

/// Integer pixel rectangle used for drawing overlays on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl CanvasRect {
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}
