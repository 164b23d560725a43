//! Points, rectangles and 2x3 affine matrices in image-pixel space.
//!
//! Integer rectangles follow the usual raster convention: `(x, y)` is the
//! top-left corner and `right()`/`bottom()` are exclusive.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PointF) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(self, dx: f32, dy: f32) -> PointF {
        PointF::new(self.x + dx, self.y + dy)
    }

    pub fn scaled(self, factor: f32) -> PointF {
        PointF::new(self.x * factor, self.y * factor)
    }

    pub fn round(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// Floating-point rectangle (x, y, width, height).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// `[x1, y1, x2, y2]`
    pub fn corners(&self) -> [f32; 4] {
        [self.x, self.y, self.right(), self.bottom()]
    }

    pub fn center(&self) -> PointF {
        PointF::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn scaled(&self, factor: f32) -> RectF {
        RectF::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Rounds x, y, width and height independently, like ImageSharp's
    /// `Rectangle.Round`; the right edge is not rounded on its own.
    pub fn round(&self) -> Rect {
        Rect::new(
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round() as i32,
            self.height.round() as i32,
        )
    }
}

/// Integer rectangle (x, y, width, height).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width as i32, size.height as i32)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Integer center, truncating half-pixels.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn center_f(&self) -> PointF {
        PointF::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// True if `other` lies completely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        self.x <= other.x
            && other.right() <= self.right()
            && self.y <= other.y
            && other.bottom() <= self.bottom()
    }

    /// Overlapping area, or an empty rect if there is none.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 >= x1 && y2 >= y1 {
            Rect::new(x1, y1, x2 - x1, y2 - y1)
        } else {
            Rect::default()
        }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn scale(&self, factor: f64) -> Rect {
        Rect::new(
            (self.x as f64 * factor).round() as i32,
            (self.y as f64 * factor).round() as i32,
            (self.width as f64 * factor).round() as i32,
            (self.height as f64 * factor).round() as i32,
        )
    }

    /// Scales width and height, keeping the rect centered where it was.
    pub fn scale_centered(&self, factor: f64) -> Rect {
        let w = (self.width as f64 * factor).round() as i32;
        let h = (self.height as f64 * factor).round() as i32;
        let dw = w - self.width;
        let dh = h - self.height;
        Rect::new(self.x - dw / 2, self.y - dh / 2, w, h)
    }

    /// Square with the longer edge of `self`, sharing its center.
    pub fn minimum_superset_square(&self) -> Rect {
        let (cx, cy) = self.center();
        let longer = self.width.max(self.height);
        let half = (longer + 1) / 2;
        Rect::new(cx - half, cy - half, longer, longer)
    }

    /// Grows both edges to the diagonal so that any rotation of `self` about
    /// its center stays inside the result.
    pub fn rotation_invariant_crop_area(&self) -> Rect {
        let w = self.width as f64;
        let h = self.height as f64;
        let r = (w * w + h * h).sqrt() as i32;
        let dx = r - self.width;
        let dy = r - self.height;
        Rect::new(
            self.x - dx / 2,
            self.y - dy / 2,
            self.width + dx,
            self.height + dy,
        )
    }

    /// Bounding rect of the four corners after transforming them by `m`.
    ///
    /// The left and top edges are floored. The right and bottom edges are
    /// ceiled plus one pixel, so bilinear sampling at the far edge still has
    /// its neighbour.
    pub fn superset_area_of_transform(&self, m: &Affine2) -> Rect {
        let (x, y) = (self.x as f32, self.y as f32);
        let (r, b) = (self.right() as f32, self.bottom() as f32);
        let corners = [
            m.transform_point(PointF::new(x, y)),
            m.transform_point(PointF::new(r, y)),
            m.transform_point(PointF::new(x, b)),
            m.transform_point(PointF::new(r, b)),
        ];

        let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

        let x = min_x.floor() as i32;
        let y = min_y.floor() as i32;
        let right = max_x.ceil() as i32 + 1;
        let bottom = max_y.ceil() as i32 + 1;
        Rect::new(x, y, right - x, bottom - y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }

    pub fn scale(&self, factor: f64) -> Size {
        Size::new(
            (self.width as f64 * factor).round() as u32,
            (self.height as f64 * factor).round() as u32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Factor that fits `size` into `into` while preserving aspect ratio.
/// Never greater than 1.
pub fn scale_factor_to_fit_into(size: Size, into: Size) -> f32 {
    let x_scale = into.width as f64 / size.width as f64;
    let y_scale = into.height as f64 / size.height as f64;
    x_scale.min(y_scale).min(1.0) as f32
}

/// 2x3 affine matrix acting on column vectors:
///
/// ```text
/// | a  b  tx |   | x |
/// | c  d  ty | * | y |
///                | 1 |
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub tx: f32,
    pub c: f32,
    pub d: f32,
    pub ty: f32,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    pub const fn new(a: f32, b: f32, tx: f32, c: f32, d: f32, ty: f32) -> Self {
        Self { a, b, tx, c, d, ty }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, tx, 0.0, 1.0, ty)
    }

    /// Rotation by `degrees` around `center`. Positive angles turn clockwise
    /// on screen since the y axis points down.
    pub fn rotation_degrees(degrees: f32, center: PointF) -> Self {
        let (sin, cos) = (degrees as f64).to_radians().sin_cos();
        let (cx, cy) = (center.x as f64, center.y as f64);
        Self::new(
            cos as f32,
            -sin as f32,
            (cx - cos * cx + sin * cy) as f32,
            sin as f32,
            cos as f32,
            (cy - sin * cx - cos * cy) as f32,
        )
    }

    /// Composition that applies `self` first and `next` afterwards.
    pub fn then(&self, next: &Affine2) -> Affine2 {
        let n = next;
        Affine2::new(
            n.a * self.a + n.b * self.c,
            n.a * self.b + n.b * self.d,
            n.a * self.tx + n.b * self.ty + n.tx,
            n.c * self.a + n.d * self.c,
            n.c * self.b + n.d * self.d,
            n.c * self.tx + n.d * self.ty + n.ty,
        )
    }

    pub fn transform_point(&self, p: PointF) -> PointF {
        PointF::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// `None` if the linear part is singular.
    pub fn invert(&self) -> Option<Affine2> {
        let (a, b, c, d) = (self.a as f64, self.b as f64, self.c as f64, self.d as f64);
        let (tx, ty) = (self.tx as f64, self.ty as f64);
        let det = a * d - b * c;
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let (ia, ib, ic, id) = (d * inv, -b * inv, -c * inv, a * inv);
        Some(Affine2::new(
            ia as f32,
            ib as f32,
            (-(ia * tx + ib * ty)) as f32,
            ic as f32,
            id as f32,
            (-(ic * tx + id * ty)) as f32,
        ))
    }

    /// Length of the transformed x unit vector.
    pub fn h_scale_factor(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }

    /// Length of the transformed y unit vector.
    pub fn v_scale_factor(&self) -> f32 {
        (self.b * self.b + self.d * self.d).sqrt()
    }
}
