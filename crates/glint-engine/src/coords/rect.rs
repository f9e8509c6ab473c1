use glam::Vec2;

/// Axis-aligned rectangle in pixels (top-left origin), stored as min/max corners.
///
/// The infinite rectangle ([`Rect2D::inf`]) is the "no clipping" sentinel used by
/// the render device.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect2D {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect2D {
    #[inline]
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + w, y + h),
        }
    }

    #[inline]
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { min: origin, max: origin + size }
    }

    /// Rectangle at the origin with the given size.
    #[inline]
    pub fn from_size(w: f32, h: f32) -> Self {
        Self::new(0.0, 0.0, w, h)
    }

    /// Rectangle spanning `[x0, x1] x [y0, y1]`.
    #[inline]
    pub const fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { min: Vec2::new(x0, y0), max: Vec2::new(x1, y1) }
    }

    /// The unbounded rectangle.
    #[inline]
    pub const fn inf() -> Self {
        Self::from_corners(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::INFINITY, f32::INFINITY)
    }

    /// A rectangle covering no pixels.
    #[inline]
    pub const fn empty() -> Self {
        Self::from_corners(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn x0(self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn y0(self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn x1(self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn y1(self) -> f32 {
        self.max.y
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn area(self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Expands the edges outward to whole pixels.
    #[inline]
    pub fn snapped_out(self) -> Self {
        Self { min: self.min.floor(), max: self.max.ceil() }
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.x0() && p.y >= self.y0() && p.x < self.x1() && p.y < self.y1()
    }

    #[inline]
    pub fn intersect(self, other: Rect2D) -> Option<Rect2D> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if max.x - min.x <= 0.0 || max.y - min.y <= 0.0 {
            None
        } else {
            Some(Rect2D { min, max })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect2D { Rect2D::new(x, y, w, h) }

    // ── sentinels ─────────────────────────────────────────────────────────

    #[test]
    fn inf_is_not_finite_and_not_empty() {
        assert!(!Rect2D::inf().is_finite());
        assert!(!Rect2D::inf().is_empty());
    }

    #[test]
    fn empty_has_zero_area() {
        assert!(Rect2D::empty().is_empty());
        assert_eq!(Rect2D::empty().area(), 0.0);
    }

    #[test]
    fn negative_size_is_empty_with_zero_area() {
        let rect = r(0.0, 0.0, -4.0, 5.0);
        assert!(rect.is_empty());
        assert_eq!(rect.area(), 0.0);
    }

    // ── snapping ──────────────────────────────────────────────────────────

    #[test]
    fn snapped_out_floors_min_and_ceils_max() {
        let s = r(1.5, 2.25, 3.0, 3.0).snapped_out();
        assert_eq!(s, r(1.0, 2.0, 4.0, 4.0));
    }

    #[test]
    fn snapped_out_keeps_integral_rect() {
        let rect = r(2.0, 3.0, 10.0, 20.0);
        assert_eq!(rect.snapped_out(), rect);
    }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_top_left_inclusive() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn contains_bottom_right_exclusive() {
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(10.0, 10.0)));
    }

    // ── intersect ─────────────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(b), Some(r(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn intersect_with_inf_is_identity() {
        let a = r(3.0, 4.0, 10.0, 10.0);
        assert_eq!(a.intersect(Rect2D::inf()), Some(a));
    }

    #[test]
    fn intersect_touching_edge_returns_none() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersect(b).is_none());
    }
}
