use super::{Vec2, Viewport};

/// Converts a pixel position (top-left origin, +Y down) into NDC
/// (center origin, +Y up) for a surface of `viewport` size.
///
/// `viewport` must be valid; zero-sized surfaces produce non-finite output.
#[inline]
pub fn pixel_to_ndc(pixel: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (pixel.x / viewport.width) * 2.0 - 1.0,
        -((pixel.y / viewport.height) * 2.0 - 1.0),
    )
}

/// Inverse of [`pixel_to_ndc`] for the same `viewport`.
#[inline]
pub fn ndc_to_pixel(ndc: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.width,
        (1.0 - ndc.y) * 0.5 * viewport.height,
    )
}

/// Axis-aligned rectangle in NDC, described by its center and full size.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct NdcRect {
    pub center: Vec2,
    pub size: Vec2,
}

impl NdcRect {
    #[inline]
    pub const fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(center_x, center_y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.center - self.size * 0.5
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.center + self.size * 0.5
    }

    /// Closed containment: both edges count as inside.
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() <= EPS && (a.y - b.y).abs() <= EPS
    }

    // ── pixel_to_ndc ──────────────────────────────────────────────────────

    #[test]
    fn top_left_pixel_maps_to_upper_left_corner() {
        let vp = Viewport::new(800.0, 600.0);
        assert!(close(pixel_to_ndc(Vec2::new(0.0, 0.0), vp), Vec2::new(-1.0, 1.0)));
    }

    #[test]
    fn bottom_right_pixel_maps_to_lower_right_corner() {
        let vp = Viewport::new(800.0, 600.0);
        assert!(close(pixel_to_ndc(Vec2::new(800.0, 600.0), vp), Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn surface_center_maps_to_origin() {
        let vp = Viewport::new(640.0, 480.0);
        assert!(close(pixel_to_ndc(Vec2::new(320.0, 240.0), vp), Vec2::ZERO));
    }

    #[test]
    fn y_axis_is_flipped() {
        let vp = Viewport::new(100.0, 100.0);
        // A quarter of the way down in pixels is half-way up in NDC.
        let ndc = pixel_to_ndc(Vec2::new(50.0, 25.0), vp);
        assert!(close(ndc, Vec2::new(0.0, 0.5)));
    }

    // ── round trip ────────────────────────────────────────────────────────

    #[test]
    fn pixel_round_trip_recovers_input() {
        let vp = Viewport::new(1280.0, 720.0);
        for &(x, y) in &[(0.0, 0.0), (13.5, 700.25), (640.0, 360.0), (1279.0, 1.0)] {
            let p = Vec2::new(x, y);
            let back = ndc_to_pixel(pixel_to_ndc(p, vp), vp);
            assert!((back.x - p.x).abs() < 1e-2, "x: {} vs {}", back.x, p.x);
            assert!((back.y - p.y).abs() < 1e-2, "y: {} vs {}", back.y, p.y);
        }
    }

    // ── NdcRect ───────────────────────────────────────────────────────────

    #[test]
    fn rect_bounds_are_center_plus_minus_half_size() {
        let r = NdcRect::new(0.2, 0.2, 0.5, 0.3);
        assert!(close(r.min(), Vec2::new(-0.05, 0.05)));
        assert!(close(r.max(), Vec2::new(0.45, 0.35)));
    }

    #[test]
    fn rect_contains_edges_inclusively() {
        let r = NdcRect::new(0.0, 0.0, 1.0, 1.0);
        assert!(r.contains(Vec2::new(0.5, 0.5)));
        assert!(r.contains(Vec2::new(-0.5, -0.5)));
        assert!(r.contains(Vec2::new(0.5, 0.0)));
    }

    #[test]
    fn rect_rejects_outside_points() {
        let r = NdcRect::new(0.0, 0.0, 1.0, 1.0);
        assert!(!r.contains(Vec2::new(0.51, 0.0)));
        assert!(!r.contains(Vec2::new(0.0, -0.51)));
    }
}
