/// Per-frame profiling counters kept by the render device.
///
/// Counters reset at `begin_frame`; rates are computed at `end_frame`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    /// Logical state changes that are cheap to apply.
    pub minor_state_changes: u64,
    /// Logical state changes that rebind objects.
    pub major_state_changes: u64,
    /// Native calls classified as minor.
    pub minor_native_changes: u64,
    /// Native calls classified as major (binds, draws, clears, swaps).
    pub major_native_changes: u64,
    pub push_states: u64,
    pub primitives: u64,
    pub triangles: u64,

    pub frame_rate: f32,
    pub triangle_rate: f64,
    pub smooth_frame_rate: f32,
    pub smooth_triangle_rate: f64,
    pub smooth_triangles: f64,
}

impl RenderStats {
    /// Total native calls emitted since the last reset.
    #[inline]
    pub fn native_calls(&self) -> u64 {
        self.minor_native_changes + self.major_native_changes
    }

    /// Total logical state changes since the last reset.
    #[inline]
    pub fn state_changes(&self) -> u64 {
        self.minor_state_changes + self.major_state_changes
    }

    /// Clears the per-frame counters; smoothed rates are kept.
    pub fn reset(&mut self) {
        self.minor_state_changes = 0;
        self.major_state_changes = 0;
        self.minor_native_changes = 0;
        self.major_native_changes = 0;
        self.push_states = 0;
        self.primitives = 0;
        self.triangles = 0;
    }

    /// Updates the rates from the wall-clock time `dt` (seconds) since the last frame.
    pub fn end_frame(&mut self, dt: f64) {
        let dt = if dt <= 0.0 { 0.0001 } else { dt };

        self.frame_rate = (1.0 / dt) as f32;
        self.triangle_rate = self.triangles as f64 / dt;

        let mut a = (dt * 0.6).clamp(0.001, 1.0);
        let fr = self.frame_rate;
        let discrepancy = (self.smooth_frame_rate - fr).abs() / self.smooth_frame_rate.max(fr);
        if discrepancy > 0.18 {
            a = 1.0;
        }

        self.smooth_frame_rate = lerp(self.smooth_frame_rate as f64, fr as f64, a) as f32;
        self.smooth_triangle_rate = lerp(self.smooth_triangle_rate, self.triangle_rate, a);
        self.smooth_triangles = lerp(self.smooth_triangles, self.triangles as f64, a);

        if !self.smooth_frame_rate.is_finite() {
            self.smooth_frame_rate = 1_000_000.0;
        } else if self.smooth_frame_rate < 0.0 {
            self.smooth_frame_rate = 0.0;
        }
        self.smooth_triangle_rate = sanitize(self.smooth_triangle_rate);
        self.smooth_triangles = sanitize(self.smooth_triangles);
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn sanitize(v: f64) -> f64 {
    if !v.is_finite() {
        1e20
    } else if v < 0.0 {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_jumps_to_measured_rate() {
        let mut stats = RenderStats::default();
        stats.end_frame(0.02);
        assert!((stats.frame_rate - 50.0).abs() < 1e-3);
        assert!((stats.smooth_frame_rate - 50.0).abs() < 1e-3);
    }

    #[test]
    fn small_change_is_smoothed() {
        let mut stats = RenderStats::default();
        stats.end_frame(0.020);
        stats.end_frame(0.021);
        assert!(stats.smooth_frame_rate < 50.0);
        assert!(stats.smooth_frame_rate > stats.frame_rate);
    }

    #[test]
    fn large_change_snaps() {
        let mut stats = RenderStats::default();
        stats.end_frame(0.020);
        stats.end_frame(0.100);
        assert!((stats.smooth_frame_rate - 10.0).abs() < 1e-3);
    }

    #[test]
    fn non_positive_dt_is_clamped() {
        let mut stats = RenderStats::default();
        stats.end_frame(0.0);
        assert!(stats.frame_rate.is_finite());
        assert!(stats.smooth_frame_rate.is_finite());
    }

    #[test]
    fn reset_keeps_smoothed_rates() {
        let mut stats = RenderStats { triangles: 10, push_states: 2, ..Default::default() };
        stats.end_frame(0.02);
        stats.reset();
        assert_eq!(stats.triangles, 0);
        assert_eq!(stats.push_states, 0);
        assert!(stats.smooth_frame_rate > 0.0);
    }
}
