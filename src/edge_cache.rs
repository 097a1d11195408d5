//! Length-parameterized traversal of a polygon boundary.
//!
//! The placer's corner search walks an NFP contour by a normalized
//! parameter `t` in `[0, 1)` rather than by vertex index, so that the local
//! minimizer can treat the boundary as a continuous 1-D domain. `EdgeCache`
//! precomputes the cumulative arc length at each vertex once per contour so
//! `coords(t)` is a binary search plus a lerp instead of a linear walk.

use crate::units::Point;

/// A single boundary, ready for length-parameterized lookups.
#[derive(Debug, Clone)]
pub struct EdgeCache {
    vertices: Vec<Point>,
    /// `cumulative[i]` is the arc length from the start of the ring to
    /// `vertices[i]`. Has `vertices.len()` entries; `cumulative[0] == 0.0`.
    cumulative: Vec<f64>,
    total_length: f64,
}

impl EdgeCache {
    /// Builds a cache over a closed ring (first vertex repeated as last).
    pub fn new(contour: &[Point]) -> Self {
        let mut vertices = contour.to_vec();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        assert!(vertices.len() >= 3, "a boundary needs at least 3 vertices");

        let n = vertices.len();
        let mut cumulative = Vec::with_capacity(n);
        let mut acc = 0.0;
        for i in 0..n {
            cumulative.push(acc);
            let (x0, y0) = vertices[i].to_f64();
            let (x1, y1) = vertices[(i + 1) % n].to_f64();
            acc += ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        }

        Self {
            vertices,
            cumulative,
            total_length: acc,
        }
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The point at normalized arc-length parameter `t` (wrapped into
    /// `[0, 1)`), linearly interpolated between the bracketing vertices.
    pub fn coords(&self, t: f64) -> Point {
        if self.total_length <= 0.0 {
            return self.vertices[0];
        }
        let t = t.rem_euclid(1.0);
        let target = t * self.total_length;

        let n = self.vertices.len();
        // First vertex index whose cumulative length exceeds the target.
        let idx = self.cumulative.partition_point(|&c| c <= target);
        let start_idx = if idx == 0 { n - 1 } else { idx - 1 };
        let end_idx = (start_idx + 1) % n;

        let seg_start = self.cumulative[start_idx];
        let seg_len = if start_idx + 1 < n {
            self.cumulative[start_idx + 1] - seg_start
        } else {
            self.total_length - seg_start
        };

        let local = (target - seg_start).max(0.0);
        let frac = if seg_len > 0.0 { (local / seg_len).min(1.0) } else { 0.0 };

        let (x0, y0) = self.vertices[start_idx].to_f64();
        let (x1, y1) = self.vertices[end_idx].to_f64();
        Point::from_f64(x0 + frac * (x1 - x0), y0 + frac * (y1 - y0))
    }

    /// A subsample of vertex parameters, one roughly every `stride`
    /// vertices, used to seed the minimizer at several starting points
    /// instead of only `t = 0`. `stride = round(n / n^(accuracy^(1/3)))`,
    /// clamped to at least 1 so every vertex is a candidate when `n` is
    /// small.
    pub fn corners(&self, accuracy: f64) -> Vec<f64> {
        let n = self.vertices.len();
        if n == 0 {
            return Vec::new();
        }
        let accuracy = accuracy.clamp(1e-6, 1.0);
        let exponent = accuracy.powf(1.0 / 3.0);
        let stride = ((n as f64) / (n as f64).powf(exponent)).round().max(1.0) as usize;

        let mut params: Vec<f64> = (0..n)
            .step_by(stride)
            .map(|i| self.cumulative[i] / self.total_length.max(1e-12))
            .collect();
        if params.last() != Some(&1.0) {
            params.push(1.0);
        }
        params
    }
}
