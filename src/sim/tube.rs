//! Tube wall geometry for hand raycasts
//!
//! A ring of vertices is laid around every curve sample; consecutive rings are
//! stitched into quads. Each vertex remembers its tunnel-local coordinate
//! (distance along the curve, turn fraction around it) so a hit can be mapped
//! back to hazard-field space by barycentric interpolation.

use glam::Vec3;
use std::f32::consts::TAU;

use super::curve::SampledCurve;
use crate::consts::RING_ANGLE_OFFSET;

/// Smallest determinant treated as a non-parallel ray/triangle pair
const PARALLEL_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TubeVertex {
    position: Vec3,
    /// Meters along the curve
    distance: f32,
    /// Turn fraction around the tube, 0 at the seam, 1 at the closing duplicate
    turn: f32,
}

/// A ray hit on the tube wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeHit {
    /// Distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Meters along the tunnel at the hit
    pub tunnel_distance: f32,
    /// Turn fraction around the tunnel, measured from the tube seam
    pub tunnel_turn: f32,
}

/// Triangulated tube around a sampled curve
#[derive(Debug, Clone, Default)]
pub struct TubeMesh {
    radius: f32,
    radial_segments: usize,
    ring_count: usize,
    vertices: Vec<TubeVertex>,
}

impl TubeMesh {
    /// Build a tube of `radius` with `radial_segments` faces per ring.
    ///
    /// The seam (turn 0) sits a quarter turn before ring angle 0, so a hit's
    /// ring angle is `tunnel_turn + RING_ANGLE_OFFSET`.
    pub fn build(curve: &SampledCurve, radius: f32, radial_segments: usize) -> Self {
        let radial_segments = radial_segments.max(3);
        let ring_count = curve.samples().len();
        let mut vertices = Vec::with_capacity(ring_count * (radial_segments + 1));

        for (i, sample) in curve.samples().iter().enumerate() {
            let distance = curve.sample_distance(i);
            for j in 0..=radial_segments {
                let turn = j as f32 / radial_segments as f32;
                let angle = (turn + RING_ANGLE_OFFSET) * TAU;
                let offset = sample.normal * angle.sin() + sample.binormal * angle.cos();
                vertices.push(TubeVertex {
                    position: sample.position + offset * radius,
                    distance,
                    turn,
                });
            }
        }

        Self {
            radius,
            radial_segments,
            ring_count,
            vertices,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn ring_count(&self) -> usize {
        self.ring_count
    }

    /// Triangle count of the whole tube
    pub fn triangle_count(&self) -> usize {
        self.ring_count.saturating_sub(1) * self.radial_segments * 2
    }

    #[inline]
    fn vertex(&self, ring: usize, step: usize) -> &TubeVertex {
        &self.vertices[ring * (self.radial_segments + 1) + step]
    }

    /// Raycast against the spans between rings `first_ring..last_ring`.
    /// Both faces of each triangle count. Hits are sorted nearest first.
    pub fn raycast(
        &self,
        first_ring: usize,
        last_ring: usize,
        origin: Vec3,
        direction: Vec3,
    ) -> Vec<TubeHit> {
        let mut hits = Vec::new();
        let Some(direction) = direction.try_normalize() else {
            return hits;
        };
        if self.ring_count < 2 {
            return hits;
        }
        let last_ring = last_ring.min(self.ring_count - 1);

        for ring in first_ring..last_ring {
            for step in 0..self.radial_segments {
                let a = self.vertex(ring, step);
                let b = self.vertex(ring + 1, step);
                let c = self.vertex(ring + 1, step + 1);
                let d = self.vertex(ring, step + 1);
                for tri in [[a, b, d], [b, c, d]] {
                    if let Some(hit) = intersect_triangle(origin, direction, tri) {
                        hits.push(hit);
                    }
                }
            }
        }

        hits.sort_by(|x, y| x.distance.total_cmp(&y.distance));
        hits
    }
}

/// Möller–Trumbore ray/triangle test (double-sided)
fn intersect_triangle(origin: Vec3, direction: Vec3, tri: [&TubeVertex; 3]) -> Option<TubeHit> {
    let [v0, v1, v2] = tri;
    let edge1 = v1.position - v0.position;
    let edge2 = v2.position - v0.position;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - v0.position;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    if t <= 0.0 {
        return None;
    }

    let w = 1.0 - u - v;
    Some(TubeHit {
        distance: t,
        point: origin + direction * t,
        tunnel_distance: v0.distance * w + v1.distance * u + v2.distance * v,
        tunnel_turn: v0.turn * w + v1.turn * u + v2.turn * v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::curve::Curve;
    use crate::{turn_distance, wrap_turn};

    fn straight() -> SampledCurve {
        let points = (0..11).map(|i| Vec3::new(0.0, 0.0, i as f32 * 10.0)).collect();
        SampledCurve::new(&Curve::new(points).unwrap()).unwrap()
    }

    #[test]
    fn test_tube_triangle_count() {
        let curve = straight();
        let tube = curve.tube();
        assert_eq!(tube.ring_count(), curve.samples().len());
        assert_eq!(tube.triangle_count(), (tube.ring_count() - 1) * 16 * 2);
    }

    #[test]
    fn test_ray_from_center_hits_wall() {
        let curve = straight();
        let d = 50.3;
        let center = curve.position_at(d);
        for k in 0..7 {
            let ring_turn = 0.05 + k as f32 * 0.13;
            let target = curve.point_on_ring(d, 2.0, ring_turn * TAU);
            let hits = curve.raycast(d - 4.0, d + 10.0, center, target - center);
            assert!(!hits.is_empty(), "ray toward turn {ring_turn} missed");
            let hit = hits[0];
            // Inscribed 16-gon: wall is between 2 cos(pi/16) and 2 from the axis
            assert!(hit.distance > 1.95 && hit.distance <= 2.001);
            assert!((hit.tunnel_distance - d).abs() < 0.05);
            let hit_ring_turn = wrap_turn(hit.tunnel_turn + RING_ANGLE_OFFSET);
            assert!(turn_distance(hit_ring_turn, ring_turn) < 0.01);
        }
    }

    #[test]
    fn test_window_excludes_far_geometry() {
        let curve = straight();
        let center = curve.position_at(50.0);
        let hits = curve.raycast(0.0, 10.0, center, Vec3::X);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ray_from_outside_reports_both_walls_sorted() {
        let curve = straight();
        let origin = curve.position_at(40.0) + Vec3::new(10.0, 0.5, 0.0);
        let hits = curve.raycast(36.0, 50.0, origin, Vec3::NEG_X);
        assert!(hits.len() >= 2);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_zero_direction_misses() {
        let curve = straight();
        let hits = curve.raycast(0.0, 100.0, curve.position_at(20.0), Vec3::ZERO);
        assert!(hits.is_empty());
    }
}
