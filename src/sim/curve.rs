//! Spline sampling for the tunnel centerline
//!
//! The level curve is a centripetal Catmull-Rom spline through random
//! waypoints. At load time it is resampled into one sample per meter of
//! arclength, each carrying a parallel-transported frame so the tunnel never
//! flips as it bends. Everything downstream (camera, hub, hand rays, hazard
//! geometry) addresses the tunnel by `distance` along this sampled curve and
//! by polar coordinates around it.

use glam::{Mat3, Quat, Vec3};

use super::tube::{TubeHit, TubeMesh};
use crate::consts::*;

/// Centripetal Catmull-Rom spline through a list of waypoints
#[derive(Debug, Clone)]
pub struct Curve {
    points: Vec<Vec3>,
    /// Cumulative chord lengths at `ARC_LENGTH_DIVISIONS + 1` parameter steps
    arc_lengths: Vec<f32>,
}

impl Curve {
    /// Build a spline through `points`. Returns `None` with fewer than two points.
    pub fn new(points: Vec<Vec3>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut curve = Self {
            points,
            arc_lengths: Vec::with_capacity(ARC_LENGTH_DIVISIONS + 1),
        };
        curve.arc_lengths = curve.compute_arc_lengths(ARC_LENGTH_DIVISIONS);
        Some(curve)
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Total arclength (piecewise-linear estimate)
    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    fn compute_arc_lengths(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for p in 1..=divisions {
            let current = self.point(p as f32 / divisions as f32);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }

    /// Point at spline parameter `t` in [0, 1]
    pub fn point(&self, t: f32) -> Vec3 {
        let pts = &self.points;
        let l = pts.len();
        let p = (l - 1) as f32 * t.clamp(0.0, 1.0);
        let mut int_point = p.floor() as usize;
        let mut weight = p - int_point as f32;
        if int_point >= l - 1 {
            int_point = l - 2;
            weight = 1.0;
        }

        // Phantom end points mirror the first/last segment
        let p0 = if int_point > 0 {
            pts[int_point - 1]
        } else {
            pts[0] * 2.0 - pts[1]
        };
        let p1 = pts[int_point];
        let p2 = pts[int_point + 1];
        let p3 = if int_point + 2 < l {
            pts[int_point + 2]
        } else {
            pts[l - 1] * 2.0 - pts[l - 2]
        };

        // Centripetal parametrization: knot spacing = sqrt(chord length)
        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        let mut t1 = (p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1;
        let mut t2 = (p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2;
        t1 *= dt1;
        t2 *= dt1;

        // Cubic Hermite between p1 and p2
        let c0 = p1;
        let c1 = t1;
        let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2;
        let c3 = 2.0 * p1 - 2.0 * p2 + t1 + t2;
        let w = weight;
        c0 + c1 * w + c2 * (w * w) + c3 * (w * w * w)
    }

    /// Map an arclength fraction `u` to the spline parameter `t`
    pub fn u_to_t(&self, u: f32) -> f32 {
        let lengths = &self.arc_lengths;
        let count = lengths.len();
        let target = u.clamp(0.0, 1.0) * self.length();

        // Last index whose cumulative length is <= target
        let i = lengths
            .partition_point(|&len| len <= target)
            .saturating_sub(1)
            .min(count - 2);

        let before = lengths[i];
        let segment = lengths[i + 1] - before;
        let fraction = if segment > 0.0 {
            ((target - before) / segment).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (i as f32 + fraction) / (count - 1) as f32
    }

    /// Point at arclength fraction `u`
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.u_to_t(u))
    }

    /// Unit tangent at arclength fraction `u` (central difference)
    pub fn tangent_at(&self, u: f32) -> Vec3 {
        const DELTA: f32 = 0.0001;
        let t = self.u_to_t(u);
        let t1 = (t - DELTA).max(0.0);
        let t2 = (t + DELTA).min(1.0);
        (self.point(t2) - self.point(t1)).normalize_or_zero()
    }
}

/// One arclength-uniform sample of the centerline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub position: Vec3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

/// Interpolated frame at an arbitrary distance
pub type Frame = CurveSample;

/// Bracketing samples for a distance query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleWeight {
    /// Lower sample index, in [0, N-2]
    pub index: usize,
    /// Blend toward `index + 1`, in [0, 1]
    pub t: f32,
}

/// Position and orientation of something riding the curve (camera rig, hub)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub up: Vec3,
    pub orientation: Quat,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            up: Vec3::Y,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Placement {
    /// Local -Z axis in world space
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Transform a point from this placement's local space to world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }
}

/// The level curve resampled to roughly one sample per meter
#[derive(Debug, Clone)]
pub struct SampledCurve {
    length: f32,
    segments: usize,
    samples: Vec<CurveSample>,
    tube: TubeMesh,
}

impl SampledCurve {
    /// Sample `curve` uniformly by arclength. Returns `None` when the curve is
    /// shorter than two meters (not enough samples to interpolate).
    pub fn new(curve: &Curve) -> Option<Self> {
        let length = curve.length();
        if !length.is_finite() || length < 2.0 {
            return None;
        }
        let segments = length.floor() as usize;

        let positions: Vec<Vec3> = (0..=segments)
            .map(|i| curve.point_at(i as f32 / segments as f32))
            .collect();
        let tangents: Vec<Vec3> = (0..=segments)
            .map(|i| curve.tangent_at(i as f32 / segments as f32))
            .collect();
        let (normals, binormals) = transport_frames(&tangents);

        let samples: Vec<CurveSample> = (0..=segments)
            .map(|i| CurveSample {
                position: positions[i],
                tangent: tangents[i],
                normal: normals[i],
                binormal: binormals[i],
            })
            .collect();

        let mut sampled = Self {
            length,
            segments,
            samples,
            tube: TubeMesh::default(),
        };
        sampled.tube = TubeMesh::build(&sampled, TUNNEL_RADIUS, TUNNEL_RADIAL_SEGMENTS);
        Some(sampled)
    }

    /// Total arclength `L` in meters
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Number of spans between samples (`floor(L)`)
    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn samples(&self) -> &[CurveSample] {
        &self.samples
    }

    pub fn tube(&self) -> &TubeMesh {
        &self.tube
    }

    /// Distance along the curve of sample `index`
    pub fn sample_distance(&self, index: usize) -> f32 {
        index as f32 / self.segments as f32 * self.length
    }

    /// Map a distance to its two bracketing samples. Out-of-range distances clamp.
    pub fn length_at(&self, distance: f32) -> SampleWeight {
        let n = self.samples.len();
        let exact = distance / self.length * self.segments as f32;
        let exact = if exact.is_nan() { 0.0 } else { exact };
        let index = (exact.floor().max(0.0) as usize).min(n - 2);
        SampleWeight {
            index,
            t: (exact - index as f32).clamp(0.0, 1.0),
        }
    }

    fn lerp_with<F>(&self, distance: f32, field: F) -> Vec3
    where
        F: Fn(&CurveSample) -> Vec3,
    {
        let SampleWeight { index, t } = self.length_at(distance);
        field(&self.samples[index]).lerp(field(&self.samples[index + 1]), t)
    }

    /// Centerline position at `distance`
    pub fn position_at(&self, distance: f32) -> Vec3 {
        self.lerp_with(distance, |s| s.position)
    }

    /// Interpolated frame at `distance`. Axes are linearly blended and may be
    /// marginally shorter than unit length between samples.
    pub fn frame_at(&self, distance: f32) -> Frame {
        let SampleWeight { index, t } = self.length_at(distance);
        let a = &self.samples[index];
        let b = &self.samples[index + 1];
        Frame {
            position: a.position.lerp(b.position, t),
            tangent: a.tangent.lerp(b.tangent, t),
            normal: a.normal.lerp(b.normal, t),
            binormal: a.binormal.lerp(b.binormal, t),
        }
    }

    /// Point `radius` meters from the centerline at `distance`, `angle`
    /// radians around it (0 points along the binormal).
    pub fn point_on_ring(&self, distance: f32, radius: f32, angle: f32) -> Vec3 {
        let frame = self.frame_at(distance);
        frame.position + (frame.normal * angle.sin() + frame.binormal * angle.cos()) * radius
    }

    /// Move `target` onto the curve at `distance`, up along the binormal, and
    /// turn it toward `tangent * forward_sign`. `blend` = 1 snaps, smaller
    /// values slerp part of the way.
    pub fn place_frame(&self, distance: f32, target: &mut Placement, forward_sign: f32, blend: f32) {
        let frame = self.frame_at(distance);
        target.position = frame.position;
        target.up = frame.binormal;

        let Some(rotation) = look_rotation(frame.tangent * forward_sign, frame.binormal) else {
            return;
        };
        target.orientation = if blend >= 1.0 {
            rotation
        } else {
            target.orientation.slerp(rotation, blend.max(0.0)).normalize()
        };
    }

    /// Cast a ray against the tube wall, testing only geometry that overlaps
    /// `[window_start, window_end]` meters. Hits are sorted nearest first.
    pub fn raycast(
        &self,
        window_start: f32,
        window_end: f32,
        origin: Vec3,
        direction: Vec3,
    ) -> Vec<TubeHit> {
        let first = (window_start / self.length * self.segments as f32).floor();
        let last = (window_end / self.length * self.segments as f32).ceil();
        let max_ring = self.segments as f32;
        let first = first.clamp(0.0, max_ring) as usize;
        let last = last.clamp(0.0, max_ring) as usize;
        self.tube.raycast(first, last, origin, direction)
    }
}

/// Rotation whose -Z looks along `forward` with +Y as close to `up` as possible
fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let z = (-forward).try_normalize()?;
    let x = up.cross(z).try_normalize()?;
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize())
}

/// Parallel-transport an initial normal along the tangents.
///
/// The seed normal is the world axis least aligned with the first tangent.
/// Each following normal is the previous one rotated by the turn between
/// consecutive tangents, which keeps the frame from twisting or flipping.
fn transport_frames(tangents: &[Vec3]) -> (Vec<Vec3>, Vec<Vec3>) {
    let mut normals = Vec::with_capacity(tangents.len());
    let mut binormals = Vec::with_capacity(tangents.len());

    let t0 = tangents[0];
    let abs = t0.abs();
    let mut seed = Vec3::X;
    let mut min = abs.x;
    if abs.y <= min {
        min = abs.y;
        seed = Vec3::Y;
    }
    if abs.z <= min {
        seed = Vec3::Z;
    }
    let side = t0.cross(seed).normalize_or_zero();
    let n0 = t0.cross(side);
    normals.push(n0);
    binormals.push(t0.cross(n0));

    for i in 1..tangents.len() {
        let mut normal = normals[i - 1];
        let axis = tangents[i - 1].cross(tangents[i]);
        if axis.length() > f32::EPSILON {
            let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
            normal = Quat::from_axis_angle(axis.normalize(), theta) * normal;
        }
        binormals.push(tangents[i].cross(normal));
        normals.push(normal);
    }

    (normals, binormals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_curve(count: usize, spacing: f32) -> SampledCurve {
        let points = (0..count)
            .map(|i| Vec3::new(0.0, 0.0, i as f32 * spacing))
            .collect();
        SampledCurve::new(&Curve::new(points).unwrap()).unwrap()
    }

    fn wiggly_curve() -> SampledCurve {
        let points = (0..12)
            .map(|i| {
                let f = i as f32;
                Vec3::new((f * 1.3).sin() * 8.0, (f * 0.7).cos() * 6.0, f * 15.0)
            })
            .collect();
        SampledCurve::new(&Curve::new(points).unwrap()).unwrap()
    }

    #[test]
    fn test_straight_curve_length_and_samples() {
        let curve = straight_curve(11, 10.0);
        assert!((curve.length() - 100.0).abs() < 0.01);
        assert_eq!(curve.segments(), curve.length().floor() as usize);
        assert_eq!(curve.samples().len(), curve.segments() + 1);
    }

    #[test]
    fn test_position_at_is_arclength_uniform() {
        let curve = straight_curve(11, 10.0);
        for d in [0.0, 12.5, 50.0, 99.0] {
            let p = curve.position_at(d);
            assert!((p.z - d).abs() < 0.05, "z {} at distance {}", p.z, d);
        }
    }

    #[test]
    fn test_length_at_clamps() {
        let curve = straight_curve(11, 10.0);
        let w = curve.length_at(-5.0);
        assert_eq!(w.index, 0);
        assert_eq!(w.t, 0.0);
        let w = curve.length_at(1.0e6);
        assert_eq!(w.index, curve.samples().len() - 2);
        assert_eq!(w.t, 1.0);
        let w = curve.length_at(f32::NAN);
        assert_eq!(w.index, 0);
    }

    #[test]
    fn test_frames_orthonormal() {
        let curve = wiggly_curve();
        for s in curve.samples() {
            assert!((s.tangent.length() - 1.0).abs() < 1e-3);
            assert!((s.normal.length() - 1.0).abs() < 1e-3);
            assert!((s.binormal.length() - 1.0).abs() < 1e-3);
            assert!(s.tangent.dot(s.normal).abs() < 1e-3);
            assert!(s.tangent.dot(s.binormal).abs() < 1e-3);
            assert!(s.normal.dot(s.binormal).abs() < 1e-3);
        }
    }

    #[test]
    fn test_frames_do_not_flip() {
        let curve = wiggly_curve();
        for pair in curve.samples().windows(2) {
            assert!(pair[0].normal.dot(pair[1].normal) > 0.9);
            assert!(pair[0].binormal.dot(pair[1].binormal) > 0.9);
        }
    }

    #[test]
    fn test_point_on_ring_radius() {
        let curve = wiggly_curve();
        let d = curve.length() * 0.4;
        let center = curve.position_at(d);
        for i in 0..8 {
            let angle = i as f32 / 8.0 * std::f32::consts::TAU;
            let p = curve.point_on_ring(d, 2.0, angle);
            assert!((p.distance(center) - 2.0).abs() < 0.02);
        }
        // Angle 0 lies along the binormal
        let frame = curve.frame_at(d);
        let p = curve.point_on_ring(d, 1.0, 0.0);
        assert!((p - center).dot(frame.binormal) > 0.99);
    }

    #[test]
    fn test_place_frame_snaps_to_tangent() {
        let curve = straight_curve(11, 10.0);
        let mut rig = Placement::default();
        curve.place_frame(30.0, &mut rig, 1.0, 1.0);
        assert!((rig.position.z - 30.0).abs() < 0.05);
        assert!(rig.forward().dot(Vec3::Z) > 0.999);
        assert!((rig.orientation * Vec3::Y).dot(rig.up) > 0.999);

        curve.place_frame(30.0, &mut rig, -1.0, 1.0);
        assert!(rig.forward().dot(Vec3::NEG_Z) > 0.999);
    }

    #[test]
    fn test_place_frame_partial_blend() {
        let curve = straight_curve(11, 10.0);
        let mut rig = Placement::default();
        curve.place_frame(30.0, &mut rig, -1.0, 1.0);
        curve.place_frame(30.0, &mut rig, 1.0, 0.5);
        let along = rig.forward().dot(Vec3::Z);
        assert!(along > -0.99 && along < 0.99, "blend should stop part way");
    }

    #[test]
    fn test_too_short_curve_rejected() {
        let curve = Curve::new(vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)]).unwrap();
        assert!(SampledCurve::new(&curve).is_none());
        assert!(Curve::new(vec![Vec3::ZERO]).is_none());
    }
}
