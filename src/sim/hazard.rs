//! Compiled hazard field
//!
//! One bucket per meter of tunnel, four bytes per bucket:
//! `[center angle A, center angle B, half-width A, half-width B]`.
//! Angles and half-widths are turn fractions scaled by 255. The byte layout
//! is exactly what the renderer uploads as a 4096x1 RGBA8 texture, and
//! collision reads it with the same linear filtering the shader gets.

use bytemuck::{Pod, Zeroable};

use crate::consts::{FIELD_BUCKETS, FIELD_CHANNELS};
use crate::lerp;

/// Which tracked hand a lane belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    A = 0,
    B = 1,
}

impl Hand {
    pub const BOTH: [Hand; 2] = [Hand::A, Hand::B];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Byte channel holding this hand's lane center
    pub fn angle_channel(self) -> usize {
        self.index()
    }

    /// Byte channel holding this hand's lane half-width
    pub fn width_channel(self) -> usize {
        2 + self.index()
    }
}

/// One bucket as laid out in the texture
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Bucket {
    pub center_angle: [u8; 2],
    pub half_width: [u8; 2],
}

impl Bucket {
    #[inline]
    pub fn channel(&self, channel: usize) -> u8 {
        match channel {
            0 | 1 => self.center_angle[channel],
            _ => self.half_width[channel - 2],
        }
    }
}

/// Safe lane for one hand at one distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lane {
    /// Lane center, turn fraction (0 down, .25 right, .5 up, .75 left)
    pub center_angle: f32,
    /// Half the lane's angular width, turn fraction
    pub half_width: f32,
}

impl Lane {
    /// Whether a ring angle lies strictly inside the lane
    pub fn contains(&self, angle: f32) -> bool {
        crate::turn_distance(angle, self.center_angle) < self.half_width
    }
}

/// Distance-indexed lane parameters for both hands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardField {
    buckets: Vec<Bucket>,
}

impl Default for HazardField {
    /// Centered, full-width lanes everywhere
    fn default() -> Self {
        Self {
            buckets: vec![
                Bucket {
                    center_angle: [64, 192],
                    half_width: [64, 64],
                };
                FIELD_BUCKETS
            ],
        }
    }
}

impl HazardField {
    /// Wrap pre-quantized buckets. Shorter inputs are padded with the last
    /// bucket so lookups always have two neighbours.
    pub fn from_buckets(mut buckets: Vec<Bucket>) -> Self {
        let pad = buckets.last().copied().unwrap_or_default();
        if buckets.len() < 2 {
            buckets.resize(2, pad);
        }
        Self { buckets }
    }

    /// Parse the raw `4 * B` byte layout. Trailing partial buckets are dropped.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let whole = bytes.len() / FIELD_CHANNELS * FIELD_CHANNELS;
        let buckets: &[Bucket] = bytemuck::cast_slice(&bytes[..whole]);
        Self::from_buckets(buckets.to_vec())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Contiguous byte view in texture order
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buckets)
    }

    /// Raw byte at an integer bucket
    pub fn byte(&self, bucket: usize, channel: usize) -> u8 {
        self.buckets[bucket.min(self.buckets.len() - 1)].channel(channel)
    }

    /// Linearly interpolated channel value (byte units) at a distance.
    /// Distances outside the field clamp to its ends.
    pub fn sample(&self, distance: f32, channel: usize) -> f32 {
        let last = (self.buckets.len() - 1) as f32;
        let d = if distance.is_finite() {
            distance.clamp(0.0, last)
        } else {
            0.0
        };
        let i = (d.floor() as usize).min(self.buckets.len() - 2);
        let a = self.buckets[i].channel(channel) as f32;
        let b = self.buckets[i + 1].channel(channel) as f32;
        lerp(a, b, d - i as f32)
    }

    /// Lane for `hand` at `distance`
    pub fn lane(&self, distance: f32, hand: Hand) -> Lane {
        Lane {
            center_angle: self.sample(distance, hand.angle_channel()) / 255.0,
            half_width: self.sample(distance, hand.width_channel()) / 255.0,
        }
    }
}
