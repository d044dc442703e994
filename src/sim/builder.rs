//! Song → hazard field compiler
//!
//! Every note of every influencing track pushes the hands' safe lanes around:
//! a signed rotation nudge on the lane center and an unsigned size nudge on
//! the lane width, held for the note's duration and then released linearly.
//! Nudges accumulate in float space (overlapping notes compound) and are
//! clamped to [-1, 1] after each addition. The float field is then quantized
//! to the byte layout of [`HazardField`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::hazard::{Bucket, Hand, HazardField};
use super::playback::Track;
use crate::consts::{FIELD_BUCKETS, FIELD_CHANNELS};
use crate::lerp;

/// Per-track weights: how strongly notes move and resize each hand's lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Influence {
    pub rotation: f32,
    pub size: f32,
    /// Per-hand phase offsets into the note modulation
    pub phase: [f32; 2],
}

impl From<[f32; 4]> for Influence {
    fn from(v: [f32; 4]) -> Self {
        Self {
            rotation: v[0],
            size: v[1],
            phase: [v[2], v[3]],
        }
    }
}

impl From<Influence> for [f32; 4] {
    fn from(i: Influence) -> Self {
        [i.rotation, i.size, i.phase[0], i.phase[1]]
    }
}

/// Tunable constants of the compiler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParams {
    /// Field length in buckets (one per meter)
    pub buckets: usize,
    /// Lanes start near double width and narrow by 1/ramp per field element
    /// (four per bucket), so they reach resting width within a few buckets.
    /// Zero disables the ease-in.
    pub intro_ramp: f32,
    /// Angular frequency of the per-note modulation (radians per second)
    pub phase_frequency: f32,
    /// Linear release tail after each note (seconds)
    pub release_seconds: f32,
    /// Rotation values beyond this no longer move the lane center
    pub rotation_limit: f32,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            buckets: FIELD_BUCKETS,
            intro_ramp: 32.0,
            phase_frequency: TAU / 5.0,
            release_seconds: 2.0,
            rotation_limit: 0.7,
        }
    }
}

/// Level-specific lane widths, in byte units (64 = quarter turn)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneWidths {
    /// Resting width once the intro has narrowed
    pub default_width: f32,
    /// Floor the lane can never shrink below
    pub min_width: f32,
}

/// Which logical channel an influence lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Rotation(Hand),
    Size(Hand),
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::Rotation(hand) => hand.angle_channel(),
            Channel::Size(hand) => hand.width_channel(),
        }
    }
}

/// Accumulates note influences for one level
#[derive(Debug, Clone)]
pub struct HazardFieldBuilder {
    params: BuildParams,
    widths: LaneWidths,
    song_duration: f32,
    tunnel_length: f32,
    values: Vec<f32>,
    rng: Pcg32,
}

impl HazardFieldBuilder {
    /// Start from open lanes: centered rotation, width easing in from double
    /// the quarter turn down to `widths.default_width`.
    pub fn new(
        params: BuildParams,
        widths: LaneWidths,
        song_duration: f32,
        tunnel_length: f32,
        seed: u64,
    ) -> Self {
        let buckets = params.buckets.max(2);
        let resting = widths.default_width / 64.0;
        let mut values = vec![0.0; buckets * FIELD_CHANNELS];
        for (i, value) in values.iter_mut().enumerate() {
            if i % FIELD_CHANNELS < 2 {
                continue;
            }
            let intro = if params.intro_ramp > 0.0 {
                2.0 - i as f32 / params.intro_ramp
            } else {
                resting
            };
            *value = intro.max(resting);
        }

        Self {
            params: BuildParams { buckets, ..params },
            widths,
            song_duration,
            tunnel_length,
            values,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Float channel values, `[rotA, rotB, sizeA, sizeB]` per bucket
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Float value of one channel at one bucket
    pub fn value(&self, bucket: usize, channel: Channel) -> f32 {
        self.values[bucket * FIELD_CHANNELS + channel.index()]
    }

    fn to_distance(&self, time: f32) -> f32 {
        time * self.tunnel_length / self.song_duration
    }

    /// Add `strength` to `channel` over the buckets covered by
    /// `[time, time + duration)`. With `decay` the strength ramps linearly
    /// from full at the start of the window to zero at its end.
    pub fn add_influence(
        &mut self,
        time: f32,
        duration: f32,
        strength: f32,
        channel: Channel,
        decay: bool,
    ) {
        let d0 = self.to_distance(time);
        let d1 = self.to_distance(time + duration);
        if !d0.is_finite() || !d1.is_finite() {
            return;
        }
        let start = d0.ceil().max(0.0) as usize;
        let end = (d1.ceil().max(0.0) as usize).min(self.params.buckets);
        let span = d1 - d0;
        let offset = channel.index();

        for bucket in start..end {
            let amount = if decay && span > 0.0 {
                lerp(strength, 0.0, (bucket as f32 - d0) / span)
            } else {
                strength
            };
            let slot = &mut self.values[bucket * FIELD_CHANNELS + offset];
            *slot = (*slot + amount).clamp(-1.0, 1.0);
        }
    }

    /// Note modulation in [0, 1] for a hand with the given phase offset
    pub fn note_weight(&self, phase: f32, note_time: f32) -> f32 {
        (phase + (note_time * self.params.phase_frequency).sin()).sin() / 2.0 + 0.5
    }

    /// Apply every note of `track` to both hands
    pub fn add_track(&mut self, track: &Track, influence: &Influence) {
        let release = self.params.release_seconds;
        for hand in Hand::BOTH {
            for note in &track.notes {
                let weight = self.note_weight(influence.phase[hand.index()], note.time);
                let sign = if self.rng.random_bool(0.5) { -1.0 } else { 1.0 };
                let rotation = influence.rotation * weight * sign;
                let size = influence.size * weight;
                let release_start = note.time + note.duration;

                self.add_influence(note.time, note.duration, rotation, Channel::Rotation(hand), false);
                self.add_influence(release_start, release, rotation, Channel::Rotation(hand), true);
                self.add_influence(note.time, note.duration, size, Channel::Size(hand), false);
                self.add_influence(release_start, release, size, Channel::Size(hand), true);
            }
        }
    }

    /// Apply all tracks with their influences. Tracks without an influence
    /// (or beyond the end of `influences`) contribute nothing.
    pub fn add_song(&mut self, tracks: &[Track], influences: &[Option<Influence>]) {
        for (index, track) in tracks.iter().enumerate() {
            if let Some(Some(influence)) = influences.get(index) {
                self.add_track(track, influence);
            }
        }
    }

    /// Quantize the accumulated values into a hazard field
    pub fn quantize(&self) -> HazardField {
        let limit = self.params.rotation_limit;
        let min_width = self.widths.min_width;
        let to_byte = |v: f32| v.clamp(0.0, 255.0).round() as u8;

        let buckets = self
            .values
            .chunks_exact(FIELD_CHANNELS)
            .map(|v| {
                // Same rotation signal pushes the two lanes in opposite directions
                let rot_a = v[0].clamp(-limit, limit);
                let rot_b = v[1].clamp(-limit, limit);
                let width = |w: f32| (w * 64.0).min(64.0).max(min_width);
                Bucket {
                    center_angle: [to_byte(64.0 + rot_a * 64.0), to_byte(192.0 - rot_b * 64.0)],
                    half_width: [to_byte(width(v[2])), to_byte(width(v[3]))],
                }
            })
            .collect();
        HazardField::from_buckets(buckets)
    }

    /// Compile a whole song in one go
    pub fn compile(
        params: BuildParams,
        widths: LaneWidths,
        song_duration: f32,
        tunnel_length: f32,
        tracks: &[Track],
        influences: &[Option<Influence>],
        seed: u64,
    ) -> HazardField {
        let mut builder = Self::new(params, widths, song_duration, tunnel_length, seed);
        builder.add_song(tracks, influences);
        let field = builder.quantize();
        log::debug!(
            "Compiled hazard field: {} tracks, {} buckets",
            tracks.len(),
            field.len()
        );
        field
    }
}
