//! Hand/hazard collision
//!
//! Each hand casts a ray along its pointing direction. Where the ray meets the
//! tunnel wall we read the hand's safe lane from the hazard field at that
//! distance: inside the lane's angular arc is safe, anywhere else on the wall
//! hurts. A ray that misses the tunnel (pointing out the end, or no pose this
//! frame) is not a hazard interaction at all.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::curve::SampledCurve;
use super::hazard::{Hand, HazardField, Lane};
use super::tube::TubeHit;
use crate::consts::*;
use crate::{damp, wrap_turn};

/// World-space pose of a tracked hand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandPose {
    pub position: Vec3,
    /// Pointing direction (need not be normalized)
    pub forward: Vec3,
}

/// Where a hand's ray meets the wall, in tunnel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallContact {
    pub hit: TubeHit,
    /// Meters along the tunnel
    pub distance: f32,
    /// Ring angle as a turn fraction (0 down, .25 right, .5 up, .75 left)
    pub angle: f32,
    pub lane: Lane,
}

impl WallContact {
    pub fn in_lane(&self) -> bool {
        self.lane.contains(self.angle)
    }
}

/// Cast `pose` against the tunnel near `player_distance` and resolve the lane
pub fn probe(
    curve: &SampledCurve,
    field: &HazardField,
    hand: Hand,
    pose: &HandPose,
    player_distance: f32,
) -> Option<WallContact> {
    let hits = curve.raycast(
        player_distance - RAY_WINDOW_BEHIND,
        player_distance + RAY_WINDOW_AHEAD,
        pose.position,
        pose.forward,
    );
    let hit = *hits.first()?;
    let distance = hit.tunnel_distance;
    Some(WallContact {
        hit,
        distance,
        angle: wrap_turn(hit.tunnel_turn + RING_ANGLE_OFFSET),
        lane: field.lane(distance, hand),
    })
}

/// Whether the player is inside the invulnerable stretch at either end
pub fn in_grace_window(distance: f32, length: f32) -> bool {
    distance < GRACE_DISTANCE || distance > length - GRACE_DISTANCE
}

/// Hand state mirrored to the tunnel shader: `(angle, offset, hurt)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandSample {
    /// Ring angle of the ray hit (turn fraction)
    pub angle: f32,
    /// Hit distance relative to the player; `MISS_OFFSET` when nothing was hit
    pub offset: f32,
    pub hurt: f32,
}

impl HandSample {
    pub const MISS: HandSample = HandSample {
        angle: 0.0,
        offset: MISS_OFFSET,
        hurt: 0.0,
    };
}

impl Default for HandSample {
    fn default() -> Self {
        Self::MISS
    }
}

/// Per-hand collision state, owned by the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandState {
    pub sample: HandSample,
    /// Smoothed exposure in [0, 1]; eases very slowly toward 1 - safe
    pub hurt: f32,
    /// Result of the last update
    pub safe: bool,
    /// Length of the pointing ray up to the wall, for the hand's beam visual
    pub ray_length: Option<f32>,
}

impl Default for HandState {
    fn default() -> Self {
        Self {
            sample: HandSample::MISS,
            hurt: 0.0,
            safe: true,
            ray_length: None,
        }
    }
}

impl HandState {
    /// Run one frame of collision for this hand. Returns whether it is safe.
    pub fn update(
        &mut self,
        curve: &SampledCurve,
        field: &HazardField,
        hand: Hand,
        pose: Option<&HandPose>,
        player_distance: f32,
        dt: f32,
    ) -> bool {
        let grace = in_grace_window(player_distance, curve.length());
        let contact = pose.and_then(|pose| probe(curve, field, hand, pose, player_distance));

        let Some(contact) = contact else {
            self.sample = HandSample::MISS;
            self.ray_length = None;
            self.safe = true;
            return true;
        };

        let safe = grace || contact.in_lane();
        let exposure = if safe { 0.0 } else { 1.0 };
        self.hurt = damp(self.hurt, exposure, HURT_DAMP_FACTOR, dt);
        self.sample = HandSample {
            angle: contact.angle,
            offset: contact.distance - player_distance,
            hurt: self.hurt,
        };
        self.ray_length = Some(contact.hit.distance);
        self.safe = safe;
        safe
    }
}

/// Whether a hand is close enough to a hub socket to count as docked
pub fn is_docked(hand_position: Vec3, socket_position: Vec3) -> bool {
    hand_position.distance(socket_position) < SOCKET_DOCK_RADIUS
}
