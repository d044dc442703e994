//! Tunnel Transfer - rhythm-driven hazard tunnel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (curve sampling, hazard field, traversal, collisions)
//! - `renderer`: GPU data contract consumed by an external renderer
//! - `settings`: Player/debug preferences
//! - `error`: Level loading errors

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{LevelError, Result};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Nominal display refresh used by the headless runner
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Number of distance buckets in a hazard field (one per meter)
    pub const FIELD_BUCKETS: usize = 4096;
    /// Channels per bucket: angle A, angle B, half-width A, half-width B
    pub const FIELD_CHANNELS: usize = 4;

    /// Tube geometry
    pub const TUNNEL_RADIUS: f32 = 2.0;
    pub const TUNNEL_RADIAL_SEGMENTS: usize = 16;
    /// Arclength table resolution for spline inversion
    pub const ARC_LENGTH_DIVISIONS: usize = 200;

    /// Invulnerable stretch at each end of the tunnel (meters)
    pub const GRACE_DISTANCE: f32 = 20.0;
    /// Raycast window around the player (meters behind / ahead)
    pub const RAY_WINDOW_BEHIND: f32 = 4.0;
    pub const RAY_WINDOW_AHEAD: f32 = 10.0;
    /// Ring parametrization starts a quarter turn before the tube seam
    pub const RING_ANGLE_OFFSET: f32 = 0.25;
    /// Hand sample reported when the ray misses the tunnel
    pub const MISS_OFFSET: f32 = -100.0;
    /// Per-second retention factor for hurt smoothing (very slow)
    pub const HURT_DAMP_FACTOR: f32 = 0.0001;

    /// Health rates (per second)
    pub const DAMAGE_RATE: f32 = 1.0;
    pub const RECOVERY_RATE: f32 = 0.5;

    /// Camera trails the audio position by up to this many meters
    pub const CAMERA_LOOK_BEHIND: f32 = 3.0;
    /// Camera rig sits this far below the spline (meters)
    pub const CAMERA_RIG_DROP: f32 = 1.0;
    /// Per-second retention factor for the camera entry blend
    pub const CAMERA_ENTRY_DAMP: f32 = 0.01;

    /// Draw distance easing
    pub const DRAW_DISTANCE_RETRACT_RATE: f32 = 50.0;
    pub const DRAW_DISTANCE_LEAD: f32 = 50.0;
    pub const DRAW_DISTANCE_EXPONENT: f32 = 1.1;

    /// Phase timings (seconds)
    pub const CONNECTING_DELAY: f32 = 1.0;
    pub const COMPLETED_RESET_DELAY: f32 = 3.5;
    pub const FAILED_RESET_DELAY: f32 = 4.0;
    pub const FAILED_HUB_CLOSE_DELAY: f32 = 2.0;
    pub const PLAYBACK_FADE_IN: f32 = 0.2;

    /// Hand sockets on the hub
    pub const SOCKET_SPACING: f32 = 1.2;
    pub const SOCKET_DEPTH: f32 = 0.4;
    pub const SOCKET_DOCK_RADIUS: f32 = 0.23;
    /// Minimum seconds between socket click cues
    pub const SOCKET_CLICK_COOLDOWN: f32 = 0.2;
}

/// Wrap a turn fraction into [0, 1)
#[inline]
pub fn wrap_turn(turn: f32) -> f32 {
    let wrapped = turn.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Shortest angular distance between two turn fractions, in [0, 0.5]
#[inline]
pub fn turn_distance(a: f32, b: f32) -> f32 {
    ((a - b + 0.5).rem_euclid(1.0) - 0.5).abs().min(0.5)
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate independent exponential smoothing.
///
/// `factor` is the fraction of the gap to `b` that survives one second.
#[inline]
pub fn damp(a: f32, b: f32, factor: f32, dt: f32) -> f32 {
    lerp(a, b, 1.0 - factor.powf(dt))
}
