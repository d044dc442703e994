//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied frame delta only
//! - Seeded RNG only (curve waypoints, note polarity)
//! - No rendering, audio or platform dependencies

pub mod builder;
pub mod collision;
pub mod curve;
pub mod hazard;
pub mod health;
pub mod level;
pub mod playback;
pub mod schedule;
pub mod state;
pub mod tick;
pub mod tube;

pub use builder::{BuildParams, Channel, HazardFieldBuilder, Influence, LaneWidths};
pub use collision::{HandPose, HandSample, HandState, WallContact, in_grace_window, is_docked, probe};
pub use curve::{Curve, CurveSample, Frame, Placement, SampleWeight, SampledCurve};
pub use hazard::{Bucket, Hand, HazardField, Lane};
pub use health::HealthModel;
pub use level::{CurveRecipe, Level, LevelDescriptor, load_levels};
pub use playback::{ClockPlayback, Note, Playback, Song, Track};
pub use schedule::{ScheduledAction, Scheduler};
pub use state::{GameEvent, GamePhase, GameState, Hub, PlayerState};
pub use tick::{TickInput, camera_distance, start_level, tick};
pub use tube::{TubeHit, TubeMesh};
