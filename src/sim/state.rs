//! Game state and core simulation types
//!
//! Everything the tick mutates lives in [`GameState`]; levels are read-only
//! apart from their playback handle.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::HandState;
use super::curve::Placement;
use super::schedule::Scheduler;
use crate::consts::*;

/// Phase of the current level attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting at the start of the tunnel for the player to dock both hands
    Ready,
    /// Start triggered; playback begins after a short delay
    Connecting,
    /// Song playing, player moving, hazards live
    Active,
    /// Song finished with health left
    Completed,
    /// Health ran out
    Failed,
}

impl GamePhase {
    /// No attempt is running: hands dock, hazards are off
    pub fn is_over(self) -> bool {
        !matches!(self, GamePhase::Active)
    }
}

/// Notifications for the presentation layer (HUD, sound cues)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelReady { index: usize, title: String },
    LevelStarting,
    /// Emitted whenever the rounded progress changes
    LevelActive { progress_percent: u32 },
    LevelCompleted,
    LevelFailed,
    /// Continuous hurt sound should start / stop
    HurtCueStarted,
    HurtCueStopped,
    /// Hub doors moving
    HubSound,
    LoseSound,
    /// A hand entered or left its socket; `click` when the cue should sound
    SocketSelected { side: usize, selected: bool, click: bool },
}

/// Per-attempt player state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    /// Meters along the tunnel, in [0, L]
    pub distance: f32,
    /// In [0, 1]
    pub health: f32,
    pub hands: [HandState; 2],
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            distance: 0.0,
            health: 1.0,
            hands: [HandState::default(); 2],
        }
    }
}

/// The start/end platform with the two hand sockets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hub {
    #[serde(skip)]
    pub placement: Placement,
    /// Last curve fraction the hub was moved to
    pub last_fraction: Option<f32>,
    pub closed: bool,
    /// Socket selection as last reported, per side
    pub socket_selected: [Option<bool>; 2],
    /// Seconds since the last socket click cue
    pub since_click: f32,
}

impl Hub {
    /// World position of a hand socket
    pub fn socket_position(&self, side: usize) -> Vec3 {
        let local = Vec3::new(side as f32 * SOCKET_SPACING - SOCKET_SPACING / 2.0, 0.0, SOCKET_DEPTH);
        self.placement.transform_point(local)
    }
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seconds since the game started (monotonic)
    pub clock: f64,
    pub phase: GamePhase,
    /// Index into the level list
    pub level_index: usize,
    pub player: PlayerState,
    /// How far ahead the tunnel is drawn (rendering hint)
    pub draw_distance: f32,
    /// Camera rig pose on the curve
    #[serde(skip)]
    pub camera_rig: Placement,
    pub hub: Hub,
    /// Whether the hurt cue is currently playing
    pub hurt_cue_playing: bool,
    /// Last progress percentage reported while Active
    pub last_progress: Option<u32>,
    pub scheduler: Scheduler,
    /// Events produced since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            phase: GamePhase::Ready,
            level_index: 0,
            player: PlayerState::default(),
            draw_distance: 0.0,
            camera_rig: Placement::default(),
            hub: Hub {
                closed: true,
                since_click: SOCKET_CLICK_COOLDOWN,
                ..Default::default()
            },
            hurt_cue_playing: false,
            last_progress: None,
            scheduler: Scheduler::new(),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Reset the per-attempt fields for a fresh run of `index`
    pub fn reset_attempt(&mut self, index: usize) {
        self.level_index = index;
        self.phase = GamePhase::Ready;
        self.player = PlayerState::default();
        self.draw_distance = 0.0;
        self.last_progress = None;
        self.hub.last_fraction = None;
        self.scheduler.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_ready() {
        let state = GameState::new();
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.player.health, 1.0);
        assert!(state.hub.closed);
        assert!(state.phase.is_over());
    }

    #[test]
    fn test_reset_attempt_clears_progress() {
        let mut state = GameState::new();
        state.phase = GamePhase::Failed;
        state.player.distance = 120.0;
        state.player.health = 0.0;
        state.last_progress = Some(40);
        state.scheduler.schedule(0.0, 1.0, crate::sim::schedule::ScheduledAction::CloseHub);
        state.reset_attempt(3);
        assert_eq!(state.level_index, 3);
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.player.distance, 0.0);
        assert_eq!(state.player.health, 1.0);
        assert!(state.last_progress.is_none());
        assert!(state.scheduler.is_empty());
    }

    #[test]
    fn test_socket_positions_straddle_hub() {
        let hub = Hub::default();
        let left = hub.socket_position(0);
        let right = hub.socket_position(1);
        assert!((left.x + 0.6).abs() < 1e-6);
        assert!((right.x - 0.6).abs() < 1e-6);
        assert!((left.z - SOCKET_DEPTH).abs() < 1e-6);
    }
}
