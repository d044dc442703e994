//! Per-frame simulation tick
//!
//! Runs once per display refresh in a fixed order: playback clock, traversal
//! (distance, camera rig, hub), hand collision, health, phase transitions,
//! then any scheduled events that came due.

use super::collision::{HandPose, HandSample, is_docked};
use super::hazard::Hand;
use super::level::Level;
use super::schedule::ScheduledAction;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::damp;
use crate::settings::Settings;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// World-space hand poses; `None` when tracking is unavailable
    pub hands: [Option<HandPose>; 2],
    /// External start trigger (menu button, keyboard)
    pub start: bool,
    /// Treat this frame as hurt regardless of hands (debug/testing)
    pub force_hurt: bool,
}

/// Load level `index` (wrapping) and reset the attempt to `Ready`
pub fn start_level(state: &mut GameState, levels: &mut [Level], index: usize) {
    if levels.is_empty() {
        return;
    }
    if let Some(previous) = levels.get_mut(state.level_index) {
        previous.playback.stop();
    }

    let index = index % levels.len();
    state.reset_attempt(index);

    let level = &levels[index];
    level.curve.place_frame(0.0, &mut state.camera_rig, 1.0, 1.0);
    let up = state.camera_rig.up;
    state.camera_rig.position -= up * CAMERA_RIG_DROP;

    log::info!("Level {} of {} ready: '{}'", index + 1, levels.len(), level.title);
    state.emit(GameEvent::LevelReady {
        index,
        title: level.title.clone(),
    });
}

/// Camera distance: a few meters behind the audio position, closing the gap
/// near the end so the rig still reaches the last meter
pub fn camera_distance(distance: f32, length: f32) -> f32 {
    (distance - CAMERA_LOOK_BEHIND.min(length - distance)).max(0.0)
}

/// Advance the game by `dt` seconds
pub fn tick(state: &mut GameState, levels: &mut [Level], input: &TickInput, settings: &Settings, dt: f32) {
    if levels.is_empty() {
        return;
    }
    if state.level_index >= levels.len() {
        start_level(state, levels, 0);
    }

    state.clock += dt as f64;
    state.hub.since_click += dt;

    let level = &mut levels[state.level_index];
    let length = level.length();

    // Distance follows the song clock, including the frame the song ends on
    level.playback.advance(dt);
    if state.phase == GamePhase::Active {
        state.player.distance = (level.playback.current_time() * level.velocity).clamp(0.0, length);
    }
    let distance = state.player.distance;

    // Camera rig: snapped while waiting, eased in once the attempt starts
    let player_distance = camera_distance(distance, length);
    let blend = if state.phase == GamePhase::Ready {
        1.0
    } else {
        damp(0.0, 1.0, CAMERA_ENTRY_DAMP, dt)
    };
    level.curve.place_frame(player_distance, &mut state.camera_rig, 1.0, blend);
    let up = state.camera_rig.up;
    state.camera_rig.position -= up * CAMERA_RIG_DROP;

    // Hub waits at the start, then jumps to the end halfway through
    let hub_fraction = if state.phase.is_over() {
        player_distance / length
    } else {
        (distance / length * 2.0).floor().min(1.0)
    };
    if state.hub.last_fraction != Some(hub_fraction) {
        state.hub.last_fraction = Some(hub_fraction);
        level.curve.place_frame(hub_fraction * length, &mut state.hub.placement, -1.0, 1.0);
    }

    // Hands: hazards while active, sockets otherwise
    let mut hurt = input.force_hurt;
    let mut docked = [false; 2];
    if state.phase == GamePhase::Active {
        for hand in Hand::BOTH {
            let i = hand.index();
            let safe = state.player.hands[i].update(
                &level.curve,
                &level.field,
                hand,
                input.hands[i].as_ref(),
                distance,
                dt,
            );
            hurt |= !safe;
        }
    } else {
        for hand in Hand::BOTH {
            let i = hand.index();
            let hand_state = &mut state.player.hands[i];
            hand_state.sample = HandSample::MISS;
            hand_state.ray_length = None;
            hand_state.safe = true;
            docked[i] = input.hands[i]
                .map(|pose| is_docked(pose.position, state.hub.socket_position(i)))
                .unwrap_or(false);
        }
        update_sockets(state, docked);
    }

    // Hurt cue follows the frame's hurt flag
    if hurt != state.hurt_cue_playing {
        state.hurt_cue_playing = hurt;
        state.emit(if hurt {
            GameEvent::HurtCueStarted
        } else {
            GameEvent::HurtCueStopped
        });
    }

    let level_count = levels.len();
    let level = &mut levels[state.level_index];

    match state.phase {
        GamePhase::Ready => {
            let triggered = input.start || settings.start_automatically || docked.iter().all(|&d| d);
            if triggered {
                state.phase = GamePhase::Connecting;
                state.hub.closed = false;
                state.emit(GameEvent::HubSound);
                state.emit(GameEvent::LevelStarting);
                let now = state.clock;
                state
                    .scheduler
                    .schedule(now, CONNECTING_DELAY, ScheduledAction::BeginPlayback);
                log::info!("Connecting to '{}'", level.title);
            }
            retract_draw_distance(state, dt);
        }

        GamePhase::Active => {
            state.player.health = settings
                .health
                .step(state.player.health, hurt, settings.god_mode, dt);

            let progress = (distance / length * 100.0).round() as u32;
            if state.last_progress != Some(progress) {
                state.last_progress = Some(progress);
                state.emit(GameEvent::LevelActive {
                    progress_percent: progress,
                });
            }

            let now = state.clock;
            if !level.playback.is_playing() {
                state.phase = GamePhase::Completed;
                state.hub.closed = true;
                let next = (state.level_index + 1) % level_count;
                state
                    .scheduler
                    .schedule(now, COMPLETED_RESET_DELAY, ScheduledAction::StartLevel { index: next });
                state.emit(GameEvent::HubSound);
                state.emit(GameEvent::LevelCompleted);
                log::info!("Transfer complete: '{}'", level.title);
            } else if state.player.health <= 0.0 {
                state.phase = GamePhase::Failed;
                let index = state.level_index;
                state
                    .scheduler
                    .schedule(now, FAILED_RESET_DELAY, ScheduledAction::StartLevel { index });
                state
                    .scheduler
                    .schedule(now, FAILED_HUB_CLOSE_DELAY, ScheduledAction::CloseHub);
                state.emit(GameEvent::LoseSound);
                state.emit(GameEvent::LevelFailed);
                log::info!("Transfer failed at {:.0} m of '{}'", distance, level.title);
            }

            state.draw_distance = (distance + DRAW_DISTANCE_LEAD).min(distance.powf(DRAW_DISTANCE_EXPONENT));
        }

        GamePhase::Connecting | GamePhase::Completed | GamePhase::Failed => {
            retract_draw_distance(state, dt);
        }
    }

    run_scheduled(state, levels);
}

fn retract_draw_distance(state: &mut GameState, dt: f32) {
    state.draw_distance = (state.draw_distance - dt * DRAW_DISTANCE_RETRACT_RATE).max(0.0);
}

/// Report socket selection changes; clicks are rate limited
fn update_sockets(state: &mut GameState, docked: [bool; 2]) {
    for (side, &selected) in docked.iter().enumerate() {
        if state.hub.socket_selected[side] == Some(selected) {
            continue;
        }
        state.hub.socket_selected[side] = Some(selected);
        let click = selected && state.hub.since_click > SOCKET_CLICK_COOLDOWN;
        if click {
            state.hub.since_click = 0.0;
        }
        state.emit(GameEvent::SocketSelected { side, selected, click });
    }
}

fn run_scheduled(state: &mut GameState, levels: &mut [Level]) {
    for action in state.scheduler.drain_due(state.clock) {
        match action {
            ScheduledAction::BeginPlayback => {
                if state.phase == GamePhase::Connecting {
                    levels[state.level_index].playback.play(false, PLAYBACK_FADE_IN);
                    state.phase = GamePhase::Active;
                    log::info!("Playback started");
                }
            }
            ScheduledAction::StartLevel { index } => start_level(state, levels, index),
            ScheduledAction::CloseHub => {
                state.hub.closed = true;
                state.emit(GameEvent::HubSound);
            }
        }
    }
}
