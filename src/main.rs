//! Tunnel Transfer entry point
//!
//! Headless runner: loads a level list, flies a scripted pilot through it at
//! a fixed frame rate and logs what happens.
//!
//! Run with `--help` for options.

use std::f32::consts::TAU;
use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;
use tunnel_transfer::consts::*;
use tunnel_transfer::renderer::TunnelUniforms;
use tunnel_transfer::sim::{
    GameEvent, GamePhase, GameState, Hand, HandPose, Level, LevelDescriptor, TickInput, load_levels, start_level, tick,
};
use tunnel_transfer::Settings;

/// Built-in level list used when no file is given
const DEMO_LEVELS: &str = r#"[
    {
        "title": "Dial Tone",
        "curve": [16, 6.0, 25.0],
        "song": {
            "duration": 24.0,
            "tracks": [
                {"notes": [
                    {"time": 2.0, "duration": 0.5}, {"time": 4.0, "duration": 0.5},
                    {"time": 6.0, "duration": 1.0}, {"time": 9.0, "duration": 0.5},
                    {"time": 12.0, "duration": 2.0}, {"time": 16.0, "duration": 0.5}
                ]},
                {"notes": [
                    {"time": 3.0, "duration": 1.5}, {"time": 8.0, "duration": 1.0},
                    {"time": 14.0, "duration": 3.0}
                ]}
            ]
        },
        "influences": [[0.6, 0.3, 0.0, 1.0], [0.3, 0.6, 2.0, 0.5]],
        "defaultWidth": 52,
        "minWidth": 14
    }
]"#;

/// Fly a scripted pilot through a level list and log what happens
#[derive(Debug, Parser)]
#[command(name = "tunnel-transfer", version, about)]
struct Cli {
    /// Level list JSON; the built-in demo level is used when omitted
    levels: Option<PathBuf>,

    /// Settings JSON (missing fields take their defaults)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Aim the hands straight across from the safe lane
    #[arg(long)]
    reckless: bool,

    /// Simulated run time in seconds
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,
}

/// Scripted hands: dock into the hub sockets while waiting, otherwise point
/// at the lane center a couple of meters ahead (or straight across from it
/// when reckless)
fn pilot(state: &GameState, level: &Level, reckless: bool) -> [Option<HandPose>; 2] {
    let mut hands = [None; 2];
    for hand in Hand::BOTH {
        let i = hand.index();
        hands[i] = Some(if state.phase == GamePhase::Ready {
            HandPose {
                position: state.hub.socket_position(i),
                forward: state.hub.placement.forward(),
            }
        } else {
            let distance = state.player.distance;
            let ahead = (distance + 2.0).min(level.length());
            let mut turn = level.field.lane(ahead, hand).center_angle;
            if reckless {
                turn += 0.5;
            }
            let position = level.curve.position_at(distance);
            let target = level.curve.point_on_ring(ahead, TUNNEL_RADIUS, turn * TAU);
            HandPose {
                position,
                forward: (target - position).try_normalize().unwrap_or(Vec3::NEG_Z),
            }
        });
    }
    hands
}

fn main() {
    env_logger::init();
    log::info!("Tunnel Transfer (headless) starting...");

    let options = Cli::parse();
    let settings = match &options.settings {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };

    let descriptors = match &options.levels {
        Some(path) => LevelDescriptor::load_file(path),
        None => LevelDescriptor::parse_list(DEMO_LEVELS),
    };
    let descriptors = match descriptors {
        Ok(d) => d,
        Err(e) => {
            log::error!("Failed to read levels: {}", e);
            std::process::exit(1);
        }
    };

    let mut levels = load_levels(&descriptors, &settings.build, settings.seed);
    if levels.is_empty() {
        log::error!("No playable levels");
        std::process::exit(1);
    }

    let mut state = GameState::new();
    start_level(&mut state, &mut levels, 0);

    let frames = (options.seconds / FRAME_DT).ceil() as usize;
    for _ in 0..frames {
        let level = &levels[state.level_index];
        let input = TickInput {
            hands: pilot(&state, level, options.reckless),
            ..Default::default()
        };
        tick(&mut state, &mut levels, &input, &settings, FRAME_DT);

        for event in state.drain_events() {
            match event {
                GameEvent::LevelActive { progress_percent } if progress_percent % 10 != 0 => {}
                GameEvent::SocketSelected { .. } | GameEvent::HubSound => {
                    log::debug!("{:?}", event);
                }
                _ => log::info!("t={:6.2}s health={:.2} {:?}", state.clock, state.player.health, event),
            }
        }
    }

    let uniforms = TunnelUniforms::from_state(&state, &levels[state.level_index]);
    log::info!("Final uniforms: {:?}", uniforms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["tunnel-transfer"]).unwrap();
        assert!(cli.levels.is_none());
        assert!(cli.settings.is_none());
        assert!(!cli.reckless);
        assert_eq!(cli.seconds, 60.0);
    }

    #[test]
    fn test_cli_full() {
        let cli = Cli::try_parse_from([
            "tunnel-transfer",
            "levels.json",
            "--settings",
            "settings.json",
            "--reckless",
            "--seconds",
            "12.5",
        ])
        .unwrap();
        assert_eq!(cli.levels, Some(PathBuf::from("levels.json")));
        assert_eq!(cli.settings, Some(PathBuf::from("settings.json")));
        assert!(cli.reckless);
        assert_eq!(cli.seconds, 12.5);
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        assert!(Cli::try_parse_from(["tunnel-transfer", "--bogus"]).is_err());
        assert!(Cli::try_parse_from(["tunnel-transfer", "--seconds"]).is_err());
        assert!(Cli::try_parse_from(["tunnel-transfer", "--seconds", "soon"]).is_err());
        let help = Cli::try_parse_from(["tunnel-transfer", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
