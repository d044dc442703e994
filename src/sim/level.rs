//! Level construction
//!
//! A level descriptor names a curve recipe (waypoint count, lateral spread,
//! spacing), a song and per-track influences. Loading one draws the waypoints
//! from a seeded RNG, samples the spline, and compiles the song into a hazard
//! field. Everything built here stays immutable for the life of the level.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::builder::{BuildParams, HazardFieldBuilder, Influence, LaneWidths};
use super::curve::{Curve, SampledCurve};
use super::hazard::HazardField;
use super::playback::{ClockPlayback, Playback, Song};
use crate::error::{LevelError, Result};

/// Curve recipe: `[pointCount, lateralSpread, pointSpacing]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(usize, f32, f32)", into = "(usize, f32, f32)")]
pub struct CurveRecipe {
    pub point_count: usize,
    pub lateral_spread: f32,
    pub point_spacing: f32,
}

impl From<(usize, f32, f32)> for CurveRecipe {
    fn from((point_count, lateral_spread, point_spacing): (usize, f32, f32)) -> Self {
        Self {
            point_count,
            lateral_spread,
            point_spacing,
        }
    }
}

impl From<CurveRecipe> for (usize, f32, f32) {
    fn from(c: CurveRecipe) -> Self {
        (c.point_count, c.lateral_spread, c.point_spacing)
    }
}

impl CurveRecipe {
    /// Waypoints marching along +Z with random X/Y jitter
    pub fn waypoints(&self, rng: &mut Pcg32) -> Vec<Vec3> {
        let spread = self.lateral_spread.abs();
        (0..self.point_count)
            .map(|i| {
                let x = rng.random_range(-spread..=spread);
                let y = rng.random_range(-spread..=spread);
                Vec3::new(x, y, i as f32 * self.point_spacing)
            })
            .collect()
    }
}

/// Raw level data as shipped with the game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescriptor {
    pub title: String,
    pub curve: CurveRecipe,
    #[serde(default)]
    pub song: Option<Song>,
    /// One entry per song track; `null` tracks don't shape the tunnel
    #[serde(default)]
    pub influences: Vec<Option<Influence>>,
    /// Resting lane width (byte units, 64 = quarter turn)
    pub default_width: f32,
    /// Narrowest the lane may get (byte units)
    pub min_width: f32,
    /// Fixed seed for this level; otherwise derived from the run seed
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LevelDescriptor {
    /// Parse a JSON array of descriptors
    pub fn parse_list(json: &str) -> Result<Vec<LevelDescriptor>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file holding an array of descriptors
    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<LevelDescriptor>> {
        let json = std::fs::read_to_string(path)?;
        Self::parse_list(&json)
    }
}

/// A playable level
pub struct Level {
    pub title: String,
    pub curve: SampledCurve,
    pub field: HazardField,
    pub playback: Box<dyn Playback>,
    /// Meters per second of song (`L / duration`)
    pub velocity: f32,
}

impl std::fmt::Debug for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Level")
            .field("title", &self.title)
            .field("length", &self.curve.length())
            .field("velocity", &self.velocity)
            .finish_non_exhaustive()
    }
}

impl Level {
    /// Build a level around an already-constructed playback backend
    pub fn build(
        descriptor: &LevelDescriptor,
        playback: Box<dyn Playback>,
        params: &BuildParams,
        seed: u64,
    ) -> Result<Self> {
        let title = descriptor.title.clone();
        let duration = playback.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(LevelError::InvalidSongDuration { title, duration });
        }

        let mut rng = Pcg32::seed_from_u64(descriptor.seed.unwrap_or(seed));
        let waypoints = descriptor.curve.waypoints(&mut rng);
        let curve = Curve::new(waypoints)
            .as_ref()
            .and_then(SampledCurve::new)
            .ok_or_else(|| LevelError::EmptyCurve {
                title: title.clone(),
            })?;

        let widths = LaneWidths {
            default_width: descriptor.default_width,
            min_width: descriptor.min_width,
        };
        let field = HazardFieldBuilder::compile(
            params.clone(),
            widths,
            duration,
            curve.length(),
            playback.tracks(),
            &descriptor.influences,
            rng.random(),
        );

        let velocity = curve.length() / duration;
        log::info!(
            "Loaded level '{}': {:.0} m over {:.1} s ({:.1} m/s)",
            title,
            curve.length(),
            duration,
            velocity
        );

        Ok(Self {
            title,
            curve,
            field,
            playback,
            velocity,
        })
    }

    /// Build a level whose song is driven by [`ClockPlayback`]
    pub fn from_descriptor(descriptor: &LevelDescriptor, params: &BuildParams, seed: u64) -> Result<Self> {
        let song = descriptor.song.clone().ok_or_else(|| LevelError::MissingSong {
            title: descriptor.title.clone(),
        })?;
        Self::build(descriptor, Box::new(ClockPlayback::new(song)), params, seed)
    }

    /// Tunnel length in meters
    pub fn length(&self) -> f32 {
        self.curve.length()
    }
}

/// Build every descriptor, dropping (and logging) the ones that fail
pub fn load_levels(descriptors: &[LevelDescriptor], params: &BuildParams, seed: u64) -> Vec<Level> {
    descriptors
        .iter()
        .enumerate()
        .filter_map(|(i, descriptor)| {
            let level_seed = seed.wrapping_add(i as u64);
            match Level::from_descriptor(descriptor, params, level_seed) {
                Ok(level) => Some(level),
                Err(e) => {
                    log::warn!("Skipping level {} ('{}'): {}", i, descriptor.title, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS_JSON: &str = r#"[
        {
            "title": "Handshake",
            "curve": [12, 4.0, 20.0],
            "song": {
                "duration": 20.0,
                "tracks": [
                    {"notes": [{"time": 1.0, "duration": 0.5}, {"time": 6.0, "duration": 1.0}]},
                    {"notes": [{"time": 3.0, "duration": 2.0}]}
                ]
            },
            "influences": [[0.8, 0.4, 0.0, 1.5], null],
            "defaultWidth": 48,
            "minWidth": 12
        },
        {
            "title": "Silent",
            "curve": [12, 4.0, 20.0],
            "influences": [],
            "defaultWidth": 48,
            "minWidth": 12
        },
        {
            "title": "Stub",
            "curve": [1, 4.0, 20.0],
            "song": {"duration": 10.0},
            "defaultWidth": 48,
            "minWidth": 12
        }
    ]"#;

    #[test]
    fn test_parse_descriptors() {
        let descriptors = LevelDescriptor::parse_list(LEVELS_JSON).unwrap();
        assert_eq!(descriptors.len(), 3);
        let first = &descriptors[0];
        assert_eq!(first.curve.point_count, 12);
        assert_eq!(first.influences.len(), 2);
        assert!(first.influences[1].is_none());
        assert!(descriptors[1].song.is_none());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = LevelDescriptor::parse_list("{not json").unwrap_err();
        assert!(matches!(err, LevelError::Parse(_)));
    }

    #[test]
    fn test_broken_levels_are_skipped() {
        let descriptors = LevelDescriptor::parse_list(LEVELS_JSON).unwrap();
        let levels = load_levels(&descriptors, &BuildParams::default(), 42);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].title, "Handshake");
    }

    #[test]
    fn test_missing_song_and_empty_curve_errors() {
        let descriptors = LevelDescriptor::parse_list(LEVELS_JSON).unwrap();
        let params = BuildParams::default();
        assert!(matches!(
            Level::from_descriptor(&descriptors[1], &params, 1),
            Err(LevelError::MissingSong { .. })
        ));
        assert!(matches!(
            Level::from_descriptor(&descriptors[2], &params, 1),
            Err(LevelError::EmptyCurve { .. })
        ));
    }

    #[test]
    fn test_velocity_matches_length_over_duration() {
        let descriptors = LevelDescriptor::parse_list(LEVELS_JSON).unwrap();
        let level = Level::from_descriptor(&descriptors[0], &BuildParams::default(), 5).unwrap();
        assert!(level.length() > 200.0);
        assert!((level.velocity * 20.0 - level.length()).abs() < 1e-3);
    }

    #[test]
    fn test_same_seed_same_level() {
        let descriptors = LevelDescriptor::parse_list(LEVELS_JSON).unwrap();
        let params = BuildParams::default();
        let a = Level::from_descriptor(&descriptors[0], &params, 9).unwrap();
        let b = Level::from_descriptor(&descriptors[0], &params, 9).unwrap();
        assert_eq!(a.field, b.field);
        assert_eq!(a.curve.samples(), b.curve.samples());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut descriptor = LevelDescriptor::parse_list(LEVELS_JSON).unwrap().remove(0);
        descriptor.song = Some(Song {
            duration: 0.0,
            tracks: Vec::new(),
        });
        assert!(matches!(
            Level::from_descriptor(&descriptor, &BuildParams::default(), 1),
            Err(LevelError::InvalidSongDuration { .. })
        ));
    }
}
