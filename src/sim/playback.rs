//! Song data and the playback contract
//!
//! Audio synthesis lives outside the simulation. The sim only needs to start
//! and stop a song, ask whether it is still playing and read its clock.
//! [`ClockPlayback`] implements the contract with a plain accumulator for
//! headless runs and tests.

use serde::{Deserialize, Serialize};

/// A single note (seconds from song start)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub time: f32,
    pub duration: f32,
}

/// An instrument track: notes in playback order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub notes: Vec<Note>,
}

/// Song as it appears in a level descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Total length in seconds
    pub duration: f32,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// What the simulation needs from an audio backend
pub trait Playback {
    /// Start from the beginning, optionally looping, fading in over `fade_in` seconds
    fn play(&mut self, looped: bool, fade_in: f32);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    /// Seconds since `play`
    fn current_time(&self) -> f32;
    /// Song length in seconds
    fn duration(&self) -> f32;
    fn tracks(&self) -> &[Track];
    /// Called once per tick with the frame delta. Backends with their own
    /// clock can ignore it.
    fn advance(&mut self, _dt: f32) {}
}

/// Playback driven purely by `advance`
#[derive(Debug, Clone)]
pub struct ClockPlayback {
    song: Song,
    time: f32,
    playing: bool,
    looped: bool,
}

impl ClockPlayback {
    pub fn new(song: Song) -> Self {
        Self {
            song,
            time: 0.0,
            playing: false,
            looped: false,
        }
    }

    pub fn song(&self) -> &Song {
        &self.song
    }
}

impl Playback for ClockPlayback {
    fn play(&mut self, looped: bool, _fade_in: f32) {
        self.time = 0.0;
        self.playing = true;
        self.looped = looped;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_time(&self) -> f32 {
        self.time
    }

    fn duration(&self) -> f32 {
        self.song.duration
    }

    fn tracks(&self) -> &[Track] {
        &self.song.tracks
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        self.time += dt;
        if self.time >= self.song.duration {
            if self.looped && self.song.duration > 0.0 {
                self.time = self.time.rem_euclid(self.song.duration);
            } else {
                self.time = self.song.duration;
                self.playing = false;
            }
        }
    }
}
