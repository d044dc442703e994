//! Level loading errors
//!
//! A level that fails to build is dropped from rotation; it never takes the
//! run loop down with it.

/// Result type for level construction
pub type Result<T> = std::result::Result<T, LevelError>;

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// Curve definition produces no usable geometry
    #[error("curve for level '{title}' is empty (needs at least 2 waypoints and 2 m of length)")]
    EmptyCurve { title: String },

    /// Descriptor has no song
    #[error("level '{title}' has no song")]
    MissingSong { title: String },

    /// Song duration is zero, negative or not finite
    #[error("song for level '{title}' has invalid duration {duration}")]
    InvalidSongDuration { title: String, duration: f32 },

    /// Descriptor JSON could not be parsed
    #[error("level descriptor parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Descriptor file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LevelError::MissingSong {
            title: "Intro".to_string(),
        };
        assert_eq!(err.to_string(), "level 'Intro' has no song");

        let err = LevelError::InvalidSongDuration {
            title: "Intro".to_string(),
            duration: 0.0,
        };
        assert!(err.to_string().contains("invalid duration 0"));
    }
}
