//! Error types
//!
//! Degenerate numeric configurations (gimbal lock, antiparallel vectors,
//! near-zero interpolation arcs) are handled by fallback branches in the
//! math itself and never surface as errors. The types here cover the two
//! conditions that have no sensible best-effort answer: sampling a track
//! with no keyframes, and parsing an unrecognized rotation-order string.

use thiserror::Error;

/// Error returned when evaluating a keyframe track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SampleError {
    /// The track holds no samples, so there is nothing to interpolate.
    #[error("keyframe track has no samples")]
    EmptyTrack,
}

/// Error returned when parsing a rotation-order string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized rotation order `{0}`")]
pub struct ParseOrderError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_error_display() {
        let msg = format!("{}", SampleError::EmptyTrack);
        assert!(msg.contains("no samples"));
    }

    #[test]
    fn test_parse_order_error_display() {
        let msg = format!("{}", ParseOrderError("XXY".to_string()));
        assert!(msg.contains("XXY"));
        assert!(msg.contains("rotation order"));
    }
}
