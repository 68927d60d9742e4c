//! Errors reported by the light index.
//!
//! Only misconfiguration is an error. Running out of light or index capacity
//! during a frame is an expected degradation: it is counted in
//! [`BuildStats`](crate::tiled::BuildStats) and logged, never returned here.

use std::fmt;

/// Errors that can occur while configuring or building the light index.
#[derive(Debug, Clone, PartialEq)]
pub enum LutError {
    /// The viewport has a zero dimension.
    InvalidViewport { width: u32, height: u32 },
    /// The projection matrix cannot be inverted, or unprojecting a tile
    /// produced non-finite corners (e.g. an infinite far plane).
    DegenerateProjection,
    /// The viewport needs more tiles than the tile table can hold.
    GridOverflow { tiles: usize, capacity: usize },
    /// The configuration is invalid or could not be parsed.
    Config(String),
    /// A configuration file could not be read.
    Io(String),
}

impl fmt::Display for LutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LutError::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {width}x{height}: both dimensions must be non-zero")
            }
            LutError::DegenerateProjection => {
                write!(f, "projection matrix is degenerate or has an infinite far plane")
            }
            LutError::GridOverflow { tiles, capacity } => {
                write!(f, "viewport needs {tiles} tiles but the tile table holds {capacity}")
            }
            LutError::Config(e) => write!(f, "invalid light index config: {e}"),
            LutError::Io(e) => write!(f, "failed to read light index config: {e}"),
        }
    }
}

impl std::error::Error for LutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_dimensions() {
        let e = LutError::InvalidViewport { width: 0, height: 720 };
        assert_eq!(
            e.to_string(),
            "invalid viewport 0x720: both dimensions must be non-zero"
        );
    }
}
