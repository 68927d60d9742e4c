//! Per-build statistics and running counters.
//!
//! Capacity problems never fail a build. They show up here instead, so a
//! caller (or the telemetry viewer) can tell when the table is too small for
//! the scene.

use serde::{Deserialize, Serialize};

/// What one build did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildStats {
    /// Lights passed to `build`.
    pub lights_submitted: usize,
    /// Lights skipped because they failed validation.
    pub lights_rejected: usize,
    /// Light entries written.
    pub lights_stored: usize,
    /// Valid lights dropped because the light region was full.
    pub lights_dropped: usize,
    /// Tiles in the grid.
    pub tiles: usize,
    /// Total indices written across all tiles.
    pub tile_light_pairs: usize,
    /// Tile/light intersections skipped because a tile hit its per-tile cap.
    pub tile_overflow: usize,
    /// Tile/light intersections skipped because the index region was full.
    pub index_overflow: usize,
    /// Longest run written for a single tile.
    pub max_tile_lights: usize,
    /// Wall-clock build time in microseconds.
    pub build_us: u64,
}

impl BuildStats {
    /// Whether anything was dropped for lack of space.
    pub fn overflowed(&self) -> bool {
        self.lights_dropped > 0 || self.tile_overflow > 0 || self.index_overflow > 0
    }
}

/// Totals since the index was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LutCounters {
    pub builds: u64,
    pub lights_dropped: u64,
    pub lights_rejected: u64,
    pub tile_overflow: u64,
    pub index_overflow: u64,
    /// Builds in which anything overflowed.
    pub overflowed_builds: u64,
}

impl LutCounters {
    pub(crate) fn record(&mut self, stats: &BuildStats) {
        self.builds += 1;
        self.lights_dropped += stats.lights_dropped as u64;
        self.lights_rejected += stats.lights_rejected as u64;
        self.tile_overflow += stats.tile_overflow as u64;
        self.index_overflow += stats.index_overflow as u64;
        if stats.overflowed() {
            self.overflowed_builds += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut counters = LutCounters::default();
        counters.record(&BuildStats {
            lights_dropped: 2,
            ..Default::default()
        });
        counters.record(&BuildStats {
            tile_overflow: 5,
            lights_rejected: 1,
            ..Default::default()
        });
        counters.record(&BuildStats::default());
        assert_eq!(counters.builds, 3);
        assert_eq!(counters.lights_dropped, 2);
        assert_eq!(counters.tile_overflow, 5);
        assert_eq!(counters.lights_rejected, 1);
        assert_eq!(counters.overflowed_builds, 2);
    }

    #[test]
    fn rejected_lights_are_not_overflow() {
        let stats = BuildStats {
            lights_rejected: 3,
            ..Default::default()
        };
        assert!(!stats.overflowed());
    }
}
