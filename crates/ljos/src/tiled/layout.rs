//! # Layout — Where Every Value Lives in the Table
//!
//! The table is a 640-texel-wide grid of RGBA f32 texels split into three
//! bands of rows. The same arithmetic is used by the builder to write and by
//! every consumer to read, so it lives in one place.
//!
//! ```text
//!  col → 0                                                      639
//!  row 0 ┌──────────────────────────────────────────────────────┐
//!        │ light entries: 5 texels × 128 lights per row          │
//!        │ [color,kind][pos_cam,int][pos_world,range][dir,cut][shadow]
//!  index_base_row ├────────────────────────────────────────────────┤
//!        │ flattened light indices: 4 per texel, 2560 per row    │
//!        │ tile 0's run │ tile 1's run │ ... (contiguous)        │
//!  grid_base_row ├─────────────────────────────────────────────────┤
//!        │ tile table: (offset, count) × 2 per texel, 1280/row   │
//!        └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Addressing
//!
//! | Lookup | Row | Column | Channel |
//! |--------|-----|--------|---------|
//! | light `i`, texel `k` | `i / 128` | `(i % 128) * 5 + k` | all |
//! | index at position `p` | `index_base_row + p / 2560` | `(p % 2560) / 4` | `p % 4` |
//! | tile `c` | `grid_base_row + c / 1280` | `(c % 1280) / 2` | `xy` if `c` even, else `zw` |
//!
//! Integers (kind codes, indices, offsets, counts) are stored as f32. Config
//! validation keeps every capacity below 2^24, where f32 stops representing
//! integers exactly.
//!
//! ## Comparison
//!
//! - **Storage-buffer Forward+** (most wgpu/Vulkan engines): separate typed
//!   buffers for lights, indices and the grid. Cleaner, but needs storage
//!   buffers in the fragment stage.
//! - **Our approach**: one float texture, readable by the most constrained
//!   backends (WebGL-class devices sample textures, they may not bind storage
//!   buffers). The price is f32-encoded integers and manual row wrapping.

use bytemuck::{Pod, Zeroable};

use crate::config::LutConfig;

/// Width of the table in texels.
pub const LUT_WIDTH: usize = 640;
/// Texels per light entry.
pub const TEXELS_PER_LIGHT: usize = 5;
/// Light entries per texel row.
pub const LIGHTS_PER_ROW: usize = LUT_WIDTH / TEXELS_PER_LIGHT;
/// Light indices packed into one texel.
pub const INDICES_PER_TEXEL: usize = 4;
/// Light indices per texel row.
pub const INDICES_PER_ROW: usize = LUT_WIDTH * INDICES_PER_TEXEL;
/// (offset, count) pairs packed into one texel.
pub const CELLS_PER_TEXEL: usize = 2;
/// Tile cells per texel row.
pub const CELLS_PER_ROW: usize = LUT_WIDTH * CELLS_PER_TEXEL;

/// Texel offsets within a light entry.
pub(crate) mod texel {
    pub const COLOR_KIND: usize = 0;
    pub const POSITION_CAMERA_INTENSITY: usize = 1;
    pub const POSITION_WORLD_RANGE: usize = 2;
    pub const DIRECTION_CUTOFF: usize = 3;
    pub const SHADOW: usize = 4;
}

/// A texel coordinate plus the channel(s) within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub col: usize,
    pub row: usize,
    /// First channel (0–3) of the value within the texel.
    pub channel: usize,
}

/// Row layout of one table, derived from a [`LutConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LutLayout {
    max_lights: usize,
    light_rows: usize,
    index_rows: usize,
    grid_rows: usize,
}

impl LutLayout {
    pub fn new(config: &LutConfig) -> Self {
        let max_lights = config.max_lights as usize;
        Self {
            max_lights,
            light_rows: max_lights.div_ceil(LIGHTS_PER_ROW),
            index_rows: config.index_rows as usize,
            grid_rows: config.grid_rows as usize,
        }
    }

    pub const fn width(&self) -> usize {
        LUT_WIDTH
    }

    pub const fn height(&self) -> usize {
        self.light_rows + self.index_rows + self.grid_rows
    }

    pub const fn max_lights(&self) -> usize {
        self.max_lights
    }

    pub const fn index_base_row(&self) -> usize {
        self.light_rows
    }

    pub const fn grid_base_row(&self) -> usize {
        self.light_rows + self.index_rows
    }

    /// Number of flattened index slots.
    pub const fn index_capacity(&self) -> usize {
        self.index_rows * INDICES_PER_ROW
    }

    /// Number of tiles the tile table can describe.
    pub const fn cell_capacity(&self) -> usize {
        self.grid_rows * CELLS_PER_ROW
    }

    /// Texel `k` of light entry `index`.
    pub const fn light_slot(&self, index: usize, k: usize) -> Slot {
        Slot {
            col: (index % LIGHTS_PER_ROW) * TEXELS_PER_LIGHT + k,
            row: index / LIGHTS_PER_ROW,
            channel: 0,
        }
    }

    /// Slot of position `position` in the flattened index list.
    pub const fn index_slot(&self, position: usize) -> Slot {
        let in_row = position % INDICES_PER_ROW;
        Slot {
            col: in_row / INDICES_PER_TEXEL,
            row: self.index_base_row() + position / INDICES_PER_ROW,
            channel: in_row % INDICES_PER_TEXEL,
        }
    }

    /// Slot of tile `tile`'s (offset, count) pair. `channel` is 0 (`xy`) or 2
    /// (`zw`).
    pub const fn cell_slot(&self, tile: usize) -> Slot {
        let in_row = tile % CELLS_PER_ROW;
        Slot {
            col: in_row / CELLS_PER_TEXEL,
            row: self.grid_base_row() + tile / CELLS_PER_ROW,
            channel: (in_row % CELLS_PER_TEXEL) * 2,
        }
    }

    /// Linear texel index of a slot in a row-major buffer.
    pub const fn texel_index(&self, slot: Slot) -> usize {
        slot.row * LUT_WIDTH + slot.col
    }
}

/// Per-frame parameters a GPU consumer needs besides the texture, laid out
/// for a WGSL uniform.
///
/// ```text
/// LutUniform (16 bytes)
/// ┌──────────────┬────────────────┬───────────────┐
/// │ grid_size    │ index_base_row │ grid_base_row │
/// │ vec2<u32>    │ u32            │ u32           │
/// │ offset 0     │ offset 8       │ offset 12     │
/// └──────────────┴────────────────┴───────────────┘
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct LutUniform {
    pub grid_size: [u32; 2],
    pub index_base_row: u32,
    pub grid_base_row: u32,
}
