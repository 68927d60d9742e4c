//! Reading the packed table back: the CPU twin of the WGSL decode functions.
//!
//! A fragment shader does three lookups per pixel: find its tile's cell, walk
//! the cell's run of indices, and fetch each indexed light entry. [`LutReader`]
//! does the same against a [`PackedBuffer`], which is how the tests (and CPU
//! consumers such as a software rasterizer or a debug overlay) see exactly
//! what the GPU would.

use crate::light::{LightKind, ShadowParams};
use crate::math::Vec3;

use super::buffer::PackedBuffer;
use super::grid::TILE_SIZE;
use super::layout::{LutLayout, Slot, texel};

/// A decoded light entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEntry {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub position_camera: Vec3,
    pub position_world: Vec3,
    pub range: f32,
    pub direction_camera: Vec3,
    pub spot_cutoff: f32,
    pub shadow: Option<ShadowParams>,
}

/// A tile's run in the flattened index list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileCell {
    pub offset: u32,
    pub count: u32,
}

impl TileCell {
    /// Flattened index positions covered by this run.
    pub fn positions(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.count as usize
    }
}

/// Read-only view of one built table.
#[derive(Debug, Clone, Copy)]
pub struct LutReader<'a> {
    buffer: &'a PackedBuffer,
    layout: LutLayout,
    grid_width: u32,
    grid_height: u32,
}

impl<'a> LutReader<'a> {
    pub fn new(buffer: &'a PackedBuffer, layout: LutLayout, grid_width: u32, grid_height: u32) -> Self {
        Self {
            buffer,
            layout,
            grid_width,
            grid_height,
        }
    }

    fn texel(&self, slot: Slot) -> [f32; 4] {
        self.buffer.texel(slot.col, slot.row).unwrap_or([0.0; 4])
    }

    /// Light entry `index`, or `None` for an empty or out-of-range slot.
    pub fn light(&self, index: usize) -> Option<LightEntry> {
        if index >= self.layout.max_lights() {
            return None;
        }
        let t = |k| self.texel(self.layout.light_slot(index, k));
        let color_kind = t(texel::COLOR_KIND);
        let kind = LightKind::from_code(color_kind[3])?;
        let cam = t(texel::POSITION_CAMERA_INTENSITY);
        let world = t(texel::POSITION_WORLD_RANGE);
        let dir = t(texel::DIRECTION_CUTOFF);
        let shadow = t(texel::SHADOW);
        Some(LightEntry {
            kind,
            color: [color_kind[0], color_kind[1], color_kind[2]],
            intensity: cam[3],
            position_camera: Vec3::new(cam[0], cam[1], cam[2]),
            position_world: Vec3::new(world[0], world[1], world[2]),
            range: world[3],
            direction_camera: Vec3::new(dir[0], dir[1], dir[2]),
            spot_cutoff: dir[3],
            shadow: (shadow[0] != 0.0).then_some(ShadowParams {
                strength: shadow[1],
                bias: shadow[2],
            }),
        })
    }

    /// Light entry index stored at flattened position `position`.
    pub fn light_index(&self, position: usize) -> Option<u32> {
        if position >= self.layout.index_capacity() {
            return None;
        }
        let slot = self.layout.index_slot(position);
        Some(self.texel(slot)[slot.channel] as u32)
    }

    /// The `(offset, count)` cell of tile `tile`.
    pub fn cell(&self, tile: usize) -> Option<TileCell> {
        if tile >= self.grid_width as usize * self.grid_height as usize {
            return None;
        }
        let slot = self.layout.cell_slot(tile);
        let t = self.texel(slot);
        Some(TileCell {
            offset: t[slot.channel] as u32,
            count: t[slot.channel + 1] as u32,
        })
    }

    /// The cell of the tile containing fragment `(frag_x, frag_y)`.
    pub fn cell_at(&self, frag_x: f32, frag_y: f32) -> Option<TileCell> {
        if !(frag_x >= 0.0 && frag_y >= 0.0) {
            return None;
        }
        let tx = (frag_x / TILE_SIZE as f32) as u32;
        let ty = (frag_y / TILE_SIZE as f32) as u32;
        if tx >= self.grid_width || ty >= self.grid_height {
            return None;
        }
        self.cell(ty as usize * self.grid_width as usize + tx as usize)
    }

    /// Light entry indices listed for tile `tile`, in stored order.
    pub fn tile_lights(&self, tile: usize) -> impl Iterator<Item = u32> + '_ {
        self.cell(tile)
            .unwrap_or_default()
            .positions()
            .filter_map(move |p| self.light_index(p))
    }

    /// Lights affecting fragment `(frag_x, frag_y)`. Empty means the pixel
    /// gets no dynamic light.
    pub fn lights_at(&self, frag_x: f32, frag_y: f32) -> impl Iterator<Item = LightEntry> + '_ {
        self.cell_at(frag_x, frag_y)
            .unwrap_or_default()
            .positions()
            .filter_map(move |p| self.light_index(p))
            .filter_map(move |i| self.light(i as usize))
    }

    pub fn grid_size(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }
}
