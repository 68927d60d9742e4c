//! Writing lights, indices and tile cells into a [`PackedBuffer`].
//!
//! Every write goes through a [`LutLayout`] slot, so the encoder and the
//! decoder can't disagree about where a value lives.

use crate::light::{Light, LightKind};
use crate::math::{Mat4, Vec3};

use super::buffer::PackedBuffer;
use super::layout::{LutLayout, Slot, TEXELS_PER_LIGHT, texel};

/// A light with its camera-space position and direction resolved for one
/// frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewLight {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub position_world: Vec3,
    pub position_camera: Vec3,
    /// Unit camera-space direction, or zero for point lights.
    pub direction_camera: Vec3,
    /// Zero for directional lights.
    pub range: f32,
    pub spot_cutoff: f32,
    pub shadow: Option<(f32, f32)>,
}

impl ViewLight {
    /// Resolve `light` against the world → camera transform `view`.
    pub fn new(light: &Light, view: &Mat4) -> Self {
        let direction_camera = match light.kind {
            LightKind::Point => Vec3::ZERO,
            LightKind::Directional | LightKind::Spot => {
                view.transform_vector3(light.direction).normalize_or_zero()
            }
        };
        let (position_world, range) = match light.kind {
            LightKind::Directional => (Vec3::ZERO, 0.0),
            LightKind::Point | LightKind::Spot => (light.position, light.range),
        };
        Self {
            kind: light.kind,
            color: light.color,
            intensity: light.intensity,
            position_world,
            position_camera: view.transform_point3(position_world),
            direction_camera,
            range,
            spot_cutoff: if light.kind == LightKind::Spot {
                light.spot_cutoff
            } else {
                0.0
            },
            shadow: light.shadow.map(|s| (s.strength, s.bias)),
        }
    }

    /// The five texels of this light's entry.
    ///
    /// ```text
    /// k │ r            g            b            a
    /// ──┼───────────────────────────────────────────────────
    /// 0 │ color.r      color.g      color.b      kind code
    /// 1 │ pos_cam.x    pos_cam.y    pos_cam.z    intensity
    /// 2 │ pos_world.x  pos_world.y  pos_world.z  range
    /// 3 │ dir_cam.x    dir_cam.y    dir_cam.z    spot cutoff
    /// 4 │ shadowed     strength     bias         0
    /// ```
    pub fn pack(&self) -> [[f32; 4]; TEXELS_PER_LIGHT] {
        let mut texels = [[0.0; 4]; TEXELS_PER_LIGHT];
        let [r, g, b] = self.color;
        texels[texel::COLOR_KIND] = [r, g, b, self.kind.code()];
        texels[texel::POSITION_CAMERA_INTENSITY] = self.position_camera.extend(self.intensity).into();
        texels[texel::POSITION_WORLD_RANGE] = self.position_world.extend(self.range).into();
        texels[texel::DIRECTION_CUTOFF] = self.direction_camera.extend(self.spot_cutoff).into();
        if let Some((strength, bias)) = self.shadow {
            texels[texel::SHADOW] = [1.0, strength, bias, 0.0];
        }
        texels
    }
}

fn write(buffer: &mut PackedBuffer, layout: &LutLayout, slot: Slot, values: &[f32]) {
    let index = layout.texel_index(slot);
    if let Some(texel) = buffer.texel_mut(index) {
        let end = (slot.channel + values.len()).min(4);
        texel[slot.channel..end].copy_from_slice(&values[..end - slot.channel]);
    }
}

/// Write light entry `index`.
pub fn write_light(buffer: &mut PackedBuffer, layout: &LutLayout, index: usize, light: &ViewLight) {
    for (k, values) in light.pack().iter().enumerate() {
        write(buffer, layout, layout.light_slot(index, k), values);
    }
}

/// Write light entry index `light` at flattened position `position`.
pub fn write_index(buffer: &mut PackedBuffer, layout: &LutLayout, position: usize, light: u32) {
    write(buffer, layout, layout.index_slot(position), &[light as f32]);
}

/// Write tile `tile`'s `(offset, count)` pair.
pub fn write_cell(buffer: &mut PackedBuffer, layout: &LutLayout, tile: usize, offset: u32, count: u32) {
    write(buffer, layout, layout.cell_slot(tile), &[offset as f32, count as f32]);
}
