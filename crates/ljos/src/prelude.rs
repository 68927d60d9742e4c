//! Convenience re-exports: `use ljos::prelude::*;`

pub use crate::camera::{Camera, ClipDepth};
pub use crate::config::LutConfig;
pub use crate::error::LutError;
pub use crate::light::{Light, LightKind, LightRejection, ShadowParams};
pub use crate::math::{Mat4, Quat, Transform, Vec2, Vec3, Vec4, Viewport};
pub use crate::tiled::{
    BuildStats, LightEntry, LightLut, LutCounters, LutLayout, LutParam, LutReader, LutUniform,
    PackedBuffer, TILE_SIZE, TileCell, TileGrid, TileOrigin, TiledLightIndex,
};

#[cfg(feature = "gpu")]
pub use crate::gpu::{DECODE_WGSL, LutTexture};
