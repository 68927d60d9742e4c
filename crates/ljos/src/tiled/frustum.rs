//! # Frustum — Which Lights Can Reach a Tile
//!
//! Each tile sees a thin slice of the camera's view volume: a small frustum
//! bounded by the four planes through the tile's edges and by the near and far
//! clip planes. A point or spot light can only light pixels in the tile if its
//! range sphere overlaps that slice.
//!
//! ## Building the Slice
//!
//! ```text
//!          near                         far
//!   n3 ┌──────┐ n2              f3 ┌──────────────┐ f2
//!      │ tile │       ───►         │              │
//!   n0 └──────┘ n1    unproject f0 └──────────────┘ f1
//! ```
//!
//! The tile's NDC rectangle is unprojected at the near and far depths through
//! the inverse projection, giving eight camera-space corners. Each of the six
//! faces becomes a plane, flipped so the centroid of the corners lies on its
//! positive side. Orienting by the centroid instead of by winding makes the
//! same code work for right- and left-handed, perspective and orthographic,
//! and reversed-Z projections.
//!
//! ## The Test
//!
//! A sphere is rejected only if it lies entirely behind one plane:
//! `distance(center) < -radius`. This is conservative: a sphere sitting just
//! off a corner of the frustum passes all six tests without touching the
//! slice. The cost is an occasional extra light in a tile's list, never a
//! missing one.
//!
//! ## Caching
//!
//! The planes depend only on the projection, viewport, tile origin and clip
//! depth, not on the camera's position. A moving camera with a fixed lens
//! reuses the same planes every frame; they are rebuilt when any input
//! changes (a resize, a zoom).
//!
//! ## Comparison
//!
//! - **GPU Forward+ (compute)**: the same six-plane test per tile, usually with
//!   near/far tightened to the tile's depth range from a depth pre-pass.
//! - **Screen-space AABB**: project each sphere to a screen rectangle and fill
//!   the tiles it covers. Faster for many lights, looser for lights near the
//!   camera.

use crate::camera::{Camera, ClipDepth};
use crate::error::LutError;
use crate::math::{Mat4, Plane, Vec2, Vec3};

use super::grid::TileGrid;

/// The six camera-space planes bounding one tile, all facing inward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileFrustum {
    pub planes: [Plane; 6],
}

impl TileFrustum {
    /// Frustum for the NDC rectangle `[min, max]` between the given NDC depths.
    pub fn from_ndc(
        inverse_projection: &Mat4,
        min: Vec2,
        max: Vec2,
        near_z: f32,
        far_z: f32,
    ) -> Result<Self, LutError> {
        let corners = [
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
        ];
        let mut n = [Vec3::ZERO; 4];
        let mut f = [Vec3::ZERO; 4];
        for (i, c) in corners.iter().enumerate() {
            n[i] = unproject(inverse_projection, c.extend(near_z))?;
            f[i] = unproject(inverse_projection, c.extend(far_z))?;
        }

        let centroid = n.iter().chain(f.iter()).copied().sum::<Vec3>() / 8.0;
        let faces = [
            (n[0], n[3], f[0]), // left
            (n[1], n[2], f[1]), // right
            (n[0], n[1], f[0]), // bottom
            (n[3], n[2], f[3]), // top
            (n[0], n[1], n[2]), // near
            (f[0], f[1], f[2]), // far
        ];

        let mut planes = [Plane {
            normal: Vec3::ZERO,
            d: 0.0,
        }; 6];
        for (plane, (a, b, c)) in planes.iter_mut().zip(faces) {
            *plane = Plane::from_points(a, b, c)
                .ok_or(LutError::DegenerateProjection)?
                .facing(centroid);
        }
        Ok(Self { planes })
    }

    /// Whether a sphere overlaps the frustum (conservatively).
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(center) >= -radius)
    }

    /// Whether a point is inside the frustum.
    pub fn contains(&self, point: Vec3) -> bool {
        self.intersects_sphere(point, 0.0)
    }
}

/// Unproject an NDC point to camera space.
fn unproject(inverse_projection: &Mat4, ndc: Vec3) -> Result<Vec3, LutError> {
    let h = *inverse_projection * ndc.extend(1.0);
    if !h.is_finite() || h.w == 0.0 {
        return Err(LutError::DegenerateProjection);
    }
    let p = h.truncate() / h.w;
    if p.is_finite() {
        Ok(p)
    } else {
        Err(LutError::DegenerateProjection)
    }
}

/// Whether the projection sends points at infinity into the depth range,
/// which is what an infinite far plane does.
///
/// The direction `(0, 0, ±1, 0)` projects to the projection's z column, so its
/// NDC depth is `z_axis.z / z_axis.w` for either handedness. A finite far
/// plane puts that depth strictly outside `[near_z, far_z]`. Orthographic
/// projections leave `w` at zero and never qualify.
fn has_infinite_far_plane(projection: &Mat4, clip_depth: ClipDepth) -> bool {
    let column = projection.z_axis;
    if column.w == 0.0 {
        return false;
    }
    let depth = column.z / column.w;
    let (lo, hi) = (
        clip_depth.near_z().min(clip_depth.far_z()),
        clip_depth.near_z().max(clip_depth.far_z()),
    );
    (lo..=hi).contains(&depth)
}

/// Everything the planes depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrustumKey {
    projection: Mat4,
    grid: TileGrid,
    clip_depth: ClipDepth,
}

/// Per-tile frusta, rebuilt only when the lens or viewport changes.
#[derive(Debug, Default)]
pub struct FrustumCache {
    key: Option<FrustumKey>,
    frusta: Vec<TileFrustum>,
}

impl FrustumCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the cache holds frusta for `camera` and `grid`, and return
    /// them in tile-index order.
    pub fn update(&mut self, camera: &Camera, grid: &TileGrid) -> Result<&[TileFrustum], LutError> {
        let key = FrustumKey {
            projection: camera.projection,
            grid: *grid,
            clip_depth: camera.clip_depth,
        };
        if self.key.as_ref() != Some(&key) {
            self.rebuild(camera, grid)?;
            self.key = Some(key);
        }
        Ok(&self.frusta)
    }

    fn rebuild(&mut self, camera: &Camera, grid: &TileGrid) -> Result<(), LutError> {
        // Drop the old key first so a failed rebuild is never mistaken for a
        // valid cache.
        self.key = None;
        self.frusta.clear();

        if !camera.projection.is_finite()
            || camera.projection.determinant() == 0.0
            || has_infinite_far_plane(&camera.projection, camera.clip_depth)
        {
            return Err(LutError::DegenerateProjection);
        }
        let inverse = camera.projection.inverse();
        if !inverse.is_finite() {
            return Err(LutError::DegenerateProjection);
        }
        let near_z = camera.clip_depth.near_z();
        let far_z = camera.clip_depth.far_z();

        self.frusta.reserve(grid.tile_count());
        for ty in 0..grid.height {
            for tx in 0..grid.width {
                let (min, max) = grid.ndc_rect(tx, ty);
                self.frusta
                    .push(TileFrustum::from_ndc(&inverse, min, max, near_z, far_z)?);
            }
        }
        log::debug!(
            "Rebuilt {} tile frusta for {}x{} ({:?} origin)",
            self.frusta.len(),
            grid.viewport.width,
            grid.viewport.height,
            grid.origin,
        );
        Ok(())
    }

    pub fn frusta(&self) -> &[TileFrustum] {
        &self.frusta
    }
}
