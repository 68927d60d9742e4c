//! Camera input for the light index: view and projection transforms plus the
//! viewport they render into.
//!
//! The builder needs the projection only to reconstruct each tile's slice of
//! the view frustum, so any invertible projection works (perspective or
//! orthographic). It does need to know which depth range the projection maps
//! to, because the near plane sits at NDC z = 0 for wgpu-style projections and
//! at z = -1 for OpenGL-style ones.

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Transform, Viewport};

/// NDC depth range produced by the projection matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClipDepth {
    /// Near plane at z = 0, far at z = 1 (`Mat4::perspective_rh`, wgpu, D3D).
    #[default]
    ZeroToOne,
    /// Near plane at z = -1, far at z = 1 (`Mat4::perspective_rh_gl`, OpenGL).
    NegOneToOne,
}

impl ClipDepth {
    /// NDC z of the near plane.
    pub const fn near_z(self) -> f32 {
        match self {
            ClipDepth::ZeroToOne => 0.0,
            ClipDepth::NegOneToOne => -1.0,
        }
    }

    /// NDC z of the far plane.
    pub const fn far_z(self) -> f32 {
        1.0
    }
}

/// The camera the index is built for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World → camera transform.
    pub view: Mat4,
    /// Camera → clip transform.
    pub projection: Mat4,
    pub viewport: Viewport,
    pub clip_depth: ClipDepth,
}

impl Camera {
    /// A camera from raw matrices with a `[0, 1]` depth range.
    pub fn new(view: Mat4, projection: Mat4, viewport: Viewport) -> Self {
        Self {
            view,
            projection,
            viewport,
            clip_depth: ClipDepth::ZeroToOne,
        }
    }

    /// A right-handed perspective camera placed at `transform`.
    ///
    /// `fov_y_degrees` is the vertical field of view. The aspect ratio comes
    /// from the viewport.
    pub fn perspective(
        transform: &Transform,
        fov_y_degrees: f32,
        near: f32,
        far: f32,
        viewport: Viewport,
    ) -> Self {
        let projection =
            Mat4::perspective_rh(fov_y_degrees.to_radians(), viewport.aspect(), near, far);
        Self::new(transform.view_matrix(), projection, viewport)
    }

    /// Return a copy with a different depth convention.
    pub fn with_clip_depth(mut self, clip_depth: ClipDepth) -> Self {
        self.clip_depth = clip_depth;
        self
    }

    /// Return a copy rendering into a different viewport. The projection is
    /// left untouched; rebuild it if the aspect ratio changed.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}
