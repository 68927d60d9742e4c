//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Transform`] places cameras, [`Viewport`] sizes the
//! render target, and [`Plane`] / [`ScreenRect`] are the small geometric
//! pieces the tile builder is made of.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use serde::{Deserialize, Serialize};

/// Where a camera sits and which way it faces.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    /// At the origin, looking down -Z.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    /// Create a transform that looks at a target point from the current position.
    ///
    /// `Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y)`
    /// places a camera on +Z looking down -Z toward the origin.
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        let look = Mat4::look_at_rh(self.translation, target, up);
        let (_, rot, _) = look.inverse().to_scale_rotation_translation();
        self.rotation = rot;
        self
    }

    /// The view matrix for a camera placed at this transform (world → camera).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation).inverse()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Render target size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. Zero-height viewports report an aspect of 1.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An axis-aligned rectangle in pixel coordinates. `min` is inclusive, `max`
/// exclusive, both in the consumer's fragment-coordinate convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }
}

/// A plane `dot(normal, p) + d = 0` with a unit normal. Positive distances are
/// on the side the normal points to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    /// Plane through three points. Returns `None` if the points are collinear
    /// or not finite.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let normal = (b - a).cross(c - a);
        let len = normal.length();
        if !len.is_finite() || len <= f32::EPSILON {
            return None;
        }
        let normal = normal / len;
        Some(Self {
            normal,
            d: -normal.dot(a),
        })
    }

    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    /// Flip the plane so `inside` lies on its positive side.
    pub fn facing(self, inside: Vec3) -> Self {
        if self.signed_distance(inside) < 0.0 {
            Self {
                normal: -self.normal,
                d: -self.d,
            }
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_through_xy_points_has_z_normal() {
        let p = Plane::from_points(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert!((p.normal - Vec3::Z).length() < 1e-6);
        assert!((p.signed_distance(Vec3::new(3.0, -2.0, 5.0)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn collinear_points_give_no_plane() {
        assert!(Plane::from_points(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }

    #[test]
    fn facing_flips_toward_inside() {
        let p = Plane::from_points(Vec3::ZERO, Vec3::X, Vec3::Y)
            .unwrap()
            .facing(Vec3::new(0.0, 0.0, -1.0));
        assert!(p.signed_distance(Vec3::new(0.0, 0.0, -1.0)) > 0.0);
    }

    #[test]
    fn looking_at_view_matrix_moves_target_onto_neg_z() {
        let cam = Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);
        let p = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4, "got {p:?}");
    }

    #[test]
    fn viewport_aspect() {
        assert_eq!(Viewport::new(320, 240).aspect(), 320.0 / 240.0);
        assert!(Viewport::new(0, 240).is_empty());
    }
}
