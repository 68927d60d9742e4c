//! # Lights — What the Index Is Built From
//!
//! The index never owns lights. Each frame the scene hands it a slice of the
//! currently enabled lights, in whatever order the scene keeps them. That
//! order matters in exactly one place: when there are more lights than the
//! table can hold, the lights at the end of the slice are the ones dropped.
//!
//! ## Kinds
//!
//! ```text
//!  Directional           Point                 Spot
//!  ───────────►          ╭───────╮             ╲   ╱
//!  ───────────►         ╱    ●    ╲             ╲ ╱
//!  ───────────►         ╲  range  ╱              ●  cutoff = cos(half angle)
//!  (every tile)          ╰───────╯             (bounded by its range sphere)
//! ```
//!
//! Directional lights have no position and reach every tile. Point and spot
//! lights have a finite `range`; the builder bounds them with a sphere of that
//! radius. Spot lights additionally carry a direction and the cosine of their
//! cone's half angle, which the builder stores untouched for the consumer's
//! falloff formula.
//!
//! ## Units
//!
//! Color and intensity are linear values and are stored as-is. `range` is in
//! world units. Nothing is converted on the way into the table: the values a
//! shader reads back are exactly the values set here.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// The three light shapes the index understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Code stored in the alpha channel of a light's first texel. Zero is
    /// reserved for "no light".
    pub const fn code(self) -> f32 {
        match self {
            LightKind::Directional => 1.0,
            LightKind::Point => 2.0,
            LightKind::Spot => 3.0,
        }
    }

    /// Inverse of [`code`](Self::code). Returns `None` for empty slots and
    /// for anything that is not exactly one of the codes.
    pub fn from_code(code: f32) -> Option<Self> {
        [LightKind::Directional, LightKind::Point, LightKind::Spot]
            .into_iter()
            .find(|kind| kind.code() == code)
    }

    /// Whether the light has a finite influence volume.
    pub const fn is_local(self) -> bool {
        !matches!(self, LightKind::Directional)
    }
}

/// Shadow parameters passed through to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowParams {
    /// How dark the shadowed region gets, 0 (no shadow) to 1 (black).
    pub strength: f32,
    /// Depth bias applied when comparing against the shadow map.
    pub bias: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            strength: 1.0,
            bias: 0.002,
        }
    }
}

/// One dynamic light source, in world space.
///
/// Build with [`Light::directional`], [`Light::point`] or [`Light::spot`] and
/// the builder methods:
///
/// ```
/// use ljos::prelude::*;
///
/// let lamp = Light::point(Vec3::new(1.5, 0.7, 0.0), 1.8)
///     .color(1.0, 1.0, 1.0)
///     .intensity(2.0);
/// assert!(lamp.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    /// Light color (linear RGB).
    pub color: [f32; 3],
    /// Intensity multiplier, never negative.
    pub intensity: f32,
    /// World-space position. Ignored for directional lights.
    pub position: Vec3,
    /// World-space direction the light shines toward. Directional and spot only.
    pub direction: Vec3,
    /// Radius of influence. Point and spot only.
    pub range: f32,
    /// Cosine of the cone's half angle. Spot only.
    pub spot_cutoff: f32,
    pub shadow: Option<ShadowParams>,
}

impl Light {
    /// A directional light shining toward `direction`.
    pub fn directional(direction: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            direction,
            ..Self::base()
        }
    }

    /// A point light at `position` reaching `range` world units.
    pub fn point(position: Vec3, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            range,
            ..Self::base()
        }
    }

    /// A spot light at `position` shining toward `direction`, reaching `range`
    /// world units, with a cone whose half angle has cosine `cutoff`.
    pub fn spot(position: Vec3, direction: Vec3, range: f32, cutoff: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            position,
            direction,
            range,
            spot_cutoff: cutoff,
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            kind: LightKind::Point,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            range: 1.0,
            spot_cutoff: 0.0,
            shadow: None,
        }
    }

    /// Set the color.
    pub fn color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.color = [r, g, b];
        self
    }

    /// Set the intensity.
    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Enable shadows with the given parameters.
    pub fn shadow(mut self, shadow: ShadowParams) -> Self {
        self.shadow = Some(shadow);
        self
    }

    /// Check the light's invariants. Lights that fail are skipped by the
    /// builder rather than stored.
    pub fn validate(&self) -> Result<(), LightRejection> {
        let color_ok = self.color.iter().all(|c| c.is_finite());
        if !color_ok || !self.intensity.is_finite() {
            return Err(LightRejection::NonFinite);
        }
        if self.intensity < 0.0 {
            return Err(LightRejection::NegativeIntensity);
        }
        if self.kind.is_local() {
            if !self.position.is_finite() || !self.range.is_finite() {
                return Err(LightRejection::NonFinite);
            }
            if self.range <= 0.0 {
                return Err(LightRejection::NonPositiveRange);
            }
        }
        if matches!(self.kind, LightKind::Directional | LightKind::Spot) {
            if !self.direction.is_finite() {
                return Err(LightRejection::NonFinite);
            }
            if self.direction.length_squared() <= f32::EPSILON {
                return Err(LightRejection::ZeroDirection);
            }
        }
        if self.kind == LightKind::Spot && !(-1.0..=1.0).contains(&self.spot_cutoff) {
            return Err(LightRejection::CutoffOutOfRange);
        }
        if let Some(shadow) = &self.shadow {
            if !shadow.strength.is_finite() || !shadow.bias.is_finite() {
                return Err(LightRejection::NonFinite);
            }
        }
        Ok(())
    }
}

/// Why a light was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightRejection {
    NonFinite,
    NegativeIntensity,
    NonPositiveRange,
    ZeroDirection,
    CutoffOutOfRange,
}
