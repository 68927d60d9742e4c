//! # Ljos — Tiled Forward Light Index
//!
//! A per-frame builder that turns a list of dynamic lights and a camera into a
//! fixed-size, texture-shaped lookup table. Fragment shaders (or CPU code) use
//! the table to iterate only the lights that touch their 32×32 pixel screen
//! tile, instead of every light in the scene.
//!
//! Start with `use ljos::prelude::*`, create a
//! [`TiledLightIndex`](tiled::TiledLightIndex) once, and call
//! [`build`](tiled::TiledLightIndex::build) every frame.

pub mod camera;
pub mod config;
pub mod error;
pub mod light;
pub mod math;
pub mod prelude;
pub mod tiled;

#[cfg(feature = "gpu")]
pub mod gpu;

#[cfg(feature = "diagnostics")]
pub mod diag;
