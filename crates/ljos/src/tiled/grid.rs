//! # Grid — Partitioning the Viewport into Tiles
//!
//! The viewport is cut into 32×32 pixel tiles. The last column and row are
//! usually partial: a 1280×720 target has 40×23 tiles, and the bottom row is
//! only 16 pixels tall. Partial tiles are clipped to the viewport so their
//! frusta don't reach past the screen edge.
//!
//! ## Origin
//!
//! A fragment shader finds its tile from its own pixel coordinate, so the
//! builder must number tiles the way the shader sees pixels:
//!
//! ```text
//!  TopLeft (wgpu @builtin(position))     BottomLeft (GL gl_FragCoord)
//!  (0,0) ┌────┬────┬────┐                ┌────┬────┬────┐
//!        │ 0  │ 1  │ 2  │                │ 3  │ 4  │ 5  │
//!        ├────┼────┼────┤                ├────┼────┼────┤
//!        │ 3  │ 4  │ 5  │                │ 0  │ 1  │ 2  │
//!        └────┴────┴────┘          (0,0) └────┴────┴────┘
//! ```
//!
//! Either way, tiles are enumerated row-major: `index = ty * width + tx`.

use serde::{Deserialize, Serialize};

use crate::error::LutError;
use crate::math::{ScreenRect, Vec2, Viewport};

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 32;

/// Where pixel (0, 0) is in the consumer's fragment coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileOrigin {
    #[default]
    TopLeft,
    BottomLeft,
}

/// The tile grid for one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub viewport: Viewport,
    pub origin: TileOrigin,
}

impl TileGrid {
    /// Grid for `viewport`. Fails if either dimension is zero.
    pub fn new(viewport: Viewport, origin: TileOrigin) -> Result<Self, LutError> {
        if viewport.is_empty() {
            return Err(LutError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        Ok(Self {
            width: viewport.width.div_ceil(TILE_SIZE),
            height: viewport.height.div_ceil(TILE_SIZE),
            viewport,
            origin,
        })
    }

    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn tile_index(&self, tx: u32, ty: u32) -> usize {
        ty as usize * self.width as usize + tx as usize
    }

    /// Tile coordinates of a tile index.
    pub fn tile_coords(&self, index: usize) -> (u32, u32) {
        let w = self.width as usize;
        ((index % w) as u32, (index / w) as u32)
    }

    /// Tile containing a fragment coordinate, or `None` outside the viewport.
    pub fn tile_at(&self, frag_x: f32, frag_y: f32) -> Option<usize> {
        if !(frag_x >= 0.0 && frag_y >= 0.0) {
            return None;
        }
        let tx = (frag_x / TILE_SIZE as f32).floor() as u32;
        let ty = (frag_y / TILE_SIZE as f32).floor() as u32;
        (tx < self.width && ty < self.height).then(|| self.tile_index(tx, ty))
    }

    /// The tile's pixel rectangle, clipped to the viewport, in the consumer's
    /// fragment coordinates.
    pub fn pixel_rect(&self, tx: u32, ty: u32) -> ScreenRect {
        let x0 = tx * TILE_SIZE;
        let y0 = ty * TILE_SIZE;
        let x1 = (x0 + TILE_SIZE).min(self.viewport.width);
        let y1 = (y0 + TILE_SIZE).min(self.viewport.height);
        ScreenRect {
            min: Vec2::new(x0 as f32, y0 as f32),
            max: Vec2::new(x1 as f32, y1 as f32),
        }
    }

    /// Convert a fragment coordinate to normalized device coordinates.
    pub fn to_ndc(&self, p: Vec2) -> Vec2 {
        let x = p.x / self.viewport.width as f32 * 2.0 - 1.0;
        let y = p.y / self.viewport.height as f32 * 2.0 - 1.0;
        match self.origin {
            TileOrigin::TopLeft => Vec2::new(x, -y),
            TileOrigin::BottomLeft => Vec2::new(x, y),
        }
    }

    /// The tile's rectangle in NDC as `(min, max)`.
    pub fn ndc_rect(&self, tx: u32, ty: u32) -> (Vec2, Vec2) {
        let rect = self.pixel_rect(tx, ty);
        let a = self.to_ndc(rect.min);
        let b = self.to_ndc(rect.max);
        (a.min(b), a.max(b))
    }
}
