//! CPU-side storage for the packed table.
//!
//! A [`PackedBuffer`] is the texture's contents in row-major order, one
//! `[f32; 4]` per texel, ready to hand to `queue.write_texture` as bytes.
//!
//! With double buffering the index owns two of them and alternates: the
//! buffer written by build N+1 is never the one returned by build N. A caller
//! that copies build N's bytes to the GPU on another thread while build N+1
//! runs therefore never sees a half-written table.

use super::layout::{LUT_WIDTH, LutLayout};

/// One texture's worth of RGBA f32 texels.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedBuffer {
    width: usize,
    height: usize,
    texels: Vec<[f32; 4]>,
}

impl PackedBuffer {
    /// A zero-filled buffer sized for `layout`.
    pub fn new(layout: &LutLayout) -> Self {
        let height = layout.height();
        Self {
            width: LUT_WIDTH,
            height,
            texels: vec![[0.0; 4]; LUT_WIDTH * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    /// The table as raw bytes (native-endian f32s).
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Bytes in one texel row.
    pub fn bytes_per_row(&self) -> usize {
        self.width * std::mem::size_of::<[f32; 4]>()
    }

    /// The texel at `(col, row)`, or `None` outside the table.
    pub fn texel(&self, col: usize, row: usize) -> Option<[f32; 4]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.texels.get(row * self.width + col).copied()
    }

    pub(crate) fn clear(&mut self) {
        self.texels.fill([0.0; 4]);
    }

    pub(crate) fn texel_mut(&mut self, index: usize) -> Option<&mut [f32; 4]> {
        self.texels.get_mut(index)
    }
}

/// One or two buffers, used in turn.
#[derive(Debug)]
pub(crate) struct BufferRing {
    buffers: Vec<PackedBuffer>,
    current: usize,
}

impl BufferRing {
    pub fn new(layout: &LutLayout, double_buffered: bool) -> Self {
        let count = if double_buffered { 2 } else { 1 };
        Self {
            buffers: (0..count).map(|_| PackedBuffer::new(layout)).collect(),
            current: 0,
        }
    }

    /// Move to the next buffer and return it for writing.
    pub fn advance(&mut self) -> &mut PackedBuffer {
        self.current = (self.current + 1) % self.buffers.len();
        &mut self.buffers[self.current]
    }

    /// The most recently advanced-to buffer.
    pub fn current(&self) -> &PackedBuffer {
        &self.buffers[self.current]
    }

    pub fn current_slot(&self) -> usize {
        self.current
    }
}
