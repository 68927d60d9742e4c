//! # GPU Upload — The Table as a wgpu Texture
//!
//! [`LutTexture`] owns the GPU side of the index: an `Rgba32Float` texture the
//! size of the table, a 16-byte uniform with the grid size and region rows, and
//! the bind group tying them together.
//!
//! ```text
//!  @group(N) @binding(0)  texture_2d<f32>      lut_texture  (textureLoad only)
//!  @group(N) @binding(1)  uniform LutParams    lut
//! ```
//!
//! `Rgba32Float` is not filterable on every adapter, so the texture is bound
//! as non-filterable and read with `textureLoad`. Nothing here samples it.
//!
//! Shaders get the lookup functions by prepending [`DECODE_WGSL`] to their own
//! source. The bind group in that snippet is declared as group 0; consumers
//! that use another group should patch the `@group(0)` attributes.
//!
//! ## Frame Flow
//!
//! ```text
//! index.build(&lights, &camera)?  ──►  LightLut
//! lut_texture.upload(&queue, &lut)     write_texture (whole table) + write_buffer (uniform)
//! render pass: set_bind_group(N, lut_texture.bind_group(), &[])
//! ```

use wgpu::util::DeviceExt;

use crate::tiled::{LightLut, LutLayout, LutUniform};

/// WGSL helpers `light_entry`, `light_index` and `tile_cell` that decode the
/// table on the GPU.
pub const DECODE_WGSL: &str = include_str!("tiled_light.wgsl");

/// The packed table and its uniform on the GPU.
pub struct LutTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    layout: LutLayout,
}

impl LutTexture {
    pub fn new(device: &wgpu::Device, layout: &LutLayout) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("light lut texture"),
            size: extent(layout),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light lut uniform"),
            contents: bytemuck::bytes_of(&LutUniform {
                grid_size: [0, 0],
                index_base_row: layout.index_base_row() as u32,
                grid_base_row: layout.grid_base_row() as u32,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("light lut bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light lut bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        log::debug!(
            "Created {}x{} light lut texture ({} KiB)",
            layout.width(),
            layout.height(),
            layout.width() * layout.height() * 16 / 1024,
        );

        Self {
            texture,
            view,
            uniform_buffer,
            bind_group_layout,
            bind_group,
            layout: *layout,
        }
    }

    /// Copy a built table and its parameters to the GPU.
    ///
    /// A table built with a different layout is skipped with a warning; make
    /// a new `LutTexture` when the config changes.
    pub fn upload(&self, queue: &wgpu::Queue, lut: &LightLut<'_>) {
        if lut.layout != self.layout {
            log::warn!(
                "Skipping light lut upload: table is {}x{}, texture is {}x{}",
                lut.layout.width(),
                lut.layout.height(),
                self.layout.width(),
                self.layout.height(),
            );
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            lut.buffer.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(lut.buffer.bytes_per_row() as u32),
                rows_per_image: Some(lut.buffer.height() as u32),
            },
            extent(&self.layout),
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&lut.uniform()));
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

fn extent(layout: &LutLayout) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: layout.width() as u32,
        height: layout.height() as u32,
        depth_or_array_layers: 1,
    }
}
