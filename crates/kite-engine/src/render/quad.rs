use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::assets::{Image, ImageId};
use crate::draw::{DrawList, Quad};
use crate::render::{RenderCtx, RenderTarget};

/// Textures not drawn for this many frames are released.
const TEXTURE_TTL_FRAMES: u64 = 300;

/// Draws a [`DrawList`] in recorded order.
///
/// Every quad becomes four vertices in physical pixels. Consecutive quads that
/// share a texture are issued as one indexed draw; solid quads sample a 1x1 white
/// texture so a single pipeline covers both.
#[derive(Default)]
pub struct QuadRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    screen_bgl: Option<wgpu::BindGroupLayout>,
    texture_bgl: Option<wgpu::BindGroupLayout>,
    screen_bind_group: Option<wgpu::BindGroup>,
    screen_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,

    white: Option<wgpu::BindGroup>,
    textures: HashMap<ImageId, CachedTexture>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
    ibo: Option<wgpu::Buffer>,
    ibo_capacity: usize,

    frame: u64,
}

struct CachedTexture {
    bind_group: wgpu::BindGroup,
    last_used: u64,
}

impl QuadRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of image textures currently resident on the GPU.
    pub fn cached_textures(&self) -> usize {
        self.textures.len()
    }

    /// Clears the target (when the list requests it) and draws every quad.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, list: &DrawList) {
        self.frame += 1;
        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);

        let quads = list.quads();
        let batches = batches(quads);

        for batch in &batches {
            if let Some(image) = &batch.image {
                self.ensure_texture(ctx, image);
            }
        }
        self.evict_stale();

        let (vertices, indices) = build_geometry(quads);
        if !vertices.is_empty() {
            self.write_screen_uniform(ctx);
            self.ensure_geometry_capacity(ctx, vertices.len(), indices.len());
            if let (Some(vbo), Some(ibo)) = (self.vbo.as_ref(), self.ibo.as_ref()) {
                ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&vertices));
                ctx.queue.write_buffer(ibo, 0, bytemuck::cast_slice(&indices));
            }
        }

        let load = match list.clear_color() {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kite quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if vertices.is_empty() {
            return;
        }

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(screen) = self.screen_bind_group.as_ref() else { return };
        let Some(white) = self.white.as_ref() else { return };
        let Some(vbo) = self.vbo.as_ref() else { return };
        let Some(ibo) = self.ibo.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, screen, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);

        for batch in &batches {
            let bind_group = match &batch.image {
                None => white,
                Some(image) => match self.textures.get(&image.id()) {
                    Some(t) => &t.bind_group,
                    None => continue,
                },
            };
            rpass.set_bind_group(1, bind_group, &[]);
            let first = batch.quads.start as u32 * 6;
            let last = batch.quads.end as u32 * 6;
            rpass.draw_indexed(first..last, 0, 0..1);
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kite quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let screen_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kite quad screen bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ScreenUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kite quad texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kite quad pipeline layout"),
            bind_group_layouts: &[&screen_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("kite quad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Negative scales flip winding.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.screen_bgl = Some(screen_bgl);
        self.texture_bgl = Some(texture_bgl);

        // Bind groups depend on the layouts just replaced.
        self.screen_bind_group = None;
        self.screen_ubo = None;
        self.white = None;
        self.textures.clear();
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.screen_bind_group.is_none() {
            let Some(bgl) = self.screen_bgl.as_ref() else { return };
            let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("kite quad screen ubo"),
                size: std::mem::size_of::<ScreenUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("kite quad screen bind group"),
                layout: bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                }],
            });
            self.screen_ubo = Some(ubo);
            self.screen_bind_group = Some(bind_group);
        }

        if self.sampler.is_none() {
            self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("kite quad sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            }));
        }

        if self.white.is_none() {
            self.white = self.upload(ctx, "kite white texture", 1, 1, &[255; 4]);
        }
    }

    fn ensure_texture(&mut self, ctx: &RenderCtx<'_>, image: &Arc<Image>) {
        let frame = self.frame;
        if let Some(cached) = self.textures.get_mut(&image.id()) {
            cached.last_used = frame;
            return;
        }

        let Some(bind_group) = self.upload(
            ctx,
            "kite image texture",
            image.width(),
            image.height(),
            image.pixels(),
        ) else {
            return;
        };

        log::debug!(
            "quad renderer: uploaded image {} ({}x{})",
            image.id().raw(),
            image.width(),
            image.height()
        );
        self.textures.insert(
            image.id(),
            CachedTexture {
                bind_group,
                last_used: frame,
            },
        );
    }

    fn upload(
        &self,
        ctx: &RenderCtx<'_>,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Option<wgpu::BindGroup> {
        let bgl = self.texture_bgl.as_ref()?;
        let sampler = self.sampler.as_ref()?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }))
    }

    fn evict_stale(&mut self) {
        let frame = self.frame;
        let before = self.textures.len();
        self.textures
            .retain(|_, t| frame.saturating_sub(t.last_used) <= TEXTURE_TTL_FRAMES);
        let evicted = before - self.textures.len();
        if evicted > 0 {
            log::debug!("quad renderer: released {evicted} idle texture(s)");
        }
    }

    fn write_screen_uniform(&self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.screen_ubo.as_ref() else { return };
        let u = ScreenUniform {
            size: [ctx.target_size.width.max(1.0), ctx.target_size.height.max(1.0)],
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }

    fn ensure_geometry_capacity(&mut self, ctx: &RenderCtx<'_>, vertices: usize, indices: usize) {
        if vertices > self.vbo_capacity || self.vbo.is_none() {
            let cap = vertices.next_power_of_two().max(256);
            self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("kite quad vbo"),
                size: (cap * std::mem::size_of::<QuadVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vbo_capacity = cap;
        }

        if indices > self.ibo_capacity || self.ibo.is_none() {
            let cap = indices.next_power_of_two().max(384);
            self.ibo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("kite quad ibo"),
                size: (cap * std::mem::size_of::<u32>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.ibo_capacity = cap;
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ScreenUniform {
    size: [f32; 2],
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct QuadVertex {
    pos: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // uv
        2 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Run of consecutive quads drawn with the same texture.
struct Batch {
    image: Option<Arc<Image>>,
    quads: Range<usize>,
}

fn batches(quads: &[Quad]) -> Vec<Batch> {
    let mut out: Vec<Batch> = Vec::new();
    for (i, q) in quads.iter().enumerate() {
        let id = q.image.as_ref().map(|img| img.id());
        match out.last_mut() {
            Some(b) if b.image.as_ref().map(|img| img.id()) == id => b.quads.end = i + 1,
            _ => out.push(Batch {
                image: q.image.clone(),
                quads: i..i + 1,
            }),
        }
    }
    out
}

fn build_geometry(quads: &[Quad]) -> (Vec<QuadVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(quads.len() * 4);
    let mut indices = Vec::with_capacity(quads.len() * 6);

    for q in quads {
        let base = vertices.len() as u32;
        let color = [q.color.r, q.color.g, q.color.b, q.color.a];
        for (p, uv) in q.corners.iter().zip(q.uvs.iter()) {
            vertices.push(QuadVertex {
                pos: [p.x, p.y],
                uv: [uv.x, uv.y],
                color,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2};
    use crate::draw::Canvas;
    use crate::paint::Color;

    fn sprite() -> Arc<Image> {
        Arc::new(Image::solid(2, 2, [255; 4]).unwrap())
    }

    // ── batching ──────────────────────────────────────────────────────────

    #[test]
    fn consecutive_quads_sharing_a_texture_batch_together() {
        let img = sprite();
        let mut c = Canvas::new();
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        c.fill_rect(Rect::new(1.0, 0.0, 1.0, 1.0), Color::WHITE);
        c.draw_image(&img, Vec2::ZERO);
        c.draw_image(&img, Vec2::new(4.0, 0.0));
        c.fill_rect(Rect::new(2.0, 0.0, 1.0, 1.0), Color::WHITE);

        let b = batches(c.list().quads());
        let ranges: Vec<_> = b.iter().map(|b| b.quads.clone()).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..5]);
        assert!(b[0].image.is_none());
        assert_eq!(b[1].image.as_ref().map(|i| i.id()), Some(img.id()));
    }

    #[test]
    fn interleaved_textures_keep_paint_order() {
        let a = sprite();
        let b = sprite();
        let mut c = Canvas::new();
        c.draw_image(&a, Vec2::ZERO);
        c.draw_image(&b, Vec2::ZERO);
        c.draw_image(&a, Vec2::ZERO);
        assert_eq!(batches(c.list().quads()).len(), 3);
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn geometry_has_four_vertices_and_six_indices_per_quad() {
        let mut c = Canvas::new();
        c.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        c.fill_rect(Rect::new(20.0, 0.0, 10.0, 10.0), Color::BLACK);

        let (v, i) = build_geometry(c.list().quads());
        assert_eq!(v.len(), 8);
        assert_eq!(i, vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
        assert_eq!(v[4].pos, [20.0, 0.0]);
        assert_eq!(v[5].color, [0.0, 0.0, 0.0, 1.0]);
    }
}
