use anyhow::{ensure, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3A};
use std::sync::Arc;
use wgpu::util::DeviceExt;

use super::sphere_geometry::{SphereMesh, Vertex};

const SHADERS_WGSL: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) anchor: vec3<f32>,
    @location(3) far_fade: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

struct Scene {
    mvp: mat4x4<f32>,
    occlusion_w: f32,
};

@group(0) @binding(0)
var<uniform> scene: Scene;

@vertex
fn vs_main(model: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = scene.mvp * vec4<f32>(model.position, 1.0);
    out.color = model.color;
    // Anchors farther than the silhouette plane sit behind the sphere
    let anchor_w = (scene.mvp * vec4<f32>(model.anchor, 1.0)).w;
    if (anchor_w > scene.occlusion_w) {
        out.color.a = out.color.a * (1.0 - model.far_fade);
    }
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // egui's target expects premultiplied alpha
    return vec4<f32>(in.color.rgb * in.color.a, in.color.a);
}
"#;

/// Per-frame uniform block, laid out like the `Scene` struct in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub mvp: [[f32; 4]; 4],
    // Clip-space w past which a point on the sphere is hidden from the camera
    pub occlusion_w: f32,
    _padding: [f32; 3],
}

pub struct SphereWgpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    scene_uniform_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    render_pipeline: wgpu::RenderPipeline,
}

pub struct WgpuSphereRenderer {
    primitive: Option<Arc<SphereWgpuPrimitive>>,
    mesh: SphereMesh,
    target_format: Option<wgpu::TextureFormat>,
    camera_position: Vec3A,
    pub time: f32,
}

impl WgpuSphereRenderer {
    pub fn new(mesh: SphereMesh) -> Self {
        Self {
            primitive: None,
            mesh,
            target_format: None,
            camera_position: Vec3A::new(0.0, 0.0, 3.0),
            time: 0.0,
        }
    }

    pub fn prepare(
        &mut self,
        device: &Arc<wgpu::Device>,
        target_format: wgpu::TextureFormat,
    ) -> Result<()> {
        if self.primitive.is_some() {
            return Ok(());
        }
        ensure!(!self.mesh.indices.is_empty(), "sphere mesh has no triangles");

        tracing::info!("Preparing WgpuSphereRenderer resources...");

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sphere Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADERS_WGSL.into()),
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Index Buffer"),
            contents: bytemuck::cast_slice(&self.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let num_indices = self.mesh.indices.len() as u32;

        let scene_initial = self.scene_uniforms(1.0);
        let scene_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Scene Uniform Buffer"),
            contents: bytemuck::cast_slice(&[scene_initial]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Sphere Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sphere Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sphere Render Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            push_constant_ranges: &[],
        });
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sphere Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                        2 => Float32x3,
                        3 => Float32
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Back faces of the translucent surface stay visible
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        self.primitive = Some(Arc::new(SphereWgpuPrimitive {
            vertex_buffer,
            index_buffer,
            num_indices,
            scene_uniform_buffer,
            scene_bind_group,
            render_pipeline,
        }));
        self.target_format = Some(target_format);

        tracing::info!(
            "WgpuSphereRenderer resources prepared successfully ({} markers).",
            self.mesh.marker_count
        );

        Ok(())
    }

    /// Swaps in a new mesh, e.g. after resampling. GPU resources are rebuilt
    /// right away if a device is available and the renderer was prepared before.
    pub fn replace_mesh(
        &mut self,
        mesh: SphereMesh,
        device: Option<&Arc<wgpu::Device>>,
    ) -> Result<()> {
        self.mesh = mesh;
        self.primitive = None;

        match (device, self.target_format) {
            (Some(device), Some(target_format)) => self.prepare(device, target_format),
            _ => Ok(()),
        }
    }

    fn model_matrix(&self) -> Mat4 {
        // Tilt so the sampled +z pole points up, then spin around it.
        Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2 + 0.35)
            * Mat4::from_rotation_z(self.time * 0.4)
    }

    pub fn calculate_mvp(&self, aspect_ratio: f32) -> Mat4 {
        let view = Mat4::look_at_rh(
            self.camera_position.into(),
            Vec3A::ZERO.into(),
            Vec3A::Y.into(),
        );
        let proj = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_4, aspect_ratio, 0.1, 100.0);

        proj * view * self.model_matrix()
    }

    /// Clip-space w of the sphere's silhouette plane.
    ///
    /// With the camera at distance `d` from the center, a point on a sphere of
    /// radius `r` is visible iff its projection onto the view axis exceeds
    /// `r²/d`, i.e. iff its w is below `d - r²/d`.
    pub fn occlusion_w(&self) -> f32 {
        let d = self.camera_position.length();
        let r = self.mesh.radius;
        d - r * r / d
    }

    pub fn scene_uniforms(&self, aspect_ratio: f32) -> SceneUniforms {
        SceneUniforms {
            mvp: self.calculate_mvp(aspect_ratio).to_cols_array_2d(),
            occlusion_w: self.occlusion_w(),
            _padding: [0.0; 3],
        }
    }

    pub fn get_primitive_arc(&self) -> Option<Arc<SphereWgpuPrimitive>> {
        self.primitive.clone()
    }

    pub fn paint_primitive<'rp_lifetime>(
        primitive: &'rp_lifetime SphereWgpuPrimitive,
        scene: &SceneUniforms,
        rpass: &mut wgpu::RenderPass<'rp_lifetime>,
        queue: &Arc<wgpu::Queue>,
    ) {
        queue.write_buffer(
            &primitive.scene_uniform_buffer,
            0,
            bytemuck::cast_slice(&[*scene]),
        );

        rpass.set_pipeline(&primitive.render_pipeline);
        rpass.set_bind_group(0, &primitive.scene_bind_group, &[]);
        rpass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
        rpass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..primitive.num_indices, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mvp_keeps_sphere_center_in_front_of_camera() {
        let renderer = WgpuSphereRenderer::new(SphereMesh::default());
        let clip = renderer.calculate_mvp(4.0 / 3.0) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(clip.w > 0.0);
    }

    #[test]
    fn far_side_points_fall_past_occlusion_plane() {
        let mesh = SphereMesh::build(&[], &Default::default()).unwrap();
        let mut renderer = WgpuSphereRenderer::new(mesh);
        renderer.time = 1.7;

        let scene = renderer.scene_uniforms(1.0);
        let mvp = Mat4::from_cols_array_2d(&scene.mvp);
        // World-space direction that the model rotation turns toward the camera
        let toward_camera = renderer
            .model_matrix()
            .inverse()
            .transform_vector3(glam::Vec3::Z);

        let w_of = |p: glam::Vec3| (mvp * p.extend(1.0)).w;
        assert!((scene.occlusion_w - (3.0 - 1.0 / 3.0)).abs() < 1e-6);
        assert!(w_of(toward_camera) < scene.occlusion_w);
        assert!(w_of(-toward_camera) > scene.occlusion_w);

        // Silhouette points sit right on the plane
        let side = toward_camera.any_orthonormal_vector();
        let silhouette = toward_camera * (1.0 / 3.0) + side * (8.0f32 / 9.0).sqrt();
        assert!((w_of(silhouette) - scene.occlusion_w).abs() < 1e-4);
    }

    #[test]
    fn uniform_block_matches_shader_layout() {
        // mat4x4<f32> + f32, rounded up to 16-byte alignment
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 80);
    }

    #[test]
    fn replace_mesh_without_device_defers_upload() {
        let mut renderer = WgpuSphereRenderer::new(SphereMesh::default());
        let mesh = SphereMesh::build(&[], &Default::default()).unwrap();
        renderer.replace_mesh(mesh, None).unwrap();
        assert!(renderer.get_primitive_arc().is_none());
        assert!(!renderer.mesh.indices.is_empty());
    }
}
