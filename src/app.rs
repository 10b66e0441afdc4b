use eframe::{egui, egui_wgpu::CallbackTrait, App, Frame};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sphere_sampler::sampling::sampler::DEFAULT_FIXED_TIMEOUT;
use sphere_sampler::visualization::renderer::SceneUniforms;
use sphere_sampler::visualization::{MeshOptions, SphereMesh, WgpuSphereRenderer};
use sphere_sampler::{
    MinDistanceSampler, SampleOutcome, SamplerConfig, SamplingStatus, TimeoutPolicy,
};
use std::sync::Arc;
use type_map::concurrent::TypeMap;

// The viewer only knows how to draw the ordinary 2-sphere.
const SPHERE_DIM: usize = 3;
const DEFAULT_NUM_POINTS: usize = 40;
const DEFAULT_MIN_DISTANCE: f64 = 0.3;
const DEFAULT_SEED: u64 = 42;
const MAX_NUM_POINTS: usize = 2000;

struct Custom3DPaintCallback {
    primitive: Arc<sphere_sampler::visualization::renderer::SphereWgpuPrimitive>,
    scene: SceneUniforms,
    queue: Arc<wgpu::Queue>,
}

impl CallbackTrait for Custom3DPaintCallback {
    fn paint<'a>(
        &'a self,
        _info: egui::PaintCallbackInfo,
        render_pass: &mut wgpu::RenderPass<'a>,
        _resources: &'a TypeMap,
    ) {
        WgpuSphereRenderer::paint_primitive(
            &self.primitive,
            &self.scene,
            render_pass,
            &self.queue,
        );
    }
}

pub struct SphereSamplerApp {
    num_points: usize,
    min_distance: f64,
    seed: u64,
    use_fixed_timeout: bool,
    fixed_timeout: usize,
    last_outcome: Option<SampleOutcome>,
    action_error_message: Option<String>,
    mesh_options: MeshOptions,
    sphere_renderer: Arc<Mutex<WgpuSphereRenderer>>,
    wgpu_device: Option<Arc<wgpu::Device>>,
    wgpu_queue: Option<Arc<wgpu::Queue>>,
}

impl SphereSamplerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self {
            num_points: DEFAULT_NUM_POINTS,
            min_distance: DEFAULT_MIN_DISTANCE,
            seed: DEFAULT_SEED,
            use_fixed_timeout: false,
            fixed_timeout: DEFAULT_FIXED_TIMEOUT,
            last_outcome: None,
            action_error_message: None,
            mesh_options: MeshOptions::default(),
            sphere_renderer: Arc::new(Mutex::new(WgpuSphereRenderer::new(
                SphereMesh::default(),
            ))),
            wgpu_device: None,
            wgpu_queue: None,
        };

        // Fill the renderer's mesh before any GPU resources are created.
        app.resample();

        if let Some(wgpu_render_state) = &cc.wgpu_render_state {
            let device_arc = wgpu_render_state.device.clone();
            let queue_arc = wgpu_render_state.queue.clone();
            let target_format = wgpu_render_state.target_format;
            if let Err(e) = app.sphere_renderer.lock().prepare(&device_arc, target_format) {
                tracing::error!("Failed to prepare WGPU sphere renderer: {}", e);
            } else {
                app.wgpu_device = Some(device_arc);
                app.wgpu_queue = Some(queue_arc);
            }
        } else {
            tracing::warn!("WGPU render state not available at creation.");
        }

        app
    }

    fn sampler_config(&self) -> SamplerConfig {
        let timeout = if self.use_fixed_timeout {
            TimeoutPolicy::Fixed(self.fixed_timeout)
        } else {
            TimeoutPolicy::TargetCount
        };
        SamplerConfig::new(self.num_points, SPHERE_DIM, self.min_distance).with_timeout(timeout)
    }

    fn resample(&mut self) {
        self.action_error_message = None;

        let sampler = match MinDistanceSampler::new(self.sampler_config()) {
            Ok(sampler) => sampler,
            Err(e) => {
                self.action_error_message = Some(e.to_string());
                return;
            }
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let outcome = match sampler.sample(&mut rng) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Sampling failed: {}", e);
                self.action_error_message = Some(e.to_string());
                return;
            }
        };

        let mesh = match SphereMesh::build(&outcome.points, &self.mesh_options) {
            Ok(mesh) => mesh,
            Err(e) => {
                self.action_error_message = Some(e.to_string());
                return;
            }
        };
        if let Err(e) = self
            .sphere_renderer
            .lock()
            .replace_mesh(mesh, self.wgpu_device.as_ref())
        {
            tracing::error!("Failed to upload sphere mesh: {}", e);
            self.action_error_message = Some(e.to_string());
        }

        self.last_outcome = Some(outcome);
    }

    fn status_message(&self) -> String {
        if let Some(err_msg) = &self.action_error_message {
            return format!("Error: {}", err_msg);
        }
        match &self.last_outcome {
            Some(outcome) => match outcome.status {
                SamplingStatus::Succeeded => format!(
                    "Succeeded: {}/{} points ({} candidates drawn)",
                    outcome.found(),
                    outcome.requested,
                    outcome.attempts
                ),
                SamplingStatus::TimedOut => format!(
                    "Timed out: found {}/{} points ({} candidates drawn)",
                    outcome.found(),
                    outcome.requested,
                    outcome.attempts
                ),
            },
            None => "No points sampled yet".to_string(),
        }
    }
}

impl App for SphereSamplerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.sphere_renderer.lock().time += ctx.input(|i| i.stable_dt);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Sphere Sampler");
            ui.separator();

            let mut changed = false;
            ui.horizontal(|ui| {
                ui.label("Points:");
                changed |= ui
                    .add(
                        egui::DragValue::new(&mut self.num_points)
                            .clamp_range(1..=MAX_NUM_POINTS),
                    )
                    .changed();
                ui.label("Seed:");
                changed |= ui.add(egui::DragValue::new(&mut self.seed)).changed();
            });
            ui.horizontal(|ui| {
                ui.label("Min distance (rad):");
                changed |= ui
                    .add(
                        egui::Slider::new(&mut self.min_distance, 0.01..=std::f64::consts::PI)
                            .clamp_to_range(true)
                            .min_decimals(2),
                    )
                    .changed();
            });
            ui.horizontal(|ui| {
                changed |= ui
                    .checkbox(&mut self.use_fixed_timeout, "Fixed timeout")
                    .changed();
                let timeout_field = ui.add_enabled(
                    self.use_fixed_timeout,
                    egui::DragValue::new(&mut self.fixed_timeout).clamp_range(1..=100_000),
                );
                changed |= timeout_field.changed();
                if !self.use_fixed_timeout {
                    ui.label("(patience = number of points)");
                }
            });

            ui.add_space(5.0);
            if ui.button("Resample").clicked() {
                // New seed, new point set
                self.seed = self.seed.wrapping_add(1);
                self.resample();
            } else if changed {
                self.resample();
            }
            ui.label(self.status_message());
            ui.separator();

            // --- Visualization Area ---
            let desired_size = ui.available_size_before_wrap();
            let (rect, _response) = ui.allocate_exact_size(desired_size, egui::Sense::hover());

            let primitive_and_scene = {
                let renderer_guard = self.sphere_renderer.lock();
                renderer_guard.get_primitive_arc().map(|primitive| {
                    let aspect_ratio = rect.width() / rect.height().max(1.0);
                    (primitive, renderer_guard.scene_uniforms(aspect_ratio))
                })
            };

            match (primitive_and_scene, &self.wgpu_queue) {
                (Some((primitive, scene)), Some(queue_arc)) => {
                    let cb = eframe::egui_wgpu::Callback::new_paint_callback(
                        rect,
                        Custom3DPaintCallback {
                            primitive,
                            scene,
                            queue: queue_arc.clone(),
                        },
                    );
                    ui.painter().add(cb);
                }
                _ => {
                    ui.painter()
                        .rect_filled(rect, 0.0, egui::Color32::DARK_GRAY);
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "Renderer N/A",
                        egui::FontId::default(),
                        egui::Color32::WHITE,
                    );
                }
            }
        });

        ctx.request_repaint();
    }
}
