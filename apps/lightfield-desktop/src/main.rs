use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use lightfield_common::Rgb;
use lightfield_kernel::{BoxField, SceneConfig};
use lightfield_render::{FrameDriver, SystemClock};
use lightfield_render_wgpu::{OrthoCamera, WgpuFrame, WgpuRenderer};
use lightfield_tools::{FieldInspector, PerformanceMeter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "lightfield-desktop", about = "Lightfield desktop application")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML scene configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed; random when absent
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Application state.
struct AppState {
    config: SceneConfig,
    field: BoxField,
    driver: FrameDriver<SystemClock>,
    camera: OrthoCamera,
    meter: PerformanceMeter,
    viewport: PhysicalSize<u32>,
    cursor: Option<PhysicalPosition<f64>>,
    dragging_light: bool,
    floor_dirty: bool,
}

impl AppState {
    fn new(config: SceneConfig, seed: Option<u64>) -> Self {
        let field = BoxField::new(&config, seed);
        let camera = OrthoCamera::from_config(config.camera(), 16.0 / 9.0);
        Self {
            config,
            field,
            driver: FrameDriver::new(SystemClock::new()),
            camera,
            meter: PerformanceMeter::default(),
            viewport: PhysicalSize::new(1280, 720),
            cursor: None,
            dragging_light: false,
            floor_dirty: true,
        }
    }

    fn set_viewport(&mut self, size: PhysicalSize<u32>) {
        self.viewport = size;
        self.camera.set_viewport(size.width, size.height);
    }

    /// Cursor position in normalised device coordinates, y up.
    fn cursor_ndc(&self) -> Option<Vec2> {
        let pos = self.cursor?;
        let w = self.viewport.width.max(1) as f64;
        let h = self.viewport.height.max(1) as f64;
        Some(Vec2::new(
            (pos.x / w * 2.0 - 1.0) as f32,
            (1.0 - pos.y / h * 2.0) as f32,
        ))
    }

    fn move_light_to_cursor(&mut self) {
        let Some(ndc) = self.cursor_ndc() else {
            return;
        };
        let amplitude = self.config.interactive().mouse_movement_amplitude;
        let target = self.field.light().cursor_position(ndc, amplitude);
        if let Err(e) = self.config.set_light_position(target) {
            tracing::warn!("light position rejected: {e}");
        }
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::KeyR => {
                self.field.request_regenerate();
                tracing::info!("regeneration requested");
            }
            KeyCode::Space => {
                let animate = !self.config.looping().animate;
                self.config.set_animate(animate);
            }
            KeyCode::KeyH => {
                let mut dev = *self.config.dev();
                dev.hide_gui = !dev.hide_gui;
                self.config.set_dev(dev);
            }
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if self.config.dev().hide_gui {
            return;
        }

        egui::SidePanel::left("debug_panel")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Lightfield");
                ui.separator();
                ui.label(FieldInspector::summary(&self.field).to_string());
                if self.config.performance().measure {
                    ui.label(format!(
                        "FPS: {:.0} (avg {:.0})",
                        self.meter.fps(),
                        self.meter.average_fps()
                    ));
                }
                ui.horizontal(|ui| {
                    if ui.button("Regenerate (R)").clicked() {
                        self.field.request_regenerate();
                    }
                    let mut animate = self.config.looping().animate;
                    if ui.checkbox(&mut animate, "Animate (Space)").changed() {
                        self.config.set_animate(animate);
                    }
                });
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.generative_section(ui);
                    self.interactive_section(ui);
                    self.light_section(ui);
                    self.scene_section(ui);
                });

                ui.separator();
                ui.small("LMB drag: move light | H: hide panel | Esc: quit");
            });
    }

    fn generative_section(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Generative")
            .default_open(true)
            .show(ui, |ui| {
                let edited = edit(ui, self.config.generative(), |ui, g| {
                    ui.horizontal(|ui| {
                        ui.label("Boxes");
                        ui.add(egui::DragValue::new(&mut g.box_count.min).range(0..=50_000));
                        ui.add(egui::DragValue::new(&mut g.box_count.max).range(0..=50_000));
                    });
                    ui.add(egui::Slider::new(&mut g.min_pos, -10.0..=0.0).text("min pos"));
                    ui.add(egui::Slider::new(&mut g.max_pos, 0.0..=10.0).text("max pos"));
                    ui.add(egui::Slider::new(&mut g.min_size, 0.01..=1.0).text("min size"));
                    ui.add(egui::Slider::new(&mut g.max_size, 0.01..=1.0).text("max size"));
                });
                if let Some(g) = edited {
                    if let Err(e) = self.config.set_generative(g) {
                        tracing::warn!("generative settings rejected: {e}");
                    }
                }
                ui.small("Applied on the next regeneration.");
            });
    }

    fn interactive_section(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Interactive").show(ui, |ui| {
            let edited = edit(ui, self.config.interactive(), |ui, c| {
                ui.add(egui::Slider::new(&mut c.distance_threshold, 0.0..=5.0).text("threshold"));
                ui.add(
                    egui::Slider::new(&mut c.mouse_movement_amplitude, 0.1..=20.0)
                        .text("mouse amplitude"),
                );
                ui.add(egui::Slider::new(&mut c.box_mass_factor, 0.1..=5.0).text("mass factor"));
                ui.add(egui::Slider::new(&mut c.box_speed, 0.0..=0.1).text("speed"));
                ui.add(egui::Slider::new(&mut c.distance_factor, 0.0..=100.0).text("distance factor"));
                ui.add(egui::Slider::new(&mut c.origin_factor, 0.0..=0.2).text("origin factor"));
            });
            if let Some(c) = edited {
                if let Err(e) = self.config.set_interactive(c) {
                    tracing::warn!("interactive settings rejected: {e}");
                }
            }
        });
    }

    fn light_section(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Light").show(ui, |ui| {
            let edited = edit(ui, self.config.light(), |ui, l| {
                ui.horizontal(|ui| {
                    ui.add(egui::DragValue::new(&mut l.position.x).prefix("X: ").speed(0.05));
                    ui.add(egui::DragValue::new(&mut l.position.y).prefix("Y: ").speed(0.05));
                    ui.add(egui::DragValue::new(&mut l.position.z).prefix("Z: ").speed(0.05));
                });
                ui.add(egui::Slider::new(&mut l.intensity, 0.0..=20.0).text("intensity"));
                ui.add(egui::Slider::new(&mut l.ambient_intensity, 0.0..=10.0).text("ambient"));
                ui.add(egui::Slider::new(&mut l.marker_color.h, 0.0..=360.0).text("marker hue"));
                let mut rgb = l.point_color.to_array();
                ui.horizontal(|ui| {
                    ui.label("Point colour");
                    ui.color_edit_button_rgb(&mut rgb);
                });
                l.point_color = Rgb::new(rgb[0], rgb[1], rgb[2]);
            });
            if let Some(l) = edited {
                if let Err(e) = self.config.set_light(l) {
                    tracing::warn!("light settings rejected: {e}");
                }
            }
        });
    }

    fn scene_section(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Scene").show(ui, |ui| {
            let floor = edit(ui, self.config.floor(), |ui, f| {
                ui.checkbox(&mut f.visible, "Floor");
                ui.add(egui::Slider::new(&mut f.position.y, -5.0..=5.0).text("floor y"));
                ui.add(
                    egui::Slider::new(&mut f.rotation.x, -std::f32::consts::PI..=std::f32::consts::PI)
                        .text("floor tilt"),
                );
            });
            if let Some(f) = floor {
                match self.config.set_floor(f) {
                    Ok(()) => self.floor_dirty = true,
                    Err(e) => tracing::warn!("floor settings rejected: {e}"),
                }
            }

            let camera = edit(ui, self.config.camera(), |ui, c| {
                ui.add(egui::Slider::new(&mut c.zoom, 0.05..=2.0).text("zoom"));
            });
            if let Some(c) = camera {
                match self.config.set_camera(c) {
                    Ok(()) => self.camera.apply_config(self.config.camera()),
                    Err(e) => tracing::warn!("camera settings rejected: {e}"),
                }
            }

            let mut measure = self.config.performance().measure;
            if ui.checkbox(&mut measure, "Measure FPS").changed() {
                self.config.set_measure_performance(measure);
                self.meter.reset();
            }
        });
    }
}

/// Run `body` on a copy of `current`; the copy is returned only if it changed.
fn edit<T: Clone + PartialEq>(
    ui: &mut egui::Ui,
    current: &T,
    body: impl FnOnce(&mut egui::Ui, &mut T),
) -> Option<T> {
    let mut draft = current.clone();
    body(ui, &mut draft);
    (draft != *current).then_some(draft)
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            gpu: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Lightfield")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lightfield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.set_viewport(size);
        self.renderer = Some(WgpuRenderer::new(&device, format, config.width, config.height));
        self.egui_winit = Some(egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        ));
        self.egui_renderer = Some(egui_wgpu::Renderer::new(&device, format, None, 1, false));

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.window = Some(window);
        self.gpu = Some(Gpu {
            surface,
            device,
            queue,
            config,
        });
        Ok(())
    }

    fn redraw(&mut self) {
        let (Some(gpu), Some(renderer), Some(window)) =
            (&self.gpu, &mut self.renderer, &self.window)
        else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let state = &mut self.state;
        if std::mem::take(&mut state.floor_dirty) {
            renderer.set_floor(&gpu.queue, state.config.floor());
        }

        let mut frame = WgpuFrame {
            renderer,
            device: &gpu.device,
            queue: &gpu.queue,
            view: &view,
            camera: &state.camera,
        };
        if let Err(e) = state
            .driver
            .frame(&mut state.field, &state.config, &mut frame)
        {
            tracing::error!("frame failed: {e}");
        }
        if state.config.performance().measure {
            state.meter.tick();
        }

        if let (Some(egui_winit), Some(egui_renderer)) =
            (&mut self.egui_winit, &mut self.egui_renderer)
        {
            let raw_input = egui_winit.take_egui_input(window);
            let full_output = self.egui_ctx.run(raw_input, |ctx| state.draw_ui(ctx));
            egui_winit.handle_platform_output(window, full_output.platform_output);

            let paint_jobs = self
                .egui_ctx
                .tessellate(full_output.shapes, full_output.pixels_per_point);
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [gpu.config.width, gpu.config.height],
                pixels_per_point: full_output.pixels_per_point,
            };

            for (id, image_delta) in &full_output.textures_delta.set {
                egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, image_delta);
            }
            let mut encoder = gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("egui_encoder"),
                });
            egui_renderer.update_buffers(
                &gpu.device,
                &gpu.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            gpu.queue.submit(std::iter::once(encoder.finish()));
            for id in &full_output.textures_delta.free {
                egui_renderer.free_texture(id);
            }
        }

        output.present();
        window.request_redraw();
    }

    fn shutdown(&mut self) {
        if let Some(renderer) = &mut self.renderer {
            renderer.dispose();
        }
        tracing::info!(frames = self.state.driver.frames_drawn(), "lightfield-desktop stopped");
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialise GPU: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            if egui_winit.on_window_event(window, &event).consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(&gpu.device, gpu.config.width, gpu.config.height);
                    }
                }
                self.state.set_viewport(new_size);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key, event_loop);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.dragging_light = btn_state == ElementState::Pressed;
                if self.state.dragging_light {
                    self.state.move_light_to_cursor();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.cursor = Some(position);
                if self.state.dragging_light {
                    self.state.move_light_to_cursor();
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.cursor = None;
                self.state.dragging_light = false;
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => SceneConfig::default(),
    };

    let filter = if cli.verbose || config.dev().log {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("lightfield-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(config, cli.seed));
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn state() -> AppState {
        let mut config = SceneConfig::default();
        config.set_box_count_range(10, 10).unwrap();
        AppState::new(config, Some(1))
    }

    #[test]
    fn cursor_centre_maps_to_origin() {
        let mut state = state();
        state.set_viewport(PhysicalSize::new(800, 600));
        state.cursor = Some(PhysicalPosition::new(400.0, 300.0));
        assert_eq!(state.cursor_ndc(), Some(Vec2::ZERO));
    }

    #[test]
    fn dragging_to_corner_moves_light() {
        let mut state = state();
        state.set_viewport(PhysicalSize::new(800, 600));
        state.cursor = Some(PhysicalPosition::new(800.0, 0.0));
        state.move_light_to_cursor();
        let amplitude = state.config.interactive().mouse_movement_amplitude;
        assert_eq!(
            state.config.light().position,
            Vec3::new(amplitude / 2.0, amplitude / 2.0, 0.0)
        );
    }

    #[test]
    fn edit_reports_only_changes() {
        let ctx = EguiContext::default();
        let _ = ctx.run(Default::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                assert_eq!(edit(ui, &3, |_, _| {}), None);
                assert_eq!(edit(ui, &3, |_, v| *v = 4), Some(4));
            });
        });
    }
}
