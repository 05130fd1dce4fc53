use std::sync::Arc;

use glam::UVec2;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::FieldVizConfig;
use crate::error::FieldError;
use crate::gpu::{FieldEngine, GpuContext};
use crate::input::InputState;
use crate::time::FramePacer;

const WINDOW_TITLE: &str = "Vector fields";

/// Open a window and run the field until the user quits.
///
/// # Errors
///
/// Returns the first fatal error raised while setting up or drawing.
pub fn run(config: FieldVizConfig) -> Result<(), FieldError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    gpu: GpuContext,
    engine: FieldEngine,
}

impl GpuState {
    fn new(window: Arc<Window>, config: &FieldVizConfig) -> Result<Self, FieldError> {
        let size = window.inner_size();

        let instance = GpuContext::create_instance(config.debug);
        let surface = instance.create_surface(window)?;
        let gpu = pollster::block_on(GpuContext::new(instance, Some(&surface)))?;

        let surface_caps = surface.get_capabilities(&gpu.adapter);
        // The blit is a plain copy of the accumulation surface; an sRGB
        // target would re-encode it.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(FieldError::NoAdapter)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if config.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &surface_config);
        log::info!(
            "Surface format {:?}, {}x MSAA",
            surface_format,
            config.msaa_samples
        );

        let initial = FieldVizConfig {
            resolution: UVec2::new(surface_config.width, surface_config.height),
            ..config.clone()
        };
        let engine = FieldEngine::new(
            gpu.device.clone(),
            gpu.queue.clone(),
            &initial,
            surface_format,
        )?;

        Ok(Self {
            surface,
            surface_config,
            gpu,
            engine,
        })
    }

    fn resolution(&self) -> UVec2 {
        UVec2::new(self.surface_config.width, self.surface_config.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), FieldError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.gpu.device, &self.surface_config);
        self.engine.ensure_minimum_surface(UVec2::new(width, height))
    }

    fn render(&mut self, should_clear: bool) -> Result<(), FieldError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.gpu.device, &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for a frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.engine.draw(&view, self.resolution(), should_clear)?;
        frame.present();

        self.gpu.check()
    }
}

struct App {
    config: FieldVizConfig,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    input: InputState,
    pacer: FramePacer,
    error: Option<FieldError>,
}

impl App {
    fn new(config: FieldVizConfig) -> Self {
        let pacer = FramePacer::new(config.target_fps);
        Self {
            config,
            window: None,
            gpu_state: None,
            input: InputState::new(),
            pacer,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: FieldError) {
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), FieldError> {
        let window_attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.resolution.x,
                self.config.resolution.y,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = GpuState::new(window.clone(), &self.config)?;
        window.request_redraw();

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        Ok(())
    }

    fn frame(&mut self) -> Result<(), FieldError> {
        let Some(gpu_state) = &mut self.gpu_state else {
            return Ok(());
        };

        if let Some(fps) = self.pacer.wait() {
            log::debug!("{fps:.1} fps (tick {})", gpu_state.engine.tick());
        }
        if !self.input.frozen {
            gpu_state.engine.advance();
        }
        gpu_state.render(self.input.clear_every_frame)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);
        if self.input.should_quit {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    if let Err(e) = gpu_state.resize(physical_size.width, physical_size.height) {
                        self.fail(event_loop, e);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.frame() {
                    self.fail(event_loop, e);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
