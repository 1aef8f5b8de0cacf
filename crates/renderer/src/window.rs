use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::window::{Window, WindowBuilder};

use tracing::{error, info, warn};

use crate::assets::AssetBootstrap;
use crate::frame::{FrameLoop, FrameParams, FrameTarget};
use crate::gpu::GpuState;
use crate::hooks::FrameObserver;
use crate::pointer::normalize_pointer;
use crate::surface::{SurfaceSizing, Viewport};
use crate::types::RendererConfig;

#[derive(Debug, Clone, Copy)]
enum UserEvent {
    /// The asset worker finished; poll the bootstrap.
    AssetReady,
}

/// Window plus the GPU state presenting into it.
struct WindowState {
    // dropped before `window`; the surface borrows its raw handles
    gpu: GpuState,
    window: Arc<Window>,
    scale_factor: f64,
    max_device_pixel_ratio: f64,
    base_title: String,
    shown_title: String,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let scale_factor = window.scale_factor();
        let sizing = SurfaceSizing::compute(
            window.inner_size(),
            scale_factor,
            config.max_device_pixel_ratio,
        );
        let gpu = GpuState::new(window.as_ref(), sizing, &config.params, config.color_space)?;
        info!(
            width = sizing.window.width,
            height = sizing.window.height,
            drawable_width = sizing.drawable.width,
            drawable_height = sizing.drawable.height,
            scale_factor,
            "lens surface ready"
        );

        Ok(Self {
            gpu,
            window,
            scale_factor,
            max_device_pixel_ratio: config.max_device_pixel_ratio,
            base_title: config.title.clone(),
            shown_title: config.title.clone(),
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let sizing =
            SurfaceSizing::compute(new_size, self.scale_factor, self.max_device_pixel_ratio);
        self.gpu.resize(sizing);
    }

    fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
        self.resize(self.window.inner_size());
    }

    /// Pointer position in lens space, relative to the current window size.
    fn pointer_position(&self, position: PhysicalPosition<f64>) -> Vec2 {
        normalize_pointer(
            position.x,
            position.y,
            Viewport::from(self.gpu.sizing().window),
        )
    }

    fn refresh_title(&mut self, status: Option<String>) {
        let title = match status {
            Some(status) => format!("{} ({status})", self.base_title),
            None => self.base_title.clone(),
        };
        if title != self.shown_title {
            self.window.set_title(&title);
            self.shown_title = title;
        }
    }
}

impl FrameTarget for WindowState {
    type Error = wgpu::SurfaceError;

    fn schedule_next(&mut self) {
        self.window.request_redraw();
    }

    fn resolution(&self) -> Viewport {
        self.gpu.drawable()
    }

    fn has_texture(&self) -> bool {
        self.gpu.has_texture()
    }

    fn push_params(&mut self, params: &FrameParams) {
        self.gpu.push_params(params);
    }

    fn draw(&mut self) -> Result<(), Self::Error> {
        self.gpu.render()
    }
}

fn install_asset<O: FrameObserver>(
    bootstrap: &mut AssetBootstrap,
    state: &mut WindowState,
    observer: &mut O,
) {
    if !bootstrap.is_pending() {
        return;
    }
    let Some(result) = bootstrap.poll() else {
        return;
    };
    match result.and_then(|image| state.gpu.install_texture(&image)) {
        Ok(texture) => {
            info!(
                path = %texture.path.display(),
                width = texture.width,
                height = texture.height,
                "background image installed"
            );
            observer.on_ready(&texture);
        }
        Err(err) => {
            error!(error = %err, "failed to load background image; lens stays blank");
            observer.on_error(&err);
        }
    }
}

/// Opens the lens window and drives it until the window closes.
pub(crate) fn run_window<O: FrameObserver>(config: RendererConfig, mut observer: O) -> Result<()> {
    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .with_transparent(true)
        .build(&event_loop)
        .context("failed to create lens window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)?;
    let mut bootstrap = AssetBootstrap::spawn(config.image_path.clone(), move || {
        let _ = proxy.send_event(UserEvent::AssetReady);
    })?;

    let mut frame_loop = FrameLoop::new();
    frame_loop.start();
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            match event {
                Event::UserEvent(UserEvent::AssetReady) => {
                    install_asset(&mut bootstrap, &mut state, &mut observer);
                }
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            frame_loop.stop();
                            elwt.exit();
                        }
                        WindowEvent::Resized(new_size) => {
                            state.resize(new_size);
                        }
                        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                            state.set_scale_factor(scale_factor);
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            frame_loop.stage_pointer(state.pointer_position(position));
                        }
                        WindowEvent::CursorEntered { .. } => {
                            observer.on_hover();
                        }
                        WindowEvent::MouseInput {
                            state: ElementState::Pressed,
                            button: MouseButton::Left,
                            ..
                        } => {
                            observer.on_click();
                        }
                        WindowEvent::RedrawRequested => {
                            state.refresh_title(observer.status(Instant::now()));
                            match frame_loop.tick(&mut state) {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                    state.gpu.reconfigure();
                                }
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    error!("surface out of memory; exiting");
                                    frame_loop.stop();
                                    elwt.exit();
                                }
                                Err(wgpu::SurfaceError::Timeout) => {
                                    warn!("surface timeout; retrying next frame");
                                }
                                Err(other) => {
                                    warn!(error = ?other, "surface error; retrying next frame");
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}
