//! Fullscreen presenter on `winit` + `pixels`.
//!
//! The event loop is pumped rather than run: the trial controller owns the
//! frame cadence, and window events are drained after every present so the
//! operator keys reach [`SignalFlags`] at most one frame late.

use std::sync::Arc;
use std::time::Duration;

use gazelat_core::{DisplayError, PacingMode, SignalFlags, Stimulus, StimulusPresenter};
use pixels::wgpu::PresentMode;
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use tracing::{debug, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowId};

use crate::frames::StimulusFrames;

/// Pumps allowed for the window and surface to come up.
const STARTUP_PUMPS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowOptions {
    pub fullscreen: bool,
    pub pacing: PacingMode,
}

pub struct WindowPresenter {
    event_loop: EventLoop<()>,
    surface: Surface,
    frames: StimulusFrames,
}

struct Surface {
    options: WindowOptions,
    buffer_size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    signals: SignalFlags,
    modifiers: ModifiersState,
    failure: Option<String>,
}

impl WindowPresenter {
    pub fn open(
        frames: StimulusFrames,
        options: WindowOptions,
        signals: SignalFlags,
    ) -> Result<Self, DisplayError> {
        let event_loop = EventLoop::new().map_err(|e| DisplayError(e.to_string()))?;
        let layout = frames.layout();
        let mut presenter = Self {
            event_loop,
            surface: Surface {
                options,
                buffer_size: PhysicalSize::new(layout.width, layout.height),
                window: None,
                pixels: None,
                signals,
                modifiers: ModifiersState::empty(),
                failure: None,
            },
            frames,
        };

        for _ in 0..STARTUP_PUMPS {
            if presenter.surface.pixels.is_some() {
                return Ok(presenter);
            }
            if let Some(reason) = presenter.surface.failure.take() {
                return Err(DisplayError(reason));
            }
            presenter.pump(Some(Duration::from_millis(10)));
        }
        match presenter.surface.pixels {
            Some(_) => Ok(presenter),
            None => Err(DisplayError("window was never resumed".into())),
        }
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(timeout, &mut self.surface) {
            debug!(code, "event loop exited");
            self.surface.signals.raise_abort();
        }
    }
}

impl StimulusPresenter for WindowPresenter {
    fn present(&mut self, stimulus: Stimulus) -> Result<(), DisplayError> {
        let pixels = self
            .surface
            .pixels
            .as_mut()
            .ok_or_else(|| DisplayError("window closed".into()))?;
        self.frames.blit(stimulus, pixels.frame_mut())?;
        pixels.render().map_err(|e| DisplayError(e.to_string()))?;
        self.pump(Some(Duration::ZERO));
        Ok(())
    }

    fn pacing(&self) -> PacingMode {
        self.surface.options.pacing
    }
}

impl Surface {
    fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), String> {
        let mut attributes = Window::default_attributes()
            .with_title("gazelat")
            .with_resizable(false);
        if self.options.fullscreen {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
                .ok_or("no monitor available")?;
            if let Some(mhz) = monitor.refresh_rate_millihertz() {
                info!(refresh_hz = mhz as f64 / 1000.0, "primary monitor");
            }
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        } else {
            attributes = attributes.with_inner_size(self.buffer_size);
        }

        let window = Arc::new(event_loop.create_window(attributes).map_err(|e| e.to_string())?);
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        let present_mode = match self.options.pacing {
            PacingMode::Vsync => PresentMode::AutoVsync,
            PacingMode::Immediate => PresentMode::AutoNoVsync,
        };
        let pixels = PixelsBuilder::new(self.buffer_size.width, self.buffer_size.height, surface)
            .present_mode(present_mode)
            .build()
            .map_err(|e| e.to_string())?;

        info!(
            surface_width = size.width,
            surface_height = size.height,
            scale_factor = window.scale_factor(),
            ?present_mode,
            "display ready"
        );

        window.set_cursor_visible(false);
        self.pixels = Some(pixels);
        self.window = Some(window);
        Ok(())
    }

    fn handle_key(&mut self, key: PhysicalKey) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::Escape => self.signals.raise_skip(),
            KeyCode::KeyR => self.signals.raise_repeat(),
            KeyCode::KeyC if self.modifiers.control_key() => self.signals.raise_abort(),
            _ => {}
        }
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.pixels = None;
        self.signals.raise_abort();
        event_loop.exit();
    }
}

impl ApplicationHandler for Surface {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(reason) = self.create(event_loop) {
                warn!(%reason, "failed to create window and surface");
                self.failure = Some(reason);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close(event_loop),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_key(event.physical_key);
            }
            WindowEvent::Resized(size) => {
                if let Some(pixels) = &mut self.pixels {
                    if let Err(e) = pixels.resize_surface(size.width, size.height) {
                        warn!(error = %e, "failed to resize surface");
                    }
                }
            }
            _ => {}
        }
    }
}

impl Drop for WindowPresenter {
    fn drop(&mut self) {
        if let Some(window) = &self.surface.window {
            window.set_cursor_visible(true);
        }
    }
}
