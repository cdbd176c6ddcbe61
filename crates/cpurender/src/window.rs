use std::sync::Arc;
use std::time::Duration;

use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::Key;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use crate::framebuffer::Framebuffer;
use crate::gpu::Presenter;
use crate::surface::{FileClock, PresentationSurface, SurfaceError, SurfaceEvent};

/// Desktop window driven by polling: events are pumped once per frame
/// instead of handing control to the event loop.
pub struct WindowSurface {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    presenter: Presenter,
    size: PhysicalSize<u32>,
}

impl WindowSurface {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, SurfaceError> {
        let event_loop = EventLoop::new()
            .map_err(|err| SurfaceError::Window(format!("failed to initialize event loop: {err}")))?;
        let size = PhysicalSize::new(width.max(1), height.max(1));
        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(size)
            .with_resizable(false)
            .build(&event_loop)
            .map_err(|err| SurfaceError::Window(format!("failed to create window: {err}")))?;
        let window = Arc::new(window);
        let presenter = Presenter::new(window.clone(), size)?;
        tracing::info!(width = size.width, height = size.height, "viewer window opened");

        Ok(Self {
            event_loop,
            window,
            presenter,
            size,
        })
    }

    fn translate(event: WindowEvent, size: &mut PhysicalSize<u32>) -> Option<SurfaceEvent> {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => Some(SurfaceEvent::Quit),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Character(text),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match text.as_str() {
                "q" | "Q" => Some(SurfaceEvent::Quit),
                "r" | "R" => Some(SurfaceEvent::ResetClock),
                _ => None,
            },
            WindowEvent::DroppedFile(path) => Some(SurfaceEvent::FileDropped(path)),
            WindowEvent::CursorMoved { position, .. } => Some(SurfaceEvent::CursorMoved {
                x: position.x as f32,
                y: position.y as f32,
            }),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(SurfaceEvent::MouseButton {
                pressed: state == ElementState::Pressed,
            }),
            WindowEvent::Resized(new_size) => {
                *size = new_size;
                None
            }
            _ => None,
        }
    }
}

impl FileClock for WindowSurface {}

impl PresentationSurface for WindowSurface {
    fn size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        let requested = PhysicalSize::new(width.max(1), height.max(1));
        // `None` means the request was sent and a `Resized` event will follow.
        if let Some(actual) = self.window.request_inner_size(requested) {
            tracing::debug!(width = actual.width, height = actual.height, "window resized");
        }
        self.size = requested;
        self.presenter.resize(requested);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        let window_id = self.window.id();
        let mut size = self.size;
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _elwt| {
                if let Event::WindowEvent { window_id: id, event } = event {
                    if id == window_id {
                        events.extend(Self::translate(event, &mut size));
                    }
                }
            });
        if size != self.size {
            self.size = size;
            self.presenter.resize(size);
        }
        if let PumpStatus::Exit(code) = status {
            tracing::debug!(code, "event loop exited");
            events.push(SurfaceEvent::Quit);
        }
        events
    }

    fn present(&mut self, framebuffer: &Framebuffer) -> Result<(), SurfaceError> {
        self.presenter.present(framebuffer)
    }
}
