use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::framebuffer::Framebuffer;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("window system error: {0}")]
    Window(String),
    #[error("presentation failed: {0}")]
    Present(String),
}

/// Input observed while polling a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Window closed or the quit key pressed.
    Quit,
    /// Restart shader time at zero.
    ResetClock,
    FileDropped(PathBuf),
    /// Cursor position in surface pixels, origin top-left.
    CursorMoved { x: f32, y: f32 },
    MouseButton { pressed: bool },
}

/// Source of file modification timestamps for hot reload.
pub trait FileClock {
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
    }
}

/// Reads timestamps straight from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl FileClock for SystemClock {}

/// Where finished frames are shown.
pub trait PresentationSurface: FileClock {
    /// Current surface size in pixels.
    fn size(&self) -> (u32, u32);
    /// Resizes the surface, blocking until the request is issued.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;
    /// Drains input gathered since the last call.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;
    /// Converts and shows the visible part of `framebuffer`.
    fn present(&mut self, framebuffer: &Framebuffer) -> Result<(), SurfaceError>;
}

/// Surface without a window.
///
/// Presenting only counts frames unless capture is enabled with
/// [`HeadlessSurface::capturing`], in which case the last frame is kept.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    pending: VecDeque<SurfaceEvent>,
    presented: usize,
    capture: bool,
    last_frame: Option<Framebuffer>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Keeps a copy of every presented frame for [`HeadlessSurface::last_frame`].
    pub fn capturing(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Queues an event for the next [`PresentationSurface::poll_events`].
    pub fn push_event(&mut self, event: SurfaceEvent) {
        self.pending.push_back(event);
    }

    pub fn presented_frames(&self) -> usize {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&Framebuffer> {
        self.last_frame.as_ref()
    }
}

impl FileClock for HeadlessSurface {}

impl PresentationSurface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.pending.drain(..).collect()
    }

    fn present(&mut self, framebuffer: &Framebuffer) -> Result<(), SurfaceError> {
        self.presented += 1;
        if self.capture {
            match &mut self.last_frame {
                Some(last) => last.clone_from(framebuffer),
                None => self.last_frame = Some(framebuffer.clone()),
            }
        }
        Ok(())
    }
}
