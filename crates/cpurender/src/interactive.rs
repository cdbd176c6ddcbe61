use std::path::PathBuf;

use crate::compile::CompilerPipeline;
use crate::context::ViewerContext;
use crate::dispatch::{DispatchMode, TileDispatcher};
use crate::reload::ReloadMonitor;
use crate::runtime::{SystemTimeSource, TimeSource};
use crate::surface::{PresentationSurface, SurfaceError, SurfaceEvent};

/// What the frame loop does after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// State of the interactive viewer between frames.
pub struct InteractiveViewer<'a> {
    pipeline: &'a CompilerPipeline,
    dispatcher: &'a TileDispatcher,
    ctx: ViewerContext,
    monitor: ReloadMonitor,
    clock: SystemTimeSource,
}

impl<'a> InteractiveViewer<'a> {
    /// Starts on the fallback shader with no watched file.
    pub fn new(pipeline: &'a CompilerPipeline, dispatcher: &'a TileDispatcher) -> Self {
        Self {
            pipeline,
            dispatcher,
            ctx: ViewerContext::new(pipeline.load_shader(None).shader),
            monitor: ReloadMonitor::new(),
            clock: SystemTimeSource::new(),
        }
    }

    pub fn context(&self) -> &ViewerContext {
        &self.ctx
    }

    pub fn monitor(&self) -> &ReloadMonitor {
        &self.monitor
    }

    /// Loads `path` as if it had been dropped on the window.
    pub fn open<S: PresentationSurface>(&mut self, surface: &S, path: PathBuf) {
        self.monitor
            .file_dropped(path, surface, self.pipeline, &mut self.ctx);
    }

    /// Runs one frame: input, hot reload, render, present.
    pub fn step<S: PresentationSurface>(&mut self, surface: &mut S) -> Result<LoopControl, SurfaceError> {
        let time = self.clock.sample();
        if self.monitor.is_valid() {
            tracing::debug!(delta = time.delta, "frame");
        }

        for event in surface.poll_events() {
            match event {
                SurfaceEvent::Quit => return Ok(LoopControl::Quit),
                SurfaceEvent::ResetClock => {
                    tracing::info!("time reset");
                    self.clock.reset();
                }
                SurfaceEvent::FileDropped(path) => {
                    self.monitor
                        .file_dropped(path, &*surface, self.pipeline, &mut self.ctx);
                }
                pointer => self.ctx.handle_pointer(&pointer),
            }
        }

        self.monitor.poll(&*surface, self.pipeline, &mut self.ctx);

        let (width, height) = surface.size();
        self.ctx.set_output_size(width, height);
        self.ctx.begin_frame(time);
        self.ctx.render(self.dispatcher, DispatchMode::Parallel);
        surface.present(self.ctx.framebuffer())?;
        self.ctx.end_frame();
        Ok(LoopControl::Continue)
    }
}

/// Runs the viewer until the surface asks to quit.
pub fn run_interactive<S: PresentationSurface>(
    surface: &mut S,
    pipeline: &CompilerPipeline,
    dispatcher: &TileDispatcher,
    initial_shader: Option<PathBuf>,
) -> Result<(), SurfaceError> {
    let mut viewer = InteractiveViewer::new(pipeline, dispatcher);
    if let Some(path) = initial_shader {
        viewer.open(surface, path);
    }
    while viewer.step(surface)? == LoopControl::Continue {}
    tracing::info!("viewer closed");
    Ok(())
}
