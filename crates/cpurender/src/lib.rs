//! CPU shader viewer: live-compiled pixel shaders executed on host cores.
//!
//! User shader text is wrapped into a compute-style module, compiled to
//! native code and invoked once per 8x8 tile of the framebuffer:
//!
//! ```text
//!   shader file ──▶ wrap_shader ──▶ CompilerPipeline ──▶ CompiledShader
//!                                        │ (fallback on failure)
//!                                        ▼
//!   ReloadMonitor ──▶ ViewerContext ──▶ TileDispatcher ──▶ Framebuffer ──▶ surface
//! ```
//!
//! [`Viewer`] is the entry point. It either runs the interactive window with
//! hot reload or executes a benchmark script and writes its `print` output.

mod benchmark;
mod compile;
mod constants;
mod context;
mod dispatch;
mod framebuffer;
mod gpu;
mod interactive;
mod reload;
mod runtime;
mod shader;
mod slangc;
mod surface;
mod window;
mod wrap;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use benchmark::{BenchmarkError, BenchmarkRunner};
pub use compile::{
    CompileError, CompileOptions, CompilerHints, CompilerPipeline, CompilerService,
    CompilerSession, DenormalMode, FloatingPointMode, LoadOutcome, LoadedShader,
    OptimizationLevel,
};
pub use constants::{GlobalParams, ViewerConstants, TILE_SIZE};
pub use context::ViewerContext;
pub use dispatch::{DispatchError, DispatchMode, Tile, TileDispatcher, TileGrid};
pub use framebuffer::{pack_rgba, Framebuffer};
pub use interactive::{run_interactive, InteractiveViewer, LoopControl};
pub use reload::ReloadMonitor;
pub use runtime::{
    time_source_for_framerate, BoxedTimeSource, SteppedTimeSource, SystemTimeSource, TimeSample,
    TimeSource,
};
pub use shader::{solid_fill, CompiledShader, PixelKernel, TileKernel};
pub use slangc::SlangcService;
pub use surface::{
    FileClock, HeadlessSurface, PresentationSurface, SurfaceError, SurfaceEvent, SystemClock,
};
pub use window::WindowSurface;
pub use wrap::{wrap_shader, Dialect, ENTRY_POINT, FALLBACK_COLOR, FALLBACK_SHADER};

const WINDOW_TITLE: &str = "CPU shader viewer";

/// Start-up configuration assembled by the CLI.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// `slangc` executable used for every compile.
    pub slangc: PathBuf,
    pub hints: CompilerHints,
    /// Worker threads for parallel dispatch; 0 = available parallelism.
    pub threads: usize,
    /// Benchmark without opening a window.
    pub headless: bool,
    /// Where to write each wrapped module before compiling it.
    pub dump_wrapped: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            slangc: PathBuf::from("slangc"),
            hints: CompilerHints::default(),
            threads: 0,
            headless: false,
            dump_wrapped: None,
        }
    }
}

/// Owns the compiler pipeline and worker pool shared by both modes.
pub struct Viewer {
    config: ViewerConfig,
    pipeline: CompilerPipeline,
    dispatcher: TileDispatcher,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        let service = SlangcService::new(&config.slangc);
        Self::with_service(config, service)
    }

    /// Uses `service` instead of `slangc`.
    pub fn with_service(config: ViewerConfig, service: impl CompilerService + 'static) -> Result<Self> {
        let mut pipeline = CompilerPipeline::new(service, config.hints.clone());
        if let Some(path) = &config.dump_wrapped {
            pipeline = pipeline.with_dump_path(path);
        }
        let dispatcher =
            TileDispatcher::new(config.threads).context("failed to start tile worker pool")?;
        tracing::info!(threads = dispatcher.threads(), "tile dispatcher ready");
        Ok(Self {
            config,
            pipeline,
            dispatcher,
        })
    }

    pub fn pipeline(&self) -> &CompilerPipeline {
        &self.pipeline
    }

    pub fn dispatcher(&self) -> &TileDispatcher {
        &self.dispatcher
    }

    /// Opens the viewer window and runs until the user quits.
    pub fn run_interactive(&self, shader: Option<PathBuf>) -> Result<()> {
        let (width, height) = self.config.surface_size;
        let mut surface = WindowSurface::open(WINDOW_TITLE, width, height)?;
        run_interactive(&mut surface, &self.pipeline, &self.dispatcher, shader)?;
        Ok(())
    }

    /// Executes the benchmark script at `path` line by line, writing `print`
    /// lines to `output`.
    ///
    /// Relative shader paths in the script resolve against the script's
    /// directory.
    pub fn run_benchmark(&self, path: &Path, output: &mut dyn Write) -> Result<()> {
        let script = benchscript::read_script(path)?;
        tracing::info!(path = %path.display(), "benchmark script loaded");
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let (width, height) = self.config.surface_size;

        let result = if self.config.headless {
            let mut surface = HeadlessSurface::new(width, height);
            self.execute(&mut surface, &script, &base_dir, output)
        } else {
            let mut surface = WindowSurface::open(WINDOW_TITLE, width, height)?;
            self.execute(&mut surface, &script, &base_dir, output)
        };
        result.with_context(|| format!("benchmark {} aborted", path.display()))
    }

    fn execute<S: PresentationSurface>(
        &self,
        surface: &mut S,
        script: &str,
        base_dir: &Path,
        output: &mut dyn Write,
    ) -> Result<(), BenchmarkError> {
        BenchmarkRunner::new(&self.pipeline, &self.dispatcher, surface, output)
            .with_base_dir(base_dir)
            .execute_source(script)
    }
}
