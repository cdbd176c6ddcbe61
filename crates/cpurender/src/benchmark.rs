//! Executes parsed benchmark scripts against a presentation surface.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use benchscript::{Command, Resolution, Script, ScriptError, Statement};
use benchstats::{RunStats, StatsStore};

use crate::compile::CompilerPipeline;
use crate::context::ViewerContext;
use crate::dispatch::{DispatchMode, TileDispatcher};
use crate::runtime::time_source_for_framerate;
use crate::surface::{PresentationSurface, SurfaceError, SurfaceEvent};
use crate::wrap::Dialect;

#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("line {line}: benchmark interrupted during `run`")]
    Interrupted { line: usize },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("failed to write benchmark output: {0}")]
    Output(#[from] std::io::Error),
}

/// Interpreter state carried across statements.
pub struct BenchmarkRunner<'a, S> {
    pipeline: &'a CompilerPipeline,
    dispatcher: &'a TileDispatcher,
    surface: &'a mut S,
    output: &'a mut dyn Write,
    base_dir: Option<PathBuf>,
    stats: StatsStore,
    framerate: Option<f64>,
    mode: DispatchMode,
    resolution: (u32, u32),
}

impl<'a, S: PresentationSurface> BenchmarkRunner<'a, S> {
    pub fn new(
        pipeline: &'a CompilerPipeline,
        dispatcher: &'a TileDispatcher,
        surface: &'a mut S,
        output: &'a mut dyn Write,
    ) -> Self {
        let resolution = surface.size();
        Self {
            pipeline,
            dispatcher,
            surface,
            output,
            base_dir: None,
            stats: StatsStore::new(),
            framerate: None,
            mode: DispatchMode::default(),
            resolution,
        }
    }

    /// Resolves relative shader paths against `dir` instead of the working
    /// directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    /// Runs every statement in order, stopping at the first error.
    pub fn execute(&mut self, script: &Script) -> Result<(), BenchmarkError> {
        for statement in &script.statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    /// Parses and runs `text` one line at a time. Lines before a malformed
    /// one have already taken effect when the error is returned.
    pub fn execute_source(&mut self, text: &str) -> Result<(), BenchmarkError> {
        for statement in benchscript::statements(text) {
            self.execute_statement(&statement?)?;
        }
        Ok(())
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<(), BenchmarkError> {
        match &statement.command {
            Command::Framerate(hz) => {
                self.framerate = (*hz > 0.0).then_some(*hz);
            }
            Command::Clear => self.stats.clear(),
            Command::Resolution(Resolution { width, height }) => {
                self.surface.resize(*width, *height)?;
                self.resolution = (*width, *height);
                tracing::debug!(width, height, "benchmark resolution set");
            }
            Command::Multithreading(enabled) => {
                self.mode = DispatchMode::from_parallel(*enabled);
            }
            Command::Run { shader, frames } => {
                let run = self.run(statement.line, shader, *frames)?;
                self.stats.push(run);
            }
            Command::Print(template) => {
                writeln!(self.output, "{}", template.render(&self.stats))?;
            }
        }
        Ok(())
    }

    fn resolve(&self, shader: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(shader),
            None => shader.to_path_buf(),
        }
    }

    fn run(&mut self, line: usize, shader: &Path, frames: u32) -> Result<RunStats, BenchmarkError> {
        let path = self.resolve(shader);
        let source = std::fs::read_to_string(&path).map_err(|source| ScriptError::UnreadableShader {
            line,
            path: path.clone(),
            source,
        })?;

        let loaded = self
            .pipeline
            .load_source(&path.display().to_string(), &source, Dialect::for_path(&path));
        let valid = loaded.outcome.is_valid();
        if !valid {
            tracing::warn!(line, shader = %path.display(), "benchmarking the fallback shader");
        }
        let mut run = RunStats::new(loaded.build_time.as_secs_f64());

        let mut ctx = ViewerContext::new(loaded.shader);
        let (width, height) = self.resolution;
        ctx.set_output_size(width, height);
        let mut clock = time_source_for_framerate(self.framerate);

        for _ in 0..frames {
            if self
                .surface
                .poll_events()
                .iter()
                .any(|event| matches!(event, SurfaceEvent::Quit))
            {
                return Err(BenchmarkError::Interrupted { line });
            }
            ctx.begin_frame(clock.sample());
            let started = Instant::now();
            ctx.render(self.dispatcher, self.mode);
            self.surface.present(ctx.framebuffer())?;
            run.record_frame(started.elapsed().as_secs_f64());
            ctx.end_frame();
        }

        tracing::info!(
            shader = %path.display(),
            frames,
            width,
            height,
            mode = ?self.mode,
            valid,
            build_s = run.build_time,
            "benchmark run finished"
        );
        Ok(run)
    }
}
