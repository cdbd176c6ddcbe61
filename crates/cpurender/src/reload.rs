use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::compile::CompilerPipeline;
use crate::context::ViewerContext;
use crate::surface::FileClock;

/// Hot-reload state for the interactive viewer.
///
/// Tracks the active shader path, the modification time it was last loaded
/// at, and whether the requested shader (rather than the fallback) is live.
#[derive(Debug, Clone, Default)]
pub struct ReloadMonitor {
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
    valid: bool,
}

impl ReloadMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `true` while the requested shader compiled and is active.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Reloads the active shader if its file is strictly newer than the last
    /// load. Returns whether a load was attempted.
    pub fn poll(
        &mut self,
        clock: &dyn FileClock,
        pipeline: &CompilerPipeline,
        ctx: &mut ViewerContext,
    ) -> bool {
        let Some(path) = self.path.as_deref() else {
            return false;
        };
        let Some(current) = clock.modified(path) else {
            return false;
        };
        if Some(current) <= self.modified {
            return false;
        }

        tracing::info!(path = %path.display(), "shader changed on disk, reloading");
        self.modified = Some(current);
        let loaded = pipeline.load_shader(Some(path));
        self.valid = loaded.outcome.is_valid();
        ctx.install(loaded);
        true
    }

    /// Switches to `path` and loads it right away.
    ///
    /// A failed load leaves the fallback active; the previous shader is not
    /// restored and the new path stays watched.
    pub fn file_dropped(
        &mut self,
        path: PathBuf,
        clock: &dyn FileClock,
        pipeline: &CompilerPipeline,
        ctx: &mut ViewerContext,
    ) {
        tracing::info!(path = %path.display(), "loading dropped shader");
        self.modified = clock.modified(&path);
        let loaded = pipeline.load_shader(Some(&path));
        self.valid = loaded.outcome.is_valid();
        self.path = Some(path);
        ctx.install(loaded);
    }
}
