use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::shader::{solid_fill, CompiledShader};
use crate::wrap::{wrap_shader, Dialect, ENTRY_POINT, FALLBACK_COLOR, FALLBACK_SHADER};

/// Why a shader did not turn into a callable.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to start compiler session: {0}")]
    Session(String),
    #[error("shader failed to compile:\n{0}")]
    Diagnostics(String),
    #[error("entry point '{0}' not found in compiled module")]
    MissingEntryPoint(String),
    #[error("failed to load compiled module: {0}")]
    Load(String),
    #[error("failed to read shader {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationLevel {
    None,
    Default,
    High,
    Maximal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingPointMode {
    Precise,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenormalMode {
    Any,
    Preserve,
    FlushToZero,
}

/// Target hints forwarded to the native code generator when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerHints {
    /// Target micro-architecture, e.g. `znver5`.
    pub target_cpu: Option<String>,
    /// Vendor vector math library, e.g. `AMDLIBM`.
    pub vector_library: Option<String>,
}

/// Options passed to every compiler session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub optimization: OptimizationLevel,
    pub floating_point: FloatingPointMode,
    /// Denormal handling for half, single and double precision.
    pub denormals: [DenormalMode; 3],
    pub hints: CompilerHints,
}

impl CompileOptions {
    /// Fixed engine policy: maximal optimisation, fast maths, any denormal
    /// handling. Only the target hints vary.
    pub fn engine_policy(hints: CompilerHints) -> Self {
        Self {
            optimization: OptimizationLevel::Maximal,
            floating_point: FloatingPointMode::Fast,
            denormals: [DenormalMode::Any; 3],
            hints,
        }
    }
}

/// Native shader compiler backend.
pub trait CompilerService {
    fn create_session(
        &self,
        options: &CompileOptions,
        dialect: Dialect,
    ) -> Result<Box<dyn CompilerSession + '_>, CompileError>;
}

/// One configured compilation context.
pub trait CompilerSession {
    /// Compiles `source` and resolves the callable for `entry`.
    fn compile_module(&mut self, source: &str, entry: &str)
        -> Result<CompiledShader, CompileError>;
}

/// Whether the requested shader or the fallback ended up active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Requested,
    Fallback,
}

impl LoadOutcome {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Requested)
    }
}

/// Result of [`CompilerPipeline::load_shader`]; always carries a usable shader.
#[derive(Debug)]
pub struct LoadedShader {
    pub shader: CompiledShader,
    pub outcome: LoadOutcome,
    /// Time spent building the requested shader, fallback excluded.
    pub build_time: Duration,
}

/// Wraps, compiles and loads shaders with the engine's fixed options.
pub struct CompilerPipeline {
    service: Box<dyn CompilerService>,
    options: CompileOptions,
    dump_path: Option<PathBuf>,
}

impl CompilerPipeline {
    pub fn new(service: impl CompilerService + 'static, hints: CompilerHints) -> Self {
        Self {
            service: Box::new(service),
            options: CompileOptions::engine_policy(hints),
            dump_path: None,
        }
    }

    /// Writes every wrapped source to `path` before compiling it.
    pub fn with_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_path = Some(path.into());
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compiles an already wrapped module.
    pub fn compile(&self, wrapped: &str, dialect: Dialect) -> Result<CompiledShader, CompileError> {
        if let Some(path) = &self.dump_path {
            if let Err(err) = std::fs::write(path, wrapped) {
                tracing::warn!(path = %path.display(), %err, "failed to dump wrapped shader");
            }
        }
        let mut session = self.service.create_session(&self.options, dialect)?;
        session.compile_module(wrapped, ENTRY_POINT)
    }

    /// Loads the shader at `path`, substituting the fallback on any failure.
    ///
    /// `None` loads the fallback directly.
    pub fn load_shader(&self, path: Option<&Path>) -> LoadedShader {
        let Some(path) = path else {
            return LoadedShader {
                shader: self.fallback(),
                outcome: LoadOutcome::Fallback,
                build_time: Duration::ZERO,
            };
        };
        match std::fs::read_to_string(path) {
            Ok(source) => self.load_source(&path.display().to_string(), &source, Dialect::for_path(path)),
            Err(source) => {
                let err = CompileError::Read {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::warn!("{err}; using fallback shader");
                LoadedShader {
                    shader: self.fallback(),
                    outcome: LoadOutcome::Fallback,
                    build_time: Duration::ZERO,
                }
            }
        }
    }

    /// Wraps and compiles `source`, substituting the fallback on failure.
    pub fn load_source(&self, label: &str, source: &str, dialect: Dialect) -> LoadedShader {
        let started = Instant::now();
        let result = self.compile(&wrap_shader(source, dialect), dialect);
        let build_time = started.elapsed();
        match result {
            Ok(shader) => {
                tracing::info!(shader = label, build_ms = build_time.as_secs_f64() * 1e3, "shader compiled");
                LoadedShader {
                    shader: shader.with_label(label),
                    outcome: LoadOutcome::Requested,
                    build_time,
                }
            }
            Err(err) => {
                tracing::warn!(shader = label, "{err}");
                LoadedShader {
                    shader: self.fallback(),
                    outcome: LoadOutcome::Fallback,
                    build_time,
                }
            }
        }
    }

    fn fallback(&self) -> CompiledShader {
        match self.compile(&wrap_shader(FALLBACK_SHADER, Dialect::Glsl), Dialect::Glsl) {
            Ok(shader) => shader.with_label("fallback"),
            Err(err) => {
                tracing::error!("fallback shader failed to compile, using native fill: {err}");
                solid_fill("fallback", FALLBACK_COLOR)
            }
        }
    }
}
