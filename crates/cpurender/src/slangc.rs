//! Compiler backend driving the `slangc` command line compiler.
//!
//! Each module is compiled into a host shared library inside a fresh
//! temporary directory and loaded with `libloading`. Slang exports the
//! per-group entry point as `<entry>_Group`.

use std::ffi::c_void;
use std::path::PathBuf;
use std::process::Command;

use libloading::Library;
use tempfile::TempDir;

use crate::compile::{
    CompileError, CompileOptions, CompilerService, CompilerSession, DenormalMode,
    FloatingPointMode, OptimizationLevel,
};
use crate::constants::GlobalParams;
use crate::shader::{CompiledShader, TileKernel};
use crate::wrap::Dialect;

/// `void entry_Group(int groupID[3], void* entryPointParams, void* globalParams)`
type GroupEntryPoint = unsafe extern "C" fn(*mut i32, *mut c_void, *mut c_void);

/// Compiler service backed by the `slangc` executable.
#[derive(Debug, Clone)]
pub struct SlangcService {
    executable: PathBuf,
}

impl SlangcService {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for SlangcService {
    fn default() -> Self {
        Self::new("slangc")
    }
}

impl CompilerService for SlangcService {
    fn create_session(
        &self,
        options: &CompileOptions,
        dialect: Dialect,
    ) -> Result<Box<dyn CompilerSession + '_>, CompileError> {
        Ok(Box::new(SlangcSession {
            executable: &self.executable,
            args: session_args(options, dialect),
        }))
    }
}

struct SlangcSession<'a> {
    executable: &'a PathBuf,
    args: Vec<String>,
}

impl CompilerSession for SlangcSession<'_> {
    fn compile_module(&mut self, source: &str, entry: &str) -> Result<CompiledShader, CompileError> {
        let workdir = tempfile::Builder::new().prefix("tileshade-").tempdir()?;
        let source_path = workdir.path().join("shader.slang");
        let library_path = workdir
            .path()
            .join(format!("shader{}", std::env::consts::DLL_SUFFIX));
        std::fs::write(&source_path, source)?;

        let output = Command::new(self.executable)
            .arg(&source_path)
            .args(&self.args)
            .args(["-entry", entry, "-stage", "compute", "-o"])
            .arg(&library_path)
            .output()
            .map_err(|err| {
                CompileError::Session(format!("failed to run {}: {err}", self.executable.display()))
            })?;

        let diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(CompileError::Diagnostics(diagnostics));
        }
        if !diagnostics.is_empty() {
            tracing::warn!("{diagnostics}");
        }
        if !library_path.exists() {
            return Err(CompileError::MissingEntryPoint(entry.to_string()));
        }

        // SAFETY: the library was just produced by slangc from our own
        // wrapper and has no initialisers beyond the Slang runtime prelude.
        let library = unsafe { Library::new(&library_path) }
            .map_err(|err| CompileError::Load(err.to_string()))?;
        let symbol = format!("{entry}_Group");
        // SAFETY: Slang's host-callable ABI for compute groups.
        let group_entry = unsafe {
            library
                .get::<GroupEntryPoint>(symbol.as_bytes())
                .map(|function| *function)
        }
        .map_err(|_| CompileError::MissingEntryPoint(symbol.clone()))?;

        Ok(CompiledShader::new(
            entry,
            NativeKernel {
                group_entry,
                _library: library,
                _workdir: workdir,
            },
        ))
    }
}

/// Entry point of a loaded shared library.
///
/// Field order matters: the library is unloaded before its directory is
/// removed.
struct NativeKernel {
    group_entry: GroupEntryPoint,
    _library: Library,
    _workdir: TempDir,
}

impl TileKernel for NativeKernel {
    unsafe fn run_group(&self, group: [i32; 3], params: &GlobalParams<'_>) {
        let mut group = group;
        (self.group_entry)(
            group.as_mut_ptr(),
            std::ptr::null_mut(),
            params as *const GlobalParams<'_> as *mut c_void,
        );
    }
}

/// Translates the session options into `slangc` flags.
fn session_args(options: &CompileOptions, dialect: Dialect) -> Vec<String> {
    let mut args = vec![
        "-target".to_string(),
        "shader-sharedlib".to_string(),
        "-emit-cpu-via-llvm".to_string(),
    ];
    args.push(
        match options.optimization {
            OptimizationLevel::None => "-O0",
            OptimizationLevel::Default => "-O1",
            OptimizationLevel::High => "-O2",
            OptimizationLevel::Maximal => "-O3",
        }
        .to_string(),
    );
    args.push("-fp-mode".to_string());
    args.push(
        match options.floating_point {
            FloatingPointMode::Precise => "precise",
            FloatingPointMode::Fast => "fast",
        }
        .to_string(),
    );
    for (flag, mode) in ["-denorm-mode-fp16", "-denorm-mode-fp32", "-denorm-mode-fp64"]
        .into_iter()
        .zip(options.denormals)
    {
        args.push(flag.to_string());
        args.push(
            match mode {
                DenormalMode::Any => "any",
                DenormalMode::Preserve => "preserve",
                DenormalMode::FlushToZero => "ftz",
            }
            .to_string(),
        );
    }
    if dialect == Dialect::Glsl {
        args.push("-allow-glsl".to_string());
    }
    if let Some(cpu) = &options.hints.target_cpu {
        args.push("-llvm-cpu".to_string());
        args.push(cpu.clone());
    }
    if let Some(library) = &options.hints.vector_library {
        args.push("-Xllvm".to_string());
        args.push(format!("-vector-library={library}"));
    }
    args
}
