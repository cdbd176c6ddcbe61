#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpurender::{
    CompileError, CompileOptions, CompiledShader, CompilerService, CompilerSession, Dialect,
    PixelKernel, ViewerConstants,
};

/// Compiler stand-in producing in-process kernels.
///
/// A `// mock-color: r g b a` line selects the fill colour, `// mock-time`
/// renders `iTime` into the red channel and `// mock-error` fails the
/// compile. Anything else (the fallback included) fills red.
#[derive(Debug, Clone, Default)]
pub struct MockCompiler {
    compiles: Arc<AtomicUsize>,
}

impl MockCompiler {
    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl CompilerService for MockCompiler {
    fn create_session(
        &self,
        _options: &CompileOptions,
        _dialect: Dialect,
    ) -> Result<Box<dyn CompilerSession + '_>, CompileError> {
        Ok(Box::new(MockSession {
            compiles: &self.compiles,
        }))
    }
}

struct MockSession<'a> {
    compiles: &'a AtomicUsize,
}

impl CompilerSession for MockSession<'_> {
    fn compile_module(&mut self, source: &str, entry: &str) -> Result<CompiledShader, CompileError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if !source.contains(entry) {
            return Err(CompileError::MissingEntryPoint(entry.to_string()));
        }
        if source.contains("// mock-error") {
            return Err(CompileError::Diagnostics("error: mock failure".into()));
        }
        if source.contains("// mock-time") {
            return Ok(CompiledShader::new(
                "mock-time",
                PixelKernel::new(|constants: &ViewerConstants, _| [constants.time, 0.0, 0.0, 1.0]),
            ));
        }
        let color = source
            .lines()
            .find_map(|line| line.trim().strip_prefix("// mock-color:"))
            .map(parse_color)
            .unwrap_or([1.0, 0.0, 0.0, 1.0]);
        Ok(CompiledShader::new(
            "mock",
            PixelKernel::new(move |_, _| color),
        ))
    }
}

fn parse_color(text: &str) -> [f32; 4] {
    let mut color = [0.0, 0.0, 0.0, 1.0];
    for (slot, value) in color.iter_mut().zip(text.split_whitespace()) {
        *slot = value.parse().unwrap();
    }
    color
}

/// Writes a shader file that the mock compiler fills with `color`.
pub fn write_shader(dir: &Path, name: &str, color: [f32; 4]) -> PathBuf {
    let path = dir.join(name);
    let [r, g, b, a] = color;
    std::fs::write(
        &path,
        format!("// mock-color: {r} {g} {b} {a}\nvoid mainImage(out vec4 c, vec2 p) {{ c = vec4(0); }}\n"),
    )
    .unwrap();
    path
}

pub const RED: u32 = 0xff00_00ff;
pub const GREEN: u32 = 0xff00_ff00;
pub const BLUE: u32 = 0xffff_0000;
