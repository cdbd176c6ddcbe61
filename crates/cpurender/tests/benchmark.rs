mod common;

use benchscript::{Script, ScriptError};
use cpurender::{
    BenchmarkError, BenchmarkRunner, CompilerHints, CompilerPipeline, HeadlessSurface,
    PresentationSurface, SurfaceEvent, TileDispatcher,
};

use common::{write_shader, MockCompiler, GREEN, RED};

fn pipeline() -> (MockCompiler, CompilerPipeline) {
    let compiler = MockCompiler::default();
    let pipeline = CompilerPipeline::new(compiler.clone(), CompilerHints::default());
    (compiler, pipeline)
}

fn execute(
    pipeline: &CompilerPipeline,
    surface: &mut HeadlessSurface,
    dir: &std::path::Path,
    text: &str,
) -> (Result<(), BenchmarkError>, String) {
    let script = Script::parse(text).unwrap();
    let dispatcher = TileDispatcher::new(2).unwrap();
    let mut output = Vec::new();
    let result = BenchmarkRunner::new(pipeline, &dispatcher, surface, &mut output)
        .with_base_dir(dir)
        .execute(&script);
    (result, String::from_utf8(output).unwrap())
}

#[test]
fn run_records_frames_and_renders_at_aligned_resolution() {
    let dir = tempfile::tempdir().unwrap();
    write_shader(dir.path(), "green.glsl", [0.0, 1.0, 0.0, 1.0]);
    let (_, pipeline) = pipeline();
    let mut surface = HeadlessSurface::new(64, 64).capturing();

    let (result, output) = execute(
        &pipeline,
        &mut surface,
        dir.path(),
        "resolution 10 10\nmultithreading on\nrun green.glsl 4\nprint ${max frame-time}|${build-time}\n",
    );

    result.unwrap();
    assert_eq!(surface.size(), (16, 16));
    assert_eq!(surface.presented_frames(), 4);
    let frame = surface.last_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (16, 16));
    assert_eq!(frame.pixel(15, 15), Some(GREEN));

    let line = output.trim_end();
    let (frame_time, build_time) = line.split_once('|').unwrap();
    assert!(frame_time.parse::<f64>().unwrap() >= 0.0);
    assert!(build_time.parse::<f64>().unwrap() >= 0.0);
}

#[test]
fn missing_shader_stops_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let (compiler, pipeline) = pipeline();
    let mut surface = HeadlessSurface::new(16, 16).capturing();

    let (result, output) = execute(
        &pipeline,
        &mut surface,
        dir.path(),
        "run missing_file.glsl 10\nprint reached\n",
    );

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        BenchmarkError::Script(ScriptError::UnreadableShader { line: 1, .. })
    ));
    assert!(err.to_string().contains("missing_file.glsl"));
    assert!(output.is_empty());
    assert_eq!(compiler.compiles(), 0);
    assert_eq!(surface.presented_frames(), 0);
}

#[test]
fn compile_failure_benchmarks_the_fallback_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.glsl"), "// mock-error\n").unwrap();
    let (_, pipeline) = pipeline();
    let mut surface = HeadlessSurface::new(16, 16).capturing();

    let (result, output) = execute(
        &pipeline,
        &mut surface,
        dir.path(),
        "\n\nrun bad.glsl 3\nprint after=${build-time}\n",
    );

    result.unwrap();
    assert_eq!(surface.presented_frames(), 3);
    assert_eq!(surface.last_frame().unwrap().pixel(0, 0), Some(RED));
    let value = output.trim_end().strip_prefix("after=").unwrap();
    assert!(value.parse::<f64>().unwrap() >= 0.0);
}

#[test]
fn lines_before_a_malformed_one_still_run() {
    let dir = tempfile::tempdir().unwrap();
    let (_, pipeline) = pipeline();
    let mut surface = HeadlessSurface::new(16, 16);
    let dispatcher = TileDispatcher::new(1).unwrap();
    let mut output = Vec::new();

    let result = BenchmarkRunner::new(&pipeline, &dispatcher, &mut surface, &mut output)
        .with_base_dir(dir.path())
        .execute_source("print first\nresolution 640\nprint never\n");

    assert!(matches!(
        result,
        Err(BenchmarkError::Script(ScriptError::Arity { line: 2, .. }))
    ));
    assert_eq!(String::from_utf8(output).unwrap(), "first\n");
}

#[test]
fn quit_during_run_interrupts() {
    let dir = tempfile::tempdir().unwrap();
    write_shader(dir.path(), "green.glsl", [0.0, 1.0, 0.0, 1.0]);
    let (_, pipeline) = pipeline();
    let mut surface = HeadlessSurface::new(16, 16).capturing();
    surface.push_event(SurfaceEvent::Quit);

    let (result, output) = execute(
        &pipeline,
        &mut surface,
        dir.path(),
        "run green.glsl 5\nprint unreachable\n",
    );

    assert!(matches!(result, Err(BenchmarkError::Interrupted { line: 1 })));
    assert!(output.is_empty());
}

#[test]
fn forced_framerate_steps_shader_time() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("time.glsl"), "// mock-time\n").unwrap();
    let (_, pipeline) = pipeline();
    let mut surface = HeadlessSurface::new(8, 8).capturing();

    let (result, _) = execute(
        &pipeline,
        &mut surface,
        dir.path(),
        "framerate 4\nmultithreading off\nrun time.glsl 3\n",
    );

    result.unwrap();
    // Third frame: iTime = 2 / 4 Hz.
    let pixel = surface.last_frame().unwrap().pixel(0, 0).unwrap();
    assert_eq!(pixel & 0xff, 127);
}

#[test]
fn clear_resets_history() {
    let dir = tempfile::tempdir().unwrap();
    write_shader(dir.path(), "green.glsl", [0.0, 1.0, 0.0, 1.0]);
    let (_, pipeline) = pipeline();
    let mut surface = HeadlessSurface::new(8, 8).capturing();

    let (result, output) = execute(
        &pipeline,
        &mut surface,
        dir.path(),
        "run green.glsl 1\nrun green.glsl 1\nprint runs ${sum frame-time}\nclear\nprint ${build-time} ${sum max frame-time}\n",
    );

    result.unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("runs "));
    assert_eq!(lines[1], "0 0");
}
