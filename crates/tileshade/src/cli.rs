use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "tileshade",
    author,
    version,
    about = "Live-compiled CPU pixel shader viewer and benchmark runner"
)]
pub struct Cli {
    /// Benchmark script to execute; without it the interactive viewer opens.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Shader to load when the interactive viewer starts.
    #[arg(long, value_name = "FILE", conflicts_with = "script")]
    pub shader: Option<PathBuf>,

    /// Path to the `slangc` executable.
    #[arg(long, value_name = "PATH", env = "TILESHADE_SLANGC")]
    pub slangc: Option<PathBuf>,

    /// Target CPU passed to the code generator (e.g. `znver5`).
    #[arg(long, value_name = "NAME", env = "TILESHADE_TARGET_CPU")]
    pub target_cpu: Option<String>,

    /// Vector math library for the code generator (e.g. `AMDLIBM`).
    #[arg(long, value_name = "NAME", env = "TILESHADE_VECTOR_LIBRARY")]
    pub vector_library: Option<String>,

    /// Worker threads for tile dispatch (0 = available parallelism).
    #[arg(long, value_name = "N", env = "TILESHADE_THREADS")]
    pub threads: Option<usize>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Configuration file; defaults to `tileshade/config.toml` in the user config dir.
    #[arg(long, value_name = "FILE", env = "TILESHADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run the benchmark without opening a window.
    #[arg(long, requires = "script")]
    pub headless: bool,

    /// Write every wrapped shader module to this file before compiling it.
    #[arg(long, value_name = "FILE")]
    pub dump_wrapped: Option<PathBuf>,
}

/// Parses the process arguments.
///
/// Invalid invocations print the usage to stdout and exit with status 1;
/// `--help` and `--version` keep clap's behaviour.
pub fn parse() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprint!("{}", err.render());
            println!("{}", Cli::command().render_usage());
            std::process::exit(1);
        }
    }
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let parse = |text: &str| -> Result<u32, String> {
        match text.trim().parse::<u32>() {
            Ok(0) | Err(_) => Err(format!("invalid dimension '{text}' in size '{value}'")),
            Ok(dimension) => Ok(dimension),
        }
    };
    Ok((parse(width)?, parse(height)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_selects_interactive_mode() {
        let cli = Cli::try_parse_from(["tileshade"]).unwrap();
        assert!(cli.script.is_none());
        assert!(!cli.headless);
    }

    #[test]
    fn single_argument_is_a_benchmark_script() {
        let cli = Cli::try_parse_from(["tileshade", "bench.txt", "--headless"]).unwrap();
        assert_eq!(cli.script, Some(PathBuf::from("bench.txt")));
        assert!(cli.headless);
    }

    #[test]
    fn extra_positional_arguments_are_rejected() {
        let err = Cli::try_parse_from(["tileshade", "a.txt", "b.txt"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn headless_requires_a_script() {
        assert!(Cli::try_parse_from(["tileshade", "--headless"]).is_err());
    }

    #[test]
    fn compiler_hints_parse() {
        let cli = Cli::try_parse_from([
            "tileshade",
            "--target-cpu",
            "znver5",
            "--vector-library",
            "AMDLIBM",
            "--threads",
            "4",
            "--size",
            "640x360",
        ])
        .unwrap();
        assert_eq!(cli.target_cpu.as_deref(), Some("znver5"));
        assert_eq!(cli.vector_library.as_deref(), Some("AMDLIBM"));
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.size, Some((640, 360)));
    }

    #[test]
    fn size_parser_rejects_garbage() {
        assert_eq!(parse_size("1920X1080"), Ok((1920, 1080)));
        assert!(parse_size("1920").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("axb").is_err());
    }
}
