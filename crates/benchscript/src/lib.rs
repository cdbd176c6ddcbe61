//! Benchmark command scripts.
//!
//! A script is line oriented. Blank lines and lines starting with `#` are
//! ignored; every other line is `command arg...`:
//!
//! ```text
//! resolution 1920 1080
//! multithreading on
//! framerate 60
//! run shaders/plasma.glsl 200
//! print plasma: ${mean frame-time}s per frame, built in ${build-time}s
//! ```
//!
//! [`statements`] parses lazily so an executor can act on each line before
//! the next one is read; a malformed line stops the script there.

mod command;
mod template;

use std::path::{Path, PathBuf};

pub use command::{Command, Resolution, MAX_DIMENSION, RESOLUTION_ALIGNMENT};
pub use template::{Segment, Template};

use benchstats::StatsError;

/// Fatal problems with a benchmark script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to read benchmark script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: `{command}` expects {expected}, got {found} argument(s)")]
    Arity {
        line: usize,
        command: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("line {line}: `{command}` could not parse '{token}' as a number")]
    InvalidNumber {
        line: usize,
        command: &'static str,
        token: String,
    },
    #[error("line {line}: invalid query in `print`: {source}")]
    Query {
        line: usize,
        #[source]
        source: StatsError,
    },
    #[error("line {line}: `run` cannot read shader {path}: {source}")]
    UnreadableShader {
        line: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based line number in the source file.
    pub line: usize,
    pub command: Command,
}

/// A fully parsed benchmark script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub statements: Vec<Statement>,
}

/// Yields one parsed statement per non-blank, non-comment line of `text`.
pub fn statements(text: &str) -> impl Iterator<Item = Result<Statement, ScriptError>> + '_ {
    text.lines().enumerate().filter_map(|(index, raw)| {
        let line = raw.trim_start();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let number = index + 1;
        Some(Command::parse(line, number).map(|command| Statement {
            line: number,
            command,
        }))
    })
}

/// Reads script text from disk.
pub fn read_script(path: &Path) -> Result<String, ScriptError> {
    std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })
}

impl Script {
    /// Parses every line, failing on the first malformed one.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let statements = statements(text).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { statements })
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        Self::parse(&read_script(path)?)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Splits a line into whitespace separated tokens.
pub(crate) fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
