use std::path::PathBuf;
use std::str::FromStr;

use crate::template::Template;
use crate::{tokenize, ScriptError};

/// Largest width or height accepted by `resolution`.
pub const MAX_DIMENSION: i64 = 8192;
/// `resolution` rounds both dimensions up to a multiple of this (the tile size).
pub const RESOLUTION_ALIGNMENT: u32 = 8;

/// Output size requested by a `resolution` command, already clamped and aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Clamps each dimension to `[1, MAX_DIMENSION]` and rounds it up to the
    /// next multiple of [`RESOLUTION_ALIGNMENT`].
    pub fn aligned(width: i64, height: i64) -> Self {
        Self {
            width: align_dimension(width),
            height: align_dimension(height),
        }
    }
}

fn align_dimension(value: i64) -> u32 {
    let clamped = value.clamp(1, MAX_DIMENSION) as u32;
    clamped.div_ceil(RESOLUTION_ALIGNMENT) * RESOLUTION_ALIGNMENT
}

/// A single benchmark instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Forced frame rate in Hz; zero or negative means real elapsed time.
    Framerate(f64),
    Clear,
    Resolution(Resolution),
    Multithreading(bool),
    Run { shader: PathBuf, frames: u32 },
    Print(Template),
}

impl Command {
    pub(crate) fn parse(line: &str, number: usize) -> Result<Self, ScriptError> {
        let tokens = tokenize(line);
        let Some((&name, args)) = tokens.split_first() else {
            return Err(ScriptError::UnknownCommand {
                line: number,
                command: String::new(),
            });
        };

        match name {
            "framerate" => {
                let [hz] = expect_args::<1>("framerate", "1 argument (Hz)", args, number)?;
                Ok(Self::Framerate(parse_number("framerate", hz, number)?))
            }
            "clear" => {
                expect_args::<0>("clear", "no arguments", args, number)?;
                Ok(Self::Clear)
            }
            "resolution" => {
                let [width, height] =
                    expect_args::<2>("resolution", "2 arguments (width height)", args, number)?;
                let width = parse_number::<i64>("resolution", width, number)?;
                let height = parse_number::<i64>("resolution", height, number)?;
                Ok(Self::Resolution(Resolution::aligned(width, height)))
            }
            "multithreading" => {
                let [flag] =
                    expect_args::<1>("multithreading", "1 argument (on|off)", args, number)?;
                Ok(Self::Multithreading(matches!(flag, "on" | "true")))
            }
            "run" => {
                let [shader, frames] =
                    expect_args::<2>("run", "2 arguments (shader frames)", args, number)?;
                Ok(Self::Run {
                    shader: PathBuf::from(shader),
                    frames: parse_number("run", frames, number)?,
                })
            }
            "print" => {
                let rest = line[name.len()..].trim_start();
                Ok(Self::Print(Template::parse(rest, number)?))
            }
            other => Err(ScriptError::UnknownCommand {
                line: number,
                command: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Framerate(_) => "framerate",
            Self::Clear => "clear",
            Self::Resolution(_) => "resolution",
            Self::Multithreading(_) => "multithreading",
            Self::Run { .. } => "run",
            Self::Print(_) => "print",
        }
    }
}

fn expect_args<'a, const N: usize>(
    command: &'static str,
    expected: &'static str,
    args: &[&'a str],
    line: usize,
) -> Result<[&'a str; N], ScriptError> {
    <[&str; N]>::try_from(args).map_err(|_| ScriptError::Arity {
        line,
        command,
        expected,
        found: args.len(),
    })
}

fn parse_number<T: FromStr>(
    command: &'static str,
    token: &str,
    line: usize,
) -> Result<T, ScriptError> {
    token.parse().map_err(|_| ScriptError::InvalidNumber {
        line,
        command,
        token: token.to_string(),
    })
}
