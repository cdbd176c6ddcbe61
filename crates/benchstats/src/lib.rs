//! Statistics engine for benchmark runs.
//!
//! Every `run` command in a benchmark script produces one [`RunStats`]
//! record. A [`StatsStore`] keeps them in order and answers [`Query`]
//! expressions such as `mean sum frame-time`:
//!
//! ```text
//!   frame-time per run ──inner──▶ one sample per run ──outer──▶ scalar
//!   build-time per run ─────────▶ one sample per run ──outer──▶ scalar
//! ```
//!
//! A missing inner cumulation picks each run's last frame, a missing outer
//! cumulation picks the last run. Empty inputs always evaluate to `0`.

mod cumulation;
mod query;
mod store;

pub use cumulation::Cumulation;
pub use query::{Query, Variable};
pub use store::{RunStats, StatsStore};

/// Errors produced while parsing a statistics query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("empty query; expected `[outer] [inner] build-time|frame-time`")]
    MissingVariable,
    #[error("unknown variable '{0}'; expected build-time or frame-time")]
    UnknownVariable(String),
    #[error("unknown cumulation '{0}'")]
    UnknownCumulation(String),
    #[error("too many cumulation prefixes in '{0}'")]
    TooManyPrefixes(String),
}
