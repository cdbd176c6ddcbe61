use crate::{Cumulation, Query, StatsError, Variable};

/// Timing record for one benchmark `run`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Shader build duration in seconds.
    pub build_time: f64,
    /// Render duration of every frame, in seconds, in frame order.
    pub frame_times: Vec<f64>,
}

impl RunStats {
    pub fn new(build_time: f64) -> Self {
        Self {
            build_time,
            frame_times: Vec::new(),
        }
    }

    pub fn record_frame(&mut self, seconds: f64) {
        self.frame_times.push(seconds);
    }

    fn last_frame(&self) -> f64 {
        self.frame_times.last().copied().unwrap_or(0.0)
    }
}

/// Append-only history of runs, cleared only on request.
#[derive(Debug, Clone, Default)]
pub struct StatsStore {
    runs: Vec<RunStats>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, run: RunStats) {
        self.runs.push(run);
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    pub fn runs(&self) -> &[RunStats] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn evaluate(&self, query: &Query) -> f64 {
        let per_run: Vec<f64> = match query.variable {
            Variable::BuildTime => self.runs.iter().map(|run| run.build_time).collect(),
            Variable::FrameTime => self
                .runs
                .iter()
                .map(|run| match query.inner {
                    Some(inner) => inner.apply(&run.frame_times),
                    None => run.last_frame(),
                })
                .collect(),
        };
        query.outer.unwrap_or(Cumulation::Last).apply(&per_run)
    }

    /// Parses and evaluates `text` in one step.
    pub fn query(&self, text: &str) -> Result<f64, StatsError> {
        Query::parse(text).map(|query| self.evaluate(&query))
    }
}
