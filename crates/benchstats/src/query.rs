use std::fmt;

use crate::{Cumulation, StatsError};

/// Recorded quantity a query aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    /// One sample per run: the shader build duration.
    BuildTime,
    /// A sequence per run: the per-frame render durations.
    FrameTime,
}

impl Variable {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "build-time" => Some(Self::BuildTime),
            "frame-time" => Some(Self::FrameTime),
            _ => None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildTime => f.write_str("build-time"),
            Self::FrameTime => f.write_str("frame-time"),
        }
    }
}

/// Parsed form of `[outer] [inner] variable`.
///
/// Only `frame-time` consumes an inner cumulation; the token directly in
/// front of it is taken as the inner one. Whatever precedes that is the
/// outer cumulation, of which there may be at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub outer: Option<Cumulation>,
    pub inner: Option<Cumulation>,
    pub variable: Variable,
}

impl Query {
    pub fn parse(text: &str) -> Result<Self, StatsError> {
        let mut tokens: Vec<&str> = text.split_whitespace().collect();
        let variable_token = tokens.pop().ok_or(StatsError::MissingVariable)?;
        let variable = Variable::from_token(variable_token)
            .ok_or_else(|| StatsError::UnknownVariable(variable_token.to_string()))?;

        let inner = match variable {
            Variable::FrameTime => tokens.pop().map(parse_cumulation).transpose()?,
            Variable::BuildTime => None,
        };
        if tokens.len() > 1 {
            return Err(StatsError::TooManyPrefixes(text.trim().to_string()));
        }
        let outer = tokens.pop().map(parse_cumulation).transpose()?;

        Ok(Self {
            outer,
            inner,
            variable,
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(outer) = self.outer {
            write!(f, "{outer} ")?;
        }
        if let Some(inner) = self.inner {
            write!(f, "{inner} ")?;
        }
        write!(f, "{}", self.variable)
    }
}

fn parse_cumulation(token: &str) -> Result<Cumulation, StatsError> {
    Cumulation::from_token(token).ok_or_else(|| StatsError::UnknownCumulation(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_prefix_on_frame_time_is_inner() {
        let query = Query::parse("sum frame-time").unwrap();
        assert_eq!(query.inner, Some(Cumulation::Sum));
        assert_eq!(query.outer, None);
    }

    #[test]
    fn single_prefix_on_build_time_is_outer() {
        let query = Query::parse("  median   build-time ").unwrap();
        assert_eq!(query.outer, Some(Cumulation::Median));
        assert_eq!(query.inner, None);
        assert_eq!(query.variable, Variable::BuildTime);
    }

    #[test]
    fn two_prefixes_on_frame_time() {
        let query = Query::parse("mean max frame-time").unwrap();
        assert_eq!(query.outer, Some(Cumulation::Mean));
        assert_eq!(query.inner, Some(Cumulation::Max));
        assert_eq!(query.to_string(), "mean max frame-time");
    }

    #[test]
    fn rejects_surplus_prefixes() {
        assert!(matches!(
            Query::parse("min mean sum frame-time"),
            Err(StatsError::TooManyPrefixes(_))
        ));
        assert!(matches!(
            Query::parse("mean sum build-time"),
            Err(StatsError::TooManyPrefixes(_))
        ));
    }

    #[test]
    fn reports_offending_tokens() {
        assert_eq!(
            Query::parse("average frame-time"),
            Err(StatsError::UnknownCumulation("average".into()))
        );
        assert_eq!(
            Query::parse("sum fps"),
            Err(StatsError::UnknownVariable("fps".into()))
        );
        assert_eq!(Query::parse("   "), Err(StatsError::MissingVariable));
    }
}
