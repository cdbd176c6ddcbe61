use benchstats::{Query, StatsStore};

use crate::ScriptError;

/// Piece of a `print` template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Query(Query),
}

/// Text with embedded `${query}` expressions.
///
/// An unterminated `${` swallows the remainder of the line as its query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str, line: usize) -> Result<Self, ScriptError> {
        let mut segments = Vec::new();
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let body = &rest[start + 2..];
            let (expression, remainder) = match body.find('}') {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            };
            let query =
                Query::parse(expression).map_err(|source| ScriptError::Query { line, source })?;
            segments.push(Segment::Query(query));
            rest = remainder;
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Substitutes every query with its value formatted by `f64`'s `Display`.
    pub fn render(&self, stats: &StatsStore) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Query(query) => out.push_str(&stats.evaluate(query).to_string()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use benchstats::{RunStats, StatsError};

    use super::*;

    fn store() -> StatsStore {
        let mut store = StatsStore::new();
        store.push(RunStats {
            build_time: 0.5,
            frame_times: vec![1.0, 2.0],
        });
        store.push(RunStats {
            build_time: 0.25,
            frame_times: vec![3.0, 4.0],
        });
        store
    }

    #[test]
    fn substitutes_queries_between_literals() {
        let template = Template::parse("sum=${sum frame-time} build=${build-time}!", 1).unwrap();
        assert_eq!(template.segments().len(), 5);
        assert_eq!(template.render(&store()), "sum=7 build=0.25!");
    }

    #[test]
    fn plain_text_passes_through() {
        let template = Template::parse("no queries $ here {}", 1).unwrap();
        assert_eq!(template.render(&StatsStore::new()), "no queries $ here {}");
    }

    #[test]
    fn unterminated_query_consumes_rest_of_line() {
        let template = Template::parse("mean: ${mean sum frame-time", 1).unwrap();
        assert_eq!(template.render(&store()), "mean: 5");
    }

    #[test]
    fn invalid_queries_fail_at_parse_time() {
        let err = Template::parse("x ${mode frame-time}", 7).unwrap_err();
        match err {
            ScriptError::Query { line, source } => {
                assert_eq!(line, 7);
                assert_eq!(source, StatsError::UnknownCumulation("mode".into()));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_store_renders_zero() {
        let template = Template::parse("${median frame-time}", 1).unwrap();
        assert_eq!(template.render(&StatsStore::new()), "0");
    }
}
