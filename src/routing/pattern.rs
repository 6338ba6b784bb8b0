//! Path pattern compilation.
//!
//! # Responsibilities
//! - Normalize registered paths (leading `/`, single trailing `/` stripped)
//! - Classify a path as static, named-fast or named-regex
//! - Split a path into segments and extract parameter names
//! - Build and compile the regex key for regex-fallback patterns
//!
//! # Design Decisions
//! - Classification is by character class only; no parsing of regex syntax
//! - Literal segments of a regex pattern are passed through unescaped, so a
//!   segment like `ca\d*n$` acts as a fragment of the final expression
//! - Regex keys are not anchored at the start; a pattern anchors itself with `$`
//! - Compile failures surface as `RegistrationError::InvalidPattern`

use regex::Regex;

use crate::routing::types::RegistrationError;

/// Capture group substituted for every `:name` segment of a regex pattern.
const PARAM_CAPTURE: &str = r"([\w\-.~]+)";

/// How a pattern is matched at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Exact string lookup.
    Static,
    /// Positional segment comparison, `:name` segments are wildcards.
    NamedFast,
    /// Compiled regular expression over the whole path.
    NamedRegex,
}

/// One `/`-delimited piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(token: &str) -> Self {
        match token.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(token.to_string()),
        }
    }

    /// The segment as it was written in the pattern.
    pub fn as_pattern(&self) -> String {
        match self {
            Segment::Literal(s) => s.clone(),
            Segment::Param(name) => format!(":{}", name),
        }
    }
}

/// Compiled form of a registered path.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    kind: PatternKind,
    segments: Vec<Segment>,
    param_names: Vec<String>,
    regex_key: Option<String>,
    regex: Option<Regex>,
}

impl RoutePattern {
    /// Compile a path pattern.
    pub fn compile(path: &str) -> Result<Self, RegistrationError> {
        let raw = normalize_path(path);
        let kind = classify(&raw);

        if kind == PatternKind::Static {
            return Ok(Self {
                segments: split_segments(&raw).into_iter().map(Segment::parse).collect(),
                raw,
                kind,
                param_names: Vec::new(),
                regex_key: None,
                regex: None,
            });
        }

        let segments: Vec<Segment> = split_segments(&raw).into_iter().map(Segment::parse).collect();
        let param_names: Vec<String> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect();

        let (regex_key, regex) = if kind == PatternKind::NamedRegex {
            let key = build_regex_key(&segments);
            let regex = Regex::new(&key).map_err(|e| RegistrationError::InvalidPattern {
                pattern: raw.clone(),
                reason: e.to_string(),
            })?;
            // Group 0 is the whole match; every other group must be a named segment.
            if regex.captures_len() - 1 != param_names.len() {
                return Err(RegistrationError::InvalidPattern {
                    pattern: raw,
                    reason: "capture groups do not line up with named segments".to_string(),
                });
            }
            (Some(key), Some(regex))
        } else {
            (None, None)
        };

        Ok(Self {
            raw,
            kind,
            segments,
            param_names,
            regex_key,
            regex,
        })
    }

    /// The normalized pattern string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Partition bucket key.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn regex_key(&self) -> Option<&str> {
        self.regex_key.as_deref()
    }

    /// Segments joined back into a path without a leading slash.
    /// Mounting re-keys entries from this form.
    pub fn segment_path(&self) -> String {
        self.segments
            .iter()
            .map(Segment::as_pattern)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Match a request path that has already been trimmed and split.
    ///
    /// Returns the bound parameters on success. Nothing is bound on failure.
    pub fn matches(&self, path: &str, segments: &[&str]) -> Option<Vec<(String, String)>> {
        match self.kind {
            PatternKind::Static => (self.raw == path).then(Vec::new),
            PatternKind::NamedFast => self.match_segments(segments),
            PatternKind::NamedRegex => self.match_regex(path),
        }
    }

    fn match_segments(&self, segments: &[&str]) -> Option<Vec<(String, String)>> {
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::with_capacity(self.param_names.len());
        // Trailing segments differ most often between sibling routes.
        for (template, value) in self.segments.iter().zip(segments).rev() {
            match template {
                Segment::Param(name) => params.push((name.clone(), (*value).to_string())),
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
            }
        }
        params.reverse();
        Some(params)
    }

    fn match_regex(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.as_ref()?.captures(path)?;
        Some(
            self.param_names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = captures.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
                    (name.clone(), value.to_string())
                })
                .collect(),
        )
    }
}

fn is_static_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '~' | '.' | '/' | '-')
}

fn classify(path: &str) -> PatternKind {
    if path.chars().all(is_static_char) {
        PatternKind::Static
    } else if path.chars().all(|c| c == ':' || is_static_char(c)) {
        PatternKind::NamedFast
    } else {
        PatternKind::NamedRegex
    }
}

fn build_regex_key(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match s {
            Segment::Param(_) => PARAM_CAPTURE,
            Segment::Literal(literal) => literal.as_str(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a registered path: ensure a leading `/` and strip a single
/// trailing `/`. The empty pattern and `/` both become `/`.
pub fn normalize_path(path: &str) -> String {
    let trimmed = trim_request_path(path);
    if trimmed.is_empty() || trimmed == "/" {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Strip a single trailing `/` from a request path, keeping the root as-is.
pub fn trim_request_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Split a path into segments after stripping one leading and one trailing `/`.
/// The root path has no segments.
pub fn split_segments(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        return Vec::new();
    }
    path.split('/').collect()
}

/// Join a mount prefix and a path, collapsing duplicate slashes and
/// stripping the trailing slash.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let mut joined = String::with_capacity(prefix.len() + path.len() + 1);
    for piece in [prefix, "/", path] {
        for c in piece.chars() {
            if c == '/' && joined.ends_with('/') {
                continue;
            }
            joined.push(c);
        }
    }
    normalize_path(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_static() {
        let pattern = RoutePattern::compile("/foo/bar.html").unwrap();
        assert_eq!(pattern.kind(), PatternKind::Static);
        assert_eq!(pattern.raw(), "/foo/bar.html");
        assert!(pattern.param_names().is_empty());
        assert_eq!(pattern.regex_key(), None);
    }

    #[test]
    fn test_empty_pattern_is_root() {
        for path in ["", "/"] {
            let pattern = RoutePattern::compile(path).unwrap();
            assert_eq!(pattern.kind(), PatternKind::Static);
            assert_eq!(pattern.raw(), "/");
            assert_eq!(pattern.segment_count(), 0);
        }
    }

    #[test]
    fn test_classify_named_fast() {
        let pattern = RoutePattern::compile("/user/:id/photo/:pid/").unwrap();
        assert_eq!(pattern.kind(), PatternKind::NamedFast);
        assert_eq!(pattern.raw(), "/user/:id/photo/:pid");
        assert_eq!(pattern.segment_count(), 4);
        assert_eq!(pattern.param_names(), ["id", "pid"]);
        assert_eq!(
            pattern.segments()[1],
            Segment::Param("id".into())
        );
    }

    #[test]
    fn test_classify_regex_builds_key() {
        let pattern = RoutePattern::compile(r"/tor+onto/:code/ca\d*n$").unwrap();
        assert_eq!(pattern.kind(), PatternKind::NamedRegex);
        assert_eq!(pattern.regex_key(), Some(r"tor+onto/([\w\-.~]+)/ca\d*n$"));
        assert_eq!(pattern.param_names(), ["code"]);
        assert_eq!(pattern.segment_count(), 3);
    }

    #[test]
    fn test_invalid_regex_is_registration_error() {
        let err = RoutePattern::compile(r"/broken/(\d+").unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidPattern { .. }));

        let err = RoutePattern::compile(r"/(a|b)/:id").unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidPattern { .. }));

        assert!(RoutePattern::compile(r"/(?:a|b)/:id").is_ok());
    }

    #[test]
    fn test_named_fast_match_binds_params() {
        let pattern = RoutePattern::compile("/user/:uid/photo/:pid").unwrap();
        let params = pattern
            .matches("/user/5612/photo/drjr3494nd", &["user", "5612", "photo", "drjr3494nd"])
            .unwrap();
        assert_eq!(
            params,
            vec![
                ("uid".to_string(), "5612".to_string()),
                ("pid".to_string(), "drjr3494nd".to_string()),
            ]
        );
        assert!(pattern.matches("/user/1/video/2", &["user", "1", "video", "2"]).is_none());
    }

    #[test]
    fn test_regex_match() {
        let pattern = RoutePattern::compile(r"/tor+onto/:code/ca\d*n$").unwrap();
        let params = pattern.matches("/toronto/m5v/ca233n", &[]).unwrap();
        assert_eq!(params, vec![("code".to_string(), "m5v".to_string())]);
        assert!(pattern.matches("/toronto/m5v/can", &[]).is_some());
        assert!(pattern.matches("/toronto/m5v/cab", &[]).is_none());
        assert!(pattern.matches("/tonto/m5v/can", &[]).is_none());
    }

    #[test]
    fn test_regex_key_unanchored_at_start() {
        let pattern = RoutePattern::compile(r"/tor+onto/:code/ca\d*n$").unwrap();
        let params = pattern.matches("/xtoronto/m5v/can", &[]).unwrap();
        assert_eq!(params, vec![("code".to_string(), "m5v".to_string())]);

        // The end stays anchored only because the pattern ends in `$`.
        let open_ended = RoutePattern::compile(r"/tor+onto/:code/ca\d*n").unwrap();
        assert!(open_ended.matches("/toronto/m5v/can/extra", &[]).is_some());
        assert!(pattern.matches("/toronto/m5v/can/extra", &[]).is_none());
    }

    #[test]
    fn test_segment_path_round_trips_named_tokens() {
        let pattern = RoutePattern::compile("/named/:route").unwrap();
        assert_eq!(pattern.segment_path(), "named/:route");
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(normalize_path("about/"), "/about");
        assert_eq!(trim_request_path("/about/"), "/about");
        assert_eq!(trim_request_path("/"), "/");
        assert!(split_segments("/").is_empty());
        assert_eq!(split_segments("/a/b/"), vec!["a", "b"]);
        assert_eq!(join_paths("/api/", "/v1/"), "/api/v1");
        assert_eq!(join_paths("/api", "/"), "/api");
        assert_eq!(join_paths("/", "/"), "/");
        assert_eq!(join_paths("/two", "one"), "/two/one");
    }
}
