//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Compile a template such as `/users/:name/files/*` into segments
//! - Match a concrete request path segment by segment
//! - Extract named parameters and the wildcard capture (splat)
//!
//! # Design Decisions
//! - Empty segments are ignored on both sides (`//a` is `/a`)
//! - A trailing slash is significant: `/hi/` and `/hi` are different paths
//! - Literals compare case-sensitively; captured values are kept verbatim
//! - A wildcard is only allowed as the final segment and absorbs one or more
//!   remaining segments, joined back with `/`. `/secretcontent/` leaves
//!   none, so `/secretcontent/*` does not match it; guard that path with its
//!   own `/secretcontent/` filter
//! - No regex and no backtracking: matching is linear in the path length

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Errors raised when compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `*` appeared before the last segment.
    #[error("wildcard must be the last segment in `{0}`")]
    WildcardNotLast(String),

    /// A `:` segment with nothing after it.
    #[error("parameter without a name in `{0}`")]
    EmptyParamName(String),

    /// The same parameter name was used twice.
    #[error("parameter `{name}` appears more than once in `{template}`")]
    DuplicateParam { template: String, name: String },
}

/// One compiled segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches only the identical string.
    Literal(String),
    /// Matches any single non-empty segment. Stored lowercased.
    Param(String),
    /// Matches the remainder of the path.
    Wildcard,
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
}

/// Captures produced by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    /// Parameter name (lowercased, without `:`) to captured value.
    pub params: HashMap<String, String>,
    /// Wildcard captures in order of appearance.
    pub splat: Vec<String>,
}

impl PathPattern {
    /// Compile a template.
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        let raw: Vec<&str> = split_path(template).collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut seen = Vec::new();

        for (i, part) in raw.iter().enumerate() {
            let segment = if *part == "*" {
                if i + 1 != raw.len() {
                    return Err(PatternError::WildcardNotLast(template.to_string()));
                }
                Segment::Wildcard
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError::EmptyParamName(template.to_string()));
                }
                let name = name.to_lowercase();
                if seen.contains(&name) {
                    return Err(PatternError::DuplicateParam {
                        template: template.to_string(),
                        name,
                    });
                }
                seen.push(name.clone());
                Segment::Param(name)
            } else {
                Segment::Literal((*part).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            template: template.to_string(),
            trailing_slash: has_trailing_slash(template),
            segments,
        })
    }

    /// The template this pattern was compiled from, verbatim.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the template ends in a wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }

    /// Match a request path, returning the captures on success.
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        let parts: Vec<&str> = split_path(path).collect();
        let mut captures = PathMatch::default();

        if self.is_wildcard() {
            let fixed = self.segments.len() - 1;
            // `*` alone matches everything, including the root.
            if fixed == 0 {
                captures.splat.push(parts.join("/"));
                return Some(captures);
            }
            if parts.len() <= fixed {
                return None;
            }
            self.match_fixed(&parts[..fixed], &mut captures)?;
            captures.splat.push(parts[fixed..].join("/"));
            return Some(captures);
        }

        if parts.len() != self.segments.len() {
            return None;
        }
        // The root has no segments, so the slash carries no meaning there.
        if !parts.is_empty() && self.trailing_slash != has_trailing_slash(path) {
            return None;
        }
        self.match_fixed(&parts, &mut captures)?;
        Some(captures)
    }

    fn match_fixed(&self, parts: &[&str], captures: &mut PathMatch) -> Option<()> {
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    captures.params.insert(name.clone(), (*part).to_string());
                }
                Segment::Wildcard => return None,
            }
        }
        Some(())
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Normalize a parameter name for lookup: strip a leading `:` and lowercase.
pub fn param_key(name: &str) -> String {
    name.strip_prefix(':').unwrap_or(name).to_lowercase()
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn has_trailing_slash(path: &str) -> bool {
    path.len() > 1 && path.ends_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = PathPattern::parse("/hi").unwrap();
        assert!(pattern.matches("/hi").is_some());
        assert!(pattern.matches("/HI").is_none());
        assert!(pattern.matches("/hi/there").is_none());
        assert!(pattern.matches("/").is_none());
    }

    #[test]
    fn test_root() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.segments().is_empty());
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("").is_some());
        assert!(pattern.matches("/a").is_none());
    }

    #[test]
    fn test_param_keeps_value_case() {
        let pattern = PathPattern::parse("/param/:param").unwrap();
        let value = "ThisIsAValueAndItShouldRetainItsUpperCasedCharacters";
        let m = pattern.matches(&format!("/param/{}", value)).unwrap();
        assert_eq!(m.params.get("param").map(String::as_str), Some(value));
    }

    #[test]
    fn test_param_name_is_lowercased() {
        let pattern = PathPattern::parse("/paramwithmaj/:paramWithMaj").unwrap();
        let m = pattern.matches("/paramwithmaj/plop").unwrap();
        assert_eq!(m.params.get("paramwithmaj").map(String::as_str), Some("plop"));
        assert_eq!(param_key(":paramWithMaj"), "paramwithmaj");
    }

    #[test]
    fn test_param_and_wildcard() {
        let pattern = PathPattern::parse("/paramandwild/:param/stuff/*").unwrap();
        let m = pattern.matches("/paramandwild/thedude/stuff/andits").unwrap();
        assert_eq!(m.params["param"], "thedude");
        assert_eq!(m.splat, vec!["andits".to_string()]);
    }

    #[test]
    fn test_wildcard_absorbs_remainder() {
        let pattern = PathPattern::parse("/secretcontent/*").unwrap();
        let m = pattern.matches("/secretcontent/a/b/c").unwrap();
        assert_eq!(m.splat, vec!["a/b/c".to_string()]);
        // At least one segment must be left for the wildcard.
        assert!(pattern.matches("/secretcontent").is_none());
        assert!(pattern.matches("/other/a").is_none());
    }

    #[test]
    fn test_wildcard_needs_a_segment_after_trailing_slash() {
        let pattern = PathPattern::parse("/secretcontent/*").unwrap();
        assert!(pattern.matches("/secretcontent/").is_none());
        assert!(pattern.matches("/secretcontent//").is_none());

        let guard = PathPattern::parse("/secretcontent/").unwrap();
        assert!(guard.matches("/secretcontent/").is_some());
    }

    #[test]
    fn test_lone_wildcard_matches_everything() {
        let pattern = PathPattern::parse("*").unwrap();
        assert!(pattern.matches("/").is_some());
        assert_eq!(pattern.matches("/a/b").unwrap().splat, vec!["a/b".to_string()]);
    }

    #[test]
    fn test_trailing_slash_is_significant() {
        let plain = PathPattern::parse("/hi").unwrap();
        let slashed = PathPattern::parse("/hi/").unwrap();
        assert!(plain.matches("/hi/").is_none());
        assert!(slashed.matches("/hi").is_none());
        assert!(slashed.matches("/hi/").is_some());
    }

    #[test]
    fn test_case_distinct_templates() {
        let lower = PathPattern::parse("/tworoutes/param/:param").unwrap();
        let upper = PathPattern::parse("/tworoutes/PARAM/:param").unwrap();
        assert!(lower.matches("/tworoutes/param/x").is_some());
        assert!(lower.matches("/tworoutes/PARAM/x").is_none());
        assert!(upper.matches("/tworoutes/PARAM/x").is_some());
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_invalid_templates() {
        assert!(matches!(
            PathPattern::parse("/a/*/b"),
            Err(PatternError::WildcardNotLast(_))
        ));
        assert!(matches!(
            PathPattern::parse("/a/:"),
            Err(PatternError::EmptyParamName(_))
        ));
        assert!(matches!(
            PathPattern::parse("/:id/x/:ID"),
            Err(PatternError::DuplicateParam { .. })
        ));
    }
}
