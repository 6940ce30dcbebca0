//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse `{name}` placeholder patterns such as `events/{id}/rsvps`
//! - Match normalized request paths segment by segment
//! - Substitute placeholders back into a pattern (forwarded URLs)
//!
//! # Design Decisions
//! - Literal segments are case-sensitive, placeholders match one segment
//! - The placeholder syntax is closed, so no regex engine is involved
//! - Substitution leaves unknown placeholders verbatim

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a normalized pattern. Returns the reason on malformed input.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if pattern.is_empty() {
            return Err("pattern is empty".to_string());
        }

        let mut segments = Vec::new();
        for raw in pattern.split('/') {
            if raw.is_empty() {
                return Err(format!("empty segment in {:?}", pattern));
            }
            segments.push(parse_segment(raw)?);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the placeholders, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Literal segments only, placeholders dropped.
    pub fn literal_segments(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Literal(lit) => Some(lit.as_str()),
                Segment::Param(_) => None,
            })
            .collect()
    }

    /// Match a normalized path and capture placeholder values.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(raw: &str) -> Result<Segment, String> {
    let has_open = raw.contains('{');
    let has_close = raw.contains('}');
    if !has_open && !has_close {
        return Ok(Segment::Literal(raw.to_string()));
    }

    let name = raw
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| format!("placeholder must span the whole segment: {:?}", raw))?;

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid placeholder name: {:?}", raw));
    }
    Ok(Segment::Param(name.to_string()))
}

/// Replace every `{name}` token with `params[name]`.
pub fn substitute_placeholders(template: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern() {
        let pattern = PathPattern::parse("app/v1/events").unwrap();
        assert!(pattern.matches("app/v1/events").is_some());
        assert!(pattern.matches("app/v1/Events").is_none());
        assert!(pattern.matches("app/v1/events/1").is_none());
    }

    #[test]
    fn test_placeholder_capture() {
        let pattern = PathPattern::parse("app/v1/events/{id}/rsvps/{rsvp_id}").unwrap();
        let params = pattern.matches("app/v1/events/42/rsvps/7").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.get("rsvp_id").map(String::as_str), Some("7"));
        assert_eq!(pattern.placeholders(), vec!["id", "rsvp_id"]);
        assert_eq!(pattern.literal_segments(), vec!["app", "v1", "events", "rsvps"]);
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(PathPattern::parse("").is_err());
        assert!(PathPattern::parse("events//x").is_err());
        assert!(PathPattern::parse("events/{id").is_err());
        assert!(PathPattern::parse("events/x{id}").is_err());
        assert!(PathPattern::parse("events/{}").is_err());
        assert!(PathPattern::parse("events/{a-b}").is_err());
    }

    #[test]
    fn test_substitute_placeholders() {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), "42".to_string());
        assert_eq!(
            substitute_placeholders("app/v1/events/{id}/rsvps", &params),
            "app/v1/events/42/rsvps"
        );
        // Unknown placeholders are left alone.
        assert_eq!(
            substitute_placeholders("app/v1/events/{event_id}", &params),
            "app/v1/events/{event_id}"
        );
        assert_eq!(substitute_placeholders("a/{open", &params), "a/{open");
    }
}
