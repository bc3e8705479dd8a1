use common::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A single JSONPath expression in the subset Redshift accepts: `$['a']`, `$["a"]`, `$.a`
/// and array subscripts like `$.a[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expr: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidInput(format!("JSONPath '{}': {}", expr, reason));

        let rest = expr.trim();
        let mut chars = rest.strip_prefix('$').ok_or_else(|| invalid("must start with '$'"))?;
        let mut segments = Vec::new();

        while !chars.is_empty() {
            if let Some(after_dot) = chars.strip_prefix('.') {
                let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
                let key = &after_dot[..end];
                if key.is_empty() {
                    return Err(invalid("empty member name"));
                }
                segments.push(Segment::Key(key.to_string()));
                chars = &after_dot[end..];
            } else if let Some(after_bracket) = chars.strip_prefix('[') {
                let close = after_bracket.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let inner = after_bracket[..close].trim();
                let quoted = inner
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')));

                match quoted {
                    Some(key) => segments.push(Segment::Key(key.to_string())),
                    None => {
                        let index = inner
                            .parse::<usize>()
                            .map_err(|_| invalid("subscript must be a quoted name or an index"))?;
                        segments.push(Segment::Index(index));
                    }
                }
                chars = &after_bracket[close + 1..];
            } else {
                return Err(invalid("expected '.' or '['"));
            }
        }

        if segments.is_empty() {
            return Err(invalid("path selects the whole record"));
        }

        Ok(Self {
            source: expr.to_string(),
            segments,
        })
    }

    /// Value at this path, or `None` when any step is missing.
    pub fn extract<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let mut current = record;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => current.get(key.as_str())?,
                Segment::Index(index) => current.get(*index)?,
            };
        }
        Some(current)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

#[derive(Deserialize)]
struct JsonPathsFile {
    jsonpaths: Vec<String>,
}

/// Parsed JSONPaths file: `{"jsonpaths": ["$['artist']", ...]}`, one path per loaded column.
#[derive(Debug, Clone)]
pub struct JsonPaths {
    paths: Vec<JsonPath>,
}

impl JsonPaths {
    pub fn from_slice(content: &[u8]) -> Result<Self> {
        let file: JsonPathsFile = serde_json::from_slice(content)?;
        let paths = file
            .jsonpaths
            .iter()
            .map(|p| JsonPath::parse(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&JsonPath> {
        self.paths.get(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bracket_and_dot_notation() {
        let record = json!({"firstName": "Ryan", "song": {"title": "Mr. Jones"}, "tags": ["a", "b"]});

        assert_eq!(
            JsonPath::parse("$['firstName']").unwrap().extract(&record),
            Some(&json!("Ryan"))
        );
        assert_eq!(
            JsonPath::parse("$[\"firstName\"]").unwrap().extract(&record),
            Some(&json!("Ryan"))
        );
        assert_eq!(
            JsonPath::parse("$.song.title").unwrap().extract(&record),
            Some(&json!("Mr. Jones"))
        );
        assert_eq!(
            JsonPath::parse("$.tags[1]").unwrap().extract(&record),
            Some(&json!("b"))
        );
    }

    #[test]
    fn test_missing_member_is_none() {
        let record = json!({"artist": null});
        assert!(JsonPath::parse("$['userId']").unwrap().extract(&record).is_none());
        assert_eq!(
            JsonPath::parse("$['artist']").unwrap().extract(&record),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_rejects_malformed_paths() {
        assert!(JsonPath::parse("artist").is_err());
        assert!(JsonPath::parse("$").is_err());
        assert!(JsonPath::parse("$['artist'").is_err());
        assert!(JsonPath::parse("$[artist]").is_err());
        assert!(JsonPath::parse("$..artist").is_err());
    }

    #[test]
    fn test_jsonpaths_file() {
        let content = br#"{"jsonpaths": ["$['artist']", "$['auth']", "$['firstName']"]}"#;
        let paths = JsonPaths::from_slice(content).unwrap();

        assert_eq!(paths.len(), 3);
        assert_eq!(paths.get(2).unwrap().as_str(), "$['firstName']");
        assert!(paths.get(3).is_none());
    }
}
