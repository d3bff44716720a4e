//! YAML front-matter: locating the `---` block and mapping it to `Metadata`.

use notegraph_core::{Error, Result};
use notegraph_store::{MetaValue, Metadata};
use serde_yaml::Value;

/// Where the front-matter block sits in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterSplit<'a> {
    /// The document does not open with `---`.
    Absent,
    /// A closed block; `body_start` is the byte offset just past the closing line.
    Block { yaml: &'a str, body_start: usize },
    /// An opening `---` with no closing delimiter.
    Unterminated,
}

/// Locate the front-matter block.
///
/// The block opens when the first line (after an optional BOM) is exactly
/// `---` and closes at the next line that is `---` or `...`.
pub fn split_front_matter(raw: &str) -> FrontMatterSplit<'_> {
    let start = if raw.starts_with('\u{feff}') { '\u{feff}'.len_utf8() } else { 0 };
    let mut lines = LineIter::new(raw, start);

    match lines.next() {
        Some((_, line, _)) if line.trim_end() == "---" => {}
        _ => return FrontMatterSplit::Absent,
    }

    let yaml_start = lines.pos;
    for (line_start, line, next) in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return FrontMatterSplit::Block {
                yaml: &raw[yaml_start..line_start],
                body_start: next,
            };
        }
    }
    FrontMatterSplit::Unterminated
}

/// Lines as `(start, text without newline, start of next line)`.
struct LineIter<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LineIter<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }
}

impl<'a> Iterator for LineIter<'a> {
    type Item = (usize, &'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.text[start..];
        let (line, next) = match rest.find('\n') {
            Some(nl) => (&rest[..nl], start + nl + 1),
            None => (rest, self.text.len()),
        };
        self.pos = next;
        Some((start, line.strip_suffix('\r').unwrap_or(line), next))
    }
}

/// Parsed front-matter plus the keys whose values could not be represented.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMetadata {
    pub metadata: Metadata,
    pub unsupported: Vec<String>,
}

/// Parse the YAML inside a front-matter block.
///
/// Fails with `Error::Yaml` when the YAML is invalid and `Error::Ingest`
/// when it is not a mapping. An empty block is an empty mapping.
pub fn parse_metadata(yaml: &str) -> Result<ParsedMetadata> {
    let value: Value = serde_yaml::from_str(yaml)?;
    let mapping = match value {
        Value::Null => return Ok(ParsedMetadata::default()),
        Value::Mapping(m) => m,
        _ => {
            return Err(Error::Ingest(
                "front-matter is not a key/value mapping".to_string(),
            ))
        }
    };

    let mut parsed = ParsedMetadata::default();
    for (key, value) in mapping {
        let Some(key) = scalar_to_string(&key) else {
            parsed.unsupported.push(format!("{:?}", key));
            continue;
        };
        match to_meta_value(value) {
            Converted::Value(v) => {
                parsed.metadata.insert(key, v);
            }
            Converted::Skip => {}
            Converted::Unsupported => parsed.unsupported.push(key),
        }
    }
    Ok(parsed)
}

enum Converted {
    Value(MetaValue),
    Skip,
    Unsupported,
}

fn to_meta_value(value: Value) -> Converted {
    match value {
        Value::Null => Converted::Skip,
        Value::Bool(b) => Converted::Value(MetaValue::Bool(b)),
        // NaN and infinities have no JSON form and never compare equal.
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Converted::Value(MetaValue::Number(f)),
            _ => Converted::Unsupported,
        },
        Value::String(s) => Converted::Value(MetaValue::String(s)),
        Value::Sequence(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in &items {
                match item {
                    Value::Null => continue,
                    other => match scalar_to_string(other) {
                        Some(s) => list.push(s),
                        None => return Converted::Unsupported,
                    },
                }
            }
            Converted::Value(MetaValue::List(list))
        }
        Value::Tagged(tagged) => to_meta_value(tagged.value),
        Value::Mapping(_) => Converted::Unsupported,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_absent() {
        assert_eq!(split_front_matter("# Title\n---\n"), FrontMatterSplit::Absent);
        assert_eq!(split_front_matter(""), FrontMatterSplit::Absent);
        assert_eq!(split_front_matter("----\nx\n----\n"), FrontMatterSplit::Absent);
    }

    #[test]
    fn test_split_block() {
        let raw = "---\ntitle: Elbow Room\n---\nBody [[A]]\n";
        match split_front_matter(raw) {
            FrontMatterSplit::Block { yaml, body_start } => {
                assert_eq!(yaml, "title: Elbow Room\n");
                assert_eq!(&raw[body_start..], "Body [[A]]\n");
            }
            other => panic!("unexpected split: {:?}", other),
        }
    }

    #[test]
    fn test_split_block_crlf_bom_and_dots() {
        let raw = "\u{feff}---\r\nauthor: Dennett\r\n...\r\nBody";
        match split_front_matter(raw) {
            FrontMatterSplit::Block { yaml, body_start } => {
                assert_eq!(yaml, "author: Dennett\r\n");
                assert_eq!(&raw[body_start..], "Body");
            }
            other => panic!("unexpected split: {:?}", other),
        }
    }

    #[test]
    fn test_split_closing_at_eof() {
        let raw = "---\ntype: book\n---";
        match split_front_matter(raw) {
            FrontMatterSplit::Block { body_start, .. } => assert_eq!(body_start, raw.len()),
            other => panic!("unexpected split: {:?}", other),
        }
    }

    #[test]
    fn test_split_unterminated() {
        assert_eq!(
            split_front_matter("---\ntitle: Never closed\n\nBody"),
            FrontMatterSplit::Unterminated
        );
        assert_eq!(split_front_matter("---"), FrontMatterSplit::Unterminated);
    }

    #[test]
    fn test_parse_metadata_variants() {
        let yaml = "title: Freedom Evolves\nauthor: Daniel Dennett\nyear: 2003\nread: true\ntags: [free-will, compatibilism]\nempty:\n";
        let parsed = parse_metadata(yaml).unwrap();
        let m = &parsed.metadata;
        assert_eq!(m["title"], MetaValue::String("Freedom Evolves".into()));
        assert_eq!(m["year"], MetaValue::Number(2003.0));
        assert_eq!(m["read"], MetaValue::Bool(true));
        assert_eq!(
            m["tags"],
            MetaValue::List(vec!["free-will".into(), "compatibilism".into()])
        );
        assert!(!m.contains_key("empty"));
        assert!(parsed.unsupported.is_empty());
    }

    #[test]
    fn test_parse_metadata_block_list_and_numbers_in_list() {
        let parsed = parse_metadata("aliases:\n  - Free Will\n  - 42\n").unwrap();
        assert_eq!(
            parsed.metadata["aliases"],
            MetaValue::List(vec!["Free Will".into(), "42".into()])
        );
    }

    #[test]
    fn test_parse_metadata_nested_is_unsupported() {
        let parsed = parse_metadata("title: X\nsource:\n  isbn: 123\n").unwrap();
        assert_eq!(parsed.metadata.len(), 1);
        assert_eq!(parsed.unsupported, vec!["source"]);
    }

    #[test]
    fn test_parse_metadata_rejects_non_mapping_and_bad_yaml() {
        assert!(matches!(parse_metadata("- a\n- b\n"), Err(Error::Ingest(_))));
        assert!(matches!(parse_metadata("title: [unclosed\n"), Err(Error::Yaml(_))));
        assert_eq!(parse_metadata("").unwrap(), ParsedMetadata::default());
    }

    #[test]
    fn test_parse_metadata_non_finite_numbers_are_unsupported() {
        let parsed = parse_metadata("rating: .nan
high: .inf
low: -.inf
score: 4.5
").unwrap();
        assert_eq!(parsed.metadata.len(), 1);
        assert_eq!(parsed.metadata["score"], MetaValue::Number(4.5));
        assert_eq!(parsed.unsupported, vec!["rating", "high", "low"]);
    }
}
