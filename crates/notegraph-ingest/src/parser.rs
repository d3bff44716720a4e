//! Document parser: raw text → `ParsedDocument`. Pure; never fails.

use std::path::{Component, Path};

use notegraph_store::{Document, IndexWarning, Metadata, ParsedDocument, WarningKind};

use crate::file::content_hash;
use crate::frontmatter::{parse_metadata, split_front_matter, FrontMatterSplit};
use crate::links::extract_links;

/// Document id for a corpus-relative path: extension dropped, `/`-separated.
pub fn document_id(rel_path: &Path) -> String {
    rel_path
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse one document.
///
/// Front-matter problems are recovered locally: the document keeps empty
/// metadata and a warning is attached.
pub fn parse_document(rel_path: &Path, raw: &str) -> ParsedDocument {
    let mut warnings = Vec::new();
    let mut metadata = Metadata::new();
    let mut body_start = 0;

    match split_front_matter(raw) {
        FrontMatterSplit::Absent => {}
        FrontMatterSplit::Unterminated => {
            warnings.push(IndexWarning::new(
                rel_path,
                WarningKind::UnterminatedFrontMatter,
                "front-matter block is never closed; treating the whole file as body",
            ));
        }
        FrontMatterSplit::Block { yaml, body_start: start } => {
            match parse_metadata(yaml) {
                Ok(parsed) => {
                    body_start = start;
                    metadata = parsed.metadata;
                    for key in parsed.unsupported {
                        warnings.push(IndexWarning::new(
                            rel_path,
                            WarningKind::UnsupportedMetaValue,
                            format!("front-matter key '{}' has an unsupported value, dropped", key),
                        ));
                    }
                }
                Err(reason) => {
                    warnings.push(IndexWarning::new(
                        rel_path,
                        WarningKind::MalformedFrontMatter,
                        format!(
                            "front-matter ignored, whole file kept as body: {}",
                            reason
                        ),
                    ));
                }
            }
        }
    }

    let body = &raw[body_start..];
    let char_base = raw[..body_start].chars().count();
    let links = extract_links(body, char_base);

    ParsedDocument {
        document: Document {
            id: document_id(rel_path),
            path: rel_path.to_path_buf(),
            metadata,
            body: body.to_string(),
            content_hash: content_hash(raw),
        },
        links,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegraph_store::MetaValue;

    #[test]
    fn test_document_id() {
        assert_eq!(document_id(Path::new("books/Free Will.md")), "books/Free Will");
        assert_eq!(document_id(Path::new("./a.b.txt")), "a.b");
        assert_eq!(document_id(Path::new("README")), "README");
    }

    #[test]
    fn test_parse_with_front_matter() {
        let raw = "---\ntitle: Elbow Room\nauthor: Daniel Dennett\nyear: 1984\ntags: [free-will]\n---\nSee [[Freedom Evolves]] and [[Consciousness Explained|CE]].\n";
        let parsed = parse_document(Path::new("books/elbow-room.md"), raw);

        let doc = &parsed.document;
        assert_eq!(doc.id, "books/elbow-room");
        assert_eq!(doc.title(), "Elbow Room");
        assert_eq!(doc.metadata["year"], MetaValue::Number(1984.0));
        assert_eq!(doc.tags(), vec!["free-will"]);
        assert!(doc.body.starts_with("See "));
        assert!(parsed.warnings.is_empty());

        let targets: Vec<&str> = parsed.links.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, vec!["Freedom Evolves", "Consciousness Explained"]);
        // Offsets index the raw text, front-matter included.
        let first = raw.find("[[").unwrap();
        assert_eq!(parsed.links[0].offset, raw[..first].chars().count());
    }

    #[test]
    fn test_unterminated_front_matter_keeps_whole_text() {
        let raw = "---\ntitle: Broken\n\nBody linking [[A]]";
        let parsed = parse_document(Path::new("broken.md"), raw);
        assert!(parsed.document.metadata.is_empty());
        assert_eq!(parsed.document.body, raw);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].kind, WarningKind::UnterminatedFrontMatter);
        assert_eq!(parsed.links.len(), 1);
    }

    #[test]
    fn test_malformed_yaml_keeps_whole_text() {
        let raw = "---\ntitle: [oops\n---\nBody [[A]]";
        let parsed = parse_document(Path::new("bad.md"), raw);
        assert!(parsed.document.metadata.is_empty());
        assert_eq!(parsed.document.body, raw);
        assert_eq!(parsed.warnings[0].kind, WarningKind::MalformedFrontMatter);
        assert_eq!(parsed.links[0].target, "A");
        assert_eq!(parsed.links[0].offset, raw.find("[[A]]").unwrap());
    }

    #[test]
    fn test_thematic_breaks_keep_links_between_them() {
        let raw = "---\nSee [[A]] first.\n---\nthen [[B]]\n";
        let parsed = parse_document(Path::new("n.md"), raw);
        let targets: Vec<&str> = parsed.links.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, vec!["A", "B"]);
        assert_eq!(parsed.document.body, raw);
        assert_eq!(parsed.warnings[0].kind, WarningKind::MalformedFrontMatter);
    }

    #[test]
    fn test_nested_value_warns() {
        let raw = "---\ntitle: T\nsource:\n  isbn: 1\n---\n";
        let parsed = parse_document(Path::new("n.md"), raw);
        assert_eq!(parsed.document.metadata.len(), 1);
        assert_eq!(parsed.warnings[0].kind, WarningKind::UnsupportedMetaValue);
    }

    #[test]
    fn test_parse_is_pure() {
        let raw = "---\ntags: [a]\n---\n[[X]] [[Y]]";
        let a = parse_document(Path::new("p.md"), raw);
        let b = parse_document(Path::new("p.md"), raw);
        assert_eq!(a.document, b.document);
        assert_eq!(a.links, b.links);
    }
}
