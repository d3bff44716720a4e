//! `[[wikilink]]` extraction.
//!
//! Links inside fenced code blocks and inline code spans are not references
//! and are skipped.

use once_cell::sync::Lazy;
use regex::Regex;

use notegraph_store::LinkRef;

static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[\[([^\[\]\n]*)\]\]").expect("valid wikilink regex"));
static INLINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"``[^`\n]+``|`[^`\n]+`").expect("valid inline code regex"));

/// Extract wikilinks from `body`, in source order.
///
/// `char_base` is the character offset of `body` inside the raw document, so
/// returned offsets point into the raw text.
pub fn extract_links(body: &str, char_base: usize) -> Vec<LinkRef> {
    let code = code_ranges(body);
    let mut links = Vec::new();

    // Byte → char offsets, walked forward once.
    let mut last_byte = 0;
    let mut last_char = char_base;

    for caps in WIKILINK_RE.captures_iter(body) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or_default();
        if code.iter().any(|(s, e)| whole >= *s && whole < *e) {
            continue;
        }
        let inner = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let Some(parts) = normalize_target(inner) else {
            continue;
        };

        last_char += body[last_byte..whole].chars().count();
        last_byte = whole;

        links.push(LinkRef {
            target: parts.target,
            raw: inner.to_string(),
            alias: parts.alias,
            anchor: parts.anchor,
            embed: caps.get(1).map(|m| !m.as_str().is_empty()).unwrap_or(false),
            offset: last_char,
        });
    }
    links
}

/// The pieces of `target#anchor|alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetParts {
    pub target: String,
    pub alias: Option<String>,
    pub anchor: Option<String>,
}

/// Split and normalize the text between the brackets.
///
/// `None` for intra-document references such as `[[#Heading]]` and for
/// empty links.
pub fn normalize_target(inner: &str) -> Option<TargetParts> {
    let (left, alias) = match inner.split_once('|') {
        Some((l, a)) => (l.strip_suffix('\\').unwrap_or(l), non_empty(a)),
        None => (inner, None),
    };
    let (page, anchor) = match left.split_once('#') {
        Some((p, a)) => (p, non_empty(a)),
        None => (left, None),
    };

    let mut target = page.trim().replace('\\', "/");
    while let Some(rest) = target.strip_prefix("./") {
        target = rest.to_string();
    }
    let target = target.trim_start_matches('/');
    let target = strip_md_extension(target).trim_end();
    if target.is_empty() {
        return None;
    }

    Some(TargetParts {
        target: target.to_string(),
        alias,
        anchor,
    })
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn strip_md_extension(target: &str) -> &str {
    let len = target.len();
    if len > 3 && target.is_char_boundary(len - 3) && target[len - 3..].eq_ignore_ascii_case(".md") {
        &target[..len - 3]
    } else {
        target
    }
}

/// Byte ranges of fenced code blocks and inline code spans.
fn code_ranges(body: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut fence: Option<(usize, &str)> = None;
    let mut pos = 0;

    for line in body.split_inclusive('\n') {
        let start = pos;
        pos += line.len();
        let trimmed = line.trim_start();
        let marker = if trimmed.starts_with("```") {
            Some("```")
        } else if trimmed.starts_with("~~~") {
            Some("~~~")
        } else {
            None
        };

        match (fence, marker) {
            (None, Some(m)) => fence = Some((start, m)),
            (Some((open, m)), Some(close)) if m == close => {
                ranges.push((open, pos));
                fence = None;
            }
            (None, None) => {
                for m in INLINE_CODE_RE.find_iter(line) {
                    ranges.push((start + m.start(), start + m.end()));
                }
            }
            _ => {}
        }
    }
    if let Some((open, _)) = fence {
        ranges.push((open, body.len()));
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(body: &str) -> Vec<String> {
        extract_links(body, 0).into_iter().map(|l| l.target).collect()
    }

    #[test]
    fn test_targets_in_source_order() {
        assert_eq!(
            targets("See [[B]] and then [[C]], also [[B]] again."),
            vec!["B", "C", "B"]
        );
    }

    #[test]
    fn test_alias_anchor_and_embed() {
        let links = extract_links("![[Free Will#Chapter 2|the chapter]] [[Note#^abc123]]", 0);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].target, "Free Will");
        assert_eq!(links[0].anchor.as_deref(), Some("Chapter 2"));
        assert_eq!(links[0].alias.as_deref(), Some("the chapter"));
        assert!(links[0].embed);
        assert_eq!(links[0].raw, "Free Will#Chapter 2|the chapter");
        assert_eq!(links[1].anchor.as_deref(), Some("^abc123"));
        assert!(!links[1].embed);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_target(" books\\Elbow Room.md ").unwrap().target, "books/Elbow Room");
        assert_eq!(normalize_target("./notes/A.MD").unwrap().target, "notes/A");
        assert_eq!(normalize_target("Table\\|alias").unwrap().target, "Table");
        assert!(normalize_target("#Heading").is_none());
        assert!(normalize_target("   ").is_none());
        assert!(normalize_target("|alias").is_none());
    }

    #[test]
    fn test_empty_and_unclosed_tokens_ignored() {
        assert_eq!(targets("[[]] [[ ]] [[open and [[Real]]"), vec!["Real"]);
        assert!(targets("[[split\nline]]").is_empty());
    }

    #[test]
    fn test_skips_code() {
        let body = "[[A]]\n```\n[[InFence]]\n```\nInline `[[InCode]]` and [[B]]\n~~~\n[[Unclosed]]";
        assert_eq!(targets(body), vec!["A", "B"]);
    }

    #[test]
    fn test_char_offsets_with_multibyte_text() {
        let body = "Über [[Kant]] — and [[Hume]]";
        let links = extract_links(body, 10);
        assert_eq!(links[0].offset, 10 + 5);
        let expected = 10 + body[..body.find("[[Hume").unwrap()].chars().count();
        assert_eq!(links[1].offset, expected);
    }
}
