//! Corpus discovery: which files under the root are notes.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use notegraph_core::{Error, Result};

/// All note files under `root` with one of `extensions`, sorted by path.
///
/// Hidden files and directories (leading `.`) are skipped. Entries that
/// cannot be read are logged and skipped.
pub fn walk_corpus(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!(
            "corpus directory {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_lowercase();
                extensions.iter().any(|x| *x == e)
            })
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts() -> Vec<String> {
        vec!["md".into(), "txt".into()]
    }

    #[test]
    fn test_walk_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("books")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("zeta.md"), "z").unwrap();
        fs::write(root.join("books/alpha.MD"), "a").unwrap();
        fs::write(root.join("notes.txt"), "n").unwrap();
        fs::write(root.join("image.png"), "p").unwrap();
        fs::write(root.join(".hidden.md"), "h").unwrap();
        fs::write(root.join(".obsidian/workspace.md"), "w").unwrap();

        let files = walk_corpus(root, &exts()).unwrap();
        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["books/alpha.MD", "notes.txt", "zeta.md"]);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = walk_corpus(&dir.path().join("nope"), &exts()).unwrap_err();
        assert!(err.is_not_found());
    }
}
