//! Filesystem document loading.
//!
//! Walks the configured docs root **recursively**, loading `.txt`/`.md`
//! files (per the include globs) into [`Document`]s in a deterministic
//! order. Unreadable or non-UTF-8 files are skipped with a warning rather
//! than failing the whole load.
//!
//! When the docs root does not exist at all, a small built-in corpus is
//! served instead so the service answers sensibly out of the box. An
//! existing but empty directory yields an empty corpus — downstream
//! components treat that as "no knowledge available", not an error.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::DocsConfig;
use crate::models::Document;

pub fn load_documents(config: &DocsConfig) -> Result<Vec<Document>> {
    let root = &config.root;
    if !root.exists() {
        tracing::info!(
            root = %root.display(),
            "docs root does not exist, serving built-in documents"
        );
        return Ok(builtin_documents());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut documents = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match load_file(path, &rel_str) {
            Ok(doc) => documents.push(doc),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
            }
        }
    }

    // Sort for deterministic ordering
    documents.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));

    Ok(documents)
}

fn load_file(path: &Path, relative_path: &str) -> Result<Document> {
    let raw_text = std::fs::read_to_string(path)?;

    let doc_id = doc_id_from_relative(relative_path);
    let title = extract_title(&raw_text).unwrap_or_else(|| prettify_stem(&doc_id));

    Ok(Document {
        doc_id,
        title,
        source_path: Some(path.to_string_lossy().to_string()),
        raw_text,
    })
}

/// Relative path with the extension stripped and separators folded,
/// e.g. `guides/setup.md` → `guides-setup`.
fn doc_id_from_relative(relative_path: &str) -> String {
    let without_ext = match relative_path.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => relative_path,
    };
    without_ext.replace(['/', '\\'], "-")
}

/// First non-empty line, with any markdown heading marks stripped.
fn extract_title(text: &str) -> Option<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .map(|line| line.to_string())
}

fn prettify_stem(doc_id: &str) -> String {
    doc_id.replace(['-', '_'], " ")
}

/// Demo corpus served when no docs directory is present.
fn builtin_documents() -> Vec<Document> {
    vec![
        Document {
            doc_id: "project_overview".to_string(),
            title: "Project Overview".to_string(),
            source_path: None,
            raw_text: "Groundwork is a local-first retrieval-grounded question answering \
                       service. It loads text and markdown documents from a local directory, \
                       ranks passages against each question, and grounds the answer in the \
                       best matches. Graph lookups remain available as an optional tool."
                .to_string(),
        },
        Document {
            doc_id: "usage".to_string(),
            title: "Usage".to_string(),
            source_path: None,
            raw_text: "Run the server, then call POST /chat with a message to receive an \
                       answer with sources. Retrieval uses the built-in demo documents by \
                       default. Add .txt or .md files under the configured docs root to \
                       change the retrieval set."
                .to_string(),
        },
    ]
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_for(root: &Path) -> DocsConfig {
        DocsConfig {
            root: root.to_path_buf(),
            ..DocsConfig::default()
        }
    }

    #[test]
    fn test_missing_root_serves_builtins() {
        let tmp = tempfile::TempDir::new().unwrap();
        let docs = load_documents(&config_for(&tmp.path().join("nope"))).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().any(|d| d.doc_id == "project_overview"));
    }

    #[test]
    fn test_empty_root_yields_empty_corpus() {
        let tmp = tempfile::TempDir::new().unwrap();
        let docs = load_documents(&config_for(tmp.path())).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_loads_txt_and_md_recursively_sorted() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("guides")).unwrap();
        fs::write(tmp.path().join("zeta.txt"), "Zeta notes.").unwrap();
        fs::write(
            tmp.path().join("guides/setup.md"),
            "# Setup Guide\n\nInstall and run.",
        )
        .unwrap();
        fs::write(tmp.path().join("skip.rs"), "fn main() {}").unwrap();

        let docs = load_documents(&config_for(tmp.path())).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["guides-setup", "zeta"]);
        assert_eq!(docs[0].title, "Setup Guide");
        assert_eq!(docs[1].title, "Zeta notes.");
    }

    #[test]
    fn test_skips_non_utf8_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("good.txt"), "Readable.").unwrap();
        fs::write(tmp.path().join("bad.txt"), [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let docs = load_documents(&config_for(tmp.path())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].doc_id, "good");
    }
}
