//! Notes collection into the staging tree.
//!
//! Every immediate subfolder of the notes root that has a `README.md` is
//! mirrored into the staging root: sibling `.md` and `.rst` documents are
//! copied as-is, and the README is rewritten to `<folder>.md` with its
//! `__TOC__` placeholder replaced by the sibling file names.
//!
//! ```text
//! notes/                      cache/
//! ├── rust/                   ├── rust/
//! │   ├── README.md    ──►    │   ├── rust.md      (rewritten README)
//! │   ├── ownership.md ──►    │   ├── ownership.md
//! │   └── traits.rst   ──►    │   └── traits.rst
//! └── drafts/                 (no README: skipped)
//!     └── idea.md
//! ```

use crate::log;
use anyhow::{Context, Result};
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Fixed name of a folder's entry document.
pub const ENTRY_DOCUMENT: &str = "README.md";

/// Replaced by a newline-joined list wherever it appears.
pub const TOC_PLACEHOLDER: &str = "__TOC__";

/// Stage every notes folder that has an entry document.
///
/// Returns the staged entry documents as `<staging name>/<folder>/<folder>.md`,
/// one per staged folder, in file-name order.
pub fn collect_notes(notes_root: &Path, staging_root: &Path) -> Result<Vec<String>> {
    let staging_name = staging_root
        .file_name()
        .and_then(OsStr::to_str)
        .with_context(|| format!("Invalid staging directory `{}`", staging_root.display()))?;

    let mut toc = Vec::new();
    for folder in immediate_children(notes_root)? {
        if let Some(entry) = stage_folder(&folder, staging_root, staging_name)? {
            toc.push(entry);
        }
    }

    log!("collect"; "staged {} folders into {}", toc.len(), staging_name);
    Ok(toc)
}

/// Stage a single folder, or return `None` if it has no entry document.
fn stage_folder(folder: &Path, staging_root: &Path, staging_name: &str) -> Result<Option<String>> {
    let entry = folder.join(ENTRY_DOCUMENT);
    if !entry.is_file() {
        return Ok(None);
    }

    let name = utf8_file_name(folder)?;
    let target = staging_root.join(name);
    fs::create_dir_all(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;

    let documents = sibling_documents(folder)?;
    for document in &documents {
        let (src, dst) = (folder.join(document), target.join(document));
        fs::copy(&src, &dst)
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    }

    let text = fs::read_to_string(&entry)
        .with_context(|| format!("Failed to read {}", entry.display()))?;
    let staged_entry = target.join(format!("{name}.md"));
    fs::write(&staged_entry, text.replace(TOC_PLACEHOLDER, &documents.join("\n")))
        .with_context(|| format!("Failed to write {}", staged_entry.display()))?;

    Ok(Some(format!("{staging_name}/{name}/{name}.md")))
}

/// Documents listed in a folder's TOC: `.md` files other than README
/// variants, then `.rst` files. Hidden files are not matched, and entries
/// that are not readable regular files are ignored.
fn sibling_documents(folder: &Path) -> Result<Vec<String>> {
    let mut markdown = Vec::new();
    let mut rest = Vec::new();

    for path in immediate_children(folder)? {
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.as_encoded_bytes().starts_with(b".") {
            continue;
        }
        let is_markdown = match path.extension() {
            Some(ext) if ext == "md" => true,
            Some(ext) if ext == "rst" => false,
            _ => continue,
        };

        let name = utf8_file_name(&path)?;
        if !is_markdown {
            rest.push(name.to_owned());
        } else if !name.ends_with(ENTRY_DOCUMENT) {
            markdown.push(name.to_owned());
        }
    }

    markdown.append(&mut rest);
    Ok(markdown)
}

/// Entries directly under `dir`, sorted by file name.
///
/// Only failing to read `dir` itself is an error; entries that cannot be
/// inspected (dangling symlinks, permission errors) are skipped.
fn immediate_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => children.push(entry.into_path()),
            Err(err) if err.depth() == 0 => {
                return Err(err)
                    .with_context(|| format!("Failed to read directory {}", dir.display()));
            }
            Err(_) => {}
        }
    }
    Ok(children)
}

fn utf8_file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(OsStr::to_str)
        .with_context(|| format!("Non UTF-8 file name: {}", path.display()))
}
