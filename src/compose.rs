//! Top-level index rendering.

use crate::{collect::TOC_PLACEHOLDER, log};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Render `template` into `index` with the sorted TOC in place of `__TOC__`.
pub fn compose_index(template: &Path, index: &Path, toc: &[String]) -> Result<()> {
    let text = fs::read_to_string(template)
        .with_context(|| format!("Failed to read template {}", template.display()))?;

    fs::write(index, render_index(&text, toc))
        .with_context(|| format!("Failed to write {}", index.display()))?;

    log!("compose"; "{} entries written to {}", toc.len(), index.display());
    Ok(())
}

/// Replace every placeholder with the TOC, sorted regardless of input order.
pub fn render_index(template: &str, toc: &[String]) -> String {
    let mut sorted: Vec<&str> = toc.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    template.replace(TOC_PLACEHOLDER, &sorted.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn toc(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_sorts_entries() {
        let rendered = render_index("# Docs\n__TOC__\n", &toc(&["cache/b/b.md", "cache/a/a.md"]));
        assert_eq!(rendered, "# Docs\ncache/a/a.md\ncache/b/b.md\n");
    }

    #[test]
    fn test_render_each_entry_once_and_no_placeholder_left() {
        let entries = toc(&["cache/m/m.md", "cache/Z/Z.md", "cache/a/a.md", "cache/a2/a2.md"]);
        let rendered = render_index(".. toctree::\n\n__TOC__", &entries);

        assert!(!rendered.contains(TOC_PLACEHOLDER));
        let lines: Vec<&str> = rendered.lines().skip(2).collect();
        assert_eq!(lines, ["cache/Z/Z.md", "cache/a/a.md", "cache/a2/a2.md", "cache/m/m.md"]);
    }

    #[test]
    fn test_render_empty_toc() {
        assert_eq!(render_index("a\n__TOC__\nb", &[]), "a\n\nb");
    }

    #[test]
    fn test_render_without_placeholder_is_unchanged() {
        assert_eq!(render_index("static", &toc(&["cache/a/a.md"])), "static");
    }

    #[test]
    fn test_compose_overwrites_index() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("index.template.md");
        let index = dir.path().join("index.md");
        fs::write(&template, "# Docs\n__TOC__\n").unwrap();
        fs::write(&index, "stale content that is much longer than the new one").unwrap();

        compose_index(&template, &index, &toc(&["cache/b/b.md", "cache/a/a.md"])).unwrap();

        assert_eq!(
            fs::read_to_string(&index).unwrap(),
            "# Docs\ncache/a/a.md\ncache/b/b.md\n"
        );
        assert_eq!(fs::read_to_string(&template).unwrap(), "# Docs\n__TOC__\n");
    }

    #[test]
    fn test_compose_missing_template() {
        let dir = TempDir::new().unwrap();
        let err = compose_index(&dir.path().join("nope.md"), &dir.path().join("index.md"), &[])
            .unwrap_err();
        assert!(format!("{err}").contains("Failed to read template"));
    }
}
