//! Publish a notes collection as a documentation site.
//!
//! ```text
//! run()
//!     │
//!     ├── collect_notes()  notes/<topic>/README.md ──► cache/<topic>/<topic>.md
//!     ├── compose_index()  index.template.md ──► index.md
//!     └── publish()        build ─► docs/ ─► git add/commit/push
//! ```

mod cli;
mod collect;
mod compose;
mod config;
mod publish;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use collect::collect_notes;
use compose::compose_index;
use config::PublishConfig;
use publish::{Shell, SystemShell, publish};
use std::{fs, path::Path};

/// How a run ended without error.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Published,
    MissingMessage,
}

const MISSING_MESSAGE: &str =
    "No commit message was provided, please provide a message to build and publish docs.";

impl Outcome {
    /// `(module, line)` pairs to report for this outcome.
    fn diagnostics(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Published => &[],
            Self::MissingMessage => &[("error", MISSING_MESSAGE)],
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(&cli, &mut SystemShell).map(|_| ())
}

/// Check the commit message, load config, then stage, compose and publish.
///
/// Without a message nothing is read, written or executed.
fn run(cli: &Cli, shell: &mut dyn Shell) -> Result<Outcome> {
    let Some(message) = cli.message.as_deref() else {
        let outcome = Outcome::MissingMessage;
        for &(module, line) in outcome.diagnostics() {
            log!(module; "{line}");
        }
        return Ok(outcome);
    };

    let config = PublishConfig::load(cli)?;
    if config.config_path.is_file() {
        log!("config"; "loaded {}", config.config_path.display());
    }
    config.validate()?;
    build_and_publish(&config, message, shell)?;
    Ok(Outcome::Published)
}

fn build_and_publish(config: &PublishConfig, message: &str, shell: &mut dyn Shell) -> Result<()> {
    let layout = &config.layout;

    recreate_dir(&layout.staging)?;
    let toc = collect_notes(&layout.notes, &layout.staging)?;
    compose_index(&layout.template, &layout.index, &toc)?;
    publish(config, message, shell)
}

/// Start from an empty directory, dropping leftovers of an aborted run.
fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::tests::{RecordingShell, fake_build};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// A project in the standard layout with topics `a` (documented) and `b`.
    fn project() -> (TempDir, PublishConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(&root.join("source/index.template.md"), "# Docs\n__TOC__\n");
        write(&root.join("source/notes/a/README.md"), "# A\n__TOC__\n");
        write(&root.join("source/notes/a/x.md"), "x");
        write(&root.join("source/notes/b/x.md"), "orphan");

        let mut config = PublishConfig::default();
        config.resolve(root);
        (dir, config)
    }

    #[test]
    fn test_missing_message_does_nothing() {
        let dir = TempDir::new().unwrap();
        let cli = Cli {
            message: None,
            root: Some(dir.path().to_path_buf()),
            config: PathBuf::from("publish.toml"),
        };
        let mut shell = RecordingShell::default();

        let outcome = run(&cli, &mut shell).unwrap();

        assert_eq!(outcome, Outcome::MissingMessage);
        assert!(shell.calls.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_message_reports_one_error() {
        let diagnostics = Outcome::MissingMessage.diagnostics();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].0, "error");
        assert!(diagnostics[0].1.starts_with("No commit message was provided"));
        assert!(Outcome::Published.diagnostics().is_empty());
    }

    #[test]
    fn test_full_run_stages_then_publishes() {
        let (dir, config) = project();
        let root = dir.path().to_path_buf();

        // The builder sees the staged notes and the composed index.
        let staged = root.join("source/cache/a/a.md");
        let index = root.join("source/index.md");
        let mut shell = RecordingShell {
            on_build: Some(Box::new(move |root: &Path| {
                assert_eq!(fs::read_to_string(&staged).unwrap(), "# A\nx.md\n");
                assert!(staged.with_file_name("x.md").is_file());
                assert!(!root.join("source/cache/b").exists());
                assert_eq!(fs::read_to_string(&index).unwrap(), "# Docs\ncache/a/a.md\n");
                fake_build(root);
            })),
            ..Default::default()
        };

        build_and_publish(&config, "publish notes", &mut shell).unwrap();

        assert!(!root.join("source/cache").exists());
        assert!(root.join("docs/index.html").is_file());
        assert!(root.join("docs/.nojekyll").is_file());
        assert_eq!(
            fs::read_to_string(root.join("source/index.md")).unwrap(),
            "# Docs\ncache/a/a.md\n"
        );
        assert_eq!(shell.calls.last().unwrap(), &["git", "push", "origin", "main"]);
    }

    #[test]
    fn test_stale_staging_is_discarded() {
        let (dir, config) = project();
        write(&dir.path().join("source/cache/gone/gone.md"), "left by an aborted run");
        let mut shell = RecordingShell {
            fail_on: Some("make"),
            ..Default::default()
        };

        assert!(build_and_publish(&config, "msg", &mut shell).is_err());

        let cache = dir.path().join("source/cache");
        assert!(!cache.join("gone").exists());
        assert!(cache.join("a/a.md").is_file());
    }
}
