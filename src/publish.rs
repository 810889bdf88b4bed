//! Build and publish sequence.
//!
//! The sequence is a fixed list of [`Step`]s executed in order. External
//! commands (builder, git) go through a [`Shell`]; filesystem steps run
//! in-process. The first failing step aborts the rest; nothing is rolled
//! back, so a partial run leaves its effects for the next run to overwrite.
//!
//! ```text
//! make html ─► rm staging ─► clear docs/ ─► mv build/html/* docs/
//!     ─► touch docs/.nojekyll ─► rm -rf build ─► git add ─► git commit ─► git push
//! ```

use crate::{
    config::PublishConfig,
    exec, log,
    utils::{
        exec::{EMPTY_FILTER, FilterRule, GIT_FILTER, display_command},
        git,
    },
};
use anyhow::{Context, Result, bail};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

/// Runs external commands on behalf of the publish sequence.
pub trait Shell {
    fn run(&mut self, root: &Path, command: &ExternalCommand) -> Result<()>;
}

/// Spawns real processes through [`exec!`].
pub struct SystemShell;

impl Shell for SystemShell {
    fn run(&mut self, root: &Path, command: &ExternalCommand) -> Result<()> {
        exec!(pty=command.pty; filter=command.filter; root; &command.argv;)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct ExternalCommand {
    pub argv: Vec<String>,
    /// Echo the command line before running it.
    pub log_cmd: bool,
    pub pty: bool,
    pub filter: &'static FilterRule,
}

#[derive(Debug)]
pub enum Step {
    /// Announce, then run an external command in the project root.
    Run {
        message: Option<&'static str>,
        command: ExternalCommand,
    },
    /// Remove a directory that must exist.
    RemoveDir(PathBuf),
    /// Remove a directory if present.
    RemoveDirIfExists(PathBuf),
    /// Remove the non-hidden entries of a directory, creating it if missing.
    ClearDir(PathBuf),
    /// Move the non-hidden entries of `from` into `to`.
    MoveContents { from: PathBuf, to: PathBuf },
    /// Write a zero-byte file.
    Touch(PathBuf),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run { command, .. } => write!(f, "{}", display_command(&command.argv)),
            Self::RemoveDir(path) => write!(f, "rm -r {}", path.display()),
            Self::RemoveDirIfExists(path) => write!(f, "rm -rf {}", path.display()),
            Self::ClearDir(path) => write!(f, "rm -r {}/*", path.display()),
            Self::MoveContents { from, to } => {
                write!(f, "mv {}/* {}", from.display(), to.display())
            }
            Self::Touch(path) => write!(f, "touch {}", path.display()),
        }
    }
}

impl Step {
    fn apply(&self, root: &Path, shell: &mut dyn Shell) -> Result<()> {
        match self {
            Self::Run { message, command } => {
                if let Some(message) = message {
                    log!("build"; "{message}");
                }
                if command.log_cmd {
                    log!(module_of(&command.argv); "{}", display_command(&command.argv));
                }
                shell.run(root, command)
            }
            Self::RemoveDir(path) => fs::remove_dir_all(path)
                .with_context(|| format!("Failed to remove {}", path.display())),
            Self::RemoveDirIfExists(path) => {
                if path.exists() {
                    fs::remove_dir_all(path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
                Ok(())
            }
            Self::ClearDir(path) => clear_dir(path),
            Self::MoveContents { from, to } => move_contents(from, to),
            Self::Touch(path) => fs::write(path, b"")
                .with_context(|| format!("Failed to create {}", path.display())),
        }
    }
}

/// Log prefix for a command: `git` for git, `build` for everything else.
fn module_of(argv: &[String]) -> &'static str {
    match argv.first().map(String::as_str) {
        Some("git") => "git",
        _ => "build",
    }
}

/// The publish sequence for `message`, in execution order.
pub fn publish_steps(config: &PublishConfig, message: &str) -> Vec<Step> {
    let layout = &config.layout;
    let deploy = &config.deploy;
    let git_step = |argv: Vec<String>, pty: bool| Step::Run {
        message: None,
        command: ExternalCommand {
            argv,
            log_cmd: true,
            pty,
            filter: &GIT_FILTER,
        },
    };

    vec![
        Step::Run {
            message: Some("building new docs ..."),
            command: ExternalCommand {
                argv: config.builder.command.clone(),
                log_cmd: true,
                pty: false,
                filter: &EMPTY_FILTER,
            },
        },
        Step::RemoveDir(layout.staging.clone()),
        Step::ClearDir(layout.output.clone()),
        Step::MoveContents {
            from: config.builder.html.clone(),
            to: layout.output.clone(),
        },
        Step::Touch(layout.output.join(&layout.marker)),
        Step::RemoveDirIfExists(config.builder.build_dir.clone()),
        git_step(git::add(&config.output_pathspec()), false),
        git_step(git::commit(message), false),
        git_step(git::push(&deploy.remote, &deploy.branch), deploy.pty),
    ]
}

/// Run `steps` in order, stopping at the first failure.
pub fn execute(steps: &[Step], root: &Path, shell: &mut dyn Shell) -> Result<()> {
    let total = steps.len();
    for (i, step) in steps.iter().enumerate() {
        step.apply(root, shell)
            .with_context(|| format!("Publish step {}/{total} failed: {step}", i + 1))?;
    }
    Ok(())
}

/// Build the staged sources and push the result with `message` as the commit message.
pub fn publish(config: &PublishConfig, message: &str, shell: &mut dyn Shell) -> Result<()> {
    execute(&publish_steps(config, message), &config.root, shell)?;
    log!("publish"; "pushed {} to {}/{}", config.output_pathspec(), config.deploy.remote, config.deploy.branch);
    Ok(())
}

/// Entries matched by a shell `*`: everything not dot-prefixed.
fn visible_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            entries.push(entry.path());
        }
    }
    entries.sort();
    Ok(entries)
}

fn clear_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()));
    }

    for path in visible_entries(dir)? {
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

fn move_contents(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        bail!("Build output `{}` not found", from.display());
    }
    fs::create_dir_all(to).with_context(|| format!("Failed to create {}", to.display()))?;

    for src in visible_entries(from)? {
        let Some(name) = src.file_name() else {
            continue;
        };
        let dst = to.join(name);
        fs::rename(&src, &dst)
            .with_context(|| format!("Failed to move {} to {}", src.display(), dst.display()))?;
    }
    Ok(())
}
