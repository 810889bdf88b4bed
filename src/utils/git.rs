//! Git plumbing for the publish step.
//!
//! Staging, committing and pushing go through the `git` binary so that the
//! user's own credential helpers and hooks apply. Repository discovery is
//! done in-process with `gix`.

use anyhow::{Context, Result, bail};
use std::path::Path;

/// Fail unless `root` lies inside a repository with a work tree.
pub fn ensure_work_tree(root: &Path) -> Result<()> {
    let repo = gix::discover(root)
        .with_context(|| format!("`{}` is not inside a git repository", root.display()))?;
    if repo.is_bare() {
        bail!("repository at `{}` has no work tree", repo.path().display());
    }
    Ok(())
}

/// `git add <path>`
pub fn add(path: &str) -> Vec<String> {
    vec!["git".into(), "add".into(), path.into()]
}

/// `git commit -m <message>`, with the message as one argument.
pub fn commit(message: &str) -> Vec<String> {
    vec!["git".into(), "commit".into(), "-m".into(), message.into()]
}

/// `git push <remote> <branch>`
pub fn push(remote: &str, branch: &str) -> Vec<String> {
    vec!["git".into(), "push".into(), remote.into(), branch.into()]
}
