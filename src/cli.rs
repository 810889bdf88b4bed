//! Command-line interface definitions.

use clap::Parser;
use std::path::PathBuf;

/// Build the notes into a documentation site and publish it to GitHub Pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Commit message for the published site
    ///
    /// Quotes and shell metacharacters are passed to git unchanged.
    pub message: Option<String>,

    /// Project root; every path in the config resolves against it
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the root (default: publish.toml)
    #[arg(short = 'C', long, default_value = "publish.toml")]
    pub config: PathBuf,
}
