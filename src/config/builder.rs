//! `[builder]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[builder]` section in publish.toml - the external documentation builder.
///
/// # Example
/// ```toml
/// [builder]
/// command = ["sphinx-build", "-M", "html", "source", "build"]
/// html = "build/html"
/// build_dir = "build"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuilderConfig {
    /// Program and arguments, run in the project root.
    #[serde(default = "defaults::builder::command")]
    #[educe(Default = defaults::builder::command())]
    pub command: Vec<String>,

    /// Generated site, moved into `[layout.output]`.
    #[serde(default = "defaults::builder::html")]
    #[educe(Default = defaults::builder::html())]
    pub html: PathBuf,

    /// Intermediate build directory, removed after the move.
    #[serde(default = "defaults::builder::build_dir")]
    #[educe(Default = defaults::builder::build_dir())]
    pub build_dir: PathBuf,
}
