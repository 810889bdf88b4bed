//! `[layout]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[layout]` section in publish.toml - where sources and output live.
///
/// All paths are relative to the project root until resolved.
///
/// # Example
/// ```toml
/// [layout]
/// notes = "source/notes"
/// staging = "source/cache"
/// output = "docs"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// One subfolder per topic, each with an optional `README.md`.
    #[serde(default = "defaults::layout::notes")]
    #[educe(Default = defaults::layout::notes())]
    pub notes: PathBuf,

    /// Recreated on every run, removed after the build.
    #[serde(default = "defaults::layout::staging")]
    #[educe(Default = defaults::layout::staging())]
    pub staging: PathBuf,

    /// Top-level document carrying the `__TOC__` placeholder.
    #[serde(default = "defaults::layout::template")]
    #[educe(Default = defaults::layout::template())]
    pub template: PathBuf,

    /// Rendered from `template`, overwritten on every run.
    #[serde(default = "defaults::layout::index")]
    #[educe(Default = defaults::layout::index())]
    pub index: PathBuf,

    /// Directory served by the hosting branch.
    #[serde(default = "defaults::layout::output")]
    #[educe(Default = defaults::layout::output())]
    pub output: PathBuf,

    /// Empty file written into `output` after each build.
    #[serde(default = "defaults::layout::marker")]
    #[educe(Default = defaults::layout::marker())]
    pub marker: String,
}
