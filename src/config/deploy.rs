//! `[deploy]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[deploy]` section in publish.toml - where the commit is pushed.
///
/// # Example
/// ```toml
/// [deploy]
/// remote = "origin"
/// branch = "main"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    #[serde(default = "defaults::deploy::remote")]
    #[educe(Default = defaults::deploy::remote())]
    pub remote: String,

    #[serde(default = "defaults::deploy::branch")]
    #[educe(Default = defaults::deploy::branch())]
    pub branch: String,

    /// Run `git push` on a private pseudo-terminal.
    ///
    /// Its output is only shown after git exits and nothing can be typed
    /// into it, so leave this off unless credentials never prompt. With the
    /// default, git prompts on the controlling terminal directly.
    #[serde(default = "defaults::deploy::pty")]
    #[educe(Default = defaults::deploy::pty())]
    pub pty: bool,
}
