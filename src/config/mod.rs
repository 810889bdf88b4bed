//! Project configuration for `publish.toml`.
//!
//! The file is optional. Every field has a default matching the standard
//! layout, so a project that follows it needs no config at all.
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[layout]`  | Notes, staging, template, index, output paths  |
//! | `[builder]` | Documentation builder command and its output   |
//! | `[deploy]`  | Git remote and branch to push to               |
//!
//! # Example
//!
//! ```toml
//! [layout]
//! notes = "source/notes"
//! output = "docs"
//!
//! [builder]
//! command = ["make", "html"]
//!
//! [deploy]
//! branch = "main"
//! ```

mod builder;
pub mod defaults;
mod deploy;
mod error;
mod layout;

use builder::BuilderConfig;
use deploy::DeployConfig;
use error::ConfigError;
use layout::LayoutConfig;

use crate::{cli::Cli, utils::git};
use anyhow::{Context, Result, bail};
use educe::Educe;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing publish.toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub builder: BuilderConfig,

    #[serde(default)]
    pub deploy: DeployConfig,
}

impl PublishConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: PublishConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
            .with_context(|| format!("Failed to load `{}`", path.display()))
    }

    /// Load `cli.config` from the project root, falling back to defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.config_path = cli.config.clone();
        config.resolve(root);
        Ok(config)
    }

    /// Join every relative path onto `root` and make it absolute.
    pub fn resolve(&mut self, root: &Path) {
        let root = normalize_path(root);

        self.config_path = normalize_path(&root.join(&self.config_path));
        self.layout.notes = normalize_path(&root.join(&self.layout.notes));
        self.layout.staging = normalize_path(&root.join(&self.layout.staging));
        self.layout.template = normalize_path(&root.join(&self.layout.template));
        self.layout.index = normalize_path(&root.join(&self.layout.index));
        self.layout.output = normalize_path(&root.join(&self.layout.output));
        self.builder.html = normalize_path(&root.join(&self.builder.html));
        self.builder.build_dir = normalize_path(&root.join(&self.builder.build_dir));

        self.root = root;
    }

    /// Output directory as git should see it, relative to the root when possible.
    pub fn output_pathspec(&self) -> String {
        self.layout
            .output
            .strip_prefix(&self.root)
            .unwrap_or(&self.layout.output)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Check everything the publish run depends on, before touching any file.
    pub fn validate(&self) -> Result<()> {
        Self::check_command_installed("[builder.command]", &self.builder.command)?;
        Self::check_program_installed("git", "git")?;

        if !self.layout.notes.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[layout.notes] `{}` is not a directory",
                self.layout.notes.display()
            )));
        }
        if !self.layout.template.is_file() {
            bail!(ConfigError::Validation(format!(
                "[layout.template] `{}` not found",
                self.layout.template.display()
            )));
        }
        if self.layout.staging.file_name().is_none() {
            bail!(ConfigError::Validation(
                "[layout.staging] must name a directory".into()
            ));
        }
        if self.layout.marker.is_empty() || self.layout.marker.contains(['/', '\\']) {
            bail!(ConfigError::Validation(
                "[layout.marker] must be a plain file name".into()
            ));
        }

        git::ensure_work_tree(&self.root)?;
        Ok(())
    }

    fn check_command_installed(field: &'static str, command: &[String]) -> Result<()> {
        let Some(program) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };
        Self::check_program_installed(field, program)
    }

    fn check_program_installed(field: &'static str, program: &str) -> Result<()> {
        if which::which(program).is_err() {
            bail!(ConfigError::MissingTool {
                field,
                program: program.to_owned(),
            });
        }
        Ok(())
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}
