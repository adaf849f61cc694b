//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/wiki2docs/wiki2docs.toml`
//! 3. Explicit config file: `--config <file>`
//! 4. Environment variables: `WIKI2DOCS_*` prefix
//!
//! Command line flags are applied on top by the CLI layer.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::RewriteOptions;
use crate::util::path::expand_path;

/// Raw settings for intermediate parsing (all fields Option to detect "not specified").
///
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub start_file: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub home_page: Option<String>,
    pub placeholder: Option<String>,
    pub image_template: Option<String>,
    pub wiki_app_prefix: Option<String>,
    pub broken_image_hosts: Option<Vec<String>>,
}

/// Unified configuration for wiki2docs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Root page of the export (default: index.md)
    pub start_file: String,
    /// Output directory when `--output` is not given (default: docs)
    pub output_dir: PathBuf,
    /// Landing page expected in the output root (default: index.md)
    pub home_page: String,
    /// Link target for references that cannot be resolved
    pub placeholder: String,
    /// Image markup, `{src}` and `{alt}` are substituted
    pub image_template: String,
    /// URL prefix of the hosted wiki app
    pub wiki_app_prefix: String,
    /// Image hosts whose links expire
    pub broken_image_hosts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let rewrite = RewriteOptions::default();
        Self {
            start_file: "index.md".into(),
            output_dir: PathBuf::from("docs"),
            home_page: "index.md".into(),
            placeholder: rewrite.placeholder,
            image_template: rewrite.image_template,
            wiki_app_prefix: rewrite.wiki_app_prefix,
            broken_image_hosts: rewrite.broken_image_hosts,
        }
    }
}

/// Get the XDG config directory for wiki2docs.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "wiki2docs").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("wiki2docs.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are added to base
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Duplicates are de-duplicated
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: HashSet<String> = base.iter().cloned().collect();

    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.remove(negated);
        } else {
            result.insert(pattern.clone());
        }
    }

    // Sorted for deterministic output
    let mut vec: Vec<String> = result.into_iter().collect();
    vec.sort();
    vec
}

impl Settings {
    /// Options for the link and image rewrite pass.
    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            placeholder: self.placeholder.clone(),
            image_template: self.image_template.clone(),
            wiki_app_prefix: self.wiki_app_prefix.clone(),
            broken_image_hosts: self.broken_image_hosts.clone(),
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_path(self.output_dir.to_string_lossy().as_ref());
        self.output_dir = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - `broken_image_hosts`: union merge with negation support
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut merged = self.apply_scalars(overlay);
        if let Some(hosts) = &overlay.broken_image_hosts {
            merged.broken_image_hosts = merge_array(&self.broken_image_hosts, hosts);
        }
        merged
    }

    /// Apply global config onto defaults.
    ///
    /// Unlike `merge_with()` arrays are REPLACED: the compiled host list is
    /// only a starting point and the global file defines the real baseline.
    fn apply_global(&self, global: &RawSettings) -> Self {
        let mut merged = self.apply_scalars(global);
        if let Some(hosts) = &global.broken_image_hosts {
            merged.broken_image_hosts = hosts.clone();
        }
        merged
    }

    fn apply_scalars(&self, raw: &RawSettings) -> Self {
        Self {
            start_file: raw
                .start_file
                .clone()
                .unwrap_or_else(|| self.start_file.clone()),
            output_dir: raw
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            home_page: raw
                .home_page
                .clone()
                .unwrap_or_else(|| self.home_page.clone()),
            placeholder: raw
                .placeholder
                .clone()
                .unwrap_or_else(|| self.placeholder.clone()),
            image_template: raw
                .image_template
                .clone()
                .unwrap_or_else(|| self.image_template.clone()),
            wiki_app_prefix: raw
                .wiki_app_prefix
                .clone()
                .unwrap_or_else(|| self.wiki_app_prefix.clone()),
            broken_image_hosts: self.broken_image_hosts.clone(),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file (`--config`); must exist
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Explicit file: UNION with `!negation`
    /// - Any → Env vars: REPLACE
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply WIKI2DOCS_* environment variables as explicit overrides.
    ///
    /// Lists are comma separated: `WIKI2DOCS_BROKEN_IMAGE_HOSTS=a.com,b.com`.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("WIKI2DOCS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("start_file") {
            settings.start_file = val;
        }
        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("home_page") {
            settings.home_page = val;
        }
        if let Ok(val) = config.get_string("placeholder") {
            settings.placeholder = val;
        }
        if let Ok(val) = config.get_string("image_template") {
            settings.image_template = val;
        }
        if let Ok(val) = config.get_string("wiki_app_prefix") {
            settings.wiki_app_prefix = val;
        }
        if let Ok(val) = config.get_string("broken_image_hosts") {
            settings.broken_image_hosts = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
