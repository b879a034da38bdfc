//! Configuration types for `bnd-cs.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::emit::EmitOptions;

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// C type model written by the header front end, resolved relative to
    /// the config file's directory.
    pub model: PathBuf,
    pub output: OutputConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
}

/// Output file settings.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output file path (e.g. `Bindings.cs`).
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
    /// C# namespace wrapping the generated class. Empty for none.
    #[serde(default)]
    pub namespace: String,
    /// Name of the static class that holds every declaration.
    pub class_name: String,
    /// Native library name used by `DllImport` (e.g. `mylib`).
    pub library: String,
    /// Append `// Kind @ file:line` provenance comments.
    #[serde(default = "default_true")]
    pub location_comments: bool,
}

impl OutputConfig {
    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            namespace: self.namespace.clone(),
            class_name: self.class_name.clone(),
            library: self.library.clone(),
            location_comments: self.location_comments,
        }
    }
}

fn default_output_file() -> PathBuf {
    PathBuf::from("Bindings.cs")
}

fn default_true() -> bool {
    true
}

/// Mapping behavior.
#[derive(Debug, Default, Deserialize)]
pub struct MappingConfig {
    /// What to do when a declaration cannot be mapped.
    #[serde(default)]
    pub on_error: ErrorPolicy,
    /// Warn about records whose field sizes and paddings do not add up to the
    /// record size. Never changes the output.
    #[serde(default)]
    pub validate_layout: bool,
}

/// Policy for declarations the mapper rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole unit, listing every rejected declaration.
    #[default]
    Abort,
    /// Log and leave the rejected declarations out.
    Skip,
}

impl Config {
    /// Path of the model file, resolved against `base_dir` unless absolute.
    pub fn model_path(&self, base_dir: &Path) -> PathBuf {
        if self.model.is_absolute() {
            self.model.clone()
        } else {
            base_dir.join(&self.model)
        }
    }
}

/// Load and parse a `bnd-cs.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}
