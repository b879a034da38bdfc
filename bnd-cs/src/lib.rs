//! bnd-cs — C type model → layout-exact C# bindings.
//!
//! Lowers the declarations a C header front end extracted (records, enums,
//! typedefs, opaque handles, function pointers, exported functions) into a
//! single C# source file whose structs reproduce the native layout byte for
//! byte and whose `DllImport`s target the exact exported symbols.
//!
//! # Quick start
//!
//! Generate a `.cs` file from a config (suitable for `build.rs`):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads the config TOML and the model it names, writes the .cs file.
//! bnd_cs::run(Path::new("bnd-cs.toml"), None).unwrap();
//! ```
//!
//! Or get the source text without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let emitted = bnd_cs::generate(Path::new("bnd-cs.toml")).unwrap();
//! println!("{}", emitted.source);
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub mod binding;
pub mod config;
pub mod emit;
pub mod error;
pub mod map;
pub mod model;
pub mod profile;
pub mod sanitize;

pub use emit::{EmitOptions, Emitted};
pub use error::MapError;
pub use profile::TargetProfile;

/// Everything [`generate_from_model`] needs besides the model itself.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub profile: TargetProfile,
    pub emit: EmitOptions,
    pub on_error: config::ErrorPolicy,
    pub validate_layout: bool,
}

impl GenerateOptions {
    pub fn from_config(cfg: &config::Config) -> Self {
        Self {
            profile: TargetProfile::CSHARP,
            emit: cfg.output.emit_options(),
            on_error: cfg.mapping.on_error,
            validate_layout: cfg.mapping.validate_layout,
        }
    }
}

/// Run the full pipeline: load config and model, map, emit C#, and write
/// the output file.
///
/// `config_path` is the path to a `bnd-cs.toml` configuration file.
/// `output` optionally overrides the output file path from the config.
///
/// Returns the path the `.cs` file was written to.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let emitted = generate_from_config(&cfg, base_dir)?;

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => base_dir.join(&cfg.output.file),
    };
    std::fs::write(&output_path, &emitted.source)
        .with_context(|| format!("writing output to {}", output_path.display()))?;

    info!(
        path = %output_path.display(),
        size = emitted.source.len(),
        declarations = emitted.names.len(),
        "wrote bindings"
    );

    Ok(output_path)
}

/// Parse a `bnd-cs.toml` config file, load the model it references, and
/// return the generated bindings without writing to disk.
pub fn generate(config_path: &Path) -> Result<Emitted> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir)
}

/// Generate bindings from an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which the model path in the
/// config is resolved (typically the parent directory of the TOML file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path) -> Result<Emitted> {
    info!(
        class = %cfg.output.class_name,
        library = %cfg.output.library,
        "loaded configuration"
    );

    let model_path = cfg.model_path(base_dir);
    let model = model::load_model(&model_path)?;
    info!(
        path = %model_path.display(),
        declarations = model.len(),
        "loaded C type model"
    );

    generate_from_model(&model, &GenerateOptions::from_config(cfg))
}

/// Map and emit an in-memory model. No I/O.
///
/// Declarations the mapper rejects either fail the call or are logged and
/// left out, depending on `options.on_error`.
pub fn generate_from_model(model: &model::CModel, options: &GenerateOptions) -> Result<Emitted> {
    if options.validate_layout {
        for record in &model.records {
            for m in map::check_record_layout(record) {
                warn!(
                    record = %m.record,
                    expected = m.expected,
                    actual = m.actual,
                    "field sizes and paddings do not add up to the record size"
                );
            }
        }
    }

    let mapper = map::Mapper::new(options.profile);
    let mapping = mapper.map_model(model);

    if !mapping.errors.is_empty() {
        match options.on_error {
            config::ErrorPolicy::Abort => {
                let mut msg = format!(
                    "{} declaration(s) could not be mapped.\n\
                     Hint: set `on_error = \"skip\"` under `[mapping]` to emit the rest.\n",
                    mapping.errors.len()
                );
                for e in &mapping.errors {
                    msg.push_str(&format!("\n  • {e}"));
                }
                anyhow::bail!("{msg}");
            }
            config::ErrorPolicy::Skip => {
                for e in &mapping.errors {
                    warn!(
                        name = e.declaration(),
                        location = %e.location(),
                        err = %e,
                        "skipping declaration"
                    );
                }
            }
        }
    }

    let b = &mapping.bindings;
    info!(
        functions = b.function_externs.len(),
        function_pointers = b.function_pointers.len(),
        structs = b.structs.len(),
        opaque_types = b.opaque_data_types.len(),
        enums = b.enums.len(),
        skipped = mapping.errors.len(),
        "mapped declarations"
    );

    let emitted = emit::emit_bindings(b, &options.profile, &options.emit);

    info!(size = emitted.source.len(), "generated bindings");

    Ok(emitted)
}
