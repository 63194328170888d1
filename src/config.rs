//! Optional `rangekit.toml` configuration.
//!
//! Loading never fails: anything wrong with the file becomes a warning and the
//! affected setting keeps its default.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use rangekit_core::Scope;
use rangekit_engine::engine::DEFAULT_WINDOW_BUFFER;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    compiler: Option<CompilerSection>,
    names: Option<NamesSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompilerSection {
    window_buffer: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamesSection {
    default_scope: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Rows/columns scanned past the selection edge by expanding formulas.
    pub window_buffer: u32,
    pub default_scope: Scope,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            window_buffer: DEFAULT_WINDOW_BUFFER,
            default_scope: Scope::Document,
        }
    }
}

/// Load the explicit config file, or the user's one if it exists.
pub fn load_config(config_file: Option<&PathBuf>) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(path) = config_file.cloned().or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    match read_config_file(&path) {
        Ok(content) => {
            let (config, parse_warnings) = parse_config(&content, &path);
            warnings.extend(parse_warnings);
            (config, warnings)
        }
        Err(warning) => {
            warnings.push(warning);
            (Config::default(), warnings)
        }
    }
}

fn read_config_file(path: &Path) -> Result<String, String> {
    let meta = std::fs::metadata(path)
        .map_err(|err| format!("Failed to read metadata for {}: {}", path.display(), err))?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(format!(
            "Refusing to read {}: file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        ));
    }
    std::fs::read_to_string(path).map_err(|err| format!("Failed to read {}: {}", path.display(), err))
}

fn parse_config(content: &str, path: &Path) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let mut config = Config::default();

    let file = match toml::from_str::<ConfigFile>(content) {
        Ok(file) => file,
        Err(err) => {
            warnings.push(format!("Failed to parse {}: {}", path.display(), err));
            return (config, warnings);
        }
    };

    if let Some(buffer) = file.compiler.and_then(|c| c.window_buffer) {
        if buffer == 0 {
            warnings.push(format!(
                "Ignoring compiler.window_buffer = 0 in {}; using {}",
                path.display(),
                DEFAULT_WINDOW_BUFFER
            ));
        } else {
            config.window_buffer = buffer;
        }
    }
    if let Some(scope) = file.names.and_then(|n| n.default_scope) {
        config.default_scope = Scope::parse(&scope);
    }

    (config, warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "rangekit")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("rangekit.toml");
    Some(path)
}
