//! User configuration (`config.toml`).
//!
//! Problems with the file are reported as warnings and never stop the program.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tabula_core::{DEFAULT_COLUMN_WIDTH, DEFAULT_PRECISION, Document};

const MAX_CONFIG_FILE_BYTES: u64 = 65_536;
const MAX_PRECISION: usize = 15;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    default_column_width: Option<usize>,
    precision: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub default_column_width: usize,
    pub precision: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_column_width: DEFAULT_COLUMN_WIDTH,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Config {
    pub fn apply_to(&self, doc: &mut Document) {
        doc.default_column_width = self.default_column_width;
        doc.precision = self.precision;
    }

    fn from_file(file: ConfigFile, warnings: &mut Vec<String>) -> Config {
        let mut config = Config::default();

        match file.default_column_width {
            Some(0) => warnings.push("default_column_width must be at least 1".to_string()),
            Some(w) => config.default_column_width = w,
            None => {}
        }
        match file.precision {
            Some(p) if p > MAX_PRECISION => warnings.push(format!(
                "precision {} is too large (max {})",
                p, MAX_PRECISION
            )),
            Some(p) => config.precision = p,
            None => {}
        }

        config
    }
}

/// Load configuration from `explicit` or the user config dir.
/// A missing default file is not a warning; a missing explicit one is.
pub fn load_config(explicit: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(path) = explicit.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let file = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    let config = Config::from_file(file.unwrap_or_default(), &mut warnings);
    (config, warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tabula")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
