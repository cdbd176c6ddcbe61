use std::path::{Path, PathBuf};

use cpurender::{CompilerHints, ViewerConfig};
use directories_next::ProjectDirs;
use serde::Deserialize;

use crate::cli::Cli;

const APPLICATION: &str = "tileshade";
const CONFIG_FILE: &str = "config.toml";
const MAX_WINDOW_DIMENSION: u32 = 8192;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub compiler: CompilerSection,
    pub viewer: ViewerSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerSection {
    pub slangc: Option<PathBuf>,
    pub target_cpu: Option<String>,
    pub vector_library: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerSection {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub threads: Option<usize>,
}

impl FileConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FileConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `explicit` if given, otherwise the per-user config file when it
    /// exists. A missing default file yields the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "using user configuration");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("width", self.viewer.width), ("height", self.viewer.height)] {
            if let Some(value) = value {
                if value == 0 || value > MAX_WINDOW_DIMENSION {
                    return Err(ConfigError::Invalid(format!(
                        "viewer.{name} must be between 1 and {MAX_WINDOW_DIMENSION}, got {value}"
                    )));
                }
            }
        }
        for (name, value) in [
            ("target_cpu", &self.compiler.target_cpu),
            ("vector_library", &self.compiler.vector_library),
        ] {
            if value.as_deref().is_some_and(|text| text.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!("compiler.{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Combines the file with command line values; the command line wins.
    pub fn resolve(self, cli: &Cli) -> ViewerConfig {
        let defaults = ViewerConfig::default();
        let surface_size = cli.size.unwrap_or((
            self.viewer.width.unwrap_or(defaults.surface_size.0),
            self.viewer.height.unwrap_or(defaults.surface_size.1),
        ));
        ViewerConfig {
            surface_size,
            slangc: cli
                .slangc
                .clone()
                .or(self.compiler.slangc)
                .unwrap_or(defaults.slangc),
            hints: CompilerHints {
                target_cpu: cli.target_cpu.clone().or(self.compiler.target_cpu),
                vector_library: cli.vector_library.clone().or(self.compiler.vector_library),
            },
            threads: cli.threads.or(self.viewer.threads).unwrap_or(defaults.threads),
            headless: cli.headless,
            dump_wrapped: cli.dump_wrapped.clone(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
