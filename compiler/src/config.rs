//! @ai:module:intent Configuration structs for the compile runner
//! @ai:module:layer infrastructure
//! @ai:module:public_api CompilerConfig, ToolConfig, StoreConfig
//! @ai:module:stateless true

use crate::options::CompileOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "sectioner.toml";

/// @ai:intent Main configuration for the compile runner
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub compiler: ToolConfig,
    #[serde(default)]
    pub options: CompileOptions,
    #[serde(default)]
    pub store: StoreConfig,
}

/// @ai:intent Compiler binary and the file names it reads and writes
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_binary")]
    pub binary: String,
    #[serde(default = "default_stem")]
    pub stem: String,
    #[serde(default = "default_source_ext")]
    pub source_ext: String,
    #[serde(default = "default_listing_ext")]
    pub listing_ext: String,
}

/// @ai:intent Location of the persisted section store
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            stem: default_stem(),
            source_ext: default_source_ext(),
            listing_ext: default_listing_ext(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_binary() -> String {
    "sdcc".to_string()
}

fn default_stem() -> String {
    "source".to_string()
}

fn default_source_ext() -> String {
    ".c".to_string()
}

fn default_listing_ext() -> String {
    ".asm".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("sections.json")
}

impl ToolConfig {
    /// @ai:intent Name of the generated source file, as the compiler reports it
    /// @ai:example (stem "source", ext ".c") -> "source.c"
    pub fn source_name(&self) -> String {
        format!("{}{}", self.stem, self.source_ext)
    }

    /// @ai:intent Name of the listing the compiler writes next to the source
    pub fn listing_name(&self) -> String {
        format!("{}{}", self.stem, self.listing_ext)
    }
}

impl CompilerConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Load the given file, else the default file if present, else defaults
    /// @ai:effects fs:read
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
