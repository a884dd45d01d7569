use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CallscopeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source analysis configuration
    pub analysis: AnalysisConfig,

    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// File extension of analyzable sources
    pub source_extension: String,

    /// Additional directories consulted when an import does not resolve
    /// relative to the importing file
    pub search_roots: Vec<PathBuf>,

    /// Path segments marking vendored/third-party trees; a module whose
    /// resolved path contains one of these is treated as unresolved
    pub vendor_markers: Vec<String>,

    /// Maximum file size to parse (in bytes)
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format (text, json)
    pub format: String,

    /// Include a generation timestamp in JSON reports
    pub include_timestamp: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source_extension: "py".to_string(),
            search_roots: Vec::new(),
            vendor_markers: vec![
                "site-packages".to_string(),
                "dist-packages".to_string(),
            ],
            max_file_size: 1024 * 1024, // 1MB
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            output: OutputConfig {
                format: "text".to_string(),
                include_timestamp: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CallscopeError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CallscopeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Callscope.toml",
                    "callscope.toml",
                    ".callscope.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}
