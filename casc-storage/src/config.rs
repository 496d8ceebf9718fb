//! Configuration discovery and parsing for CASC installations
//!
//! This module discovers and parses build/CDN configuration files stored in
//! a CASC installation under the `Data/config/` two-level hash subdirectory
//! layout.

use crate::error::{CascError, Result};
use casc_format::config::{BuildConfig, CdnConfig, ConfigParsable};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Discovered configuration files for a CASC installation
#[derive(Debug)]
pub struct WowConfigSet {
    /// All discovered CDN configs
    pub cdn_configs: Vec<CdnConfig>,

    /// All discovered build configs
    pub build_configs: Vec<BuildConfig>,

    /// Directory where configs were found
    pub config_dir: PathBuf,
}

impl WowConfigSet {
    /// Get the most recent CDN config (if any)
    pub fn latest_cdn_config(&self) -> Option<&CdnConfig> {
        self.cdn_configs.first()
    }

    /// Get the most recent build config (if any)
    pub fn latest_build_config(&self) -> Option<&BuildConfig> {
        self.build_configs.first()
    }

    /// Get all archive hashes from CDN configs, hex-encoded
    pub fn all_archive_hashes(&self) -> Vec<String> {
        let mut hashes = Vec::new();
        for cdn_config in &self.cdn_configs {
            if let Some(archives) = &cdn_config.archives {
                hashes.extend(archives.iter().map(hex::encode));
            }
        }
        hashes.sort();
        hashes.dedup();
        hashes
    }

    /// Get file index hashes, hex-encoded
    pub fn file_index_hashes(&self) -> Vec<String> {
        let mut hashes = Vec::new();
        for cdn_config in &self.cdn_configs {
            if let Some(file_index) = &cdn_config.file_index {
                hashes.push(hex::encode(file_index));
            }
        }
        hashes.sort();
        hashes.dedup();
        hashes
    }
}

/// Configuration discovery for CASC installations
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover all configuration files in a CASC installation
    pub fn discover_configs<P: AsRef<Path>>(wow_path: P) -> Result<WowConfigSet> {
        let wow_path = wow_path.as_ref();

        let config_dir = Self::find_config_directory(wow_path)?;
        debug!("Found config directory: {:?}", config_dir);

        let mut cdn_configs = Vec::new();
        let mut build_configs = Vec::new();

        let config_files = Self::scan_config_files(&config_dir)?;
        debug!("Found {} config files", config_files.len());

        for config_path in config_files {
            match Self::parse_config_file(&config_path)? {
                ConfigType::Cdn(cdn_config) => {
                    trace!("Found CDN config: {:?}", config_path.file_name());
                    cdn_configs.push(cdn_config);
                }
                ConfigType::Build(build_config) => {
                    trace!("Found build config: {:?}", config_path.file_name());
                    build_configs.push(build_config);
                }
                ConfigType::Unknown => {
                    trace!("Unknown config type: {:?}", config_path.file_name());
                }
            }
        }

        debug!(
            "Discovered {} CDN configs, {} build configs",
            cdn_configs.len(),
            build_configs.len()
        );

        Ok(WowConfigSet {
            cdn_configs,
            build_configs,
            config_dir,
        })
    }

    /// Find the config directory in a CASC installation
    fn find_config_directory<P: AsRef<Path>>(wow_path: P) -> Result<PathBuf> {
        let wow_path = wow_path.as_ref();

        let data_config = wow_path.join("Data").join("config");
        if data_config.exists() && data_config.is_dir() {
            return Ok(data_config);
        }

        let config_dir = wow_path.join("config");
        if config_dir.exists() && config_dir.is_dir() {
            return Ok(config_dir);
        }

        Err(CascError::InvalidIndexFormat(format!(
            "No config directory found in CASC installation: {wow_path:?}"
        )))
    }

    /// Scan for all config files in the config directory
    fn scan_config_files(config_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut config_files = Vec::new();

        // Config files are stored in hash-based subdirectories like ab/cd/abcd1234...
        for entry in fs::read_dir(config_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                if let Ok(subentries) = fs::read_dir(&path) {
                    for subentry in subentries {
                        let subentry = subentry?;
                        let subpath = subentry.path();

                        if subpath.is_dir() {
                            if let Ok(files) = fs::read_dir(&subpath) {
                                for file in files {
                                    let file = file?;
                                    let file_path = file.path();

                                    if file_path.is_file() {
                                        config_files.push(file_path);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        trace!("Scanned config files: {:?}", config_files);
        Ok(config_files)
    }

    /// Parse a config file and determine its type.
    ///
    /// Both `BuildConfig` and `CdnConfig` skip unknown keys rather than
    /// erroring, so a file is classified by which parse actually populated
    /// fields rather than by a separate key sniff.
    fn parse_config_file(path: &Path) -> Result<ConfigType> {
        let content = fs::read_to_string(path).map_err(CascError::Io)?;

        if content.trim().is_empty() {
            return Ok(ConfigType::Unknown);
        }

        let cdn_config = CdnConfig::parse_config(Cursor::new(content.as_bytes()))
            .map_err(|e| CascError::InvalidIndexFormat(format!("CDN config parse error: {e}")))?;
        if Self::is_cdn_config(&cdn_config) {
            return Ok(ConfigType::Cdn(cdn_config));
        }

        let build_config = BuildConfig::parse_config(Cursor::new(content.as_bytes())).map_err(
            |e| CascError::InvalidIndexFormat(format!("Build config parse error: {e}")),
        )?;
        if Self::is_build_config(&build_config) {
            return Ok(ConfigType::Build(build_config));
        }

        Ok(ConfigType::Unknown)
    }

    /// Check if a parsed config is a CDN config based on which fields populated
    fn is_cdn_config(config: &CdnConfig) -> bool {
        config.archives.is_some() || config.archive_group.is_some() || config.file_index.is_some()
    }

    /// Check if a parsed config is a build config based on which fields populated
    fn is_build_config(config: &BuildConfig) -> bool {
        config.root.is_some()
            || config.encoding.is_some()
            || config.install.is_some()
            || config.build_name.is_some()
    }
}

/// Type of configuration file
#[derive(Debug)]
enum ConfigType {
    /// CDN configuration
    Cdn(CdnConfig),
    /// Build configuration
    Build(BuildConfig),
    /// Unknown or unsupported type
    Unknown,
}
