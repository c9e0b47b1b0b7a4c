//! Configuration file support.
//!
//! Settings resolve in order: built-in defaults, then the TOML file given
//! with `--config`, then environment variables and command-line flags.
//! The file covers layout details that rarely change between runs (host
//! naming, port bases, directory roots, the init preamble); cluster size
//! and mode come from the command line.

use std::path::Path;

use segmap_core::{MasterSegment, PortLayout, Preamble, DEFAULT_HOST_PREFIX};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmapConfig {
    /// Host name prefix; host `n` is named `<prefix><n>`.
    pub host_prefix: String,
    /// Primary directory roots. Must be set together with `mirror_dirs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_dirs: Option<Vec<String>>,
    /// Mirror directory roots. Must be set together with `primary_dirs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_dirs: Option<Vec<String>>,
    pub ports: PortsConfig,
    pub manifest: ManifestConfig,
}

impl Default for SegmapConfig {
    fn default() -> Self {
        Self {
            host_prefix: DEFAULT_HOST_PREFIX.to_string(),
            primary_dirs: None,
            mirror_dirs: None,
            ports: PortsConfig::default(),
            manifest: ManifestConfig::default(),
        }
    }
}

/// `[ports]`: base port per segment role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortsConfig {
    pub primary: u16,
    pub primary_replication: u16,
    pub mirror: u16,
    pub mirror_replication: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        let ports = PortLayout::default();
        Self {
            primary: ports.primary,
            primary_replication: ports.primary_replication,
            mirror: ports.mirror,
            mirror_replication: ports.mirror_replication,
        }
    }
}

/// `[manifest]`: settings written ahead of the segment arrays of an
/// init manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    pub array_name: String,
    pub trusted_shell: String,
    pub check_point_segments: u32,
    pub encoding: String,
    pub master_host: String,
    pub master_port: u16,
    pub master_directory: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        let p = Preamble::default();
        Self {
            array_name: p.array_name,
            trusted_shell: p.trusted_shell,
            check_point_segments: p.check_point_segments,
            encoding: p.encoding,
            master_host: p.master.host,
            master_port: p.master.port,
            master_directory: p.master.directory,
        }
    }
}

impl SegmapConfig {
    /// Loads a TOML configuration file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file '{}': {e}", path.display()))?;
        Self::from_toml(&text)
            .map_err(|e| format!("invalid config file '{}': {e}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Serializes the configuration, used for `--config-template`.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("failed to serialize config: {e}"))
    }

    pub fn port_layout(&self) -> PortLayout {
        PortLayout {
            primary: self.ports.primary,
            primary_replication: self.ports.primary_replication,
            mirror: self.ports.mirror,
            mirror_replication: self.ports.mirror_replication,
        }
    }

    pub fn preamble(&self) -> Preamble {
        let m = &self.manifest;
        Preamble {
            array_name: m.array_name.clone(),
            trusted_shell: m.trusted_shell.clone(),
            check_point_segments: m.check_point_segments,
            encoding: m.encoding.clone(),
            master: MasterSegment {
                host: m.master_host.clone(),
                port: m.master_port,
                directory: m.master_directory.clone(),
            },
        }
    }
}
