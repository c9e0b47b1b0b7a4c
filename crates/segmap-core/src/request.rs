//! Placement requests and their validation.
//!
//! A [`PlanRequest`] holds raw caller input. [`PlanRequest::validate`]
//! checks it in one pass and produces a [`ValidatedRequest`], the only
//! thing the allocators accept.

use std::collections::BTreeSet;

use crate::error::ConfigError;
use crate::layout::{Directories, PortLayout, DEFAULT_HOST_PREFIX, GROUP_SIZE};
use crate::mirror::MirrorPolicy;

/// First dbid issued when initializing a cluster. dbid 1 is the master.
pub const INIT_FIRST_DBID: u32 = 2;

/// First content id issued when initializing a cluster.
pub const INIT_FIRST_CONTENT: u32 = 0;

/// Identifier high-water marks of a running cluster being expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expansion {
    /// Number of hosts being added. Must be a multiple of 4.
    pub hosts_added: usize,
    /// Largest content id already in use.
    pub max_content: u32,
    /// Largest dbid already in use.
    pub max_dbid: u32,
}

/// What kind of manifest is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Lay out a fresh cluster.
    Init,
    /// Append host groups to a running cluster.
    Expand(Expansion),
}

impl Mode {
    /// Builds a mode from independent command-line style flags.
    ///
    /// Exactly one of `init` / `expand` must be set. In expansion mode a
    /// non-zero `hosts_added` and both high-water marks are required.
    pub fn from_flags(
        init: bool,
        expand: bool,
        hosts_added: Option<usize>,
        max_content: Option<u32>,
        max_dbid: Option<u32>,
    ) -> Result<Mode, ConfigError> {
        match (init, expand) {
            (true, false) => Ok(Mode::Init),
            (false, true) => {
                let hosts_added = match hosts_added {
                    Some(n) if n > 0 => n,
                    _ => return Err(ConfigError::MissingHostsAdded),
                };
                let max_content =
                    max_content.ok_or(ConfigError::MissingHighWaterMark("content id"))?;
                let max_dbid = max_dbid.ok_or(ConfigError::MissingHighWaterMark("dbid"))?;
                Ok(Mode::Expand(Expansion {
                    hosts_added,
                    max_content,
                    max_dbid,
                }))
            }
            _ => Err(ConfigError::ModeSelection),
        }
    }

    pub fn is_expansion(&self) -> bool {
        matches!(self, Mode::Expand(_))
    }
}

/// Raw input to the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    /// Hosts in the cluster. In expansion mode, hosts already running.
    pub host_count: usize,
    pub segments_per_host: usize,
    /// Primary directory roots; `None` selects the defaults.
    pub primary_dirs: Option<Vec<String>>,
    /// Mirror directory roots; must be given together with `primary_dirs`.
    pub mirror_dirs: Option<Vec<String>>,
    pub mode: Mode,
    pub ports: PortLayout,
    pub host_prefix: String,
}

impl PlanRequest {
    /// Creates a request using default directories, ports and host names.
    pub fn new(host_count: usize, segments_per_host: usize, mode: Mode) -> Self {
        Self {
            host_count,
            segments_per_host,
            primary_dirs: None,
            mirror_dirs: None,
            mode,
            ports: PortLayout::default(),
            host_prefix: DEFAULT_HOST_PREFIX.to_string(),
        }
    }

    /// Sets both directory lists.
    pub fn with_directories(mut self, primary: Vec<String>, mirror: Vec<String>) -> Self {
        self.primary_dirs = Some(primary);
        self.mirror_dirs = Some(mirror);
        self
    }

    pub fn with_ports(mut self, ports: PortLayout) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_host_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.host_prefix = prefix.into();
        self
    }

    /// Checks every constraint the allocators rely on.
    pub fn validate(&self) -> Result<ValidatedRequest, ConfigError> {
        if self.host_count == 0 || self.segments_per_host == 0 {
            return Err(ConfigError::MissingCounts);
        }

        let directories = match (&self.primary_dirs, &self.mirror_dirs) {
            (None, None) => Directories::default(),
            (Some(primary), Some(mirror)) => check_directories(primary, mirror)?,
            _ => return Err(ConfigError::UnpairedDirectories),
        };

        match self.mode {
            Mode::Init => {
                if self.host_count >= GROUP_SIZE && self.host_count % GROUP_SIZE != 0 {
                    return Err(ConfigError::HostsNotGroupAligned(self.host_count));
                }
            }
            Mode::Expand(expansion) => {
                if self.host_count < GROUP_SIZE {
                    return Err(ConfigError::ExpansionTooSmall(self.host_count));
                }
                if expansion.hosts_added == 0 {
                    return Err(ConfigError::MissingHostsAdded);
                }
                if expansion.hosts_added % GROUP_SIZE != 0 {
                    return Err(ConfigError::AddedNotGroupAligned(expansion.hosts_added));
                }
            }
        }

        if self.segments_per_host % directories.len() != 0 {
            return Err(ConfigError::UnevenDirectories {
                segments: self.segments_per_host,
                directories: directories.len(),
            });
        }

        if self.mode == Mode::Init && self.host_count < 2 {
            return Err(ConfigError::SingleHost(self.host_count));
        }

        let (first_host, new_hosts, first_dbid, first_content) = match self.mode {
            Mode::Init => (1, self.host_count, INIT_FIRST_DBID, INIT_FIRST_CONTENT),
            Mode::Expand(e) => (
                self.host_count
                    .checked_add(1)
                    .ok_or(ConfigError::IdentifierOverflow("host offset"))?,
                e.hosts_added,
                e.max_dbid
                    .checked_add(1)
                    .ok_or(ConfigError::IdentifierOverflow("dbid"))?,
                e.max_content
                    .checked_add(1)
                    .ok_or(ConfigError::IdentifierOverflow("content id"))?,
            ),
        };

        // host names run up to first_host + new_hosts - 1
        if first_host.checked_add(new_hosts).is_none() {
            return Err(ConfigError::IdentifierOverflow("host offset"));
        }

        // primaries and mirrors each take one dbid; primaries alone take
        // one content id. the counters left after the run must fit too.
        let segments = new_hosts
            .checked_mul(self.segments_per_host)
            .ok_or(ConfigError::IdentifierOverflow("content id"))?;
        if first_content as u64 + segments as u64 > u32::MAX as u64 {
            return Err(ConfigError::IdentifierOverflow("content id"));
        }
        if first_dbid as u64 + 2 * segments as u64 > u32::MAX as u64 {
            return Err(ConfigError::IdentifierOverflow("dbid"));
        }

        let batches: Vec<HostBatch> = if new_hosts < GROUP_SIZE {
            vec![HostBatch {
                first_host,
                policy: MirrorPolicy::small_cluster(new_hosts),
            }]
        } else {
            (0..new_hosts / GROUP_SIZE)
                .map(|g| HostBatch {
                    first_host: first_host + g * GROUP_SIZE,
                    policy: MirrorPolicy::host_group(),
                })
                .collect()
        };

        let mirror_slots = batches
            .iter()
            .map(|b| b.policy.max_mirrors_per_host(self.segments_per_host))
            .max()
            .unwrap_or(self.segments_per_host);
        self.ports
            .check(self.segments_per_host, mirror_slots)
            .map_err(|detail| ConfigError::PortLayout {
                segments: self.segments_per_host,
                detail,
            })?;

        Ok(ValidatedRequest {
            mode: self.mode,
            segments_per_host: self.segments_per_host,
            directories,
            ports: self.ports,
            host_prefix: self.host_prefix.clone(),
            batches,
            first_dbid,
            first_content,
        })
    }
}

fn check_directories(primary: &[String], mirror: &[String]) -> Result<Directories, ConfigError> {
    if primary.iter().any(|d| d.is_empty()) {
        return Err(ConfigError::EmptyDirectory { role: "primary" });
    }
    if mirror.iter().any(|d| d.is_empty()) {
        return Err(ConfigError::EmptyDirectory { role: "mirror" });
    }
    if primary.len() != mirror.len() {
        return Err(ConfigError::DirectoryCountMismatch {
            primary: primary.len(),
            mirror: mirror.len(),
        });
    }

    let primary_set: BTreeSet<&str> = primary.iter().map(String::as_str).collect();
    let mirror_set: BTreeSet<&str> = mirror.iter().map(String::as_str).collect();

    let overlap: Vec<String> = primary_set
        .intersection(&mirror_set)
        .map(|d| d.to_string())
        .collect();
    if !overlap.is_empty() {
        return Err(ConfigError::OverlappingDirectories(overlap));
    }
    if primary_set.len() != primary.len() {
        return Err(ConfigError::DuplicateDirectory { role: "primary" });
    }
    if mirror_set.len() != mirror.len() {
        return Err(ConfigError::DuplicateDirectory { role: "mirror" });
    }

    Ok(Directories::new_unchecked(primary.to_vec(), mirror.to_vec()))
}

/// A run of consecutive hosts whose mirrors are balanced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostBatch {
    /// 1-based offset of the first host, used for its name.
    pub first_host: usize,
    pub policy: MirrorPolicy,
}

impl HostBatch {
    pub fn len(&self) -> usize {
        self.policy.pool_size
    }

    pub fn is_empty(&self) -> bool {
        self.policy.pool_size == 0
    }
}

/// A request that passed validation. Allocation over it is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub(crate) mode: Mode,
    pub(crate) segments_per_host: usize,
    pub(crate) directories: Directories,
    pub(crate) ports: PortLayout,
    pub(crate) host_prefix: String,
    pub(crate) batches: Vec<HostBatch>,
    pub(crate) first_dbid: u32,
    pub(crate) first_content: u32,
}

impl ValidatedRequest {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Host batches in allocation order.
    pub fn batches(&self) -> &[HostBatch] {
        &self.batches
    }

    pub fn directories(&self) -> &Directories {
        &self.directories
    }

    pub fn first_dbid(&self) -> u32 {
        self.first_dbid
    }

    pub fn first_content(&self) -> u32 {
        self.first_content
    }
}
