//! Segment records and the physical layout they are placed into.
//!
//! A layout is everything about a placement that is not decided by the
//! balancing algorithm: host naming, port bases, and directory roots.

use std::fmt;

/// Number of hosts balanced together as one fault-tolerance unit.
pub const GROUP_SIZE: usize = 4;

/// Default host name prefix. Hosts are named `sdw1`, `sdw2`, ...
pub const DEFAULT_HOST_PREFIX: &str = "sdw";

/// Directory roots used for primaries when none are supplied.
pub const DEFAULT_PRIMARY_DIRS: [&str; 2] = ["/data1/primary", "/data2/primary"];

/// Directory roots used for mirrors when none are supplied.
pub const DEFAULT_MIRROR_DIRS: [&str; 2] = ["/data1/mirror", "/data2/mirror"];

/// Per-segment directory name prefix; the content id is appended.
const SEGMENT_DIR_PREFIX: &str = "gpseg";

/// Whether a segment is the authoritative copy or its standby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Mirror,
}

impl Role {
    /// Single-letter tag used in expansion manifests.
    pub fn tag(self) -> char {
        match self {
            Role::Primary => 'p',
            Role::Mirror => 'm',
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Mirror => write!(f, "mirror"),
        }
    }
}

/// One physical segment process: where it lives and how it is numbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRecord {
    pub host: String,
    pub dbid: u32,
    pub content: u32,
    pub port: u16,
    pub replication_port: u16,
    pub directory: String,
    pub role: Role,
}

/// Base ports for each segment role. Slot `n` on a host listens on
/// `base + n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortLayout {
    pub primary: u16,
    pub primary_replication: u16,
    pub mirror: u16,
    pub mirror_replication: u16,
}

impl Default for PortLayout {
    fn default() -> Self {
        Self {
            primary: 1025,
            primary_replication: 1089,
            mirror: 1153,
            mirror_replication: 1217,
        }
    }
}

impl PortLayout {
    /// Checks that each base has room for its slots below 65536 and that
    /// no two of the four ranges intersect. Primary ranges span
    /// `primary_slots` ports, mirror ranges `mirror_slots`.
    ///
    /// Returns a description of the first conflict found.
    pub fn check(&self, primary_slots: usize, mirror_slots: usize) -> Result<(), String> {
        let ranges = [
            ("primary", self.primary as usize, primary_slots),
            ("primary replication", self.primary_replication as usize, primary_slots),
            ("mirror", self.mirror as usize, mirror_slots),
            ("mirror replication", self.mirror_replication as usize, mirror_slots),
        ];
        for (name, base, span) in ranges {
            let end = base + span;
            if end > u16::MAX as usize + 1 {
                return Err(format!("{name} range {base}..{end} exceeds 65535"));
            }
        }
        for (i, &(a_name, a, a_span)) in ranges.iter().enumerate() {
            for &(b_name, b, b_span) in &ranges[i + 1..] {
                if a < b + b_span && b < a + a_span {
                    return Err(format!("{a_name} and {b_name} ranges intersect"));
                }
            }
        }
        Ok(())
    }

    /// `(port, replication_port)` for a role at a slot on one host.
    ///
    /// Callers must have passed [`PortLayout::check`] with a span larger
    /// than `slot`.
    pub(crate) fn ports_for(&self, role: Role, slot: usize) -> (u16, u16) {
        let slot = slot as u16;
        match role {
            Role::Primary => (self.primary + slot, self.primary_replication + slot),
            Role::Mirror => (self.mirror + slot, self.mirror_replication + slot),
        }
    }
}

/// Validated primary and mirror directory roots.
///
/// Both lists are non-empty, equally long, duplicate-free and disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    primary: Vec<String>,
    mirror: Vec<String>,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_DIRS.iter().map(|d| d.to_string()).collect(),
            mirror: DEFAULT_MIRROR_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl Directories {
    pub(crate) fn new_unchecked(primary: Vec<String>, mirror: Vec<String>) -> Self {
        Self { primary, mirror }
    }

    /// Number of directory roots per role.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn primary(&self) -> &[String] {
        &self.primary
    }

    pub fn mirror(&self) -> &[String] {
        &self.mirror
    }

    /// Full segment directory for a role at a directory slot.
    pub(crate) fn segment_dir(&self, role: Role, slot: usize, content: u32) -> String {
        let roots = match role {
            Role::Primary => &self.primary,
            Role::Mirror => &self.mirror,
        };
        let root = &roots[slot % roots.len()];
        format!("{root}/{SEGMENT_DIR_PREFIX}{content}")
    }
}

/// Splits a colon-separated directory list (`/data1/p:/data2/p`).
///
/// Entries are kept verbatim, including empty ones, so validation can
/// report them.
pub fn split_dir_list(list: &str) -> Vec<String> {
    list.split(':').map(str::to_string).collect()
}

/// Name of the host at a 1-based offset within the run.
pub fn host_name(prefix: &str, offset: usize) -> String {
    format!("{prefix}{offset}")
}
