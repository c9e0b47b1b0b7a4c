//! Error types for plan validation.

/// Reasons a placement request is rejected.
///
/// Every variant is fatal: validation runs before any allocation work,
/// and once a request passes, allocation cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Host count or segments-per-host was zero.
    #[error(
        "you must specify both the number of segment hosts and the number of segments on each host"
    )]
    MissingCounts,

    /// Only one of the primary/mirror directory lists was supplied.
    #[error("you must either specify directories for both primaries and mirrors or use defaults for both")]
    UnpairedDirectories,

    /// Neither or both of init and expansion mode were selected.
    #[error("you should either specify init system mode or expansion mode")]
    ModeSelection,

    /// Expansion mode without a number of hosts to add.
    #[error("in expansion mode you must specify the number of segment hosts added")]
    MissingHostsAdded,

    /// Expansion mode without the existing identifier high-water marks.
    #[error("in expansion mode you must specify the maximal existing {0}")]
    MissingHighWaterMark(&'static str),

    /// A directory list contained an empty entry.
    #[error("{role} directory list contains an empty entry")]
    EmptyDirectory { role: &'static str },

    /// Primary and mirror directory lists have different lengths.
    #[error(
        "number of directories for primaries ({primary}) should be the same as the number of directories for mirrors ({mirror})"
    )]
    DirectoryCountMismatch { primary: usize, mirror: usize },

    /// Some directories appear in both lists.
    #[error("primaries and mirrors cannot be put to the same directory. the overlapping ones are: {}", .0.join(", "))]
    OverlappingDirectories(Vec<String>),

    /// A directory list repeats an entry.
    #[error("list of {role} directories contains non-unique entries, while only unique entries are allowed")]
    DuplicateDirectory { role: &'static str },

    /// Initialization with 4 or more hosts that do not split into groups of 4.
    #[error(
        "initialization uses redundancy groups of 4 segment hosts; {0} hosts cannot be split into groups of 4"
    )]
    HostsNotGroupAligned(usize),

    /// Expansion of a cluster with fewer than 4 hosts.
    #[error("cannot expand a system with less than 4 segment hosts (got {0})")]
    ExpansionTooSmall(usize),

    /// Expansion by a host count that is not a multiple of 4.
    #[error("the system can only be expanded in chunks of 4 segment hosts, got {0} hosts added")]
    AddedNotGroupAligned(usize),

    /// Segments cannot be spread evenly over the directories.
    #[error("{segments} segments cannot be evenly distributed in {directories} directories")]
    UnevenDirectories { segments: usize, directories: usize },

    /// A single host leaves no peer to hold mirrors.
    #[error("mirroring needs at least 2 segment hosts, got {0}")]
    SingleHost(usize),

    /// Two port ranges collide or a range runs past 65535.
    #[error("port ranges for {segments} segments per host overlap or exceed 65535: {detail}")]
    PortLayout { segments: usize, detail: String },

    /// The dbid or content sequence would not fit in 32 bits.
    #[error("{0} sequence would overflow")]
    IdentifierOverflow(&'static str),
}
