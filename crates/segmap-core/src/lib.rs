//! segmap-core: segment placement planning for shared-nothing clusters.
//!
//! Given a number of segment hosts and segments per host, this crate lays
//! out every primary segment and its mirror: host, ports, data directory,
//! dbid and content id. It then renders the layout as a cluster manifest.
//!
//! # Architecture
//!
//! A plan is built in one pass, leaf to root:
//!
//! - **Validation** ([`PlanRequest::validate`]): mode, directory lists,
//!   divisibility and group-alignment rules, port and identifier ranges
//! - **Primaries**: host-major, one per directory slot, numbered in order
//! - **Mirrors**: greedy balancing inside groups of 4 hosts, or over the
//!   whole cluster when it has fewer than 4 hosts
//! - **Rendering** ([`render`]): init or expansion manifest text
//!
//! Expansion runs allocate only the added host groups and continue the
//! dbid and content sequences after the caller's high-water marks.
//!
//! # Quick Start
//!
//! ```rust
//! use segmap_core::{build_plan, render, Mode, PlanRequest, Preamble};
//!
//! let plan = build_plan(&PlanRequest::new(4, 2, Mode::Init))?;
//! assert_eq!(plan.segment_count(), 8);
//!
//! let manifest = render(&plan, &Preamble::default());
//! assert!(manifest.contains("sdw1:1025:/data1/primary/gpseg0:2:0:1089"));
//! # Ok::<(), segmap_core::ConfigError>(())
//! ```

mod error;
mod layout;
mod manifest;
mod mirror;
mod plan;
mod primary;
mod request;

pub use error::ConfigError;
pub use layout::{
    host_name, split_dir_list, Directories, PortLayout, Role, SegmentRecord, DEFAULT_HOST_PREFIX,
    DEFAULT_MIRROR_DIRS, DEFAULT_PRIMARY_DIRS, GROUP_SIZE,
};
pub use manifest::{render, ExpansionManifest, InitManifest, MasterSegment, Preamble};
pub use mirror::{BalanceTable, MirrorPolicy};
pub use plan::{build_plan, plan_validated, ClusterPlan, Counters};
pub use request::{
    Expansion, HostBatch, Mode, PlanRequest, ValidatedRequest, INIT_FIRST_CONTENT,
    INIT_FIRST_DBID,
};
