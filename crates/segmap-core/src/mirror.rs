//! Mirror placement.
//!
//! Each primary gets exactly one mirror on a different host of its batch.
//! Mirror hosts are chosen greedily: the candidate holding the fewest
//! mirrors wins, and among equally loaded candidates the one that has
//! mirrored the fewest primaries of this particular primary host wins.
//! The second rule keeps two hosts from becoming each other's only
//! mirror partner, so losing one host spreads its load over several
//! peers.
//!
//! Clusters smaller than one host group balance over all hosts and skip
//! the second rule.
//!
//! A mirror's port and directory come from its position on the mirror
//! host. Inside a group every host receives exactly one mirror per slot
//! sweep, so that position equals the primary's directory slot. Small
//! clusters can hand one host two mirrors from the same slot; numbering
//! by position keeps their ports apart.

use tracing::trace;

use crate::layout::{host_name, Role, SegmentRecord, GROUP_SIZE};
use crate::plan::Counters;
use crate::request::{HostBatch, ValidatedRequest};

/// How mirror hosts are chosen within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorPolicy {
    /// Hosts in the batch; every one of them is a mirror candidate.
    pub pool_size: usize,
    /// Break mirror-count ties by how often the candidate already
    /// mirrors the same primary host.
    pub cross_pair_tiebreak: bool,
}

impl MirrorPolicy {
    /// Policy for a full group of [`GROUP_SIZE`] hosts.
    pub const fn host_group() -> Self {
        Self {
            pool_size: GROUP_SIZE,
            cross_pair_tiebreak: true,
        }
    }

    /// Policy for a cluster with fewer hosts than one group.
    pub const fn small_cluster(hosts: usize) -> Self {
        Self {
            pool_size: hosts,
            cross_pair_tiebreak: false,
        }
    }

    /// Most mirrors any single host ends up with when every host holds
    /// `segments_per_host` primaries.
    ///
    /// Groups and two-host clusters stay exactly even. Three hosts
    /// balanced on mirror count alone leave one host a mirror ahead when
    /// the slot count is odd.
    pub fn max_mirrors_per_host(&self, segments_per_host: usize) -> usize {
        if self.pool_size == 3 && !self.cross_pair_tiebreak {
            segments_per_host + segments_per_host % 2
        } else {
            segments_per_host
        }
    }
}

/// Running load counters for one batch, indexed by host slot in the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceTable {
    /// Mirrors held by each host so far.
    mirror_count: [usize; GROUP_SIZE],
    /// `cross_pair[p][m]`: primaries of host `p` mirrored on host `m`.
    cross_pair: [[usize; GROUP_SIZE]; GROUP_SIZE],
}

impl BalanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the mirror host for a primary living on `primary_host`.
    ///
    /// Scans candidates in ascending slot order and keeps the first one
    /// with the smallest `(mirror_count, cross_pair)` key, or the smallest
    /// `mirror_count` when the policy has no cross-pair tie-break. The
    /// pool must hold at least two hosts.
    pub fn choose(&self, policy: MirrorPolicy, primary_host: usize) -> usize {
        debug_assert!(policy.pool_size >= 2 && policy.pool_size <= GROUP_SIZE);
        debug_assert!(primary_host < policy.pool_size);

        let key = |candidate: usize| {
            let pair = if policy.cross_pair_tiebreak {
                self.cross_pair[primary_host][candidate]
            } else {
                0
            };
            (self.mirror_count[candidate], pair)
        };

        let mut best = if primary_host == 0 { 1 } else { 0 };
        for candidate in best + 1..policy.pool_size {
            if candidate != primary_host && key(candidate) < key(best) {
                best = candidate;
            }
        }
        best
    }

    /// Records a mirror of a `primary_host` primary placed on `mirror_host`.
    pub fn record(&mut self, primary_host: usize, mirror_host: usize) {
        self.mirror_count[mirror_host] += 1;
        self.cross_pair[primary_host][mirror_host] += 1;
    }

    pub fn mirror_count(&self, host: usize) -> usize {
        self.mirror_count[host]
    }

    pub fn cross_pair(&self, primary_host: usize, mirror_host: usize) -> usize {
        self.cross_pair[primary_host][mirror_host]
    }
}

/// Places a mirror for every primary of one batch.
///
/// Primaries are visited slot by slot: for each directory slot, every
/// host's primary in that slot gets its mirror before the next slot
/// starts. Each mirror takes the next dbid and keeps its primary's content
/// id. Returns one mirror list per host in the batch, in the order mirrors
/// were assigned to that host.
pub(crate) fn allocate_mirrors(
    request: &ValidatedRequest,
    batch: HostBatch,
    primaries: &[Vec<SegmentRecord>],
    counters: &mut Counters,
) -> Vec<Vec<SegmentRecord>> {
    let policy = batch.policy;
    let mut table = BalanceTable::new();
    let mut mirrors: Vec<Vec<SegmentRecord>> = vec![Vec::new(); batch.len()];

    for slot in 0..request.segments_per_host {
        for (primary_host, host_primaries) in primaries.iter().enumerate() {
            let content = host_primaries[slot].content;
            let mirror_host = table.choose(policy, primary_host);
            table.record(primary_host, mirror_host);

            let dbid = counters.next_mirror();
            let mirror_slot = mirrors[mirror_host].len();
            let (port, replication_port) = request.ports.ports_for(Role::Mirror, mirror_slot);
            let host = host_name(&request.host_prefix, batch.first_host + mirror_host);
            trace!(content, dbid, primary = primary_host, mirror = %host, "placed mirror");

            mirrors[mirror_host].push(SegmentRecord {
                host,
                dbid,
                content,
                port,
                replication_port,
                directory: request
                    .directories
                    .segment_dir(Role::Mirror, mirror_slot, content),
                role: Role::Mirror,
            });
        }
    }

    mirrors
}
