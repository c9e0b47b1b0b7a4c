//! Whole-cluster planning: validation, then primaries and mirrors batch by
//! batch.

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::layout::SegmentRecord;
use crate::mirror::allocate_mirrors;
use crate::primary::allocate_primaries;
use crate::request::{Mode, PlanRequest, ValidatedRequest};

/// The dbid and content sequences shared by every allocation in a run.
///
/// Validation guarantees neither sequence overflows for the records a
/// request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    next_dbid: u32,
    next_content: u32,
}

impl Counters {
    pub fn new(next_dbid: u32, next_content: u32) -> Self {
        Self {
            next_dbid,
            next_content,
        }
    }

    /// Issues a dbid and a fresh content id for a primary.
    pub(crate) fn next_primary(&mut self) -> (u32, u32) {
        let ids = (self.next_dbid, self.next_content);
        self.next_dbid += 1;
        self.next_content += 1;
        ids
    }

    /// Issues a dbid for a mirror. Mirrors reuse their primary's content.
    pub(crate) fn next_mirror(&mut self) -> u32 {
        let dbid = self.next_dbid;
        self.next_dbid += 1;
        dbid
    }

    pub fn next_dbid(&self) -> u32 {
        self.next_dbid
    }

    pub fn next_content(&self) -> u32 {
        self.next_content
    }
}

/// A complete placement: per-host primary lists, per-host mirror lists,
/// and the counters left after the last allocation.
///
/// Host lists are in host order. Within a host, records appear in the
/// order they were assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPlan {
    mode: Mode,
    primaries: Vec<Vec<SegmentRecord>>,
    mirrors: Vec<Vec<SegmentRecord>>,
    counters: Counters,
}

impl ClusterPlan {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn primaries(&self) -> &[Vec<SegmentRecord>] {
        &self.primaries
    }

    pub fn mirrors(&self) -> &[Vec<SegmentRecord>] {
        &self.mirrors
    }

    /// Number of hosts that received segments.
    pub fn host_count(&self) -> usize {
        self.primaries.len()
    }

    /// Number of primaries, which is also the number of mirrors.
    pub fn segment_count(&self) -> usize {
        self.primaries.iter().map(Vec::len).sum()
    }

    /// The dbid the next allocation would receive.
    pub fn next_dbid(&self) -> u32 {
        self.counters.next_dbid()
    }

    /// The content id the next primary would receive.
    pub fn next_content(&self) -> u32 {
        self.counters.next_content()
    }

    /// Largest dbid in the plan. Feed this to a later expansion.
    pub fn max_dbid(&self) -> u32 {
        self.counters.next_dbid() - 1
    }

    /// Largest content id in the plan. Feed this to a later expansion.
    pub fn max_content(&self) -> u32 {
        self.counters.next_content() - 1
    }
}

/// Validates a request and computes its plan.
///
/// The only failure is a rejected request; given the same request the
/// result is always identical.
pub fn build_plan(request: &PlanRequest) -> Result<ClusterPlan, ConfigError> {
    let validated = request.validate()?;
    Ok(plan_validated(&validated))
}

/// Computes the plan for an already validated request.
pub fn plan_validated(request: &ValidatedRequest) -> ClusterPlan {
    let mut counters = Counters::new(request.first_dbid, request.first_content);
    let mut primaries = Vec::new();
    let mut mirrors = Vec::new();

    for &batch in request.batches() {
        debug!(
            first_host = batch.first_host,
            hosts = batch.len(),
            cross_pair_tiebreak = batch.policy.cross_pair_tiebreak,
            "allocating host batch"
        );
        let batch_primaries = allocate_primaries(request, batch, &mut counters);
        let batch_mirrors = allocate_mirrors(request, batch, &batch_primaries, &mut counters);
        primaries.extend(batch_primaries);
        mirrors.extend(batch_mirrors);
    }

    let plan = ClusterPlan {
        mode: request.mode,
        primaries,
        mirrors,
        counters,
    };
    info!(
        hosts = plan.host_count(),
        segments = plan.segment_count(),
        max_dbid = plan.max_dbid(),
        max_content = plan.max_content(),
        "segment plan computed"
    );
    plan
}
