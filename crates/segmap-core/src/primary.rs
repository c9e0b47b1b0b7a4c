//! Primary segment allocation.

use crate::layout::{host_name, Role, SegmentRecord};
use crate::plan::Counters;
use crate::request::{HostBatch, ValidatedRequest};

/// Lays out the primaries of one host batch.
///
/// Hosts are visited in order and each host gets one primary per
/// directory slot, so dbid and content both advance by one per record in
/// host-major order. Returns one record list per host in the batch.
pub(crate) fn allocate_primaries(
    request: &ValidatedRequest,
    batch: HostBatch,
    counters: &mut Counters,
) -> Vec<Vec<SegmentRecord>> {
    (0..batch.len())
        .map(|h| {
            let host = host_name(&request.host_prefix, batch.first_host + h);
            (0..request.segments_per_host)
                .map(|slot| {
                    let (dbid, content) = counters.next_primary();
                    let (port, replication_port) = request.ports.ports_for(Role::Primary, slot);
                    SegmentRecord {
                        host: host.clone(),
                        dbid,
                        content,
                        port,
                        replication_port,
                        directory: request.directories.segment_dir(Role::Primary, slot, content),
                        role: Role::Primary,
                    }
                })
                .collect()
        })
        .collect()
}
