//! Plan-wide properties checked over a sweep of cluster shapes.

use std::collections::{BTreeMap, HashMap, HashSet};

use segmap_core::{
    build_plan, render, ClusterPlan, Expansion, Mode, PlanRequest, Preamble, Role, SegmentRecord,
    GROUP_SIZE,
};

fn single_dirs() -> (Vec<String>, Vec<String>) {
    (vec!["/p".into()], vec!["/m".into()])
}

fn three_dirs() -> (Vec<String>, Vec<String>) {
    (
        vec!["/d1/p".into(), "/d2/p".into(), "/d3/p".into()],
        vec!["/d1/m".into(), "/d2/m".into(), "/d3/m".into()],
    )
}

/// Init requests for every valid host count up to 24 with a few
/// directory shapes.
fn init_requests() -> Vec<PlanRequest> {
    let mut out = Vec::new();
    let host_counts = [2, 3, 4, 8, 12, 16, 20, 24];
    for hosts in host_counts {
        for segs in 1..=6 {
            let (p, m) = single_dirs();
            out.push(PlanRequest::new(hosts, segs, Mode::Init).with_directories(p, m));
            if segs % 2 == 0 {
                out.push(PlanRequest::new(hosts, segs, Mode::Init));
            }
            if segs % 3 == 0 {
                let (p, m) = three_dirs();
                out.push(PlanRequest::new(hosts, segs, Mode::Init).with_directories(p, m));
            }
        }
    }
    out
}

fn all_records(plan: &ClusterPlan) -> impl Iterator<Item = &SegmentRecord> {
    plan.primaries().iter().chain(plan.mirrors()).flatten()
}

#[test]
fn primary_and_mirror_counts_match_hosts_times_segments() {
    for req in init_requests() {
        let plan = build_plan(&req).unwrap();
        let expected = req.host_count * req.segments_per_host;
        let primaries: usize = plan.primaries().iter().map(Vec::len).sum();
        let mirrors: usize = plan.mirrors().iter().map(Vec::len).sum();
        assert_eq!(primaries, expected, "{req:?}");
        assert_eq!(mirrors, expected, "{req:?}");
        assert!(plan.primaries().iter().all(|h| h.len() == req.segments_per_host));
    }
}

#[test]
fn every_content_has_one_mirror_on_another_host() {
    for req in init_requests() {
        let plan = build_plan(&req).unwrap();
        let primary_host: HashMap<u32, &str> = plan
            .primaries()
            .iter()
            .flatten()
            .map(|r| (r.content, r.host.as_str()))
            .collect();

        let mut seen = HashSet::new();
        for m in plan.mirrors().iter().flatten() {
            assert!(seen.insert(m.content), "content {} mirrored twice", m.content);
            let host = primary_host.get(&m.content).copied();
            assert!(host.is_some(), "mirror for unknown content {}", m.content);
            assert_ne!(host, Some(m.host.as_str()), "self-mirror for {}", m.content);
        }
        assert_eq!(seen.len(), primary_host.len());
    }
}

#[test]
fn mirror_load_within_a_group_differs_by_at_most_one() {
    for req in init_requests().into_iter().filter(|r| r.host_count >= GROUP_SIZE) {
        let plan = build_plan(&req).unwrap();
        for group in plan.mirrors().chunks(GROUP_SIZE) {
            let counts: Vec<usize> = group.iter().map(Vec::len).collect();
            let max = counts.iter().max().copied().unwrap_or(0);
            let min = counts.iter().min().copied().unwrap_or(0);
            assert!(max - min <= 1, "{req:?}: {counts:?}");
        }
    }
}

#[test]
fn dbids_are_gapless_from_two() {
    for req in init_requests() {
        let plan = build_plan(&req).unwrap();
        let mut dbids: Vec<u32> = all_records(&plan).map(|r| r.dbid).collect();
        dbids.sort_unstable();
        let expected: Vec<u32> = (2..2 + dbids.len() as u32).collect();
        assert_eq!(dbids, expected, "{req:?}");
        assert_eq!(plan.next_dbid(), 2 + dbids.len() as u32);
    }
}

#[test]
fn dbids_follow_allocation_order() {
    // host-major primaries, then the batch's mirrors, batch after batch
    let plan = build_plan(&PlanRequest::new(12, 4, Mode::Init)).unwrap();
    for (g, group) in plan.primaries().chunks(GROUP_SIZE).enumerate() {
        let primaries: Vec<u32> = group.iter().flatten().map(|r| r.dbid).collect();
        assert!(primaries.windows(2).all(|w| w[1] == w[0] + 1));
        let group_mirrors = &plan.mirrors()[g * GROUP_SIZE..(g + 1) * GROUP_SIZE];
        let last_primary = primaries.last().copied().unwrap_or(0);
        let lowest_mirror = group_mirrors.iter().flatten().map(|r| r.dbid).min();
        assert_eq!(lowest_mirror, Some(last_primary + 1));
    }
}

#[test]
fn directories_and_ports_unique_per_host() {
    for req in init_requests() {
        let plan = build_plan(&req).unwrap();
        for role_lists in [plan.primaries(), plan.mirrors()] {
            let mut dirs = HashSet::new();
            for r in role_lists.iter().flatten() {
                assert!(dirs.insert((r.host.clone(), r.directory.clone())), "{r:?}");
            }
        }
        let mut ports = HashSet::new();
        for r in all_records(&plan) {
            assert!(ports.insert((r.host.clone(), r.port)), "port clash {r:?}");
            assert!(ports.insert((r.host.clone(), r.replication_port)), "port clash {r:?}");
        }
    }
}

#[test]
fn records_carry_their_role() {
    let plan = build_plan(&PlanRequest::new(4, 2, Mode::Init)).unwrap();
    assert!(plan.primaries().iter().flatten().all(|r| r.role == Role::Primary));
    assert!(plan.mirrors().iter().flatten().all(|r| r.role == Role::Mirror));
}

#[test]
fn documented_four_host_scenario() {
    let (p, m) = single_dirs();
    let plan = build_plan(&PlanRequest::new(4, 1, Mode::Init).with_directories(p, m)).unwrap();

    let primaries: Vec<(&str, u32, u32)> = plan
        .primaries()
        .iter()
        .flatten()
        .map(|r| (r.host.as_str(), r.dbid, r.content))
        .collect();
    assert_eq!(
        primaries,
        vec![("sdw1", 2, 0), ("sdw2", 3, 1), ("sdw3", 4, 2), ("sdw4", 5, 3)]
    );

    let mut mirrors: Vec<(&str, u32, u32)> = plan
        .mirrors()
        .iter()
        .flatten()
        .map(|r| (r.host.as_str(), r.dbid, r.content))
        .collect();
    mirrors.sort_by_key(|m| m.1);
    assert_eq!(
        mirrors,
        vec![("sdw2", 6, 0), ("sdw1", 7, 1), ("sdw4", 8, 2), ("sdw3", 9, 3)]
    );
}

#[test]
fn expansion_never_reuses_identifiers() {
    for (max_content, max_dbid) in [(15, 33), (100, 100), (0, 1), (1000, 5000)] {
        for added in [4, 8, 12] {
            let mode = Mode::Expand(Expansion {
                hosts_added: added,
                max_content,
                max_dbid,
            });
            let plan = build_plan(&PlanRequest::new(16, 4, mode)).unwrap();
            for r in all_records(&plan) {
                assert!(r.dbid > max_dbid, "{r:?}");
                assert!(r.content > max_content, "{r:?}");
            }
            assert_eq!(plan.host_count(), added);
            assert_eq!(plan.primaries()[0][0].host, "sdw17");
            let last = plan.primaries().last().and_then(|h| h.first());
            assert_eq!(last.map(|r| r.host.clone()), Some(format!("sdw{}", 16 + added)));
        }
    }
}

#[test]
fn chained_expansion_continues_after_init() {
    let init = build_plan(&PlanRequest::new(8, 2, Mode::Init)).unwrap();
    let mode = Mode::Expand(Expansion {
        hosts_added: 4,
        max_content: init.max_content(),
        max_dbid: init.max_dbid(),
    });
    let grown = build_plan(&PlanRequest::new(8, 2, mode)).unwrap();

    let mut dbids: Vec<u32> = all_records(&init).chain(all_records(&grown)).map(|r| r.dbid).collect();
    dbids.sort_unstable();
    let expected: Vec<u32> = (2..2 + dbids.len() as u32).collect();
    assert_eq!(dbids, expected);

    let contents: HashSet<u32> = init
        .primaries()
        .iter()
        .chain(grown.primaries())
        .flatten()
        .map(|r| r.content)
        .collect();
    assert_eq!(contents.len(), 24);

    let hosts: HashSet<&str> = init
        .primaries()
        .iter()
        .chain(grown.primaries())
        .flatten()
        .map(|r| r.host.as_str())
        .collect();
    assert_eq!(hosts.len(), 12);
}

#[test]
fn identical_inputs_give_identical_output() {
    for req in init_requests() {
        let a = build_plan(&req).unwrap();
        let b = build_plan(&req.clone()).unwrap();
        assert_eq!(a, b);
        assert_eq!(render(&a, &Preamble::default()), render(&b, &Preamble::default()));
    }
}

#[test]
fn group_mirrors_spread_over_peers() {
    // with two or more slots, no host in a 4-host group takes all of its
    // mirrors from a single peer
    for segs in [2, 4, 6, 8] {
        let plan = build_plan(&PlanRequest::new(4, segs, Mode::Init)).unwrap();
        let primary_host: HashMap<u32, &str> = plan
            .primaries()
            .iter()
            .flatten()
            .map(|r| (r.content, r.host.as_str()))
            .collect();
        for host in plan.mirrors() {
            let sources: HashSet<&str> =
                host.iter().filter_map(|m| primary_host.get(&m.content).copied()).collect();
            assert!(sources.len() >= 2, "segs={segs}: {sources:?}");
        }
    }
}

#[test]
fn small_cluster_uses_mirror_count_only() {
    // Fewer than 4 hosts balance over the whole cluster without the
    // cross-pair tie-break. With 3 hosts and 2 slots that sends both
    // sdw2 and sdw3 slot-0 mirrors to sdw1.
    let plan = build_plan(&PlanRequest::new(3, 2, Mode::Init)).unwrap();
    let per_host: BTreeMap<&str, Vec<u32>> = plan
        .mirrors()
        .iter()
        .filter_map(|h| h.first().map(|r| (r.host.as_str(), h.iter().map(|r| r.content).collect())))
        .collect();
    assert_eq!(per_host["sdw1"], vec![2, 4]);
    assert_eq!(per_host["sdw2"], vec![0, 5]);
    assert_eq!(per_host["sdw3"], vec![1, 3]);
}
