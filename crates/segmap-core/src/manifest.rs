//! Manifest rendering.
//!
//! Two text shapes exist. The initialization manifest is a complete
//! cluster configuration: a preamble followed by `PRIMARY_ARRAY` and
//! `MIRROR_ARRAY` blocks with one `host:port:dir:dbid:content:repl_port`
//! line per segment. The expansion manifest is a bare list of
//! `host:host:port:dir:dbid:content:role:repl_port` lines meant to be
//! fed to the expansion utility of a running cluster.
//!
//! Rendering never validates; plans are correct by construction.

use std::fmt;

use crate::layout::SegmentRecord;
use crate::plan::ClusterPlan;
use crate::request::Mode;

/// The master segment line written into the init preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSegment {
    pub host: String,
    pub port: u16,
    pub directory: String,
}

impl Default for MasterSegment {
    fn default() -> Self {
        Self {
            host: "mdw1".into(),
            port: 5432,
            directory: "/data/master/gpseg-1".into(),
        }
    }
}

/// Fixed settings written ahead of the segment arrays in an init manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub array_name: String,
    pub trusted_shell: String,
    pub check_point_segments: u32,
    pub encoding: String,
    pub master: MasterSegment,
}

impl Default for Preamble {
    fn default() -> Self {
        Self {
            array_name: "Greenplum DCA".into(),
            trusted_shell: "ssh".into(),
            check_point_segments: 8,
            encoding: "unicode".into(),
            master: MasterSegment::default(),
        }
    }
}

/// An init-mode manifest ready for display.
pub struct InitManifest<'a> {
    plan: &'a ClusterPlan,
    preamble: &'a Preamble,
}

impl<'a> InitManifest<'a> {
    pub fn new(plan: &'a ClusterPlan, preamble: &'a Preamble) -> Self {
        Self { plan, preamble }
    }
}

impl fmt::Display for InitManifest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.preamble;
        writeln!(f, "ARRAY_NAME=\"{}\"", p.array_name)?;
        writeln!(f)?;
        writeln!(f, "TRUSTED_SHELL={}", p.trusted_shell)?;
        writeln!(f)?;
        writeln!(f, "CHECK_POINT_SEGMENTS={}", p.check_point_segments)?;
        writeln!(f)?;
        writeln!(f, "ENCODING={}", p.encoding)?;
        writeln!(f)?;
        // master is always dbid 1, content -1, no replication port
        writeln!(
            f,
            "QD_PRIMARY_ARRAY={}:{}:{}:1:-1:0",
            p.master.host, p.master.port, p.master.directory
        )?;
        writeln!(f)?;

        writeln!(f, "declare -a PRIMARY_ARRAY=(")?;
        write_init_lines(f, self.plan.primaries())?;
        writeln!(f, ")")?;
        writeln!(f)?;
        writeln!(f, "declare -a MIRROR_ARRAY=(")?;
        write_init_lines(f, self.plan.mirrors())?;
        writeln!(f, ")")
    }
}

fn write_init_lines(f: &mut fmt::Formatter<'_>, hosts: &[Vec<SegmentRecord>]) -> fmt::Result {
    for seg in hosts.iter().flatten() {
        writeln!(
            f,
            "{}:{}:{}:{}:{}:{}",
            seg.host, seg.port, seg.directory, seg.dbid, seg.content, seg.replication_port
        )?;
    }
    Ok(())
}

/// An expansion-mode manifest ready for display.
///
/// Each line ends with the segment's replication port, the field the
/// expansion utility reads in that position.
pub struct ExpansionManifest<'a> {
    plan: &'a ClusterPlan,
}

impl<'a> ExpansionManifest<'a> {
    pub fn new(plan: &'a ClusterPlan) -> Self {
        Self { plan }
    }
}

impl fmt::Display for ExpansionManifest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let records = self.plan.primaries().iter().chain(self.plan.mirrors()).flatten();
        for seg in records {
            // hostname and address are the same generated name
            writeln!(
                f,
                "{host}:{host}:{}:{}:{}:{}:{}:{}",
                seg.port,
                seg.directory,
                seg.dbid,
                seg.content,
                seg.role.tag(),
                seg.replication_port,
                host = seg.host,
            )?;
        }
        Ok(())
    }
}

/// Renders the manifest matching the plan's mode.
pub fn render(plan: &ClusterPlan, preamble: &Preamble) -> String {
    match plan.mode() {
        Mode::Init => InitManifest::new(plan, preamble).to_string(),
        Mode::Expand(_) => ExpansionManifest::new(plan).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::build_plan;
    use crate::request::{Expansion, PlanRequest};

    fn single_dir_plan(mode: Mode, hosts: usize) -> ClusterPlan {
        let request = PlanRequest::new(hosts, 1, mode)
            .with_directories(vec!["/p".into()], vec!["/m".into()]);
        build_plan(&request).unwrap()
    }

    #[test]
    fn init_manifest_layout() {
        let plan = single_dir_plan(Mode::Init, 4);
        let text = render(&plan, &Preamble::default());
        let expected = "\
ARRAY_NAME=\"Greenplum DCA\"

TRUSTED_SHELL=ssh

CHECK_POINT_SEGMENTS=8

ENCODING=unicode

QD_PRIMARY_ARRAY=mdw1:5432:/data/master/gpseg-1:1:-1:0

declare -a PRIMARY_ARRAY=(
sdw1:1025:/p/gpseg0:2:0:1089
sdw2:1025:/p/gpseg1:3:1:1089
sdw3:1025:/p/gpseg2:4:2:1089
sdw4:1025:/p/gpseg3:5:3:1089
)

declare -a MIRROR_ARRAY=(
sdw1:1153:/m/gpseg1:7:1:1217
sdw2:1153:/m/gpseg0:6:0:1217
sdw3:1153:/m/gpseg3:9:3:1217
sdw4:1153:/m/gpseg2:8:2:1217
)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn custom_preamble() {
        let plan = single_dir_plan(Mode::Init, 2);
        let preamble = Preamble {
            array_name: "Lab".into(),
            trusted_shell: "rsh".into(),
            check_point_segments: 16,
            encoding: "UTF8".into(),
            master: MasterSegment {
                host: "mdw2".into(),
                port: 6000,
                directory: "/master/gpseg-1".into(),
            },
        };
        let text = InitManifest::new(&plan, &preamble).to_string();
        assert!(text.starts_with("ARRAY_NAME=\"Lab\"\n\nTRUSTED_SHELL=rsh\n"));
        assert!(text.contains("CHECK_POINT_SEGMENTS=16\n"));
        assert!(text.contains("ENCODING=UTF8\n"));
        assert!(text.contains("QD_PRIMARY_ARRAY=mdw2:6000:/master/gpseg-1:1:-1:0\n"));
    }

    #[test]
    fn expansion_manifest_lines() {
        let mode = Mode::Expand(Expansion {
            hosts_added: 4,
            max_content: 3,
            max_dbid: 9,
        });
        let plan = single_dir_plan(mode, 4);
        let text = render(&plan, &Preamble::default());
        let expected = "\
sdw5:sdw5:1025:/p/gpseg4:10:4:p:1089
sdw6:sdw6:1025:/p/gpseg5:11:5:p:1089
sdw7:sdw7:1025:/p/gpseg6:12:6:p:1089
sdw8:sdw8:1025:/p/gpseg7:13:7:p:1089
sdw5:sdw5:1153:/m/gpseg5:15:5:m:1217
sdw6:sdw6:1153:/m/gpseg4:14:4:m:1217
sdw7:sdw7:1153:/m/gpseg7:17:7:m:1217
sdw8:sdw8:1153:/m/gpseg6:16:6:m:1217
";
        assert_eq!(text, expected);
    }

    #[test]
    fn expansion_ignores_preamble() {
        let mode = Mode::Expand(Expansion {
            hosts_added: 4,
            max_content: 3,
            max_dbid: 9,
        });
        let plan = single_dir_plan(mode, 4);
        let text = render(&plan, &Preamble::default());
        assert!(!text.contains("ARRAY_NAME"));
        assert_eq!(text.lines().count(), 8);
    }
}
