//! The two compilation branches: the split IP/port pipeline (C1–C7) and the
//! independent TCAM expansion (C8–C9). Each stage is grounded in one
//! function of the original reference implementation; see `DESIGN.md`.

pub mod block_splitter;
pub mod grouper;
pub mod ip_table;
pub mod lrme;
pub mod metainfo;
pub mod optimizer;
pub mod prefix;
pub mod splitter;
pub mod tcam;

use tracing::info;

use crate::model::{Rule5d, SplitTables, TcamTables};

/// Runs the full split IP/port pipeline (C1–C7) over `rules`.
pub fn run_split_pipeline(rules: &[Rule5d]) -> SplitTables {
    let (ip_table, port_table) = splitter::split_rules(rules);
    let groups = grouper::group_ip_rules(&ip_table);
    let metainfo = metainfo::build_metainfo(&groups, &port_table);
    let optimized = optimizer::optimize_metainfo(&metainfo);
    let blocks = block_splitter::split_port_blocks(&optimized);
    let (lrme_entries, lrme_duplicates_removed) = lrme::build_lrme_entries(&blocks);
    let final_ip_table = ip_table::build_final_ip_table(&groups, &optimized);

    info!(
        groups = groups.len(),
        lrme_entries = lrme_entries.len(),
        lrme_duplicates_removed,
        "split pipeline complete"
    );

    SplitTables { metainfo, lrme_entries, ip_table: final_ip_table, lrme_duplicates_removed }
}

/// Runs the independent TCAM expansion (C8–C9) over `rules`.
pub fn run_tcam_pipeline(rules: &[Rule5d]) -> TcamTables {
    let entries = tcam::expand_to_tcam(rules);
    info!(entries = entries.len(), "tcam expansion complete");
    TcamTables { entries }
}
