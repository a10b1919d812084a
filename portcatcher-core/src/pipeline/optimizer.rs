//! C4 — PortOptimizer: canonicalizes the full-range-port and
//! ephemeral-port-range patterns into the ANY/REV encoding, and classifies
//! each block by which side(s) became ANY. Grounded in
//! `Optimal_for_Port_Table`.

use tracing::info;

use crate::model::{AnyFlag, Lrmid, MergedItem, PortBlock};

const ANY_RANGE: (u16, u16) = (0, 65535);
const HIGH_RANGE: (u16, u16) = (1024, 65535);

/// Result of rewriting a single port side.
struct Rewritten {
    range: (u16, u16),
    is_any: bool,
    is_rev: bool,
}

fn rewrite_side(range: (u16, u16)) -> Rewritten {
    if range == ANY_RANGE {
        Rewritten { range: (0, 0), is_any: true, is_rev: false }
    } else if range == HIGH_RANGE {
        Rewritten { range: (0, 1023), is_any: false, is_rev: true }
    } else {
        Rewritten { range, is_any: false, is_rev: false }
    }
}

/// Rewrites every [`MergedItem`] in `metainfo` into a [`PortBlock`],
/// preserving the per-LRMID grouping.
pub fn optimize_metainfo(metainfo: &[(Lrmid, Vec<MergedItem>)]) -> Vec<(Lrmid, Vec<PortBlock>)> {
    let optimized: Vec<(Lrmid, Vec<PortBlock>)> = metainfo
        .iter()
        .map(|(lrmid, items)| {
            let blocks = items.iter().map(|item| optimize_item(*lrmid, item)).collect();
            (*lrmid, blocks)
        })
        .collect();

    let any_count = optimized
        .iter()
        .flat_map(|(_, blocks)| blocks)
        .filter(|b| !matches!(b.any, AnyFlag::None))
        .count();
    info!(groups = optimized.len(), any_rewrites = any_count, "optimized port blocks for ANY/REV");
    optimized
}

fn optimize_item(lrmid: Lrmid, item: &MergedItem) -> PortBlock {
    let src = rewrite_side(item.src_port);
    let dst = rewrite_side(item.dst_port);

    PortBlock {
        lrmid,
        src_port: src.range,
        dst_port: dst.range,
        rev: src.is_rev || dst.is_rev,
        any: AnyFlag::classify(src.is_any, dst.is_any),
        action: item.action,
    }
}
