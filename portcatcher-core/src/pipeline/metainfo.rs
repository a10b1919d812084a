//! C3 — MetaInfoBuilder: gathers each group's member port rules into a list
//! indexed by LRMID. Grounded in `Create_metainfo`.

use tracing::{info, warn};

use crate::model::{Lrmid, MergedGroup, MergedItem, PortRule};

/// Builds `metainfo[LRMID] = [MergedItem ...]`, iterating each group's
/// members in their recorded order. Member indices past the end of
/// `port_table` are a sign of an upstream bug; they are skipped with a
/// warning rather than panicking.
pub fn build_metainfo(groups: &[MergedGroup], port_table: &[PortRule]) -> Vec<(Lrmid, Vec<MergedItem>)> {
    let mut metainfo = Vec::with_capacity(groups.len());

    for group in groups {
        let mut items = Vec::with_capacity(group.members.len());
        for &member in &group.members {
            let Some(port_rule) = port_table.get(member) else {
                warn!(
                    index = member,
                    port_table_len = port_table.len(),
                    "merged group references an out-of-range port table index, skipping"
                );
                continue;
            };
            items.push(MergedItem {
                lrmid: group.lrmid,
                src_port: port_rule.src_port,
                dst_port: port_rule.dst_port,
                action: port_rule.action,
            });
        }
        metainfo.push((group.lrmid, items));
    }

    let item_count: usize = metainfo.iter().map(|(_, items)| items.len()).sum();
    info!(groups = metainfo.len(), items = item_count, "built per-LRMID metainfo");
    metainfo
}
