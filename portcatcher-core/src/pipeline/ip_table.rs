//! C7 — FinalIpTable: projects each group's (pre-split) port blocks back
//! into up to three per-group slots. Grounded in `create_final_IP_table`.

use tracing::{debug, info};

use crate::model::{AnyFlag, IpTableEntry, Lrmid, LrmeSlot, MergedGroup, PortBlock};

/// Builds one [`IpTableEntry`] per merged group, in LRMID order.
///
/// `optimal_metainfo` must be the pre-C5 per-LRMID block lists (i.e. before
/// 32-port-window splitting) — slot assignment operates on whole blocks, one
/// per original rule, not on their sub-block expansion.
pub fn build_final_ip_table(groups: &[MergedGroup], optimal_metainfo: &[(Lrmid, Vec<PortBlock>)]) -> Vec<IpTableEntry> {
    let lookup: ahash::AHashMap<Lrmid, &Vec<PortBlock>> =
        optimal_metainfo.iter().map(|(lrmid, blocks)| (*lrmid, blocks)).collect();

    let table: Vec<IpTableEntry> = groups
        .iter()
        .map(|group| {
            let mut entry = IpTableEntry {
                src_ip: group.src_ip,
                dst_ip: group.dst_ip,
                proto: group.proto,
                src_any: None,
                dst_any: None,
                no_any: None,
                drop_flag: false,
            };

            if let Some(blocks) = lookup.get(&group.lrmid) {
                for block in blocks.iter() {
                    assign_slot(&mut entry, group.lrmid, block);
                }
            }

            entry
        })
        .collect();

    let dropped = table.iter().filter(|e| e.drop_flag).count();
    info!(entries = table.len(), dropped, "built final IP table");
    table
}

fn assign_slot(entry: &mut IpTableEntry, lrmid: Lrmid, block: &PortBlock) {
    let slot = LrmeSlot { lrmid, rev: block.rev };
    match block.any {
        AnyFlag::Both => entry.drop_flag = true,
        AnyFlag::Src => {
            if entry.src_any.replace(slot).is_some() {
                debug!(lrmid, "overwriting existing Src_ANY slot: last write wins");
            }
        }
        AnyFlag::Dst => {
            if entry.dst_any.replace(slot).is_some() {
                debug!(lrmid, "overwriting existing Dst_ANY slot: last write wins");
            }
        }
        AnyFlag::None => {
            if entry.no_any.replace(slot).is_some() {
                debug!(lrmid, "overwriting existing No_ANY slot: last write wins");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(lrmid: Lrmid) -> MergedGroup {
        MergedGroup { src_ip: (0, 0), dst_ip: (1, 1), proto: 6, lrmid, members: vec![0] }
    }

    fn block(any: AnyFlag, rev: bool) -> PortBlock {
        PortBlock { lrmid: 0, src_port: (0, 0), dst_port: (0, 0), rev, any, action: 1 }
    }

    #[test]
    fn double_any_sets_drop_flag() {
        let groups = vec![group(0)];
        let meta = vec![(0, vec![block(AnyFlag::Both, false)])];
        let table = build_final_ip_table(&groups, &meta);
        assert!(table[0].drop_flag);
        assert!(table[0].src_any.is_none());
        assert!(table[0].no_any.is_none());
    }

    #[test]
    fn single_side_any_populates_the_matching_slot() {
        let groups = vec![group(0)];
        let meta = vec![(0, vec![block(AnyFlag::Src, true)])];
        let table = build_final_ip_table(&groups, &meta);
        let slot = table[0].src_any.expect("src_any set");
        assert_eq!(slot.lrmid, 0);
        assert!(slot.rev);
        assert!(table[0].dst_any.is_none());
    }

    #[test]
    fn no_any_slot_for_plain_blocks() {
        let groups = vec![group(0)];
        let meta = vec![(0, vec![block(AnyFlag::None, false)])];
        let table = build_final_ip_table(&groups, &meta);
        assert!(table[0].no_any.is_some());
    }

    #[test]
    fn group_without_metainfo_entry_has_all_empty_slots() {
        let groups = vec![group(5)];
        let table = build_final_ip_table(&groups, &[]);
        assert!(table[0].src_any.is_none() && table[0].dst_any.is_none() && table[0].no_any.is_none());
        assert!(!table[0].drop_flag);
    }

    #[test]
    fn later_block_overwrites_earlier_one_in_the_same_slot() {
        let groups = vec![group(0)];
        let meta = vec![(0, vec![block(AnyFlag::Src, false), block(AnyFlag::Src, true)])];
        let table = build_final_ip_table(&groups, &meta);
        assert!(table[0].src_any.unwrap().rev);
    }
}
