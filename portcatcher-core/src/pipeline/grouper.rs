//! C2 — IpGrouper: collapses identical `(SrcIp, DstIp, Proto)` keys into
//! [`MergedGroup`]s and assigns dense LRMIDs in first-occurrence order.
//! Grounded in `merge_same_ip_entry`.

use ahash::AHashMap;
use tracing::info;

use crate::model::{IpRule, MergedGroup};

/// Groups `ip_table` by identical IP/protocol key, preserving first-seen
/// order for LRMID assignment.
pub fn group_ip_rules(ip_table: &[IpRule]) -> Vec<MergedGroup> {
    let mut key_to_index: AHashMap<(u32, u32, u32, u32, u8), usize> = AHashMap::default();
    let mut groups: Vec<MergedGroup> = Vec::new();

    for (i, rule) in ip_table.iter().enumerate() {
        let key = (rule.src_ip.0, rule.src_ip.1, rule.dst_ip.0, rule.dst_ip.1, rule.proto);
        match key_to_index.get(&key) {
            Some(&idx) => groups[idx].members.push(i),
            None => {
                key_to_index.insert(key, groups.len());
                groups.push(MergedGroup {
                    src_ip: rule.src_ip,
                    dst_ip: rule.dst_ip,
                    proto: rule.proto,
                    lrmid: groups.len() as u32,
                    members: vec![i],
                });
            }
        }
    }

    info!(ip_rules = ip_table.len(), groups = groups.len(), "merged IP/protocol entries into groups");
    groups
}
