//! C9 — TcamExpander: expands every original rule into the cartesian
//! product of its source- and destination-port prefix decompositions.

use crate::model::{Rule5d, TcamEntry};
use crate::pipeline::prefix::port_range_to_prefixes;

/// Expands `rules` (in load order) into ternary TCAM entries. `rule_id` is
/// the rule's zero-based position in `rules`.
pub fn expand_to_tcam(rules: &[Rule5d]) -> Vec<TcamEntry> {
    let mut out = Vec::new();

    for (rule_id, rule) in rules.iter().enumerate() {
        let src_prefixes = port_range_to_prefixes(rule.src_port.0, rule.src_port.1);
        let dst_prefixes = port_range_to_prefixes(rule.dst_port.0, rule.dst_port.1);

        for &src_port in &src_prefixes {
            for &dst_port in &dst_prefixes {
                out.push(TcamEntry {
                    src_ip: rule.src_ip,
                    dst_ip: rule.dst_ip,
                    src_port,
                    dst_port,
                    proto: rule.proto,
                    action: rule.action,
                    rule_id: rule_id as u32,
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PortPrefix;

    fn rule(src_port: (u16, u16), dst_port: (u16, u16)) -> Rule5d {
        Rule5d {
            src_ip: (0, 0),
            dst_ip: (0xFFFF_FFFF, 0xFFFF_FFFF),
            src_port,
            dst_port,
            proto: (6, 6),
            action: 1,
            priority: 1,
        }
    }

    #[test]
    fn single_port_on_both_sides_yields_one_entry() {
        let entries = expand_to_tcam(&[rule((80, 80), (443, 443))]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].src_port, PortPrefix { prefix: 80, mask: 0xFFFF });
        assert_eq!(entries[0].dst_port, PortPrefix { prefix: 443, mask: 0xFFFF });
        assert_eq!(entries[0].rule_id, 0);
    }

    #[test]
    fn ephemeral_src_times_single_dst_multiplies_out() {
        let entries = expand_to_tcam(&[rule((1024, 65535), (22, 22))]);
        assert_eq!(entries.len(), 6);
        assert!(entries.iter().all(|e| e.dst_port == PortPrefix { prefix: 22, mask: 0xFFFF }));
    }

    #[test]
    fn rule_id_tracks_load_order_across_multiple_rules() {
        let entries = expand_to_tcam(&[rule((80, 80), (80, 80)), rule((443, 443), (443, 443))]);
        let ids: Vec<u32> = entries.iter().map(|e| e.rule_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn ip_ranges_and_protocol_are_carried_verbatim() {
        let entries = expand_to_tcam(&[rule((80, 80), (80, 80))]);
        assert_eq!(entries[0].src_ip, (0, 0));
        assert_eq!(entries[0].dst_ip, (0xFFFF_FFFF, 0xFFFF_FFFF));
        assert_eq!(entries[0].proto, (6, 6));
    }
}
