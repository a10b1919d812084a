//! C1 — RuleSplitter: pure projection of each [`Rule5d`] into its IP and
//! port halves. Grounded in the original `split_rules`.

use crate::model::{IpRule, PortRule, Rule5d};

/// Splits `rules` into parallel IP and port tables; `ip_table[i]` and
/// `port_table[i]` describe the same source rule.
pub fn split_rules(rules: &[Rule5d]) -> (Vec<IpRule>, Vec<PortRule>) {
    let mut ip_table = Vec::with_capacity(rules.len());
    let mut port_table = Vec::with_capacity(rules.len());

    for (i, rule) in rules.iter().enumerate() {
        ip_table.push(IpRule {
            src_ip: rule.src_ip,
            dst_ip: rule.dst_ip,
            proto: rule.proto.0,
        });
        port_table.push(PortRule {
            rid: i,
            src_port: rule.src_port,
            dst_port: rule.dst_port,
            action: rule.action,
        });
    }

    (ip_table, port_table)
}
