//! Rule-file parsing (C11): turns the pinned textual format into [`Rule5d`]
//! values. Grounded in the original loader's `load_rules_from_file` and
//! `ip_range_from_parts`.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::{CompilerError, Result};
use crate::model::{Rule5d, RuleParseWarning};

/// Reads and parses every line of `path`, returning the accepted rules and a
/// warning for every line that was skipped. A file that cannot be opened is
/// the only fatal condition here.
pub fn load_rules_from_file(path: impl AsRef<Path>) -> Result<(Vec<Rule5d>, Vec<RuleParseWarning>)> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| CompilerError::RulesUnreadable {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_rules(&text))
}

/// Parses rule text already held in memory (used directly by tests and by
/// [`load_rules_from_file`]).
pub fn parse_rules(text: &str) -> (Vec<Rule5d>, Vec<RuleParseWarning>) {
    let mut rules = Vec::new();
    let mut warnings = Vec::new();
    let mut accepted: u32 = 0;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(mut rule) => {
                accepted += 1;
                rule.priority = accepted;
                rules.push(rule);
            }
            Err(reason) => {
                warn!(line = line_no, %reason, "skipping malformed rule line");
                warnings.push(RuleParseWarning { line: line_no, reason });
            }
        }
    }

    (rules, warnings)
}

struct Fields {
    sip: [u32; 4],
    smask: u32,
    dip: [u32; 4],
    dmask: u32,
    sport_lo: u32,
    sport_hi: u32,
    dport_lo: u32,
    dport_hi: u32,
    proto: u32,
    proto_mask: u32,
    action: u32,
}

fn parse_line(line: &str) -> std::result::Result<Rule5d, String> {
    let fields = parse_space_separated(line)
        .or_else(|| parse_tab_separated(line))
        .ok_or_else(|| "does not match the @SIP/M DIP/M SPLO:SPHI DPLO:DPHI PROTO/M ACTION/M format".to_string())?;

    for octet in fields.sip.iter().chain(fields.dip.iter()) {
        if *octet > 255 {
            return Err("invalid IP octet (must be 0-255)".to_string());
        }
    }
    if fields.sport_lo > 65535 || fields.sport_hi > 65535 || fields.dport_lo > 65535 || fields.dport_hi > 65535 {
        return Err("port out of range (must be 0-65535)".to_string());
    }
    if fields.sport_lo > fields.sport_hi || fields.dport_lo > fields.dport_hi {
        return Err("invalid port range (lo > hi)".to_string());
    }
    if fields.smask > 32 || fields.dmask > 32 {
        return Err("invalid mask length (must be 0-32)".to_string());
    }

    let src_ip = ip_range_from_parts(fields.sip[0], fields.sip[1], fields.sip[2], fields.sip[3], fields.smask)?;
    let dst_ip = ip_range_from_parts(fields.dip[0], fields.dip[1], fields.dip[2], fields.dip[3], fields.dmask)?;

    let proto = if fields.proto_mask == 0xFF {
        (fields.proto as u8, fields.proto as u8)
    } else {
        // mask == 0x00, or any other mask: treated as wildcard. See design
        // notes on protocol masks other than 0x00/0xFF.
        (0u8, 255u8)
    };

    Ok(Rule5d {
        src_ip,
        dst_ip,
        src_port: (fields.sport_lo as u16, fields.sport_hi as u16),
        dst_port: (fields.dport_lo as u16, fields.dport_hi as u16),
        proto,
        action: fields.action as u16,
        priority: 0, // assigned by the caller once the line is accepted
    })
}

/// `@a.b.c.d/m e.f.g.h/m splo : sphi dplo : dphi proto/pmask action/amask`
fn parse_space_separated(line: &str) -> Option<Fields> {
    let line = line.strip_prefix('@')?;
    let mut tokens = line.split_whitespace();

    let (sip, smask) = parse_cidr_token(tokens.next()?)?;
    let (dip, dmask) = parse_cidr_token(tokens.next()?)?;

    let sport_lo = tokens.next()?.parse().ok()?;
    if tokens.next()? != ":" {
        return None;
    }
    let sport_hi = tokens.next()?.parse().ok()?;

    let dport_lo = tokens.next()?.parse().ok()?;
    if tokens.next()? != ":" {
        return None;
    }
    let dport_hi = tokens.next()?.parse().ok()?;

    let (proto, proto_mask) = parse_hex_pair(tokens.next()?)?;
    let (action, _action_mask) = parse_hex_pair(tokens.next()?)?;

    if tokens.next().is_some() {
        return None;
    }

    Some(Fields { sip, smask, dip, dmask, sport_lo, sport_hi, dport_lo, dport_hi, proto, proto_mask, action })
}

/// Tab-separated variant of the same grammar, tried when the space-separated
/// parse fails.
fn parse_tab_separated(line: &str) -> Option<Fields> {
    if !line.contains('\t') {
        return None;
    }
    let normalized = line.replace('\t', " ");
    parse_space_separated(&normalized)
}

fn parse_cidr_token(tok: &str) -> Option<([u32; 4], u32)> {
    let (ip, mask) = tok.split_once('/')?;
    let mut octets = [0u32; 4];
    let mut parts = ip.split('.');
    for octet in octets.iter_mut() {
        *octet = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    let mask = mask.parse().ok()?;
    Some((octets, mask))
}

fn parse_hex_pair(tok: &str) -> Option<(u32, u32)> {
    let (value, mask) = tok.split_once('/')?;
    let value = u32::from_str_radix(value.strip_prefix("0x").unwrap_or(value), 16).ok()?;
    let mask = u32::from_str_radix(mask.strip_prefix("0x").unwrap_or(mask), 16).ok()?;
    Some((value, mask))
}

/// CIDR expansion: the inclusive `[network, broadcast]` range of `a.b.c.d/masklen`.
fn ip_range_from_parts(a: u32, b: u32, c: u32, d: u32, masklen: u32) -> std::result::Result<(u32, u32), String> {
    if masklen > 32 {
        return Err("masklen > 32".to_string());
    }

    let addr = std::net::Ipv4Addr::new(a as u8, b as u8, c as u8, d as u8);
    let net = ipnet::Ipv4Net::new(addr, masklen as u8).map_err(|e| format!("invalid prefix length: {e}"))?;
    Ok((u32::from(net.network()), u32::from(net.broadcast())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cidr_masklen_zero_covers_everything() {
        assert_eq!(ip_range_from_parts(10, 0, 0, 0, 0).unwrap(), (0, u32::MAX));
    }

    #[test]
    fn cidr_masklen_32_is_single_address() {
        let (lo, hi) = ip_range_from_parts(10, 0, 0, 1, 32).unwrap();
        assert_eq!(lo, hi);
        assert_eq!(lo, (10u32 << 24) | 1);
    }

    #[test]
    fn cidr_masklen_24_covers_256_addresses() {
        let (lo, hi) = ip_range_from_parts(192, 168, 1, 37, 24).unwrap();
        assert_eq!(lo, (192u32 << 24) | (168 << 16) | (1 << 8));
        assert_eq!(hi, lo + 255);
    }

    #[test]
    fn parses_space_separated_line() {
        let (rules, warnings) = parse_rules(
            "@10.0.0.0/8 20.0.0.0/8 0 : 65535 0 : 65535 0x06/0xFF 0x01/0xFFFF\n",
        );
        assert!(warnings.is_empty());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].proto, (6, 6));
        assert_eq!(rules[0].action, 1);
        assert_eq!(rules[0].priority, 1);
    }

    #[test]
    fn parses_tab_separated_line() {
        let line = "@1.2.3.4/32\t5.6.7.8/32\t1024 : 65535\t80 : 80\t0x11/0xFF\t0x02/0xFFFF\n";
        let (rules, warnings) = parse_rules(line);
        assert!(warnings.is_empty());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].src_port, (1024, 65535));
        assert_eq!(rules[0].dst_port, (80, 80));
    }

    #[test]
    fn wildcard_protocol_mask_expands_to_full_range() {
        let (rules, _) = parse_rules("@10.0.0.0/8 20.0.0.0/8 0 : 1 0 : 1 0x00/0x00 0x00/0x0000\n");
        assert_eq!(rules[0].proto, (0, 255));
    }

    #[test]
    fn rejects_inverted_port_range() {
        let (rules, warnings) = parse_rules("@10.0.0.0/8 20.0.0.0/8 100 : 1 0 : 1 0x06/0xFF 0x00/0x0000\n");
        assert!(rules.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 1);
    }

    #[test]
    fn rejects_out_of_range_octet() {
        let (rules, warnings) = parse_rules("@300.0.0.0/8 20.0.0.0/8 0 : 1 0 : 1 0x06/0xFF 0x00/0x0000\n");
        assert!(rules.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn blank_lines_are_ignored_without_warning() {
        let (rules, warnings) = parse_rules("\n\n@10.0.0.0/8 20.0.0.0/8 0 : 1 0 : 1 0x06/0xFF 0x00/0x0000\n\n");
        assert_eq!(rules.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn priority_counts_only_accepted_lines() {
        let text = "@bad line\n@10.0.0.0/8 20.0.0.0/8 0 : 1 0 : 1 0x06/0xFF 0x00/0x0000\n@10.0.0.0/8 20.0.0.0/8 0 : 1 0 : 1 0x06/0xFF 0x00/0x0000\n";
        let (rules, warnings) = parse_rules(text);
        assert_eq!(warnings.len(), 1);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].priority, 1);
        assert_eq!(rules[1].priority, 2);
    }
}
