//! C10 — Reporters: render each table to a fixed-column, diffable text file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{CompilerError, Result};
use crate::model::{IpTableEntry, Lrmid, LrmeEntry, LrmeSlot, MergedItem, PortPrefix, TcamEntry};

fn open(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|source| CompilerError::ReportUnwritable {
        path: path.display().to_string(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn finish(path: &Path, mut writer: BufWriter<File>) -> Result<()> {
    writer.flush().map_err(|source| CompilerError::ReportUnwritable {
        path: path.display().to_string(),
        source,
    })
}

pub fn write_metainfo(path: &Path, metainfo: &[(Lrmid, Vec<MergedItem>)]) -> Result<()> {
    let mut w = open(path)?;
    writeln!(w, "{:<10}{:<10}{:<10}{:<10}{:<10}{:<10}", "LRM-ID", "Src_lo", "Src_hi", "Dst_lo", "Dst_hi", "Action")
        .map_err(|source| io_err(path, source))?;

    for (lrmid, items) in metainfo {
        for item in items {
            writeln!(
                w,
                "{:<10}{:<10}{:<10}{:<10}{:<10}{:<10}",
                lrmid, item.src_port.0, item.src_port.1, item.dst_port.0, item.dst_port.1, item.action
            )
            .map_err(|source| io_err(path, source))?;
        }
    }

    finish(path, w)
}

pub fn write_port_table(path: &Path, entries: &[LrmeEntry]) -> Result<()> {
    let mut w = open(path)?;
    writeln!(w, "{:<10}{:<10}{:<10}{:<34}{:<34}", "LRMID", "SrcPAI", "DstPAI", "Src_Bitmap", "Dst_Bitmap")
        .map_err(|source| io_err(path, source))?;

    for entry in entries {
        writeln!(
            w,
            "{:<10}{:<10}{:<10}{:<34}{:<34}",
            entry.lrmid,
            render_pai(entry.src_pai),
            render_pai(entry.dst_pai),
            render_bitmap(entry.src_bitmap),
            render_bitmap(entry.dst_bitmap),
        )
        .map_err(|source| io_err(path, source))?;
    }

    finish(path, w)
}

pub fn write_ip_table(path: &Path, entries: &[IpTableEntry]) -> Result<()> {
    let mut w = open(path)?;
    writeln!(
        w,
        "{:<20}{:<20}{:<10}{:<16}{:<16}{:<16}",
        "SrcIP", "DstIP", "Protocol", "Src_ANY", "Dst_ANY", "No_ANY"
    )
    .map_err(|source| io_err(path, source))?;

    for entry in entries {
        let mut line = format!(
            "{:<20}{:<20}{:<10}{:<16}{:<16}{:<16}",
            render_ip_range(entry.src_ip),
            render_ip_range(entry.dst_ip),
            format!("0x{:02X}", entry.proto),
            render_slot(entry.src_any),
            render_slot(entry.dst_any),
            render_slot(entry.no_any),
        );
        if entry.drop_flag {
            line.push_str("[DROP]");
        }
        writeln!(w, "{line}").map_err(|source| io_err(path, source))?;
    }

    finish(path, w)
}

/// Streams TCAM entries to disk as they are iterated, rather than
/// materialising a second copy of a potentially large expansion.
pub fn write_tcam_table<'a>(path: &Path, entries: impl IntoIterator<Item = &'a TcamEntry>) -> Result<()> {
    let mut w = open(path)?;
    writeln!(
        w,
        "{:<20}{:<20}{:<18}{:<18}{:<12}{:<8}{:<8}",
        "SrcIP", "DstIP", "SrcPort", "DstPort", "Protocol", "Action", "RuleID"
    )
    .map_err(|source| io_err(path, source))?;

    for entry in entries {
        writeln!(
            w,
            "{:<20}{:<20}{:<18}{:<18}{:<12}{:<8}{:<8}",
            render_ip_range(entry.src_ip),
            render_ip_range(entry.dst_ip),
            render_port_prefix(entry.src_port),
            render_port_prefix(entry.dst_port),
            format!("0x{:02X}/0x{:02X}", entry.proto.0, entry.proto.1),
            entry.action,
            entry.rule_id,
        )
        .map_err(|source| io_err(path, source))?;
    }

    finish(path, w)
}

fn io_err(path: &Path, source: std::io::Error) -> CompilerError {
    CompilerError::ReportUnwritable { path: path.display().to_string(), source }
}

fn render_pai(pai: Option<u16>) -> String {
    match pai {
        Some(p) => p.to_string(),
        None => "ANY".to_string(),
    }
}

fn render_bitmap(bitmap: u32) -> String {
    format!("{bitmap:032b}")
}

fn render_slot(slot: Option<LrmeSlot>) -> String {
    match slot {
        Some(LrmeSlot { lrmid, rev }) => format!("{lrmid}/{}", if rev { "REV" } else { "-" }),
        None => "-".to_string(),
    }
}

fn ip_to_string(ip: u32) -> String {
    format!("{}.{}.{}.{}", (ip >> 24) & 0xFF, (ip >> 16) & 0xFF, (ip >> 8) & 0xFF, ip & 0xFF)
}

/// Renders `[lo, hi]` as CIDR when the range is a power-of-two-aligned
/// block, else as an explicit `lo-hi` dotted-quad range.
fn render_ip_range((lo, hi): (u32, u32)) -> String {
    let size = hi as u64 - lo as u64 + 1;
    if size.is_power_of_two() && lo as u64 % size == 0 {
        let masklen = 32 - size.trailing_zeros();
        format!("{}/{}", ip_to_string(lo), masklen)
    } else {
        format!("{}-{}", ip_to_string(lo), ip_to_string(hi))
    }
}

fn render_port_prefix(prefix: PortPrefix) -> String {
    if prefix.mask == 0 {
        "*".to_string()
    } else {
        format!("{}/0x{:04X}", prefix.prefix, prefix.mask)
    }
}
