//! Data model shared across the compilation pipeline.
//!
//! Every table here is built once by its owning stage and never mutated
//! afterwards; downstream stages only read it.

/// A single 5-tuple rule as parsed from the rule file, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule5d {
    pub src_ip: (u32, u32),
    pub dst_ip: (u32, u32),
    pub src_port: (u16, u16),
    pub dst_port: (u16, u16),
    /// Single value when the protocol mask pinned it, `(0, 255)` when wildcard.
    pub proto: (u8, u8),
    pub action: u16,
    /// 1-based, assigned in file order to accepted lines.
    pub priority: u32,
}

/// The IP+protocol projection of a [`Rule5d`]; `ip_table[i]` and
/// `port_table[i]` always describe the same source rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRule {
    pub src_ip: (u32, u32),
    pub dst_ip: (u32, u32),
    pub proto: u8,
}

/// The port+action projection of a [`Rule5d`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRule {
    pub rid: usize,
    pub src_port: (u16, u16),
    pub dst_port: (u16, u16),
    pub action: u16,
}

/// Dense identifier assigned to each unique `(SrcIp, DstIp, Proto)` group,
/// in first-occurrence order starting at 0.
pub type Lrmid = u32;

/// A group of original rule indices that share the same IP/protocol key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedGroup {
    pub src_ip: (u32, u32),
    pub dst_ip: (u32, u32),
    pub proto: u8,
    pub lrmid: Lrmid,
    /// Positional indices into the original rule list, in first-seen order.
    pub members: Vec<usize>,
}

/// One original rule's port ranges, tagged with the LRMID of its IP group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedItem {
    pub lrmid: Lrmid,
    pub src_port: (u16, u16),
    pub dst_port: (u16, u16),
    pub action: u16,
}

/// Which side(s) of a [`PortBlock`] were rewritten to the ANY sentinel by
/// [`crate::pipeline::optimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyFlag {
    None,
    Src,
    Dst,
    Both,
}

impl AnyFlag {
    pub(crate) fn classify(src_any: bool, dst_any: bool) -> Self {
        match (src_any, dst_any) {
            (true, true) => AnyFlag::Both,
            (true, false) => AnyFlag::Src,
            (false, true) => AnyFlag::Dst,
            (false, false) => AnyFlag::None,
        }
    }
}

/// A port sub-range produced after the ANY/REV rewrite and (for concrete
/// sides) after splitting at 32-port boundaries.
///
/// The single `rev` flag cannot distinguish a src-side REV from a dst-side
/// REV, or both at once — that ambiguity is inherited from the source design
/// and is not resolved here (see the design notes on dual-side REV).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBlock {
    pub lrmid: Lrmid,
    pub src_port: (u16, u16),
    pub dst_port: (u16, u16),
    pub rev: bool,
    pub any: AnyFlag,
    pub action: u16,
}

/// Port Address Interval + 32-bit occupancy bitmap encoding of one
/// [`PortBlock`], deduplicated within its LRMID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LrmeEntry {
    pub lrmid: Lrmid,
    pub any: AnyFlag,
    /// `None` when the side is ANY; `Some(port / 32)` otherwise.
    pub src_pai: Option<u16>,
    pub dst_pai: Option<u16>,
    pub src_bitmap: u32,
    pub dst_bitmap: u32,
}

/// One of the three per-group slots in [`IpTableEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LrmeSlot {
    pub lrmid: Lrmid,
    pub rev: bool,
}

/// Final per-IP-group row, linking back into the port table via up to three
/// LRMID slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpTableEntry {
    pub src_ip: (u32, u32),
    pub dst_ip: (u32, u32),
    pub proto: u8,
    pub src_any: Option<LrmeSlot>,
    pub dst_any: Option<LrmeSlot>,
    pub no_any: Option<LrmeSlot>,
    /// Set when a block matched on both sides ANY (whole-flow wildcard).
    pub drop_flag: bool,
}

/// A `(prefix, mask)` pair covering part of a port range. `mask == 0` means
/// "wildcard" (the whole 16-bit space).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPrefix {
    pub prefix: u16,
    pub mask: u16,
}

/// One ternary-matched entry in the TCAM expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcamEntry {
    pub src_ip: (u32, u32),
    pub dst_ip: (u32, u32),
    pub src_port: PortPrefix,
    pub dst_port: PortPrefix,
    pub proto: (u8, u8),
    pub action: u16,
    pub rule_id: u32,
}

/// Everything the split/IP-table side of the pipeline produces.
#[derive(Debug, Clone, Default)]
pub struct SplitTables {
    pub metainfo: Vec<(Lrmid, Vec<MergedItem>)>,
    pub lrme_entries: Vec<LrmeEntry>,
    pub ip_table: Vec<IpTableEntry>,
    /// Count of duplicate LRME rows collapsed during dedup, for logging.
    pub lrme_duplicates_removed: usize,
}

/// Everything the TCAM side of the pipeline produces.
#[derive(Debug, Clone, Default)]
pub struct TcamTables {
    pub entries: Vec<TcamEntry>,
}

/// A rule line that was rejected during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParseWarning {
    pub line: u32,
    pub reason: String,
}
