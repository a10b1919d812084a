//! C6 — LrmeBuilder: encodes each port sub-block as a PAI + 32-bit bitmap
//! entry, then deduplicates within each LRMID. Grounded in
//! `Caculate_LRME_Enries`.

use ahash::AHashMap;
use tracing::info;

use crate::model::{AnyFlag, LrmeEntry, PortBlock};

/// Encodes and deduplicates `blocks` into LRME entries, returning them in
/// ascending-LRMID order together with the number of duplicates collapsed.
pub fn build_lrme_entries(blocks: &[PortBlock]) -> (Vec<LrmeEntry>, usize) {
    let mut by_lrmid: AHashMap<u32, Vec<LrmeEntry>> = AHashMap::default();
    let mut order: Vec<u32> = Vec::new();
    let mut total_before = 0usize;

    for block in blocks {
        let entry = encode_block(block);
        total_before += 1;
        let bucket = by_lrmid.entry(block.lrmid).or_insert_with(|| {
            order.push(block.lrmid);
            Vec::new()
        });
        if !bucket.contains(&entry) {
            bucket.push(entry);
        }
    }

    order.sort_unstable();
    let mut total_after = 0usize;
    let mut out = Vec::new();
    for lrmid in order {
        let bucket = &by_lrmid[&lrmid];
        total_after += bucket.len();
        out.extend_from_slice(bucket);
    }

    let duplicates_removed = total_before - total_after;
    info!(before = total_before, after = total_after, duplicates_removed, "deduplicated LRME entries");
    (out, duplicates_removed)
}

fn encode_block(block: &PortBlock) -> LrmeEntry {
    let src_is_any = matches!(block.any, AnyFlag::Src | AnyFlag::Both) && block.src_port == (0, 0);
    let dst_is_any = matches!(block.any, AnyFlag::Dst | AnyFlag::Both) && block.dst_port == (0, 0);

    let (src_pai, src_bitmap) = encode_side(block.src_port, src_is_any);
    let (dst_pai, dst_bitmap) = encode_side(block.dst_port, dst_is_any);

    LrmeEntry { lrmid: block.lrmid, any: block.any, src_pai, dst_pai, src_bitmap, dst_bitmap }
}

fn encode_side(range: (u16, u16), is_any: bool) -> (Option<u16>, u32) {
    if is_any {
        return (None, 0);
    }
    let (lo, hi) = range;
    let window = lo / 32;
    let base = window as u32 * 32;
    let start_bit = lo as u32 - base;
    let end_bit = hi as u32 - base;
    let width = end_bit - start_bit + 1;
    let bitmap = if width == 32 { u32::MAX } else { ((1u32 << width) - 1) << start_bit };
    (Some(window), bitmap)
}
