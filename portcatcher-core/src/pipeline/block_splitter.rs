//! C5 — PortBlockSplitter: splits each optimized block's concrete sides at
//! 32-port boundaries and emits the cartesian product of the resulting
//! sub-ranges. Grounded in `Create_Port_Block_Subset`.

use tracing::info;

use crate::model::{Lrmid, PortBlock};

const ANY_SENTINEL: (u16, u16) = (0, 0);

/// Splits every block under every LRMID, flattening into one sequence of
/// sub-blocks. Every emitted non-ANY side satisfies `hi/32 == lo/32`.
pub fn split_port_blocks(optimal_metainfo: &[(Lrmid, Vec<PortBlock>)]) -> Vec<PortBlock> {
    let input_blocks: usize = optimal_metainfo.iter().map(|(_, blocks)| blocks.len()).sum();
    let sub_blocks: Vec<PortBlock> =
        optimal_metainfo.iter().flat_map(|(_, blocks)| blocks.iter().flat_map(split_block)).collect();

    info!(input_blocks, sub_blocks = sub_blocks.len(), "split port blocks at 32-port boundaries");
    sub_blocks
}

fn split_block(block: &PortBlock) -> Vec<PortBlock> {
    let src_is_any = block.src_port == ANY_SENTINEL && matches!(block.any, crate::model::AnyFlag::Src | crate::model::AnyFlag::Both);
    let dst_is_any = block.dst_port == ANY_SENTINEL && matches!(block.any, crate::model::AnyFlag::Dst | crate::model::AnyFlag::Both);

    if src_is_any && dst_is_any {
        return vec![*block];
    }

    let src_ranges = if src_is_any { vec![ANY_SENTINEL] } else { split_into_windows(block.src_port) };
    let dst_ranges = if dst_is_any { vec![ANY_SENTINEL] } else { split_into_windows(block.dst_port) };

    let mut out = Vec::with_capacity(src_ranges.len() * dst_ranges.len());
    for &src in &src_ranges {
        for &dst in &dst_ranges {
            out.push(PortBlock { src_port: src, dst_port: dst, ..*block });
        }
    }
    out
}

/// Splits `[lo, hi]` into the minimum number of sub-ranges each contained in
/// one 32-port window.
fn split_into_windows(range: (u16, u16)) -> Vec<(u16, u16)> {
    let (lo, hi) = range;
    let mut out = Vec::new();
    let mut start = lo;
    loop {
        let window = start / 32;
        let next_boundary = (window as u32 + 1) * 32;
        let end = if next_boundary > hi as u32 + 1 { hi } else { (next_boundary - 1) as u16 };
        out.push((start, end));
        if end == hi {
            break;
        }
        start = end + 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnyFlag;

    fn block(src: (u16, u16), dst: (u16, u16), any: AnyFlag) -> PortBlock {
        PortBlock { lrmid: 0, src_port: src, dst_port: dst, rev: false, any, action: 1 }
    }

    #[test]
    fn both_any_passes_through_unchanged() {
        let out = split_block(&block((0, 0), (0, 0), AnyFlag::Both));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].src_port, (0, 0));
    }

    #[test]
    fn single_32_aligned_window_stays_whole() {
        let windows = split_into_windows((0, 31));
        assert_eq!(windows, vec![(0, 31)]);
    }

    #[test]
    fn two_windows_split_at_boundary() {
        let windows = split_into_windows((0, 63));
        assert_eq!(windows, vec![(0, 31), (32, 63)]);
    }

    #[test]
    fn unaligned_range_splits_into_three_pieces() {
        let windows = split_into_windows((10, 70));
        assert_eq!(windows, vec![(10, 31), (32, 63), (64, 70)]);
    }

    #[test]
    fn every_emitted_side_is_window_contained() {
        let windows = split_into_windows((100, 1000));
        for (lo, hi) in windows {
            assert_eq!(lo / 32, hi / 32);
        }
    }

    #[test]
    fn cartesian_product_of_both_sides() {
        let b = block((0, 63), (1024, 1055), AnyFlag::None);
        let out = split_block(&b);
        assert_eq!(out.len(), 2 * 1);
    }

    #[test]
    fn one_side_any_keeps_the_any_singleton() {
        let b = block((0, 0), (70, 100), AnyFlag::Src);
        let out = split_block(&b);
        assert!(out.iter().all(|blk| blk.src_port == (0, 0)));
        assert_eq!(out.len(), split_into_windows((70, 100)).len());
    }
}
