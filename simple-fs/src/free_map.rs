//! # 空闲块管理层
//!
//! 覆盖全卷的内存态位图，置位表示占用。
//! 它只是派生缓存而非权威数据：从不落盘，
//! 每次挂载都由 inode 扫描整体重建，
//! 因此磁盘上不存在需要与 inode 保持一致的空闲表结构。

use alloc::vec;
use alloc::vec::Vec;

/// 空闲块位图，64 块一组
pub(crate) struct FreeMap {
    groups: Vec<u64>,
    blocks: usize,
}

impl FreeMap {
    /// 建立全空闲的位图
    pub fn new(blocks: usize) -> Self {
        let mut groups = vec![0u64; blocks.div_ceil(64)];
        // 末组的越界位预先置满，分配扫描就无需单独判界
        if blocks % 64 != 0 {
            if let Some(last) = groups.last_mut() {
                *last |= !0 << (blocks % 64);
            }
        }

        Self { groups, blocks }
    }

    /// 首次适应：自块 0 向上取最低编号的空闲块并标记占用。
    /// 卷满时返回空
    pub fn alloc(&mut self) -> Option<u32> {
        let (group_index, ingroup_index) = self
            .groups
            .iter()
            .enumerate()
            .find_map(|(group_index, &bits)| {
                (bits != u64::MAX).then_some((group_index, bits.trailing_ones() as usize))
            })?;

        self.groups[group_index] |= 1 << ingroup_index;
        Some((group_index * 64 + ingroup_index) as u32)
    }

    pub fn set_used(&mut self, block_id: usize) {
        debug_assert!(block_id < self.blocks);
        self.groups[block_id / 64] |= 1 << (block_id % 64);
    }

    pub fn set_free(&mut self, block_id: usize) {
        debug_assert!(block_id < self.blocks);
        self.groups[block_id / 64] &= !(1 << (block_id % 64));
    }

    pub fn is_free(&self, block_id: usize) -> bool {
        self.groups[block_id / 64] & (1 << (block_id % 64)) == 0
    }

    pub fn free_blocks(&self) -> usize {
        self.groups.iter().map(|bits| bits.count_zeros() as usize).sum()
    }
}
