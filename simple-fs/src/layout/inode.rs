use super::{get_u32, put_u32};
use crate::{DataBlock, BLOCK_SIZE, INODE_SIZE, POINTERS_PER_INODE};

/// 磁盘 inode：32 字节定长记录，每块容纳 `INODES_PER_BLOCK` 个，
/// inode 表自块 1 起连续存放。
///
/// 指针值 0 统一表示“未分配”：块 0 是超级块，
/// 永远不可能成为合法的数据块目标。
/// 调用方从 inode 表拿到的是副本，修改后须显式写回。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct DiskInode {
    valid: u32,
    /// 文件大小（字节）
    pub size: u32,
    direct: [u32; POINTERS_PER_INODE],
    indirect: u32,
}

impl DiskInode {
    /// 置为新生状态：有效、零大小、全部指针未分配
    #[inline]
    pub(crate) fn init(&mut self) {
        *self = Self {
            valid: 1,
            ..Self::default()
        };
    }

    /// 销毁：回到全零的无效状态
    #[inline]
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid != 0
    }

    /// 直接指针，0 哨兵在此翻译为 `Option`
    #[inline]
    pub fn direct(&self, index: usize) -> Option<u32> {
        let pointer = self.direct[index];
        (pointer != 0).then_some(pointer)
    }

    #[inline]
    pub fn indirect(&self) -> Option<u32> {
        (self.indirect != 0).then_some(self.indirect)
    }

    #[inline]
    pub(crate) fn set_direct(&mut self, index: usize, pointer: u32) {
        self.direct[index] = pointer;
    }

    #[inline]
    pub(crate) fn set_indirect(&mut self, pointer: u32) {
        self.indirect = pointer;
    }

    /// 按大小推导的数据块数
    #[inline]
    pub fn data_blocks(&self) -> usize {
        (self.size as usize).div_ceil(BLOCK_SIZE)
    }

    pub(crate) fn decode(block: &DataBlock, slot: usize) -> Self {
        let at = slot * INODE_SIZE;
        let mut direct = [0u32; POINTERS_PER_INODE];
        for (i, pointer) in direct.iter_mut().enumerate() {
            *pointer = get_u32(block, at + 8 + i * 4);
        }

        Self {
            valid: get_u32(block, at),
            size: get_u32(block, at + 4),
            direct,
            indirect: get_u32(block, at + 28),
        }
    }

    pub(crate) fn encode(&self, block: &mut DataBlock, slot: usize) {
        let at = slot * INODE_SIZE;
        put_u32(block, at, self.valid);
        put_u32(block, at + 4, self.size);
        for (i, pointer) in self.direct.iter().enumerate() {
            put_u32(block, at + 8 + i * 4, *pointer);
        }
        put_u32(block, at + 28, self.indirect);
    }
}
