use super::{get_u32, put_u32};
use crate::{DataBlock, INODES_PER_BLOCK, MAGIC};

/// 超级块：占据块 0 的起始 16 字节。
/// - 提供文件系统合法性校验；
/// - 记录卷的几何信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    pub magic: u32,
    /// 卷总块数
    pub blocks: u32,
    /// inode 表占据块数
    pub inode_blocks: u32,
    /// inode 总数
    pub inodes: u32,
}

/// 卷的一成留给 inode 表，四舍五入。
/// 这是跨实现挂载的协议常量，挂载时会据此拒绝异族卷
pub(crate) fn inode_region_blocks(total_blocks: u32) -> u32 {
    (total_blocks + 5) / 10
}

impl SuperBlock {
    pub(crate) fn new(blocks: u32) -> Self {
        let inode_blocks = inode_region_blocks(blocks);
        Self {
            magic: MAGIC,
            blocks,
            inode_blocks,
            inodes: inode_blocks * INODES_PER_BLOCK as u32,
        }
    }

    pub(crate) fn decode(block: &DataBlock) -> Self {
        Self {
            magic: get_u32(block, 0),
            blocks: get_u32(block, 4),
            inode_blocks: get_u32(block, 8),
            inodes: get_u32(block, 12),
        }
    }

    pub(crate) fn encode(&self, block: &mut DataBlock) {
        put_u32(block, 0, self.magic);
        put_u32(block, 4, self.blocks);
        put_u32(block, 8, self.inode_blocks);
        put_u32(block, 12, self.inodes);
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 布局一致性校验，用于挡下异族或已损坏的卷
    pub fn is_consistent(&self) -> bool {
        self.inodes == self.inode_blocks * INODES_PER_BLOCK as u32
            && self.inode_blocks == inode_region_blocks(self.blocks)
    }
}
