//! # 磁盘数据结构层
//!
//! 一个块有四种结构视图：原始字节、超级块、inode 表、指针表。
//! 本层不做不安全的内存重释，而是为每种视图提供显式的编解码：
//! 读出时解码、写回时编码，字节布局与小端协议保持一致。

mod inode;
mod super_block;

pub use self::{inode::DiskInode, super_block::SuperBlock};

use crate::{DataBlock, POINTERS_PER_BLOCK};

/// 间接索引块视图：整个块连续存储块编号，0 表示未分配
pub(crate) type PointerBlock = [u32; POINTERS_PER_BLOCK];

pub(crate) fn decode_pointers(block: &DataBlock) -> PointerBlock {
    let mut pointers = [0u32; POINTERS_PER_BLOCK];
    for (i, pointer) in pointers.iter_mut().enumerate() {
        *pointer = get_u32(block, i * 4);
    }
    pointers
}

pub(crate) fn encode_pointers(pointers: &PointerBlock, block: &mut DataBlock) {
    for (i, pointer) in pointers.iter().enumerate() {
        put_u32(block, i * 4, *pointer);
    }
}

pub(crate) fn get_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

pub(crate) fn put_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
