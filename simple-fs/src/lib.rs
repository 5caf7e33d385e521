#![no_std]

extern crate alloc;

/* simple-fs 的整体架构，自上而下 */

// 索引节点层：面向使用者的 inode 句柄
mod vfs;

// 卷管理层：格式化、挂载会话与字节区间读写
mod sfs;

// 空闲块管理层：挂载期间的内存态位图
mod free_map;

// 磁盘数据结构层：块的各种结构视图及其编解码
mod layout;

// 错误类型
mod error;

pub use self::{
    error::Error,
    layout::{DiskInode, SuperBlock},
    sfs::{InodeReport, SimpleFileSystem, VolumeReport},
    vfs::Inode,
};

pub const MAGIC: u32 = 0xf0f0_3410;
pub const BLOCK_SIZE: usize = 4096;

/// inode 记录定长 32 字节
pub const INODE_SIZE: usize = 32;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// 每个 inode 的直接指针数
pub const POINTERS_PER_INODE: usize = 5;
/// 间接索引块能容纳的指针数
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;

/// 直接与间接寻址合计的文件大小上限
pub const MAX_FILE_SIZE: usize = BLOCK_SIZE * (POINTERS_PER_INODE + POINTERS_PER_BLOCK);

type DataBlock = [u8; BLOCK_SIZE];
