//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统引擎只通过此特质触达存储：几何信息在格式化/挂载时查询，
//! 挂载标志是防止重复挂载与重复格式化的唯一闸门。

#![no_std]

use core::any::Any;

/// 块设备驱动特质。
///
/// 读写以整块为单位进行，块大小由上层文件系统约定；
/// 设备读写被视为原子且不会失败，失败即底层系统中止。
pub trait BlockDevice: Send + Sync + Any {
    /// 设备总块数，固定几何信息
    fn block_count(&self) -> usize;

    /// 设备是否已被某个文件系统会话占用
    fn is_mounted(&self) -> bool;

    fn set_mounted(&self, mounted: bool);

    fn read_block(&self, block_id: usize, buf: &mut [u8]);

    fn write_block(&self, block_id: usize, buf: &[u8]);
}
