//! # 卷管理层
//!
//! 构建出磁盘的布局并维护挂载会话：设备句柄、几何信息与
//! 空闲块位图都封装在 [`SimpleFileSystem`] 中，由 `mount` 创建、
//! 随会话对象的丢弃而结束，不存在游离的全局可变状态。

use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::BlockDevice;
use log::{debug, trace};
use spin::Mutex;

use crate::free_map::FreeMap;
use crate::layout::{self, DiskInode, PointerBlock, SuperBlock};
use crate::vfs::Inode;
use crate::{
    DataBlock, Error, BLOCK_SIZE, INODES_PER_BLOCK, MAX_FILE_SIZE, POINTERS_PER_BLOCK,
    POINTERS_PER_INODE,
};

/// 一次挂载会话。
///
/// 单线程同步模型：每个操作运行到完成，多块写中途失败不回滚，
/// 设备停留在已完成子写入的状态，位图与 inode 记录只反映
/// 实际分配到的块。
pub struct SimpleFileSystem {
    block_device: Arc<dyn BlockDevice>,
    super_block: SuperBlock,
    free_map: FreeMap,
}

/// 卷面目一览，供上层渲染
#[derive(Debug)]
pub struct VolumeReport {
    pub super_block: SuperBlock,
    pub inodes: Vec<InodeReport>,
}

#[derive(Debug)]
pub struct InodeReport {
    pub inumber: u32,
    pub size: u32,
    pub direct: Vec<u32>,
    pub indirect: Option<u32>,
    /// 间接索引块内的非零指针
    pub indirect_blocks: Vec<u32>,
}

impl SimpleFileSystem {
    /// 格式化块设备：写出超级块并清零其余所有块。
    /// inode 表被整体清零，即全部 inode 天然无效。
    /// 不做部分状态回滚，设备的块写入视为原子
    pub fn format(block_device: &Arc<dyn BlockDevice>) -> Result<(), Error> {
        if block_device.is_mounted() {
            return Err(Error::AlreadyMounted);
        }

        let super_block = SuperBlock::new(block_device.block_count() as u32);
        debug!(
            "format: blocks={} inode_blocks={} inodes={}",
            super_block.blocks, super_block.inode_blocks, super_block.inodes
        );

        let mut block: DataBlock = [0; BLOCK_SIZE];
        super_block.encode(&mut block);
        block_device.write_block(0, &block);

        let zeroes: DataBlock = [0; BLOCK_SIZE];
        for block_id in 1..super_block.blocks as usize {
            block_device.write_block(block_id, &zeroes);
        }

        Ok(())
    }

    /// 挂载块设备：校验超级块，重建空闲块位图。
    ///
    /// 位图完全由持久化的 inode 推导：块 0 与 inode 表恒为占用，
    /// 每个有效 inode 按大小推导的块数贡献其直接指针，
    /// 超出直接指针的部分再贡献间接索引块及其内部指针。
    pub fn mount(block_device: Arc<dyn BlockDevice>) -> Result<Arc<Mutex<Self>>, Error> {
        if block_device.is_mounted() {
            return Err(Error::AlreadyMounted);
        }

        let mut block: DataBlock = [0; BLOCK_SIZE];
        block_device.read_block(0, &mut block);
        let super_block = SuperBlock::decode(&block);

        if !super_block.is_valid() {
            return Err(Error::BadMagic);
        }
        if !super_block.is_consistent() {
            return Err(Error::BadGeometry);
        }

        let mut free_map = FreeMap::new(super_block.blocks as usize);

        // 结构块恒为占用
        free_map.set_used(0);
        for block_id in 1..=super_block.inode_blocks as usize {
            free_map.set_used(block_id);
        }

        // 扫描整个 inode 表，标记每个有效 inode 的可达块
        for block_id in 1..=super_block.inode_blocks as usize {
            block_device.read_block(block_id, &mut block);
            for slot in 0..INODES_PER_BLOCK {
                let inode = DiskInode::decode(&block, slot);
                if !inode.is_valid() {
                    continue;
                }

                let data_blocks = inode.data_blocks();
                for index in 0..data_blocks.min(POINTERS_PER_INODE) {
                    if let Some(pointer) = inode.direct(index) {
                        free_map.set_used(pointer as usize);
                    }
                }

                if data_blocks > POINTERS_PER_INODE {
                    let Some(indirect) = inode.indirect() else {
                        continue;
                    };
                    free_map.set_used(indirect as usize);

                    let mut pointer_block: DataBlock = [0; BLOCK_SIZE];
                    block_device.read_block(indirect as usize, &mut pointer_block);
                    let pointers = layout::decode_pointers(&pointer_block);
                    for &pointer in pointers.iter().take(data_blocks - POINTERS_PER_INODE) {
                        if pointer != 0 {
                            free_map.set_used(pointer as usize);
                        }
                    }
                }
            }
        }

        debug!(
            "mount: blocks={} free={}",
            super_block.blocks,
            free_map.free_blocks()
        );

        block_device.set_mounted(true);
        Ok(Arc::new(Mutex::new(Self {
            block_device,
            super_block,
            free_map,
        })))
    }

    #[inline]
    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.free_map.free_blocks()
    }

    #[inline]
    pub fn block_in_use(&self, block_id: usize) -> bool {
        !self.free_map.is_free(block_id)
    }
}

/* inode 表 */
impl SimpleFileSystem {
    /// 读出一个 inode 记录。拿到的是副本，修改后须经 [`save_inode`]
    /// 落盘。
    ///
    /// [`save_inode`]: Self::save_inode
    pub fn load_inode(&self, inumber: u32) -> Result<DiskInode, Error> {
        let (block_id, slot) = self.disk_inode_pos(inumber)?;
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.block_device.read_block(block_id, &mut block);
        Ok(DiskInode::decode(&block, slot))
    }

    /// 写回一个 inode 记录。同块内还有其它 inode，必须读-改-写
    pub fn save_inode(&self, inumber: u32, inode: &DiskInode) -> Result<(), Error> {
        let (block_id, slot) = self.disk_inode_pos(inumber)?;
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.block_device.read_block(block_id, &mut block);
        inode.encode(&mut block, slot);
        self.block_device.write_block(block_id, &block);
        Ok(())
    }

    /// 分配新的 inode 并返回其编号：按块、块内槽位升序取第一个
    /// 无效槽位；表满时返回空。新 inode 不占任何数据块，无需改动
    /// 位图
    pub fn create(&mut self) -> Option<u32> {
        for block_id in 1..=self.super_block.inode_blocks as usize {
            let mut block: DataBlock = [0; BLOCK_SIZE];
            self.block_device.read_block(block_id, &mut block);

            for slot in 0..INODES_PER_BLOCK {
                if DiskInode::decode(&block, slot).is_valid() {
                    continue;
                }

                let inumber = ((block_id - 1) * INODES_PER_BLOCK + slot) as u32;
                let mut inode = DiskInode::default();
                inode.init();
                inode.encode(&mut block, slot);
                self.block_device.write_block(block_id, &block);

                trace!("create: inumber={inumber}");
                return Some(inumber);
            }
        }

        None
    }

    /// 销毁 inode：释放其全部直接块、间接索引块与间接数据块，
    /// 清空记录并落盘。对无效 inode 重复销毁是错误，不动位图
    pub fn remove(&mut self, inumber: u32) -> Result<(), Error> {
        let mut inode = self.load_inode(inumber)?;
        if !inode.is_valid() {
            return Err(Error::InvalidInode);
        }

        for index in 0..POINTERS_PER_INODE {
            if let Some(pointer) = inode.direct(index) {
                self.free_map.set_free(pointer as usize);
            }
        }

        if let Some(indirect) = inode.indirect() {
            self.free_map.set_free(indirect as usize);

            let mut block: DataBlock = [0; BLOCK_SIZE];
            self.block_device.read_block(indirect as usize, &mut block);
            for pointer in layout::decode_pointers(&block) {
                if pointer != 0 {
                    self.free_map.set_free(pointer as usize);
                }
            }
        }

        inode.clear();
        self.save_inode(inumber, &inode)?;

        trace!("remove: inumber={inumber}");
        Ok(())
    }

    /// 有效 inode 的字节大小
    pub fn stat(&self, inumber: u32) -> Result<u32, Error> {
        let inode = self.load_inode(inumber)?;
        if !inode.is_valid() {
            return Err(Error::InvalidInode);
        }
        Ok(inode.size)
    }

    /// inode 编号 → (所在块ID, 块内槽位)
    fn disk_inode_pos(&self, inumber: u32) -> Result<(usize, usize), Error> {
        if inumber >= self.super_block.inodes {
            return Err(Error::InodeOutOfRange);
        }

        Ok((
            1 + inumber as usize / INODES_PER_BLOCK,
            inumber as usize % INODES_PER_BLOCK,
        ))
    }
}

/* 数据通路 */
impl SimpleFileSystem {
    /// 从指定位置（字节偏移）读出数据填充 `buf`，返回读取的字节数。
    ///
    /// 读取不越过文件末尾，长度收缩到 `size - offset`；
    /// 声称范围内出现 0 指针是错误，读路径从不补零。
    pub fn read_at(&self, inumber: u32, offset: usize, buf: &mut [u8]) -> Result<usize, Error> {
        let inode = self.load_inode(inumber)?;
        if !inode.is_valid() {
            return Err(Error::InvalidInode);
        }

        let size = inode.size as usize;
        if offset > size {
            return Err(Error::OffsetOutOfRange);
        }

        let length = buf.len().min(size - offset);
        if length == 0 {
            return Ok(0);
        }

        // 跨入间接区域的读取只加载一次间接索引块
        let pointers = if (offset + length).div_ceil(BLOCK_SIZE) > POINTERS_PER_INODE {
            let indirect = inode.indirect().ok_or(Error::UnallocatedRegion)?;
            let mut block: DataBlock = [0; BLOCK_SIZE];
            self.block_device.read_block(indirect as usize, &mut block);
            Some(layout::decode_pointers(&block))
        } else {
            None
        };

        let mut read = 0;
        let mut index = offset / BLOCK_SIZE;
        while read < length {
            let block_id = Self::resolve(&inode, pointers.as_ref(), index)?;
            let mut block: DataBlock = [0; BLOCK_SIZE];
            self.block_device.read_block(block_id as usize, &mut block);

            // 首块从块内偏移起拷，后续块从头起拷
            let start = if read == 0 { offset % BLOCK_SIZE } else { 0 };
            let n = (BLOCK_SIZE - start).min(length - read);
            buf[read..read + n].copy_from_slice(&block[start..start + n]);

            read += n;
            index += 1;
        }

        Ok(read)
    }

    /// 向指定位置（字节偏移）写入 `buf`，返回写入的字节数。
    ///
    /// 长度收缩到寻址容量上限 `MAX_FILE_SIZE - offset`。
    /// 任何一次块分配失败（直接数据块、间接索引块、间接数据块）
    /// 都走同一条耗尽路径：停下循环，再统一结算大小并持久化——
    /// `size` 与已落盘的指针只反映完整写完的块。
    /// 短写是正常返回而非错误，调用方须检查写入字节数。
    pub fn write_at(&mut self, inumber: u32, offset: usize, buf: &[u8]) -> Result<usize, Error> {
        let mut inode = self.load_inode(inumber)?;
        if !inode.is_valid() {
            return Err(Error::InvalidInode);
        }

        let size = inode.size as usize;
        if offset > size {
            return Err(Error::OffsetOutOfRange);
        }

        // 损坏的卷可能谎报出越过寻址容量的 size，偏移随之越界，
        // 饱和减法把这样的写入收缩为零而不是下溢
        let length = buf.len().min(MAX_FILE_SIZE.saturating_sub(offset));

        let mut inode_dirty = false;
        let mut pointers: Option<PointerBlock> = None;
        let mut pointers_dirty = false;
        // 本次调用新分配的间接索引块，收尾时可能需要回收
        let mut fresh_indirect = None;

        let mut written = 0;
        let mut index = offset / BLOCK_SIZE;
        while written < length {
            debug_assert!(index < POINTERS_PER_INODE + POINTERS_PER_BLOCK);

            // 解析本块的物理块号，指针为 0 则当场分配
            let block_id = if index < POINTERS_PER_INODE {
                match inode.direct(index) {
                    Some(pointer) => pointer,
                    None => {
                        let Some(pointer) = self.alloc_block() else {
                            break;
                        };
                        inode.set_direct(index, pointer);
                        inode_dirty = true;
                        pointer
                    }
                }
            } else {
                // 首次踏入间接区域：先保证间接索引块本身存在，
                // 其指针表只加载一次
                if pointers.is_none() {
                    let indirect = match inode.indirect() {
                        Some(pointer) => pointer,
                        None => {
                            let Some(pointer) = self.alloc_block() else {
                                break;
                            };
                            inode.set_indirect(pointer);
                            inode_dirty = true;
                            fresh_indirect = Some(pointer);
                            pointer
                        }
                    };

                    let mut block: DataBlock = [0; BLOCK_SIZE];
                    self.block_device.read_block(indirect as usize, &mut block);
                    pointers = Some(layout::decode_pointers(&block));
                }
                let Some(table) = pointers.as_mut() else {
                    break;
                };

                match table[index - POINTERS_PER_INODE] {
                    0 => {
                        let Some(pointer) = self.alloc_block() else {
                            break;
                        };
                        table[index - POINTERS_PER_INODE] = pointer;
                        pointers_dirty = true;
                        pointer
                    }
                    pointer => pointer,
                }
            };

            let start = if written == 0 { offset % BLOCK_SIZE } else { 0 };
            let n = (BLOCK_SIZE - start).min(length - written);

            let mut block: DataBlock = [0; BLOCK_SIZE];
            if n < BLOCK_SIZE {
                // 读-改-写，保住写入窗口之外的字节
                self.block_device.read_block(block_id as usize, &mut block);
            }
            block[start..start + n].copy_from_slice(&buf[written..written + n]);
            self.block_device.write_block(block_id as usize, &block);

            written += n;
            index += 1;
        }

        // 统一的收尾路径：无论是否中途耗尽，这里才结算大小、
        // 写回脏的间接指针表与 inode 记录
        if offset + written > size {
            inode.size = (offset + written) as u32;
            inode_dirty = true;
        }
        // 间接索引块若是本次新分配、却没有任何间接数据块完整落盘
        // （结算后的块数仍未越过直接区域），则回收之。否则挂载重建
        // 位图时该块不可达，会被再次分配出去
        if let Some(indirect) = fresh_indirect {
            if inode.data_blocks() <= POINTERS_PER_INODE {
                self.free_map.set_free(indirect as usize);
                inode.set_indirect(0);
            }
        }
        if pointers_dirty {
            if let (Some(table), Some(indirect)) = (pointers.as_ref(), inode.indirect()) {
                let mut block: DataBlock = [0; BLOCK_SIZE];
                layout::encode_pointers(table, &mut block);
                self.block_device.write_block(indirect as usize, &block);
            }
        }
        if inode_dirty {
            self.save_inode(inumber, &inode)?;
        }

        trace!("write_at: inumber={inumber} offset={offset} written={written}");
        Ok(written)
    }

    /// 逻辑块索引 → 物理块号
    fn resolve(
        inode: &DiskInode,
        pointers: Option<&PointerBlock>,
        index: usize,
    ) -> Result<u32, Error> {
        let pointer = if index < POINTERS_PER_INODE {
            inode.direct(index)
        } else if index < POINTERS_PER_INODE + POINTERS_PER_BLOCK {
            pointers.and_then(|table| {
                let pointer = table[index - POINTERS_PER_INODE];
                (pointer != 0).then_some(pointer)
            })
        } else {
            // 寻址容量之外没有块可言：损坏的 inode 谎报的大小
            // 到这里按未分配处理
            None
        };

        pointer.ok_or(Error::UnallocatedRegion)
    }

    /// 唯一的块分配入口：取得最低编号的空闲块，先在设备上清零
    /// 再交出，新块绝不暴露陈旧数据
    fn alloc_block(&mut self) -> Option<u32> {
        let block_id = self.free_map.alloc()?;
        let zeroes: DataBlock = [0; BLOCK_SIZE];
        self.block_device.write_block(block_id as usize, &zeroes);
        trace!("alloc_block: {block_id}");
        Some(block_id)
    }
}

/* 句柄与巡览 */
impl SimpleFileSystem {
    /// 新建 inode 并包装成句柄
    pub fn create_inode(fs: &Arc<Mutex<Self>>) -> Option<Inode> {
        let inumber = fs.lock().create()?;
        Some(Inode::new(inumber, fs.clone()))
    }

    /// 既有编号的句柄，不校验有效性，留给后续操作报告
    pub fn inode(fs: &Arc<Mutex<Self>>, inumber: u32) -> Inode {
        Inode::new(inumber, fs.clone())
    }

    /// 遍历卷面目结构：超级块加上每个有效 inode 的大小与指针
    pub fn report(&self) -> VolumeReport {
        let mut inodes = Vec::new();

        for inumber in 0..self.super_block.inodes {
            let Ok(inode) = self.load_inode(inumber) else {
                continue;
            };
            if !inode.is_valid() {
                continue;
            }

            let mut indirect_blocks = Vec::new();
            if let Some(indirect) = inode.indirect() {
                let mut block: DataBlock = [0; BLOCK_SIZE];
                self.block_device.read_block(indirect as usize, &mut block);
                indirect_blocks = layout::decode_pointers(&block)
                    .into_iter()
                    .filter(|&pointer| pointer != 0)
                    .collect();
            }

            inodes.push(InodeReport {
                inumber,
                size: inode.size,
                direct: (0..POINTERS_PER_INODE)
                    .filter_map(|index| inode.direct(index))
                    .collect(),
                indirect: inode.indirect(),
                indirect_blocks,
            });
        }

        VolumeReport {
            super_block: self.super_block,
            inodes,
        }
    }
}

impl Drop for SimpleFileSystem {
    /// 会话结束即卸载，设备可再次挂载或格式化
    fn drop(&mut self) {
        self.block_device.set_mounted(false);
    }
}
