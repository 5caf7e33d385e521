//! # 索引节点层
//!
//! 面向使用者的句柄：一个 inode 编号加上挂载会话的共享引用，
//! 所有操作都在会话锁内转发。本引擎是平坦的 inode 空间，
//! 没有目录与文件名，句柄即是文件。

use alloc::sync::Arc;

use spin::Mutex;

use crate::Error;
use crate::SimpleFileSystem;

pub struct Inode {
    inumber: u32,
    fs: Arc<Mutex<SimpleFileSystem>>,
}

impl Inode {
    #[inline]
    pub(crate) fn new(inumber: u32, fs: Arc<Mutex<SimpleFileSystem>>) -> Self {
        Self { inumber, fs }
    }

    #[inline]
    pub fn inumber(&self) -> u32 {
        self.inumber
    }

    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize, Error> {
        self.fs.lock().read_at(self.inumber, offset, buf)
    }

    pub fn write_at(&self, offset: usize, buf: &[u8]) -> Result<usize, Error> {
        self.fs.lock().write_at(self.inumber, offset, buf)
    }

    /// 文件大小（字节）
    pub fn stat(&self) -> Result<u32, Error> {
        self.fs.lock().stat(self.inumber)
    }

    /// 销毁所指 inode，句柄此后只会得到 [`Error::InvalidInode`]
    pub fn remove(&self) -> Result<(), Error> {
        self.fs.lock().remove(self.inumber)
    }
}
