/// 文件系统操作错误。
///
/// 空间耗尽不在其列：inode 表满由 `create` 返回空表达，
/// 数据块耗尽由 `write_at` 以短写表达。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 设备已被挂载，拒绝再次挂载或格式化
    AlreadyMounted,
    /// 超级块魔数不符
    BadMagic,
    /// 超级块的几何信息自相矛盾，或非本协议的 inode 区比例
    BadGeometry,
    /// inode 编号超出 inode 表容量
    InodeOutOfRange,
    /// 目标 inode 未处于有效状态
    InvalidInode,
    /// 字节偏移越过了文件当前大小
    OffsetOutOfRange,
    /// 读到了声称范围内却未分配的块
    UnallocatedRegion,
}
