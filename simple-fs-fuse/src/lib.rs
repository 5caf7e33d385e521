
use std::fs::File;
use std::io::{Read, Write};
use std::io::{Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use block_dev::BlockDevice;
use simple_fs::BLOCK_SIZE;

/// A host file standing in for a raw block device.
pub struct BlockFile {
    file: Mutex<File>,
    blocks: usize,
    mounted: AtomicBool,
}

impl BlockFile {
    pub fn new(file: File, blocks: usize) -> Self {
        Self {
            file: Mutex::new(file),
            blocks,
            mounted: AtomicBool::new(false),
        }
    }
}

impl BlockDevice for BlockFile {
    fn block_count(&self) -> usize {
        self.blocks
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    fn set_mounted(&self, mounted: bool) {
        self.mounted.store(mounted, Ordering::Release);
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        assert_eq!(file.read(buf).unwrap(), BLOCK_SIZE, "not a complete block!");
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        assert_eq!(
            file.write(buf).unwrap(),
            BLOCK_SIZE,
            "not a complete block!"
        );
    }
}
